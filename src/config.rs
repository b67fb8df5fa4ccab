use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Runtime settings, read from the process environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub upload_dir: PathBuf,
    pub file_size_limit: usize,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_owned()),
            secret: required("SECRET")?,
            access_token_ttl: Duration::minutes(parsed("ACCESS_TOKEN_MINUTES", 60)?),
            refresh_token_ttl: Duration::days(parsed("REFRESH_TOKEN_DAYS", 7)?),
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            file_size_limit: parsed("FILE_SIZE_LIMIT", 5 * 1024 * 1024)?,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    /// Settings for tests and local tooling: in-memory database, fixed secret.
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            database_url: "sqlite::memory:".to_owned(),
            bind_addr: "127.0.0.1:0".to_owned(),
            secret: "test-secret".to_owned(),
            access_token_ttl: Duration::minutes(30),
            refresh_token_ttl: Duration::days(1),
            upload_dir,
            file_size_limit: 1024 * 1024,
            admin_username: Some("admin".to_owned()),
            admin_password: Some("Secret15!".to_owned()),
        }
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
