use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+\.[a-zA-Z]{2,}$").unwrap());

pub static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").unwrap());

pub static COLOR_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

pub static FILE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,25}$").unwrap());

const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const EMAIL_MESSAGE: &str = "Invalid email format. Please enter a valid email address.";
pub const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters long and contain at least one letter, one number, and one special character.";
pub const PHONE_MESSAGE: &str = "Phone number must be exactly 11 digits.";
pub const ADDRESS_MESSAGE: &str = "Address must contain at least one alphabetic character, one number, and one of the following characters: -, \\, or ,.";

/// At least 8 characters from letters, digits and the allowed specials, with
/// one of each kind.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let valid = allowed
        && password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(Cow::Borrowed(PASSWORD_MESSAGE)))
    }
}

/// Letters, digits, whitespace, `-`, `\` and `,`, with at least one letter,
/// one digit and one separator.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let is_separator = |c: char| matches!(c, '-' | '\\' | ',');
    let allowed = address
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || is_separator(c));
    let valid = allowed
        && address.chars().any(|c| c.is_ascii_alphabetic())
        && address.chars().any(|c| c.is_ascii_digit())
        && address.chars().any(is_separator);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("address").with_message(Cow::Borrowed(ADDRESS_MESSAGE)))
    }
}

/// Message of the first failing field, checking fields in `order`.
pub fn first_error(errors: &ValidationErrors, order: &[&str]) -> Option<String> {
    let fields = errors.field_errors();
    order.iter().find_map(|field| {
        fields
            .get(*field)
            .and_then(|errs| errs.first())
            .map(|err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {field}"),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(validate_password("Secret15!").is_ok());
        assert!(validate_password("Sec15!").is_err());
        assert!(validate_password("Secret155").is_err());
        assert!(validate_password("Secret!!!").is_err());
        assert!(validate_password("Secret 15!").is_err());
    }

    #[test]
    fn address_rules() {
        assert!(validate_address("12 Main St, Springfield").is_ok());
        assert!(validate_address("Block 4-B").is_ok());
        assert!(validate_address("Main Street").is_err());
        assert!(validate_address("12 Main St.").is_err());
    }

    #[test]
    fn patterns() {
        assert!(EMAIL_REGEX.is_match("jane.doe@example.com"));
        assert!(!EMAIL_REGEX.is_match("jane@example"));
        assert!(PHONE_REGEX.is_match("09123456789"));
        assert!(!PHONE_REGEX.is_match("0912345678"));
        assert!(COLOR_CODE_REGEX.is_match("#FF5733"));
        assert!(!COLOR_CODE_REGEX.is_match("FF5733"));
    }
}
