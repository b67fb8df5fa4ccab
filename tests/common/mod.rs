#![allow(dead_code)]

use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use multishop::entities::{
    color, customer_profile, primary_setup, product, product_color, product_color_image,
    product_color_size, setup_schema, shop, size, user,
};
use multishop::{create_api_router, Config};

pub const ADMIN_USERNAME: &str = "admin";
pub const PASSWORD: &str = "Secret15!";

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: Arc<DatabaseConnection>,
    pub upload_dir: PathBuf,
}

/// Runs the full router against a fresh SQLite file on a random port.
pub async fn spawn_app() -> TestApp {
    let root = std::env::temp_dir().join(format!("multishop-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();
    let upload_dir = root.join("uploads");

    let mut config = Config::for_tests(upload_dir.clone());
    config.database_url = format!("sqlite://{}?mode=rwc", root.join("db.sqlite").display());
    let config = Arc::new(config);

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(4).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    setup_schema(&db).await.unwrap();
    let db = Arc::new(db);
    primary_setup(&db, &config).await.unwrap();

    let app = create_api_router(db.clone(), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        client: Client::new(),
        db,
        upload_dir,
    }
}

impl TestApp {
    pub fn store(&self, path: &str) -> String {
        format!("http://{}/api/store{}", self.addr, path)
    }

    pub fn admin(&self, path: &str) -> String {
        format!("http://{}/api/admin{}", self.addr, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.store("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_owned()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, PASSWORD).await
    }

    /// Registers a customer through the API and returns their access token.
    pub async fn customer(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.store("/register"))
            .json(&registration(username))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        self.login(username, PASSWORD).await
    }

    pub async fn staff_user(&self, username: &str) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_owned()),
            email: Set(format!("{username}@example.com")),
            password: Set(user::hash_password(PASSWORD).unwrap()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            is_staff: Set(true),
            is_superuser: Set(false),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap()
    }

    pub async fn shop(&self, name: &str, owner_id: i32) -> shop::Model {
        shop::ActiveModel {
            name: Set(name.to_owned()),
            address: Set("Main street 1, City".to_owned()),
            owner_id: Set(owner_id),
            contact_email: Set(String::new()),
            contact_phone: Set(String::new()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap()
    }

    pub async fn color(&self, name: &str) -> color::Model {
        color::ActiveModel {
            color_name: Set(name.to_owned()),
            color_code: Set("#000000".to_owned()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap()
    }

    pub async fn size(&self, name: &str) -> size::Model {
        size::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap()
    }

    /// A product of `shop_id` in `color` with `stock` units and no sizes.
    pub async fn product(
        &self,
        name: &str,
        price: i64,
        shop_id: i32,
        color: &color::Model,
        stock: i32,
    ) -> (product::Model, product_color_image::Model) {
        let product = product::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(format!("{name} description")),
            price: Set(Decimal::new(price, 0)),
            make_by: Set("Factory".to_owned()),
            rating: Set(Decimal::ZERO),
            discount: Set(Decimal::ZERO),
            stock: Set(stock),
            category_id: Set(None),
            brand_id: Set(None),
            device_model_id: Set(None),
            created_by_shop_id: Set(Some(shop_id)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap();

        product_color::ActiveModel {
            product_id: Set(product.id),
            color_id: Set(color.id),
        }
        .insert(&*self.db)
        .await
        .unwrap();

        let color_image = product_color_image::ActiveModel {
            product_id: Set(product.id),
            color_id: Set(color.id),
            image_id: Set(None),
            stock: Set(stock),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap();

        (product, color_image)
    }

    pub async fn color_size(
        &self,
        color_image: &product_color_image::Model,
        size: &size::Model,
        stock: i32,
    ) -> product_color_size::Model {
        product_color_size::ActiveModel {
            product_color_image_id: Set(color_image.id),
            size_id: Set(size.id),
            stock: Set(stock),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .unwrap()
    }

    pub async fn get(&self, url: String, token: &str) -> (StatusCode, Value) {
        let response = self.client.get(url).bearer_auth(token).send().await.unwrap();
        read(response).await
    }

    pub async fn post(&self, url: String, token: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(response).await
    }

    pub async fn patch(&self, url: String, token: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(response).await
    }

    pub async fn delete(&self, url: String, token: &str) -> StatusCode {
        self.client
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .status()
    }
}

pub fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "confirm_password": PASSWORD,
        "first_name": "Test",
        "last_name": "User",
        "phone_number": "89991234567",
        "address": "Main street 5, flat 2",
        "city": "City",
        "postal_code": "123456"
    })
}

async fn read(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, body)
}

pub async fn customer_profile_of(app: &TestApp, username: &str) -> customer_profile::Model {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    customer_profile::Entity::find()
        .filter(customer_profile::Column::UserId.eq(user.id))
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap()
}

/// Reads a money value whether it was serialized as a string or a number.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(text) => text.parse().unwrap(),
        Value::Number(number) => number.to_string().parse().unwrap(),
        other => panic!("not a money value: {other}"),
    }
}
