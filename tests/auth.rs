mod common;

use common::{registration, spawn_app, PASSWORD};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_verify() {
    let app = spawn_app().await;
    let token = app.customer("alice").await;

    let (status, body) = app.get(app.store("/verify-token"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token is valid!");

    let (status, profile) = app.get(app.store("/profile"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["phone_number"], "89991234567");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = spawn_app().await;
    app.customer("alice").await;

    let mut payload = registration("bob");
    payload["email"] = json!("alice@example.com");
    let response = app
        .client
        .post(app.store("/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Email is already in use. Please use a different email address."
    );
}

#[tokio::test]
async fn register_rejects_weak_password_and_mismatch() {
    let app = spawn_app().await;

    let mut weak = registration("carol");
    weak["password"] = json!("password");
    weak["confirm_password"] = json!("password");
    let response = app.client.post(app.store("/register")).json(&weak).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut mismatch = registration("carol");
    mismatch["confirm_password"] = json!("Other15!x");
    let response = app
        .client
        .post(app.store("/register"))
        .json(&mismatch)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Passwords do not match.");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.customer("alice").await;

    let response = app
        .client
        .post(app.store("/login"))
        .json(&json!({ "username": "alice", "password": "Wrong15!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_issues_access_token() {
    let app = spawn_app().await;
    app.customer("alice").await;

    let login: Value = app
        .client
        .post(app.store("/login"))
        .json(&json!({ "username": "alice", "password": PASSWORD }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.store("/refresh-token"))
        .json(&json!({ "refresh_token": login["refresh_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let access = body["access_token"].as_str().unwrap();

    let (status, _) = app.get(app.store("/verify-token"), access).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not accepted as a refresh token.
    let response = app
        .client
        .post(app.store("/refresh-token"))
        .json(&json!({ "refresh_token": access }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.store("/getcart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.customer("alice").await;
    let (status, _) = app.get(app.admin("/products"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
