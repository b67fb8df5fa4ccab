mod common;

use common::{spawn_app, PASSWORD};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn superuser_manages_the_global_catalog() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (status, cases) = app
        .post(app.admin("/categories"), &admin, json!({ "name": "Cases", "description": "Phone cases" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            app.admin("/brands"),
            &admin,
            json!({ "name": "Acme", "category_id": cases["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post(app.admin("/categories"), &admin, json!({ "name": "Cases" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(app.admin("/colors"), &admin, json!({ "color_name": "Red", "color_code": "red" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Color code must look like #RRGGBB");

    let brands: Value = app
        .client
        .get(app.store("/brands?category=Cases"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(brands.as_array().unwrap().len(), 1);
    assert_eq!(brands[0]["name"], "Acme");

    let brands: Value = app
        .client
        .get(app.store("/brands?category=Unknown"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(brands.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn shop_staff_read_only_referenced_catalog_rows() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let owner = app.staff_user("owner").await;
    app.shop("North", owner.id).await;
    let owner_token = app.login("owner", PASSWORD).await;

    app.post(app.admin("/categories"), &admin, json!({ "name": "Cases" })).await;

    let (status, _) = app
        .post(app.admin("/categories"), &owner_token, json!({ "name": "Straps" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, categories) = app.get(app.admin("/categories"), &owner_token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(categories.as_array().unwrap().is_empty());

    let (_, categories) = app.get(app.admin("/categories"), &admin).await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn about_page_is_upserted_by_the_superuser() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app.client.get(app.store("/about")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let about = json!({
        "title": "About us",
        "description": "We sell cases",
        "history_title": "History",
        "history_description": "Since 2020",
        "customers_title": "Customers"
    });
    let response = app
        .client
        .put(app.admin("/about"))
        .bearer_auth(&admin)
        .json(&about)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .client
        .put(app.admin("/about"))
        .bearer_auth(&admin)
        .json(&about)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.client.get(app.store("/about")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], "About us");
}
