mod common;

use common::{money, spawn_app};
use multishop::entities::product_color_image;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn add_increment_decrement_and_remove() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (product, _) = app.product("Case", 10, shop.id, &black, 3).await;
    let token = app.customer("alice").await;

    let (status, cart) = app
        .post(
            app.store("/cart"),
            &token,
            json!({
                "product_id": product.id,
                "color_size_quantities": [{ "color_name": "Black", "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["cart_items"][0]["quantity"], 2);
    assert_eq!(money(&cart["total_price"]), Decimal::new(20, 0));

    let line = json!({ "product_id": product.id, "color_name": "Black" });

    let (status, cart) = app.post(app.store("/cart/increment"), &token, line.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart_items"][0]["quantity"], 3);

    let (status, body) = app.post(app.store("/cart/increment"), &token, line.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .ends_with("Only 0 more can be added."));

    let (status, cart) = app.post(app.store("/cart/decrement"), &token, line.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart_items"][0]["quantity"], 2);

    let (status, cart) = app.post(app.store("/cart/remove"), &token, line.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart_items"].as_array().unwrap().len(), 0);

    let (status, body) = app.post(app.store("/cart/remove"), &token, line).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Cart item not found for this product, color, and size"
    );
}

#[tokio::test]
async fn adding_more_than_stock_counts_the_cart() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (product, _) = app.product("Case", 10, shop.id, &black, 3).await;
    let token = app.customer("alice").await;

    let add = |quantity: i32| {
        json!({
            "product_id": product.id,
            "color_size_quantities": [{ "color_name": "Black", "quantity": quantity }]
        })
    };

    let (status, _) = app.post(app.store("/cart"), &token, add(2)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post(app.store("/cart"), &token, add(2)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Not enough stock for"));
    assert!(message.ends_with("Available: 3, Requested: 2, In cart: 2"));
}

#[tokio::test]
async fn sized_products_need_a_size() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let large = app.size("L").await;
    let (product, color_image) = app.product("Shirt", 15, shop.id, &black, 4).await;
    app.color_size(&color_image, &large, 4).await;
    let token = app.customer("alice").await;

    let (status, _) = app
        .post(
            app.store("/cart"),
            &token,
            json!({
                "product_id": product.id,
                "color_size_quantities": [{ "color_name": "Black" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = app
        .post(
            app.store("/cart"),
            &token,
            json!({
                "product_id": product.id,
                "color_size_quantities": [{ "color_name": "Black", "size_name": "l" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["cart_items"][0]["size_name"], "L");
    assert_eq!(cart["cart_items"][0]["quantity"], 1);
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = spawn_app().await;
    let token = app.customer("alice").await;

    let (status, body) = app
        .post(app.store("/cart"), &token, json!({ "color_size_quantities": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing product_id or color_size_quantities");

    let (status, body) = app
        .post(
            app.store("/cart"),
            &token,
            json!({
                "product_id": 999,
                "color_size_quantities": [{ "color_name": "Black" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid product");
}

#[tokio::test]
async fn get_cart_creates_an_empty_one_and_delete_clears_it() {
    let app = spawn_app().await;
    let token = app.customer("alice").await;

    let (status, cart) = app.get(app.store("/getcart"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&cart["total_price"]), Decimal::ZERO);
    assert!(cart["cart_items"].as_array().unwrap().is_empty());

    let status = app.delete(app.store("/delete_cart"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .post(
            app.store("/cart/decrement"),
            &token,
            json!({ "product_id": 1, "color_name": "Black" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No cart found for this user");
}

#[tokio::test]
async fn get_cart_prunes_sold_out_lines() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, color_image) = app.product("Case", 10, shop.id, &black, 2).await;
    let token = app.customer("alice").await;

    app.post(
        app.store("/cart"),
        &token,
        json!({
            "product_id": case.id,
            "color_size_quantities": [{ "color_name": "Black", "quantity": 2 }]
        }),
    )
    .await;

    let mut sold_out: product_color_image::ActiveModel = color_image.into();
    sold_out.stock = Set(0);
    sold_out.update(&*app.db).await.unwrap();

    let (status, cart) = app.get(app.store("/getcart"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["cart_items"].as_array().unwrap().is_empty());
    assert_eq!(money(&cart["total_price"]), Decimal::ZERO);
}

#[tokio::test]
async fn huge_quantity_on_top_of_cart_is_refused() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (product, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let token = app.customer("alice").await;

    let add = |quantity: i64| {
        json!({
            "product_id": product.id,
            "color_size_quantities": [{ "color_name": "Black", "quantity": quantity }]
        })
    };

    let (status, _) = app.post(app.store("/cart"), &token, add(1)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(app.store("/cart"), &token, add(i64::from(i32::MAX)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Not enough stock for Black"));

    let (status, cart) = app.get(app.store("/getcart"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart_items"][0]["quantity"], 1);
    assert_eq!(money(&cart["total_price"]), Decimal::new(10, 0));
}
