mod common;

use common::{money, spawn_app, PASSWORD};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

async fn get_public(app: &common::TestApp, path: &str) -> (StatusCode, Value) {
    let response = app.client.get(app.store(path)).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn search_matches_name_prefix_and_description() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    for index in 0..12 {
        app.product(&format!("Phone case {index}"), 10, shop.id, &black, 1).await;
    }
    app.product("Strap", 4, shop.id, &black, 1).await;

    let (status, page) = get_public(&app, "/search?q=PHONE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["current_page"], 1);
    assert_eq!(page["products"].as_array().unwrap().len(), 10);

    let (_, page) = get_public(&app, "/search?q=phone&page=99").await;
    assert_eq!(page["current_page"], 2);
    assert_eq!(page["products"].as_array().unwrap().len(), 2);

    let (_, page) = get_public(&app, "/search?q=strap%20desc").await;
    assert_eq!(page["products"][0]["name"], "Strap");

    let (_, page) = get_public(&app, "/search?q=case").await;
    assert_eq!(page["products"].as_array().unwrap().len(), 10);
    assert_eq!(page["total_pages"], 2);

    let (status, body) = get_public(&app, "/search?q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query cannot be empty.");
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    app.product("50% off case", 10, shop.id, &black, 1).await;
    app.product("Strap", 4, shop.id, &black, 1).await;

    let (status, page) = get_public(&app, "/search?q=%25").await;
    assert_eq!(status, StatusCode::OK);
    let products = page["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "50% off case");

    let (status, page) = get_public(&app, "/search?q=_").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["products"].as_array().unwrap().len(), 0);
    assert_eq!(page["total_pages"], 1);
}

#[tokio::test]
async fn shop_listing_overrides_price_and_checkout_uses_it() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let owner_token = app.login("owner", PASSWORD).await;

    let (status, listing) = app
        .post(
            app.admin("/inventory"),
            &owner_token,
            json!({ "product_id": case.id, "custom_price": "8.00", "custom_discount": "50" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&listing["final_price"]), Decimal::new(4, 0));

    let (status, products) = get_public(&app, &format!("/shops/{}/products", shop.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&products[0]["final_price"]), Decimal::new(4, 0));
    assert_eq!(products[0]["stock"], 5);

    let customer = app.customer("alice").await;
    let (status, placed) = app
        .post(
            app.store("/orders"),
            &customer,
            json!({
                "color_size_quantities": [{ "product_id": case.id, "color_name": "Black", "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, order) = app
        .get(app.store(&format!("/checkorder/{}", placed["order_ids"][0])), &customer)
        .await;
    assert_eq!(money(&order["order_items"][0]["unit_price"]), Decimal::new(4, 0));
    assert_eq!(money(&order["total_price"]), Decimal::new(8, 0));
}

#[tokio::test]
async fn popular_and_best_selling_follow_orders() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    app.product("Case", 10, shop.id, &black, 5).await;
    let (strap, _) = app.product("Strap", 4, shop.id, &black, 5).await;
    let customer = app.customer("alice").await;

    app.post(
        app.store("/orders"),
        &customer,
        json!({
            "color_size_quantities": [{ "product_id": strap.id, "color_name": "Black", "quantity": 3 }]
        }),
    )
    .await;

    let (status, popular) = get_public(&app, "/popular_products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(popular.as_array().unwrap().len(), 2);
    assert_eq!(popular[0]["name"], "Strap");

    let (status, best) = get_public(&app, "/best_selling_products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(best.as_array().unwrap().len(), 1);
    assert_eq!(best[0]["name"], "Strap");
    assert_eq!(best[0]["total_quantity_sold"], 3);
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let app = spawn_app().await;

    let (status, body) = get_public(&app, "/products/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No product with 77 id was found.");

    let (status, products) = get_public(&app, "/products?category_id=All").await;
    assert_eq!(status, StatusCode::OK);
    assert!(products.as_array().unwrap().is_empty());
}
