mod common;

use common::{money, spawn_app};
use multishop::entities::{order, product, product_color_image};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

#[tokio::test]
async fn insufficient_stock_writes_nothing() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (first, first_image) = app.product("Case", 10, shop.id, &black, 5).await;
    let (second, _) = app.product("Strap", 4, shop.id, &black, 1).await;
    let token = app.customer("alice").await;

    let (status, body) = app
        .post(
            app.store("/orders"),
            &token,
            json!({
                "color_size_quantities": [
                    { "product_id": first.id, "color_name": "Black", "quantity": 2 },
                    { "product_id": second.id, "color_name": "Black", "quantity": 3 }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Not enough stock for Strap"));
    assert_eq!(order::Entity::find().count(&*app.db).await.unwrap(), 0);

    let image = product_color_image::Entity::find_by_id(first_image.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.stock, 5);
}

#[tokio::test]
async fn lines_split_into_one_order_per_shop() {
    let app = spawn_app().await;
    let north_owner = app.staff_user("north").await;
    let south_owner = app.staff_user("south").await;
    let north = app.shop("North", north_owner.id).await;
    let south = app.shop("South", south_owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, north.id, &black, 5).await;
    let (strap, _) = app.product("Strap", 4, south.id, &black, 5).await;
    let token = app.customer("alice").await;

    let (status, body) = app
        .post(
            app.store("/orders"),
            &token,
            json!({
                "color_size_quantities": [
                    { "product_id": case.id, "color_name": "Black", "quantity": 1 },
                    { "product_id": strap.id, "color_name": "Black", "quantity": 2 },
                    { "product_id": case.id, "color_name": "Black", "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order_ids"].as_array().unwrap().len(), 2);

    let (status, orders) = app.get(app.store("/checkorder"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);

    let north_order = orders.iter().find(|o| o["shop"] == north.id).unwrap();
    assert_eq!(north_order["order_items"].as_array().unwrap().len(), 1);
    assert_eq!(north_order["order_items"][0]["quantity"], 2);
    assert_eq!(money(&north_order["total_price"]), Decimal::new(20, 0));
    assert_eq!(north_order["status"], "Pending");

    let south_order = orders.iter().find(|o| o["shop"] == south.id).unwrap();
    assert_eq!(money(&south_order["total_price"]), Decimal::new(8, 0));

    let case = product::Entity::find_by_id(case.id).one(&*app.db).await.unwrap().unwrap();
    assert_eq!(case.stock, 3);
}

#[tokio::test]
async fn repeated_checkout_merges_into_pending_order() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let token = app.customer("alice").await;

    let order_once = json!({
        "color_quantities": [{ "product_id": case.id, "color_name": "Black", "quantity": 1 }]
    });
    let (_, first) = app.post(app.store("/orders"), &token, order_once.clone()).await;
    let (status, second) = app.post(app.store("/orders"), &token, order_once).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["order_ids"], second["order_ids"]);

    let order_id = first["order_ids"][0].as_i64().unwrap();
    let (status, order) = app
        .get(app.store(&format!("/checkorder/{order_id}")), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_items"][0]["quantity"], 2);
    assert_eq!(money(&order["total_price"]), Decimal::new(20, 0));
}

#[tokio::test]
async fn invalid_lines_are_rejected() {
    let app = spawn_app().await;
    let token = app.customer("alice").await;

    let (status, body) = app
        .post(app.store("/orders"), &token, json!({ "color_size_quantities": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No items to order.");

    let (status, body) = app
        .post(
            app.store("/orders"),
            &token,
            json!({ "color_size_quantities": [{ "product_id": 1, "quantity": 0 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid item format (product_id/color_name/quantity)."
    );
}

#[tokio::test]
async fn cart_checkout_empties_the_cart() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let token = app.customer("alice").await;

    let (status, body) = app.post(app.store("/cart/checkout"), &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    app.post(
        app.store("/cart"),
        &token,
        json!({
            "product_id": case.id,
            "color_size_quantities": [{ "color_name": "Black", "quantity": 3 }]
        }),
    )
    .await;

    let (status, body) = app.post(app.store("/cart/checkout"), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], "Orders placed/updated successfully.");

    let (_, cart) = app.get(app.store("/getcart"), &token).await;
    assert!(cart["cart_items"].as_array().unwrap().is_empty());

    let case = product::Entity::find_by_id(case.id).one(&*app.db).await.unwrap().unwrap();
    assert_eq!(case.stock, 2);
}

#[tokio::test]
async fn orders_of_other_customers_are_hidden() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let alice = app.customer("alice").await;
    let bob = app.customer("bob").await;

    let (_, body) = app
        .post(
            app.store("/orders"),
            &alice,
            json!({
                "color_size_quantities": [{ "product_id": case.id, "color_name": "Black", "quantity": 1 }]
            }),
        )
        .await;
    let order_id = body["order_ids"][0].as_i64().unwrap();

    let (status, body) = app
        .get(app.store(&format!("/checkorder/{order_id}")), &bob)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");
}

#[tokio::test]
async fn size_level_stock_limits_and_is_decremented() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let medium = app.size("M").await;
    let large = app.size("L").await;
    let (shirt, color_image) = app.product("Shirt", 15, shop.id, &black, 5).await;
    app.color_size(&color_image, &medium, 1).await;
    app.color_size(&color_image, &large, 4).await;
    let token = app.customer("alice").await;

    let (status, body) = app
        .post(
            app.store("/orders"),
            &token,
            json!({
                "color_size_quantities": [
                    { "product_id": shirt.id, "color_name": "Black", "size_name": "M", "quantity": 2 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Not enough stock for Shirt (Black - M). Available: 1, requested: 2."
    );

    let (status, _) = app
        .post(
            app.store("/orders"),
            &token,
            json!({
                "color_size_quantities": [
                    { "product_id": shirt.id, "color_name": "Black", "size_name": "l", "quantity": 3 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let image = product_color_image::Entity::find_by_id(color_image.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.stock, 2);
    let shirt = product::Entity::find_by_id(shirt.id).one(&*app.db).await.unwrap().unwrap();
    assert_eq!(shirt.stock, 2);
}

#[tokio::test]
async fn huge_duplicate_lines_are_rejected() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, case_image) = app.product("Case", 10, shop.id, &black, 5).await;
    let token = app.customer("alice").await;

    let line = json!({ "product_id": case.id, "color_name": "Black", "quantity": i32::MAX });
    let (status, _) = app
        .post(
            app.store("/orders"),
            &token,
            json!({ "color_size_quantities": [line.clone(), line] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order::Entity::find().count(&*app.db).await.unwrap(), 0);

    let image = product_color_image::Entity::find_by_id(case_image.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.stock, 5);
    let case = product::Entity::find_by_id(case.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(case.stock, 5);
}
