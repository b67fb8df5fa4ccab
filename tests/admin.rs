mod common;

use common::{customer_profile_of, money, spawn_app, TestApp, PASSWORD};
use multishop::entities::{product, product_color_image, user};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde_json::{json, Value};

async fn product_stock(app: &TestApp, id: i32) -> i32 {
    product::Entity::find_by_id(id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap()
        .stock
}

/// Owner creates a role and an employee holding it; returns the employee's token.
async fn hire(
    app: &TestApp,
    owner_token: &str,
    shop_id: i32,
    username: &str,
    permissions: Value,
) -> (Value, String) {
    let (status, role) = app
        .post(
            app.admin("/roles"),
            owner_token,
            json!({ "shop_id": shop_id, "name": format!("{username} role"), "permissions": permissions }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, employee) = app
        .post(
            app.admin("/employees"),
            owner_token,
            json!({
                "username": username,
                "password": PASSWORD,
                "shop_id": shop_id,
                "role_id": role["id"],
                "position": "Clerk"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let token = app.login(username, PASSWORD).await;
    (employee, token)
}

#[tokio::test]
async fn size_edits_recompute_stock() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let small = app.size("S").await;
    let large = app.size("L").await;
    let (shirt, color_image) = app.product("Shirt", 20, shop.id, &black, 7).await;
    let token = app.login("owner", PASSWORD).await;

    let sizes = app.admin(&format!("/color-images/{}/sizes", color_image.id));
    let (status, small_row) = app
        .post(sizes.clone(), &token, json!({ "size_id": small.id, "stock": 2 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product_stock(&app, shirt.id).await, 2);

    let (status, _) = app
        .post(sizes, &token, json!({ "size_id": large.id, "stock": 5 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product_stock(&app, shirt.id).await, 7);

    let size_url = app.admin(&format!("/color-sizes/{}", small_row["id"]));
    let (status, _) = app.patch(size_url.clone(), &token, json!({ "stock": 10 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_stock(&app, shirt.id).await, 15);

    let (status, body) = app.patch(size_url.clone(), &token, json!({ "stock": -1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Stock cannot be negative");

    assert_eq!(app.delete(size_url, &token).await, StatusCode::NO_CONTENT);
    assert_eq!(product_stock(&app, shirt.id).await, 5);

    let (status, _) = app
        .patch(
            app.admin(&format!("/color-images/{}", color_image.id)),
            &token,
            json!({ "stock": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_deletes_recompute_stock() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let white = app.color("White").await;
    let medium = app.size("M").await;
    let (shirt, black_image) = app.product("Shirt", 20, shop.id, &black, 0).await;
    let (_, white_image) = app.product("Shirt white", 20, shop.id, &white, 3).await;
    let token = app.login("owner", PASSWORD).await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .post(
            app.admin(&format!("/color-images/{}/sizes", black_image.id)),
            &token,
            json!({ "size_id": medium.id, "stock": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product_stock(&app, shirt.id).await, 7);

    let status = app
        .delete(app.admin(&format!("/sizes/{}", medium.id)), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(product_stock(&app, shirt.id).await, 0);
    let black_image = product_color_image::Entity::find_by_id(black_image.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(black_image.stock, 0);

    assert_eq!(product_stock(&app, white_image.product_id).await, 3);
    let status = app
        .delete(app.admin(&format!("/colors/{}", white.id)), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(product_stock(&app, white_image.product_id).await, 0);
}

#[tokio::test]
async fn size_stock_totals_must_fit() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let small = app.size("S").await;
    let large = app.size("L").await;
    let (shirt, color_image) = app.product("Shirt", 20, shop.id, &black, 0).await;
    let token = app.login("owner", PASSWORD).await;

    let sizes = app.admin(&format!("/color-images/{}/sizes", color_image.id));
    let (status, _) = app
        .post(sizes.clone(), &token, json!({ "size_id": small.id, "stock": i32::MAX }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(sizes, &token, json!({ "size_id": large.id, "stock": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(product_stock(&app, shirt.id).await, i32::MAX);
}

#[tokio::test]
async fn recoloring_a_color_image_links_the_color() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let red = app.color("Red").await;
    let (shirt, color_image) = app.product("Shirt", 20, shop.id, &black, 2).await;
    let token = app.login("owner", PASSWORD).await;

    let (status, _) = app
        .patch(
            app.admin(&format!("/color-images/{}", color_image.id)),
            &token,
            json!({ "color_id": red.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, colors) = app
        .get(app.admin(&format!("/products/{}/colors", shirt.id)), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = colors
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|color| color["color_name"].as_str())
        .collect();
    assert!(names.contains(&"Red"), "{names:?}");
}

#[tokio::test]
async fn owners_only_see_their_own_products() {
    let app = spawn_app().await;
    let north_owner = app.staff_user("north").await;
    let south_owner = app.staff_user("south").await;
    let north = app.shop("North", north_owner.id).await;
    let south = app.shop("South", south_owner.id).await;
    let black = app.color("Black").await;
    app.product("Case", 10, north.id, &black, 1).await;
    let (strap, _) = app.product("Strap", 4, south.id, &black, 1).await;
    let token = app.login("north", PASSWORD).await;

    let (status, products) = app.get(app.admin("/products"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Case");

    let (status, _) = app
        .get(app.admin(&format!("/products/{}", strap.id)), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // New products land in the caller's shop whatever the payload says.
    let (status, created) = app
        .post(
            app.admin("/products"),
            &token,
            json!({ "name": "Charger", "price": "12.50", "created_by_shop_id": south.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["created_by_shop"], north.id);
    assert_eq!(money(&created["price"]), Decimal::new(1250, 2));
}

#[tokio::test]
async fn employees_are_limited_to_their_role() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    app.product("Case", 10, shop.id, &black, 1).await;
    let owner_token = app.login("owner", PASSWORD).await;

    let (_, clerk) = hire(&app, &owner_token, shop.id, "clerk", json!(["manage_products"])).await;

    let (status, products) = app.get(app.admin("/products"), &clerk).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);

    let (status, _) = app.get(app.admin("/orders"), &clerk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(app.admin("/sales-summary"), &clerk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            app.admin("/roles"),
            &clerk,
            json!({ "shop_id": shop.id, "name": "Boss", "permissions": ["view_sales"] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owners_manage_employees() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let owner_token = app.login("owner", PASSWORD).await;

    let (employee, clerk) = hire(&app, &owner_token, shop.id, "clerk", json!([])).await;
    assert_eq!(employee["shop"], shop.id);
    assert_eq!(employee["position"], "Clerk");

    let (status, _) = app
        .post(
            app.admin("/employees"),
            &clerk,
            json!({ "username": "intern", "password": PASSWORD, "shop_id": shop.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let url = app.admin(&format!("/employees/{}", employee["id"]));
    let (status, _) = app.patch(url.clone(), &clerk, json!({ "position": "Manager" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app.patch(url.clone(), &owner_token, json!({ "position": "Manager" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["position"], "Manager");

    assert_eq!(app.delete(url, &owner_token).await, StatusCode::NO_CONTENT);

    let user_id = employee["user"].as_i64().unwrap() as i32;
    let kept = user::Entity::find_by_id(user_id).one(&*app.db).await.unwrap();
    assert!(kept.is_some());
}

#[tokio::test]
async fn roles_reject_foreign_shops() {
    let app = spawn_app().await;
    let north_owner = app.staff_user("north").await;
    let south_owner = app.staff_user("south").await;
    app.shop("North", north_owner.id).await;
    let south = app.shop("South", south_owner.id).await;
    let token = app.login("north", PASSWORD).await;

    let (status, _) = app
        .post(
            app.admin("/roles"),
            &token,
            json!({ "shop_id": south.id, "name": "Spy", "permissions": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_superusers_create_shops() {
    let app = spawn_app().await;
    app.customer("alice").await;
    let profile = customer_profile_of(&app, "alice").await;
    let admin = app.admin_token().await;

    let (status, shop) = app
        .post(
            app.admin("/shops"),
            &admin,
            json!({ "name": "Alice's", "owner_id": profile.user_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shop["owner_id"], profile.user_id);

    let owner = user::Entity::find_by_id(profile.user_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(owner.is_staff);

    let alice = app.login("alice", PASSWORD).await;
    let (status, shops) = app.get(app.admin("/shops"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shops.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(app.admin("/shops"), &alice, json!({ "name": "Second", "owner_id": profile.user_id }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn order_status_changes_and_sales_summary() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 5).await;
    let customer = app.customer("alice").await;
    let owner_token = app.login("owner", PASSWORD).await;

    let (_, placed) = app
        .post(
            app.store("/orders"),
            &customer,
            json!({
                "color_size_quantities": [{ "product_id": case.id, "color_name": "Black", "quantity": 3 }]
            }),
        )
        .await;
    let order_url = app.admin(&format!("/orders/{}", placed["order_ids"][0]));

    let (status, body) = app.patch(order_url.clone(), &owner_token, json!({ "status": "Lost" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, order) = app.patch(order_url, &owner_token, json!({ "status": "Shipped" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Shipped");

    let (status, orders) = app
        .get(app.admin("/orders?status=Pending"), &owner_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());

    let (status, summary) = app.get(app.admin("/sales-summary"), &owner_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["order_count"], 1);
    assert_eq!(summary["labels"].as_array().unwrap().len(), 1);
    assert_eq!(money(&summary["total"]), Decimal::new(30, 0));
}

#[tokio::test]
async fn owners_moderate_reviews_and_see_carts_of_their_products() {
    let app = spawn_app().await;
    let north_owner = app.staff_user("north").await;
    let south_owner = app.staff_user("south").await;
    let north = app.shop("North", north_owner.id).await;
    app.shop("South", south_owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, north.id, &black, 5).await;
    let alice = app.customer("alice").await;
    let bob = app.customer("bob").await;
    let north_token = app.login("north", PASSWORD).await;
    let south_token = app.login("south", PASSWORD).await;

    let url = app.store(&format!("/product/{}/reviews", case.id));
    app.post(url.clone(), &alice, json!({ "rating": 1 })).await;
    app.post(url, &bob, json!({ "rating": 5 })).await;

    let (status, reviews) = app.get(app.admin("/reviews"), &north_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 2);

    let (_, reviews) = app.get(app.admin("/reviews"), &south_token).await;
    assert!(reviews.as_array().unwrap().is_empty());

    let harsh = reviews_with_rating(&app, &north_token, 1).await;
    assert_eq!(
        app.delete(app.admin(&format!("/reviews/{harsh}")), &south_token).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(app.admin(&format!("/reviews/{harsh}")), &north_token).await,
        StatusCode::NO_CONTENT
    );
    let rating = product::Entity::find_by_id(case.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap()
        .rating;
    assert_eq!(rating, Decimal::new(50, 1));

    app.post(
        app.store("/cart"),
        &alice,
        json!({
            "product_id": case.id,
            "color_size_quantities": [{ "color_name": "Black", "quantity": 1 }]
        }),
    )
    .await;

    let (status, carts) = app.get(app.admin("/carts"), &north_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(carts.as_array().unwrap().len(), 1);

    let (_, carts) = app.get(app.admin("/carts"), &south_token).await;
    assert!(carts.as_array().unwrap().is_empty());
}

async fn reviews_with_rating(app: &TestApp, token: &str, rating: i64) -> i64 {
    let (_, reviews) = app.get(app.admin("/reviews"), token).await;
    reviews
        .as_array()
        .unwrap()
        .iter()
        .find(|review| review["rating"] == rating)
        .and_then(|review| review["id"].as_i64())
        .unwrap()
}
