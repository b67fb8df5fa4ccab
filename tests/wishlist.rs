mod common;

use common::spawn_app;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_list_and_delete_wishlists() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 1).await;
    let alice = app.customer("alice").await;

    let (status, body) = app
        .post(app.store("/wishlists"), &alice, json!({ "products": [999] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid products found.");

    let (status, wishlist) = app
        .post(app.store("/wishlists"), &alice, json!({ "products": [case.id, 999] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wishlist["name"], "My wishlist");
    assert_eq!(wishlist["products"].as_array().unwrap().len(), 1);

    let (status, wishlists) = app.get(app.store("/wishlists"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wishlists.as_array().unwrap().len(), 1);

    let url = app.store(&format!("/wishlists/{}", wishlist["id"]));
    let bob = app.customer("bob").await;
    assert_eq!(app.delete(url.clone(), &bob).await, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(url, &alice).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn wishlists_of_other_users_are_forbidden() {
    let app = spawn_app().await;
    let alice = app.customer("alice").await;
    let (_, verified) = app.get(app.store("/verify-token"), &alice).await;
    let user_id = verified["user_id"].as_i64().unwrap();

    let (status, body) = app
        .get(app.store(&format!("/wishlists/user/{user_id}")), &alice)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No wishlists found for this user.");

    let (status, _) = app
        .get(app.store(&format!("/wishlists/user/{}", user_id + 1)), &alice)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
