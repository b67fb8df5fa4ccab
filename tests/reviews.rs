mod common;

use common::{money, spawn_app};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn reviews_update_the_average_rating() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 1).await;
    let alice = app.customer("alice").await;
    let bob = app.customer("bob").await;
    let url = app.store(&format!("/product/{}/reviews", case.id));

    let (status, body) = app.post(url.clone(), &alice, json!({ "rating": 4, "comment": "Good" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&body["average_rating"]), Decimal::new(40, 1));

    let (status, body) = app.post(url.clone(), &bob, json!({ "rating": "5" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&body["average_rating"]), Decimal::new(45, 1));

    let (status, body) = app.post(url, &bob, json!({ "rating": 6 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be between 1 and 5");

    let response = app
        .client
        .get(app.store(&format!("/products/{}", case.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let product: serde_json::Value = response.json().await.unwrap();
    assert_eq!(money(&product["rating"]), Decimal::new(45, 1));
    assert_eq!(product["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn review_of_missing_product_is_not_found() {
    let app = spawn_app().await;
    let alice = app.customer("alice").await;

    let (status, body) = app
        .post(app.store("/product/404/reviews"), &alice, json!({ "rating": 3 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn a_review_can_be_liked_once() {
    let app = spawn_app().await;
    let owner = app.staff_user("owner").await;
    let shop = app.shop("North", owner.id).await;
    let black = app.color("Black").await;
    let (case, _) = app.product("Case", 10, shop.id, &black, 1).await;
    let alice = app.customer("alice").await;
    let bob = app.customer("bob").await;

    app.post(
        app.store(&format!("/product/{}/reviews", case.id)),
        &alice,
        json!({ "rating": 5 }),
    )
    .await;
    let reviews: serde_json::Value = app
        .client
        .get(app.store(&format!("/products/{}/reviews", case.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let review_id = reviews[0]["id"].as_i64().unwrap();
    let like_url = app.store(&format!("/reviews/{review_id}/like"));

    let (status, body) = app.post(like_url.clone(), &bob, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["like_count"], 1);

    let (status, body) = app.post(like_url, &bob, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already liked this review");
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["has_liked"], true);

    let reply_url = app.store(&format!("/reviews/{review_id}/reply"));
    let (status, body) = app.post(reply_url.clone(), &bob, json!({ "reply_text": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reply text is required");

    let (status, reply) = app.post(reply_url, &bob, json!({ "reply_text": "Agreed" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["reply_text"], "Agreed");
}
