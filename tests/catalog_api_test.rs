mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn product_crud_round_trip() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Veggie Box",
                "description": "Seasonal vegetables",
                "ingredients": ["carrot", "leek"],
                "price": "12.50",
                "available": true
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Catalog reads are public.
    let (status, body) = app
        .request(Method::GET, &format!("/api/v1/products/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("Veggie Box"));

    let (status, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _body) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{id}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _body) = app
        .request(Method::GET, &format!("/api/v1/products/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_updates_merge_ingredients() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Soup Kit",
                "description": "Hearty soup",
                "ingredients": ["onion", "potato"],
                "price": "9.00",
                "available": true
            })),
            Some(&admin_token),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{id}"),
            Some(json!({ "ingredients": ["potato", "thyme"] })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let ingredients: Vec<String> = body["data"]["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(ingredients.contains(&"onion".to_string()));
    assert!(ingredients.contains(&"potato".to_string()));
    assert!(ingredients.contains(&"thyme".to_string()));
    assert_eq!(ingredients.len(), 3, "duplicates dropped: {ingredients:?}");
}

#[tokio::test]
async fn catalog_writes_require_admin() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let token = app.token_for(customer.id, false);

    let payload = json!({
        "name": "Veggie Box",
        "description": "Seasonal vegetables",
        "ingredients": ["carrot"],
        "price": "12.50",
        "available": true
    });

    let (status, _body) = app
        .request(Method::POST, "/api/v1/products", Some(payload.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _body) = app
        .request(Method::POST, "/api/v1/products", Some(payload), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn plan_creation_computes_discounted_price() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/plans",
            Some(json!({
                "name": "Monthly Plan",
                "description": ["Four boxes a month"],
                "price": "90.00",
                "duration": "MONTHLY",
                "discount_percent": "10"
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(
        common::decimal_field(&body["data"]["discounted_price"]),
        dec!(81.00)
    );
    assert_eq!(body["data"]["duration"], json!("MONTHLY"));
}

#[tokio::test]
async fn plan_discount_updates_recompute_discounted_price() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/v1/plans",
            Some(json!({
                "name": "Weekly Plan",
                "description": ["One box a week"],
                "price": "30.00",
                "duration": "WEEKLY"
            })),
            Some(&admin_token),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(
        common::decimal_field(&body["data"]["discounted_price"]),
        dec!(30.00)
    );

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/plans/{id}"),
            Some(json!({ "discount_percent": "50" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(
        common::decimal_field(&body["data"]["discounted_price"]),
        dec!(15.00)
    );
}

#[tokio::test]
async fn unknown_plan_duration_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (status, _body) = app
        .request(
            Method::POST,
            "/api/v1/plans",
            Some(json!({
                "name": "Yearly Plan",
                "description": [],
                "price": "300.00",
                "duration": "YEARLY"
            })),
            Some(&admin_token),
        )
        .await;
    assert!(
        status.is_client_error(),
        "YEARLY is not a plan duration, got {status}"
    );
}

#[tokio::test]
async fn invalid_product_price_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer(false).await;
    let admin_token = app.token_for(customer.id, true);

    let (status, _body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Free Box",
                "description": "Should not exist",
                "ingredients": ["air"],
                "price": "0",
                "available": true
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
