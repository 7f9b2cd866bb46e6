//! Integration tests for the quote-request workflow: atomic creation,
//! frozen price snapshots, listing, and status updates.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal value: {:?}", other),
    }
}

fn customer() -> Value {
    json!({
        "name": "Jordan Mason",
        "email": "jordan@example.com",
        "phone": "+1 555 0100",
        "company": "Mason Earthworks"
    })
}

async fn seed_two_products(app: &TestApp) -> (Uuid, Uuid) {
    let category = app.seed_category("spare-parts", "Spare Parts").await;
    let brand = app.seed_brand("komatsu", "Komatsu").await;
    let pump = app
        .seed_product("pump", "Hydraulic Pump", dec!(100.00), category.id, brand.id)
        .await;
    let filter = app
        .seed_product("filter", "Oil Filter", dec!(50.00), category.id, brand.id)
        .await;
    (pump.id, filter.id)
}

#[tokio::test]
async fn quote_totals_sum_price_times_quantity() {
    let app = TestApp::new().await;
    let (pump_id, filter_id) = seed_two_products(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [
                    {"productId": pump_id, "quantity": 2},
                    {"productId": filter_id, "quantity": 1}
                ],
                "notes": "Needed before end of month"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap());
    let quote = &body["data"];
    assert_eq!(quote["status"], "PENDING");
    assert_eq!(quote["customer_name"], "Jordan Mason");
    assert_eq!(quote["email"], "jordan@example.com");
    assert_eq!(decimal_field(&quote["total_amount"]), dec!(250.00));
    assert_eq!(quote["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn quote_with_unknown_product_persists_nothing() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [
                    {"productId": pump_id, "quantity": 1},
                    {"productId": Uuid::new_v4(), "quantity": 1}
                ]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "One or more products not found");

    // Atomicity: no partial quote rows survive the failure.
    let list = response_json(app.request(Method::GET, "/api/quote", None, None).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn quote_with_inactive_product_is_rejected() {
    let app = TestApp::new().await;
    let (pump_id, filter_id) = seed_two_products(&app).await;
    app.deactivate_product(filter_id).await;

    let response = app
        .request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [
                    {"productId": pump_id, "quantity": 1},
                    {"productId": filter_id, "quantity": 1}
                ]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn unit_price_is_frozen_against_catalog_changes() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [{"productId": pump_id, "quantity": 2}]
            })),
            None,
        )
        .await,
    )
    .await;
    let quote_id = created["data"]["id"].as_str().unwrap().to_string();

    app.reprice_product(pump_id, dec!(999.00)).await;

    let fetched = response_json(
        app.request(Method::GET, &format!("/api/quote/{quote_id}"), None, None)
            .await,
    )
    .await;
    let quote = &fetched["data"];
    assert_eq!(decimal_field(&quote["total_amount"]), dec!(200.00));
    let items = quote["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(decimal_field(&items[0]["unit_price"]), dec!(100.00));
    // The joined product reflects the live catalog price.
    assert_eq!(decimal_field(&items[0]["product"]["price"]), dec!(999.00));
}

#[tokio::test]
async fn empty_items_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/quote",
            Some(json!({"customerInfo": customer(), "items": []})),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": {"name": "Jordan", "email": "not-an-email"},
                "items": [{"productId": pump_id, "quantity": 1}]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn list_filters_by_email() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    for email in ["first@example.com", "second@example.com"] {
        let response = app
            .request(
                Method::POST,
                "/api/quote",
                Some(json!({
                    "customerInfo": {"name": "Customer", "email": email},
                    "items": [{"productId": pump_id, "quantity": 1}]
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let filtered = response_json(
        app.request(
            Method::GET,
            "/api/quote?email=first@example.com",
            None,
            None,
        )
        .await,
    )
    .await;
    let quotes = filtered["data"].as_array().unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["email"], "first@example.com");

    let all = response_json(app.request(Method::GET, "/api/quote", None, None).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_status_value_gets_error_envelope() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [{"productId": pump_id, "quantity": 1}]
            })),
            None,
        )
        .await,
    )
    .await;
    let quote_id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/quote/{quote_id}/status"),
            Some(json!({"status": "BOGUS"})),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    // The quote keeps its original status.
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/quote/{quote_id}"), None, None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "PENDING");
}

#[tokio::test]
async fn unknown_quote_id_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/quote/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 404);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Quote request not found");
}

#[tokio::test]
async fn status_update_overwrites_status() {
    let app = TestApp::new().await;
    let (pump_id, _) = seed_two_products(&app).await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/quote",
            Some(json!({
                "customerInfo": customer(),
                "items": [{"productId": pump_id, "quantity": 1}]
            })),
            None,
        )
        .await,
    )
    .await;
    let quote_id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/quote/{quote_id}/status"),
            Some(json!({"status": "APPROVED"})),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "APPROVED");

    let fetched = response_json(
        app.request(Method::GET, &format!("/api/quote/{quote_id}"), None, None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "APPROVED");
}
