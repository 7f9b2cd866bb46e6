//! Integration tests for the catalog: filtered listing, slug lookup, and
//! the make/model parts-finder.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal value: {:?}", other),
    }
}

#[tokio::test]
async fn listing_returns_only_active_products() {
    let app = TestApp::new().await;
    let category = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("caterpillar", "Caterpillar").await;

    app.seed_product("cat-320", "CAT 320", dec!(285000.00), category.id, brand.id)
        .await;
    let hidden = app
        .seed_product("cat-330", "CAT 330", dec!(310000.00), category.id, brand.id)
        .await;
    app.deactivate_product(hidden.id).await;

    let response = app.request(Method::GET, "/api/products", None, None).await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap());
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "cat-320");
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn product_detail_joins_category_and_brand() {
    let app = TestApp::new().await;
    let category = app.seed_category("loaders", "Loaders").await;
    let brand = app.seed_brand("volvo", "Volvo").await;
    app.seed_product(
        "volvo-l120h",
        "Volvo L120H",
        dec!(295000.00),
        category.id,
        brand.id,
    )
    .await;

    let response = app
        .request(Method::GET, "/api/products/volvo-l120h", None, None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let product = &body["data"];
    assert_eq!(product["name"], "Volvo L120H");
    assert_eq!(product["category"]["slug"], "loaders");
    assert_eq!(product["brand"]["name"], "Volvo");
}

#[tokio::test]
async fn inactive_product_is_invisible_by_slug() {
    let app = TestApp::new().await;
    let category = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("komatsu", "Komatsu").await;
    let product = app
        .seed_product(
            "komatsu-pc200",
            "Komatsu PC200",
            dec!(275000.00),
            category.id,
            brand.id,
        )
        .await;
    app.deactivate_product(product.id).await;

    let response = app
        .request(Method::GET, "/api/products/komatsu-pc200", None, None)
        .await;
    assert_eq!(response.status(), 404);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn inverted_price_bounds_yield_empty_page() {
    let app = TestApp::new().await;
    let category = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("caterpillar", "Caterpillar").await;
    app.seed_product("cat-320", "CAT 320", dec!(285000.00), category.id, brand.id)
        .await;

    let response = app
        .request(
            Method::GET,
            "/api/products?minPrice=500000&maxPrice=100",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert!(body["data"]["products"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["pagination"]["total"], 0);
    assert_eq!(body["data"]["pagination"]["pages"], 0);
}

#[tokio::test]
async fn out_of_range_page_keeps_pagination_metadata() {
    let app = TestApp::new().await;
    let category = app.seed_category("filters", "Filters").await;
    let brand = app.seed_brand("caterpillar", "Caterpillar").await;
    for i in 0..3 {
        app.seed_product(
            &format!("filter-{i}"),
            &format!("Filter {i}"),
            dec!(145.00),
            category.id,
            brand.id,
        )
        .await;
    }

    let response = app
        .request(Method::GET, "/api/products?page=5&limit=2", None, None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert!(body["data"]["products"].as_array().unwrap().is_empty());
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["page"], 5);
    assert_eq!(pagination["limit"], 2);
    assert_eq!(pagination["total"], 3);
    assert_eq!(pagination["pages"], 2);
}

#[tokio::test]
async fn price_ascending_sort_returns_cheapest_first() {
    let app = TestApp::new().await;
    let category = app.seed_category("spare-parts", "Spare Parts").await;
    let brand = app.seed_brand("komatsu", "Komatsu").await;
    app.seed_product("pump", "Hydraulic Pump", dec!(6200.00), category.id, brand.id)
        .await;
    app.seed_product("filter", "Oil Filter", dec!(45.00), category.id, brand.id)
        .await;
    app.seed_product("chain", "Track Chain", dec!(8500.00), category.id, brand.id)
        .await;

    let response = app
        .request(
            Method::GET,
            "/api/products?sortBy=price_asc&limit=2&page=1",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["slug"], "filter");
    assert_eq!(products[1]["slug"], "pump");
    let first = decimal_field(&products[0]["price"]);
    let second = decimal_field(&products[1]["price"]);
    assert!(first < second);
}

#[tokio::test]
async fn unknown_category_slug_matches_nothing() {
    let app = TestApp::new().await;
    let category = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("caterpillar", "Caterpillar").await;
    app.seed_product("cat-320", "CAT 320", dec!(285000.00), category.id, brand.id)
        .await;

    let response = app
        .request(Method::GET, "/api/products?category=tractors", None, None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert!(body["data"]["products"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn search_matches_name_case_insensitively() {
    let app = TestApp::new().await;
    let category = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("komatsu", "Komatsu").await;
    app.seed_product(
        "komatsu-pc200",
        "Komatsu PC200 Excavator",
        dec!(275000.00),
        category.id,
        brand.id,
    )
    .await;
    let loaders = app.seed_category("loaders", "Loaders").await;
    app.seed_product(
        "volvo-l120h",
        "Volvo L120H Wheel Loader",
        dec!(295000.00),
        loaders.id,
        brand.id,
    )
    .await;

    let response = app
        .request(Method::GET, "/api/products?search=EXCAVATOR", None, None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "komatsu-pc200");
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let app = TestApp::new().await;
    let category = app.seed_category("filters", "Filters").await;
    let brand = app.seed_brand("caterpillar", "Caterpillar").await;
    app.seed_product(
        "filter-505",
        "Filter Model 505",
        dec!(145.00),
        category.id,
        brand.id,
    )
    .await;
    app.seed_product(
        "part-x100",
        "Part_X100",
        dec!(99.00),
        category.id,
        brand.id,
    )
    .await;

    // "_" is not a single-character wildcard.
    let response = app
        .request(Method::GET, "/api/products?search=50_", None, None)
        .await;
    let body = response_json(response).await;
    assert!(body["data"]["products"].as_array().unwrap().is_empty());

    // A literal underscore in the catalog is still findable.
    let response = app
        .request(Method::GET, "/api/products?search=t_x", None, None)
        .await;
    let body = response_json(response).await;
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "part-x100");
}

#[tokio::test]
async fn malformed_query_parameters_get_error_envelope() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/products?minPrice=abc", None, None)
        .await;
    assert_eq!(response.status(), 400);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn parts_finder_matches_make_and_spec_models() {
    let app = TestApp::new().await;
    let spare_parts = app.seed_category("spare-parts", "Spare Parts").await;
    let machines = app.seed_category("excavators", "Excavators").await;
    let brand = app.seed_brand("komatsu", "Komatsu").await;

    app.seed_product_with_specs(
        "komatsu-pump",
        "Hydraulic Main Pump",
        dec!(6200.00),
        spare_parts.id,
        brand.id,
        json!({"compatibleMakes": ["Komatsu"], "compatibleModels": ["PC200", "PC210"]}),
    )
    .await;
    // Same make, wrong category: machines never show up in the finder.
    app.seed_product_with_specs(
        "komatsu-pc200",
        "Komatsu PC200 Excavator",
        dec!(275000.00),
        machines.id,
        brand.id,
        json!({"compatibleMakes": ["Komatsu"]}),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            "/api/parts-finder?make=Komatsu&model=PC200",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let products = body["data"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "komatsu-pump");
}

#[tokio::test]
async fn parts_finder_requires_make_and_model() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/parts-finder?make=Komatsu", None, None)
        .await;
    assert_eq!(response.status(), 400);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = TestApp::new().await;

    let live = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(live.status(), 200);
    let body = response_json(live).await;
    assert_eq!(body["status"], "OK");

    let ready = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(ready.status(), 200);
}
