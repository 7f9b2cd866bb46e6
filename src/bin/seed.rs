//! Seeds the catalog with a demo data set. Safe to run repeatedly: every
//! write is keyed by slug and skips rows that already exist.

use machinery_store_api as api;

use api::services::catalog::{
    CatalogService, CreateProductInput, UpsertBrandInput, UpsertCategoryInput,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db = api::db::establish_connection_from_app_config(&cfg).await?;
    api::db::run_migrations(&db).await?;
    let catalog = CatalogService::new(Arc::new(db));

    info!("Seeding catalog data");

    let excavators = catalog
        .upsert_category(UpsertCategoryInput {
            slug: "excavators".to_string(),
            name: "Excavators".to_string(),
            description: Some(
                "Heavy-duty excavators for construction and earthmoving".to_string(),
            ),
            image_url: Some("/uploads/categories/excavators.jpg".to_string()),
        })
        .await?;
    let loaders = catalog
        .upsert_category(UpsertCategoryInput {
            slug: "loaders".to_string(),
            name: "Loaders".to_string(),
            description: Some(
                "Wheel loaders and track loaders for material handling".to_string(),
            ),
            image_url: Some("/uploads/categories/loaders.jpg".to_string()),
        })
        .await?;
    let spare_parts = catalog
        .upsert_category(UpsertCategoryInput {
            slug: "spare-parts".to_string(),
            name: "Spare Parts".to_string(),
            description: Some(
                "Genuine and aftermarket spare parts for construction machinery".to_string(),
            ),
            image_url: Some("/uploads/categories/spare-parts.jpg".to_string()),
        })
        .await?;
    let filters = catalog
        .upsert_category(UpsertCategoryInput {
            slug: "filters".to_string(),
            name: "Filters".to_string(),
            description: Some(
                "Air, oil, fuel and hydraulic filters for construction equipment".to_string(),
            ),
            image_url: Some("/uploads/categories/filters.jpg".to_string()),
        })
        .await?;

    let caterpillar = catalog
        .upsert_brand(UpsertBrandInput {
            slug: "caterpillar".to_string(),
            name: "Caterpillar".to_string(),
            description: Some(
                "Leading manufacturer of construction and mining equipment".to_string(),
            ),
            logo_url: Some("/uploads/brands/caterpillar.jpg".to_string()),
            website: Some("https://www.caterpillar.com".to_string()),
        })
        .await?;
    let komatsu = catalog
        .upsert_brand(UpsertBrandInput {
            slug: "komatsu".to_string(),
            name: "Komatsu".to_string(),
            description: Some(
                "Japanese multinational manufacturer of construction equipment".to_string(),
            ),
            logo_url: Some("/uploads/brands/komatsu.jpg".to_string()),
            website: Some("https://www.komatsu.com".to_string()),
        })
        .await?;
    let volvo = catalog
        .upsert_brand(UpsertBrandInput {
            slug: "volvo".to_string(),
            name: "Volvo".to_string(),
            description: Some(
                "Swedish manufacturer of construction equipment and trucks".to_string(),
            ),
            logo_url: Some("/uploads/brands/volvo.jpg".to_string()),
            website: Some("https://www.volvoce.com".to_string()),
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "cat-320-hydraulic-excavator".to_string(),
            name: "CAT 320 Hydraulic Excavator".to_string(),
            description: "The Cat 320 delivers superior performance, fuel efficiency, and \
                          operator comfort for medium-sized excavation jobs."
                .to_string(),
            price: dec!(285000.00),
            stock_qty: 5,
            images: vec![
                "/uploads/products/cat-320-1.jpg".to_string(),
                "/uploads/products/cat-320-2.jpg".to_string(),
            ],
            specs: json!({
                "enginePower": "122 kW (164 hp)",
                "operatingWeight": "20500 kg",
                "bucketCapacity": "0.6-1.2 m³",
                "maxDigDepth": "6.5 m",
                "compatibleMakes": ["Caterpillar"],
                "modelYear": 2024,
                "condition": "New"
            }),
            category_id: excavators.id,
            brand_id: caterpillar.id,
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "komatsu-pc200-excavator".to_string(),
            name: "Komatsu PC200 Excavator".to_string(),
            description: "Komatsu PC200 offers exceptional fuel efficiency and productivity \
                          with advanced hydraulic technology."
                .to_string(),
            price: dec!(275000.00),
            stock_qty: 3,
            images: vec!["/uploads/products/komatsu-pc200-1.jpg".to_string()],
            specs: json!({
                "enginePower": "110 kW (148 hp)",
                "operatingWeight": "19800 kg",
                "compatibleMakes": ["Komatsu"],
                "modelYear": 2024,
                "condition": "New"
            }),
            category_id: excavators.id,
            brand_id: komatsu.id,
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "volvo-l120h-wheel-loader".to_string(),
            name: "Volvo L120H Wheel Loader".to_string(),
            description: "Volvo L120H combines power and precision for efficient loading \
                          operations."
                .to_string(),
            price: dec!(295000.00),
            stock_qty: 2,
            images: vec!["/uploads/products/volvo-l120h-1.jpg".to_string()],
            specs: json!({
                "enginePower": "188 kW (252 hp)",
                "operatingWeight": "19300 kg",
                "compatibleMakes": ["Volvo"],
                "modelYear": 2023,
                "condition": "New"
            }),
            category_id: loaders.id,
            brand_id: volvo.id,
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "cat-track-chain-assembly".to_string(),
            name: "CAT Track Chain Assembly".to_string(),
            description: "Genuine Caterpillar track chain assembly for 320-series excavators."
                .to_string(),
            price: dec!(8500.00),
            stock_qty: 12,
            images: vec!["/uploads/products/cat-track-chain-1.jpg".to_string()],
            specs: json!({
                "genuine": true,
                "compatibleMakes": ["Caterpillar"],
                "compatibleModels": ["320", "323", "326"],
                "weight": "850 kg"
            }),
            category_id: spare_parts.id,
            brand_id: caterpillar.id,
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "komatsu-hydraulic-pump-pc200".to_string(),
            name: "Komatsu Hydraulic Main Pump".to_string(),
            description: "Main hydraulic pump for Komatsu PC200-8 excavators, remanufactured \
                          to OEM specification."
                .to_string(),
            price: dec!(6200.00),
            stock_qty: 7,
            images: vec!["/uploads/products/komatsu-pump-1.jpg".to_string()],
            specs: json!({
                "genuine": false,
                "compatibleMakes": ["Komatsu"],
                "compatibleModels": ["PC200", "PC210", "PC220"],
                "weight": "120 kg"
            }),
            category_id: spare_parts.id,
            brand_id: komatsu.id,
        })
        .await?;

    catalog
        .create_product(CreateProductInput {
            slug: "heavy-duty-hydraulic-filter".to_string(),
            name: "Heavy Duty Hydraulic Filter".to_string(),
            description: "High-flow hydraulic filter fitting most Caterpillar and Volvo \
                          machines."
                .to_string(),
            price: dec!(145.00),
            stock_qty: 200,
            images: vec!["/uploads/products/hydraulic-filter-1.jpg".to_string()],
            specs: json!({
                "genuine": false,
                "compatibleMakes": ["Caterpillar", "Volvo"],
                "filtrationRating": "10 micron"
            }),
            category_id: filters.id,
            brand_id: caterpillar.id,
        })
        .await?;

    info!("Seed complete");
    Ok(())
}
