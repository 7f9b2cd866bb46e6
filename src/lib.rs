//! Storefront backend for construction machinery and spare parts.
//!
//! Three subsystems sit behind a JSON HTTP surface: the product catalog
//! (filtered listing, slug lookup, make/model parts-finder), a
//! session-scoped shopping cart, and a quote-request workflow with
//! frozen price snapshots. Persistence goes through SeaORM; cross-request
//! consistency is delegated to the relational store's constraints.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

/// Shared application state handed to every handler.
///
/// The database handle is injected here at startup rather than living in
/// a module-level singleton, so tests can build isolated instances.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Builds the `/api` router: catalog, parts-finder, cart, and quote
/// endpoints plus a small index document.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_index))
        .nest("/products", handlers::products_routes())
        .nest("/parts-finder", handlers::parts_finder_routes())
        .nest("/cart", handlers::cart_routes())
        .nest("/quote", handlers::quote_routes())
}

async fn api_index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Construction Machinery E-commerce API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "products": "/api/products",
            "partsFinder": "/api/parts-finder",
            "cart": "/api/cart",
            "quote": "/api/quote",
        }
    }))
}
