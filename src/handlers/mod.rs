pub mod cart;
pub mod common;
pub mod health;
pub mod products;
pub mod quotes;
pub mod session;

use crate::{db::DbPool, events::EventSender, services};
use std::sync::Arc;

pub use cart::cart_routes;
pub use health::health_routes;
pub use products::{parts_finder_routes, products_routes};
pub use quotes::quote_routes;

/// Aggregated services used by the HTTP handlers, constructed once at
/// startup with the shared connection pool injected into each service.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<services::CatalogService>,
    pub cart: Arc<services::CartService>,
    pub quotes: Arc<services::QuoteService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        let catalog = Arc::new(services::CatalogService::new(db.clone()));
        let cart = Arc::new(services::CartService::new(
            db.clone(),
            (*catalog).clone(),
            event_sender.clone(),
        ));
        let quotes = Arc::new(services::QuoteService::new(
            db,
            (*catalog).clone(),
            event_sender,
        ));

        Self {
            catalog,
            cart,
            quotes,
        }
    }
}
