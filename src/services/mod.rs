pub mod cart;
pub mod catalog;
pub mod quotes;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use quotes::QuoteService;
