pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod product;
pub mod quote_item;
pub mod quote_request;

pub use brand::Entity as Brand;
pub use cart::Entity as Cart;
pub use cart_item::Entity as CartItem;
pub use category::Entity as Category;
pub use product::Entity as Product;
pub use quote_item::Entity as QuoteItem;
pub use quote_request::Entity as QuoteRequest;

pub use brand::Model as BrandModel;
pub use cart::Model as CartModel;
pub use cart_item::Model as CartItemModel;
pub use category::Model as CategoryModel;
pub use product::Model as ProductModel;
pub use quote_item::Model as QuoteItemModel;
pub use quote_request::Model as QuoteRequestModel;
