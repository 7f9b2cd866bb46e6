use crate::{
    entities::{cart, cart_item, product, Cart, CartItem, Product},
    entities::{CartItemModel, CartModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{CatalogService, ProductDetail},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub use crate::entities::cart_item::ItemType;

/// Session-keyed shopping cart operations.
///
/// No in-process locking: cross-request consistency rides on the store's
/// unique constraints (one cart per session, one line per cart/product)
/// and row-level update semantics.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    catalog: CatalogService,
    event_sender: EventSender,
}

/// A cart with its items, each joined to product/category/brand so the
/// caller never needs a follow-up read.
#[derive(Debug, Serialize)]
pub struct CartWithItems {
    #[serde(flatten)]
    pub cart: CartModel,
    pub items: Vec<CartItemDetail>,
}

#[derive(Debug, Serialize)]
pub struct CartItemDetail {
    #[serde(flatten)]
    pub item: CartItemModel,
    pub product: ProductDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItemInput {
    pub quantity: i32,
    pub item_type: Option<ItemType>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: CatalogService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            catalog,
            event_sender,
        }
    }

    /// Returns the session's cart with items joined, creating an empty
    /// cart on first access.
    ///
    /// Safe to call concurrently for the same session: if the insert
    /// loses the race on the unique `session_id` constraint, the winner's
    /// row is re-read instead of surfacing the conflict.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, session_id: &str) -> Result<CartWithItems, ServiceError> {
        if let Some(existing) = self.find_cart(session_id).await? {
            return self.load_cart_with_items(existing).await;
        }

        let cart = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id.to_string()),
            created_at: Set(Utc::now()),
        };

        match cart.insert(&*self.db).await {
            Ok(created) => {
                self.event_sender
                    .send_or_log(Event::CartCreated(created.id))
                    .await;
                info!("Created cart for session");
                self.load_cart_with_items(created).await
            }
            Err(insert_err) => {
                // Lost the creation race; the other request's cart wins.
                match self.find_cart(session_id).await? {
                    Some(existing) => {
                        debug!("Concurrent cart creation detected; reusing existing cart");
                        self.load_cart_with_items(existing).await
                    }
                    None => Err(insert_err.into()),
                }
            }
        }
    }

    /// Adds a product to the session's cart.
    ///
    /// If a line for the product already exists, quantity accumulates and
    /// item type is overwritten with the new value; otherwise a new line
    /// is created. The product must exist and be active.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        session_id: &str,
        input: AddToCartInput,
    ) -> Result<CartItemDetail, ServiceError> {
        let product = Product::find_by_id(input.product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;
        if product.is_none() {
            return Err(ServiceError::NotFound("Product not found".to_string()));
        }

        let cart = self.get_or_create_cart(session_id).await?.cart;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&*self.db)
            .await?;

        let item = if let Some(item) = existing {
            let quantity = item.quantity.checked_add(input.quantity).ok_or_else(|| {
                ServiceError::ValidationError("Quantity exceeds the allowed maximum".to_string())
            })?;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.item_type = Set(input.item_type);
            item.updated_at = Set(Utc::now());
            item.update(&*self.db).await?
        } else {
            let now = Utc::now();
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                item_type: Set(input.item_type),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&*self.db).await?
        };

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id: input.product_id,
                quantity: input.quantity,
            })
            .await;

        self.load_item_detail(item).await
    }

    /// Replaces the quantity (and, when supplied, the item type) of a
    /// cart line. The line must belong to the session's cart; items are
    /// never addressable cross-session.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        session_id: &str,
        item_id: Uuid,
        input: UpdateCartItemInput,
    ) -> Result<CartItemDetail, ServiceError> {
        let item = self.find_owned_item(session_id, item_id).await?;

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(input.quantity);
        if let Some(item_type) = input.item_type {
            item.item_type = Set(item_type);
        }
        item.updated_at = Set(Utc::now());
        let item = item.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id: item.cart_id,
                item_id: item.id,
            })
            .await;

        self.load_item_detail(item).await
    }

    /// Deletes a cart line after the same session-ownership check.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        session_id: &str,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        let item = self.find_owned_item(session_id, item_id).await?;
        let cart_id = item.cart_id;
        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved { cart_id, item_id })
            .await;
        Ok(())
    }

    /// Deletes every item in the session's cart. A session without a cart
    /// is a no-op, not an error.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, session_id: &str) -> Result<(), ServiceError> {
        let Some(cart) = self.find_cart(session_id).await? else {
            return Ok(());
        };

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;
        Ok(())
    }

    async fn find_cart(&self, session_id: &str) -> Result<Option<CartModel>, ServiceError> {
        Ok(Cart::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?)
    }

    /// Looks up an item and verifies it belongs to the session's cart.
    /// A foreign item is indistinguishable from a missing one.
    async fn find_owned_item(
        &self,
        session_id: &str,
        item_id: Uuid,
    ) -> Result<CartItemModel, ServiceError> {
        let not_found = || ServiceError::NotFound("Cart item not found".to_string());

        let item = CartItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(not_found)?;

        let cart = Cart::find_by_id(item.cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(not_found)?;
        if cart.session_id != session_id {
            return Err(not_found());
        }

        Ok(item)
    }

    async fn load_cart_with_items(&self, cart: CartModel) -> Result<CartWithItems, ServiceError> {
        let items = cart.find_related(CartItem).all(&*self.db).await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            details.push(self.load_item_detail(item).await?);
        }

        Ok(CartWithItems {
            cart,
            items: details,
        })
    }

    async fn load_item_detail(&self, item: CartItemModel) -> Result<CartItemDetail, ServiceError> {
        let product = Product::find_by_id(item.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "cart item {} references missing product",
                    item.id
                ))
            })?;

        let mut products = self.catalog.attach_refs(vec![product]).await?;
        let product = products.pop().ok_or_else(|| {
            ServiceError::InternalError("product lost its references".to_string())
        })?;

        Ok(CartItemDetail { item, product })
    }
}
