use crate::handlers::common::{
    created_response, success_response, success_with_message, validate_input, Json, Path,
};
use crate::handlers::session::SessionId;
use crate::{
    entities::cart_item::ItemType,
    errors::ApiError,
    services::cart::{AddToCartInput, UpdateCartItemInput},
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints. Every route is scoped to the
/// caller's session.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_to_cart))
        .route("/items/:id", put(update_cart_item))
        .route("/items/:id", delete(remove_from_cart))
}

fn default_item_type() -> ItemType {
    ItemType::BuyNow
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default = "default_item_type")]
    pub item_type: ItemType,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub item_type: Option<ItemType>,
}

/// Current session's cart, created lazily on first access.
async fn get_cart(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_or_create_cart(session.as_str())
        .await?;
    Ok(success_response(cart))
}

async fn add_to_cart(
    State(state): State<AppState>,
    session: SessionId,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .cart
        .add_to_cart(
            session.as_str(),
            AddToCartInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
                item_type: payload.item_type,
            },
        )
        .await?;

    Ok(created_response(item, "Item added to cart"))
}

async fn update_cart_item(
    State(state): State<AppState>,
    session: SessionId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .cart
        .update_cart_item(
            session.as_str(),
            id,
            UpdateCartItemInput {
                quantity: payload.quantity,
                item_type: payload.item_type,
            },
        )
        .await?;

    Ok(success_with_message(item, "Cart item updated"))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    session: SessionId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_from_cart(session.as_str(), id)
        .await?;
    Ok(success_with_message((), "Item removed from cart"))
}

/// Clears the session's cart; succeeds even when no cart exists yet.
async fn clear_cart(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<impl IntoResponse, ApiError> {
    state.services.cart.clear_cart(session.as_str()).await?;
    Ok(success_with_message((), "Cart cleared"))
}
