use crate::handlers::common::{
    created_response, success_response, success_with_message, validate_input, Json, Path, Query,
};
use crate::{
    entities::quote_request::QuoteStatus,
    errors::ApiError,
    services::quotes::{CreateQuoteRequestInput, CustomerInfo, QuoteItemInput},
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for quote-request endpoints.
pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quote_request))
        .route("/", get(list_quote_requests))
        .route("/:id", get(get_quote_request))
        .route("/:id/status", put(update_quote_status))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerInfoBody {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemBody {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequestBody {
    #[validate]
    pub customer_info: CustomerInfoBody,
    #[validate]
    pub items: Vec<QuoteItemBody>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteListParams {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuoteStatusRequest {
    pub status: QuoteStatus,
}

/// Converts selected items plus contact info into a priced quote request.
/// Fails atomically if any referenced product is missing or inactive.
async fn create_quote_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuoteRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    if payload.items.is_empty() {
        return Err(ApiError::ValidationError(
            "At least one item is required".to_string(),
        ));
    }

    let input = CreateQuoteRequestInput {
        customer_info: CustomerInfo {
            name: payload.customer_info.name,
            email: payload.customer_info.email,
            phone: payload.customer_info.phone,
            company: payload.customer_info.company,
        },
        items: payload
            .items
            .into_iter()
            .map(|item| QuoteItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
        notes: payload.notes,
    };

    let quote = state.services.quotes.create_quote_request(input).await?;
    Ok(created_response(quote, "Quote request submitted"))
}

/// Lists quote requests newest-first, optionally filtered by email.
async fn list_quote_requests(
    State(state): State<AppState>,
    Query(params): Query<QuoteListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = state
        .services
        .quotes
        .list_quote_requests(params.email.as_deref())
        .await?;
    Ok(success_response(quotes))
}

async fn get_quote_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state.services.quotes.get_quote_request(id).await?;
    Ok(success_response(quote))
}

/// Overwrites the quote status; any status may replace any other.
async fn update_quote_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuoteStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state
        .services
        .quotes
        .update_quote_status(id, payload.status)
        .await?;
    Ok(success_with_message(quote, "Quote status updated"))
}
