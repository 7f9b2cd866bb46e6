use crate::handlers::common::{success_response, validate_input, Path, Query};
use crate::{
    errors::ApiError,
    services::catalog::{ProductQuery, SortBy},
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// Creates the router for catalog endpoints.
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:slug", get(get_product))
}

pub fn parts_finder_routes() -> Router<AppState> {
    Router::new().route("/", get(parts_finder))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PartsFinderParams {
    #[validate(length(min = 1, message = "Make is required"))]
    pub make: Option<String>,
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: Option<String>,
}

/// Paginated, filtered product listing.
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ProductQuery {
        search: params.search,
        category: params.category,
        brand: params.brand,
        min_price: params.min_price,
        max_price: params.max_price,
        page: params.page,
        limit: params.limit,
        sort_by: SortBy::from_param(params.sort_by.as_deref()),
    };

    let page = state.services.catalog.list_products(query).await?;
    Ok(success_response(page))
}

/// Single product by slug; inactive products are invisible here.
async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.catalog.get_product_by_slug(&slug).await?;
    Ok(success_response(product))
}

/// Make/model compatibility search. Both parameters are required at this
/// boundary even though the underlying search treats model as optional.
async fn parts_finder(
    State(state): State<AppState>,
    Query(params): Query<PartsFinderParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&params)?;
    let (Some(make), Some(model)) = (params.make.as_deref(), params.model.as_deref()) else {
        return Err(ApiError::ValidationError(
            "Make and model are required".to_string(),
        ));
    };

    let products = state
        .services
        .catalog
        .search_parts(make, Some(model))
        .await?;
    Ok(success_response(products))
}
