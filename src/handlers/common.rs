use crate::errors::ApiError;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::Validate;

/// Extractor wrappers that render rejections (malformed JSON, bad query
/// or path parameters) in the standard error envelope instead of axum's
/// plain-text defaults.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// Standard success envelope: `{"success": true, "data": ..., "message"?: ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, axum::Json(ApiResponse::new(data))).into_response()
}

pub fn success_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    (StatusCode::OK, axum::Json(ApiResponse::with_message(data, message))).into_response()
}

pub fn created_response<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    (
        StatusCode::CREATED,
        axum::Json(ApiResponse::with_message(data, message)),
    )
        .into_response()
}

/// Runs declarative validation at the boundary, before any store access.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))
}
