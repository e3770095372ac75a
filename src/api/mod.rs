//! REST API module.
//!
//! Contains all API routes and handlers used by the web client.

mod credentials;
mod requests;
mod users;

pub use credentials::*;
pub use requests::*;
pub use users::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip)]
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, status: StatusCode) -> Self {
        Self {
            success: true,
            data,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data, StatusCode::OK))
}

/// Create a 201 response for a newly stored record.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data, StatusCode::CREATED))
}

/// JSON body extractor whose rejections use the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Require a non-blank text field.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

/// Require a field that has no blank form.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}
