//! Deployment API key gate and credential comparison.
//!
//! Secrets are compared in constant time.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key layer function that takes the expected key as a parameter.
pub async fn api_key_layer(expected_key: Option<String>, request: Request, next: Next) -> Response {
    // If no key is configured, allow all requests (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response("Invalid API key")
            }
        }
        None => {
            // Also accept the key as a bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response("Missing or invalid API key"),
            }
        }
    }
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
