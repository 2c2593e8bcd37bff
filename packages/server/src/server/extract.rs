//! Extractors whose rejections use the JSON error body.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::common::ApiError;

/// `axum::Json` with malformed bodies reported as 400 `{"error": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with the same error shape
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
