//! Request extractors whose rejections use the shared error body

use aide::{generate::GenContext, openapi::Operation, OperationInput};
use axum::extract::{FromRequest, FromRequestParts};
use schemars::JsonSchema;

use super::errors::AppError;

/// `axum::Json` that rejects malformed bodies with a 422 [`AppError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` that rejects malformed query strings with a 422 [`AppError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

// Documented exactly like the extractors they wrap

impl<T: JsonSchema> OperationInput for ApiJson<T> {
    fn operation_input(ctx: &mut GenContext, operation: &mut Operation) {
        axum::Json::<T>::operation_input(ctx, operation);
    }
}

impl<T: JsonSchema> OperationInput for ApiQuery<T> {
    fn operation_input(ctx: &mut GenContext, operation: &mut Operation) {
        axum::extract::Query::<T>::operation_input(ctx, operation);
    }
}
