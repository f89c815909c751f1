pub mod admin;
pub mod health;
pub mod invoices;
pub mod purchase_orders;
pub mod references;

use axum::{extract::rejection::JsonRejection, Json};
use std::str::FromStr;

use crate::error::AppError;

/// Unwraps a JSON body, reporting malformed input as a validation error so
/// clients always receive the standard error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn parse_path_id<T: FromStr>(raw: &str, label: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Validation(format!("Invalid {} ID", label)))
}

/// Parses an optional numeric filter; present but malformed is an error.
pub(crate) fn parse_filter<T: FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Invalid {} filter: {}", name, value))),
        None => Ok(None),
    }
}
