use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use sqlx::error::ErrorKind;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Failure taxonomy shared by every handler and service.
///
/// `code` in the response body is the stable machine-readable kind the UI
/// switches on; the message is for humans.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("validation failed: {0:?}")]
    InvalidFields(Vec<String>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("storage failure: {0}")]
    Storage(anyhow::Error),
}

impl AppError {
    /// Stable machine kind exposed to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();
        let (error_message, details) = match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg) => (msg, None),
            AppError::InvalidFields(errors) => (
                "Validation failed".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::Storage(err) => {
                tracing::error!(error = ?err, "storage failure");
                ("Internal server error".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Storage(err)
    }
}

/// SQLSTATE raised when a value does not fit its `NUMERIC` column.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let mapped = match &err {
            sqlx::Error::RowNotFound => Some(AppError::NotFound("Resource not found".into())),
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => Some(AppError::Conflict(format!(
                        "duplicate value violates `{}`",
                        constraint
                    ))),
                    ErrorKind::ForeignKeyViolation => Some(AppError::Validation(format!(
                        "referenced record does not exist (`{}`)",
                        constraint
                    ))),
                    ErrorKind::CheckViolation => Some(AppError::Validation(format!(
                        "value violates `{}`",
                        constraint
                    ))),
                    _ if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
                        Some(AppError::Validation(
                            "numeric value exceeds the storable range".into(),
                        ))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        mapped.unwrap_or_else(|| AppError::Storage(err.into()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        messages.sort();
        AppError::InvalidFields(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn app_error_into_response_maps_status_and_code() {
        let cases = [
            (
                AppError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AppError::NotFound("missing".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Conflict("in use".into()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::Unauthorized("who".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::Forbidden("denied".into()),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
        ];

        for (error, status, code) in cases {
            let message = match &error {
                AppError::Validation(m)
                | AppError::NotFound(m)
                | AppError::Conflict(m)
                | AppError::Unauthorized(m)
                | AppError::Forbidden(m) => m.clone(),
                _ => unreachable!(),
            };
            let response = error.into_response();
            assert_eq!(response.status(), status);
            let json = response_json(response).await;
            assert_eq!(json["error"], message);
            assert_eq!(json["code"], code);
        }
    }

    #[tokio::test]
    async fn invalid_fields_include_details() {
        let response =
            AppError::InvalidFields(vec!["po_number: length".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["errors"][0], "po_number: length");
    }

    #[tokio::test]
    async fn storage_error_hides_internal_message() {
        let response = AppError::Storage(anyhow::anyhow!("connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "STORAGE_ERROR");
        assert!(json["details"].is_null());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn pool_errors_map_to_storage() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[derive(Debug)]
    struct CodedDbError(&'static str);

    impl std::fmt::Display for CodedDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl std::error::Error for CodedDbError {}

    impl sqlx::error::DatabaseError for CodedDbError {
        fn message(&self) -> &str {
            "numeric field overflow"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn numeric_overflow_maps_to_validation() {
        let err: AppError = sqlx::Error::Database(Box::new(CodedDbError("22003"))).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = sqlx::Error::Database(Box::new(CodedDbError("57014"))).into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
