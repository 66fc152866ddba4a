use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::validation::FieldErrors;

/// Every failure a handler can return. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}", .0.first_message().unwrap_or("Invalid request body."))]
    Validation(FieldErrors),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".into())
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Unprocessable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            // Duplicates are reported as 500 with a readable message.
            ApiError::Conflict(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_json(&self) -> Value {
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::Validation(fields) = self {
            let map: Map<String, Value> = fields
                .iter()
                .map(|f| (f.field.to_string(), Value::from(f.message)))
                .collect();
            body["fields"] = Value::Object(map);
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(self.to_json())).into_response()
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        ApiError::Validation(fields)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let source = db.constraint().unwrap_or_else(|| db.message());
                warn!(constraint = ?db.constraint(), "unique violation");
                ApiError::Conflict(format_db_error(source).into())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                warn!(constraint = ?db.constraint(), "foreign key violation");
                ApiError::Unprocessable("Referenced record does not exist.".into())
            }
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Turns a raw database error (or constraint name) into a user-facing message.
pub fn format_db_error(raw: &str) -> &'static str {
    if raw.contains("username") {
        "Username has already been used."
    } else if raw.contains("email") {
        "Email has already been used."
    } else if raw.contains("title") {
        "Title has already been used."
    } else if raw.contains("hashedPassword") {
        "The incorrect password has been entered."
    } else {
        "Incorrect request body."
    }
}
