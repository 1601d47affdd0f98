//! HTTP error type shared by every handler.
//!
//! Errors render as `{"error": <message>, "code": <CODE>}`. Database
//! constraint violations are translated into 4xx responses; anything
//! unexpected is logged and returned as a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dreamlight_core::error::CoreError;
use dreamlight_core::types::DbId;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// User-facing messages for the named unique constraints in the migrations.
const UNIQUE_MESSAGES: &[(&str, &str)] = &[
    ("uq_users_email", "Email already registered"),
    ("uq_users_email_lower", "Email already registered"),
    ("uq_episodes_project_number", "Episode number already exists in this project"),
    ("uq_project_crew", "User is already assigned to this project"),
];

impl AppError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Unauthorized(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Forbidden(message.into()))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Conflict(message.into()))
    }

    /// Status, machine-readable code and message for this error.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            Self::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            Self::Core(CoreError::Conflict(msg)) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Self::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            Self::Core(CoreError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            Self::Core(CoreError::Internal(msg)) | Self::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            Self::Database(err) => database_parts(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();
        (status, Json(ErrorBody { error, code })).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Map a sqlx error onto a response by Postgres SQLSTATE.
///
/// 23505 (unique) becomes 409, 23503 (foreign key) and 23514 (check) become
/// 400. `RowNotFound` is a 404.
fn database_parts(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    let constraint = db_err.constraint().unwrap_or_default();
    match db_err.code().as_deref() {
        Some("23505") => {
            let message = UNIQUE_MESSAGES
                .iter()
                .find(|(name, _)| *name == constraint)
                .map(|(_, message)| message.to_string())
                .unwrap_or_else(|| format!("Duplicate value violates {constraint}"));
            (StatusCode::CONFLICT, "CONFLICT", message)
        }
        Some("23503") => (
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            format!("Referenced record does not exist or is still in use ({constraint})"),
        ),
        Some("23514") => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value is not allowed ({constraint})"),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_and_code() {
        let cases = [
            (AppError::not_found("Project", 9), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::unauthorized("no"), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::forbidden("no"), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::conflict("dup"), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::Core(CoreError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        ];
        for (error, status, code) in cases {
            let (got_status, got_code, _) = error.parts();
            assert_eq!(got_status, status);
            assert_eq!(got_code, code);
        }
    }

    #[test]
    fn not_found_names_the_entity() {
        let (_, _, message) = AppError::not_found("Episode", 4).parts();
        assert_eq!(message, "Episode with id 4 not found");
    }

    #[test]
    fn internal_details_are_hidden() {
        let (status, _, message) = AppError::InternalError("disk on fire".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "An internal error occurred");

        let (status, code, _) = AppError::Database(sqlx::Error::RowNotFound).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }
}
