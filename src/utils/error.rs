use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;

/// Mongo server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// Unique index violation. Reported as 400 to match the public contract.
    #[error("{0}")]
    Conflict(String),

    /// Unreadable body or failed field validation. Like any other
    /// non-duplicate failure it surfaces as the endpoint's generic 500.
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(MongoError),

    #[error("{0}")]
    Internal(String),
}

/// Corpo JSON de erro: `{"error": "..."}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// Collapses everything except 404 and duplicate-key errors into the
    /// endpoint's generic message, logging the underlying cause.
    pub fn or_internal(self, message: &str) -> AppError {
        match self {
            AppError::NotFound(_) | AppError::Conflict(_) => self,
            other => {
                log::error!("❌ {}: {}", message, other);
                AppError::Internal(message.to_string())
            }
        }
    }
}

impl From<MongoError> for AppError {
    fn from(err: MongoError) -> Self {
        if is_duplicate_key(&err) {
            AppError::Conflict(format!("Duplicate key: {}", err))
        } else {
            AppError::Database(err)
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn or_internal_keeps_client_errors() {
        let err = AppError::NotFound("User not found".into()).or_internal("Failed to retrieve user");
        assert!(matches!(err, AppError::NotFound(ref m) if m == "User not found"));

        let err = AppError::Internal("socket closed".into()).or_internal("Failed to retrieve user");
        assert!(matches!(err, AppError::Internal(ref m) if m == "Failed to retrieve user"));

        let err = AppError::Validation("lastName is required".into()).or_internal("Failed to add user");
        assert!(matches!(err, AppError::Internal(ref m) if m == "Failed to add user"));
    }

    #[actix_rt::test]
    async fn error_response_has_error_field() {
        let resp = AppError::NotFound("User not found".into()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "User not found");
    }
}
