use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};
use rusqlite::Error as RusqliteError;
use serde::Serialize;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertDeskError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    HashError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Unauthorized")]
    Forbidden,

    #[error("Alert {0} not found")]
    AlertNotFound(i64),

    #[error("Invalid alert id: {0}")]
    InvalidAlertId(String),

    #[error("Failed to {operation}: {detail}")]
    Internal {
        operation: &'static str,
        detail: String,
    },

    #[error("Error: {0}")]
    Error(String),
}

impl AlertDeskError {
    /// Wraps any error as an `Internal` failure of `operation`. The detail is
    /// kept for the log but never sent to the client.
    pub fn internal(operation: &'static str, err: impl std::fmt::Display) -> Self {
        AlertDeskError::Internal {
            operation,
            detail: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AlertDeskError::BadRequest(_) | AlertDeskError::EmailTaken => StatusCode::BAD_REQUEST,
            AlertDeskError::InvalidCredentials | AlertDeskError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            AlertDeskError::Forbidden => StatusCode::FORBIDDEN,
            AlertDeskError::AlertNotFound(_) | AlertDeskError::InvalidAlertId(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to clients. Server-side failures collapse to a
    /// generic text so storage details never leak.
    pub fn user_message(&self) -> String {
        match self {
            AlertDeskError::EmailTaken
            | AlertDeskError::InvalidCredentials
            | AlertDeskError::Unauthenticated(_)
            | AlertDeskError::Forbidden => self.to_string(),
            AlertDeskError::BadRequest(detail) => detail.clone(),
            AlertDeskError::AlertNotFound(_) | AlertDeskError::InvalidAlertId(_) => {
                "Alert not found".to_string()
            }
            AlertDeskError::Internal { operation, .. } => format!("Failed to {}", operation),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Malformed or incomplete JSON bodies
impl From<JsonRejection> for AlertDeskError {
    fn from(rejection: JsonRejection) -> Self {
        AlertDeskError::BadRequest(rejection.body_text())
    }
}

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for AlertDeskError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            info!("Authorization error: {}", self);
        } else {
            debug!("Client error: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                message: self.user_message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AlertDeskError::EmailTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AlertDeskError::BadRequest("missing field `latitude`".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AlertDeskError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AlertDeskError::Unauthenticated("Token missing").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AlertDeskError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AlertDeskError::AlertNotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AlertDeskError::InvalidAlertId("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AlertDeskError::internal("fetch alerts", "disk I/O error").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AlertDeskError::internal("acknowledge alert", "database is locked");
        assert_eq!(err.user_message(), "Failed to acknowledge alert");
        assert!(err.to_string().contains("database is locked"));

        let err = AlertDeskError::Error("pool exhausted".into());
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(AlertDeskError::Unauthenticated("Invalid token").user_message(), "Invalid token");
        assert_eq!(AlertDeskError::Forbidden.user_message(), "Unauthorized");
        assert_eq!(AlertDeskError::EmailTaken.user_message(), "Email already registered");
        assert_eq!(
            AlertDeskError::InvalidAlertId("abc".into()).user_message(),
            "Alert not found"
        );
    }
}
