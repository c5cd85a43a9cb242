// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request reached a session-scoped handler without a session")]
    MissingSession,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::DuplicateLogin(_)) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Store(StoreError::DuplicateLogin(_)) => "STORE_002",
            AppError::Store(_) => "STORE_001",
            AppError::Password(_) => "AUTH_001",
            AppError::Config(_) => "CFG_001",
            AppError::MissingSession => "SESSION_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Store(StoreError::DuplicateLogin(_)) => "Login already taken".to_string(),
            AppError::Store(_) => "Service temporarily unavailable".to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::WorkFactor;

    #[test]
    fn test_app_error_display() {
        let store_error = AppError::Store(StoreError::DuplicateLogin("kraken".to_string()));
        assert_eq!(
            store_error.to_string(),
            "Credential store error: login `kraken` is already taken"
        );

        let config_error = AppError::Config("session.ttl_secs must be positive".to_string());
        assert_eq!(
            config_error.to_string(),
            "Configuration error: session.ttl_secs must be positive"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Store(StoreError::Unavailable("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Store(StoreError::DuplicateLogin("kraken".to_string())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Config("bad".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::MissingSession.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_sanitized_message_hides_details() {
        let err = AppError::Store(StoreError::Unavailable("postgres at 10.0.0.7 refused".to_string()));
        assert!(!err.sanitized_message().contains("10.0.0.7"));
        assert_eq!(err.error_code(), "STORE_001");
    }

    #[test]
    fn test_error_from_impls() {
        let app_err: AppError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(app_err, AppError::Store(_)));

        let app_err: AppError = WorkFactor::new(0).unwrap_err().into();
        assert!(matches!(app_err, AppError::Password(_)));
        assert_eq!(app_err.error_code(), "AUTH_001");
    }

    #[tokio::test]
    async fn test_error_response_is_json() {
        let response = AppError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
