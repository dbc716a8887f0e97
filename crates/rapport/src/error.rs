//! Error taxonomy shared by every request-handling path.
//!
//! Every failure the core reports is an [`ApiError`]: a closed [`ErrorKind`]
//! that fixes the HTTP status, a client-facing message, and optional
//! structured details. Handlers propagate it with `?` and the HTTP layer
//! renders it exactly once.

use crate::db::DbError;
use crate::validation::ValidationErrors;
use serde_json::Value;

/// Result alias used by services and handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Closed set of error kinds, each bound to one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Message used when the failure site does not supply one
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Internal => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal_error",
        };
        write!(f, "{}", s)
    }
}

/// A classified failure on its way to the response layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    details: Option<Value>,
    diagnostic: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            diagnostic: None,
        }
    }

    /// Attach structured details (rendered under `error.details`)
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach a diagnostic trace. Only rendered when the server runs in
    /// development mode.
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Internal failure with the generic client-facing message
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, ErrorKind::Internal.default_message())
    }

    /// 400 carrying the field-keyed validation errors as details
    pub fn validation(errors: ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        Self::bad_request("Validation failed").with_details(details)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Response body: `{ "error": { "message", "details"? } }`
    pub fn to_body(&self) -> Value {
        let mut error = serde_json::Map::new();
        error.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(details) = &self.details {
            error.insert("details".to_string(), details.clone());
        }
        serde_json::json!({ "error": error })
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::internal()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::internal().with_diagnostic(format!("{:?}", anyhow::Error::from(err)))
    }
}

#[cfg(feature = "http")]
mod http {
    use super::{ApiError, ErrorKind};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    /// Diagnostic trace stashed on error responses for the development-mode
    /// middleware to pick up.
    #[derive(Debug, Clone)]
    pub struct Diagnostic(pub String);

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            if self.kind == ErrorKind::Internal {
                tracing::error!(
                    message = %self.message,
                    diagnostic = self.diagnostic.as_deref().unwrap_or(""),
                    "request failed"
                );
            } else {
                tracing::debug!(kind = %self.kind, message = %self.message, "request rejected");
            }

            let status = StatusCode::from_u16(self.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut response = (status, Json(self.to_body())).into_response();
            if let Some(diagnostic) = self.diagnostic {
                response.extensions_mut().insert(Diagnostic(diagnostic));
            }
            response
        }
    }
}

#[cfg(feature = "http")]
pub use http::Diagnostic;
