//! Unified application error model and mapping helpers.
//! This module provides the request-scope error enum shared by the HTTP
//! surface and the identity resolver, plus the startup-fatal bridge errors.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::registry::Role;

/// Request-scope errors. These abort a single request and map directly to an
/// HTTP response; they never affect other in-flight requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Unauthorized { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthorized { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Unauthorized { .. } => 401,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &self {
            // Unauthorized carries a plain-text body and a challenge header so
            // credential-less callers see an actionable response.
            AppError::Unauthorized { .. } => {
                let mut headers = HeaderMap::new();
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"hearth\""));
                (status, headers, self.message().to_string()).into_response()
            }
            _ => (
                status,
                axum::Json(serde_json::json!({"status":"error","code": self.code_str(), "message": self.message()})),
            )
                .into_response(),
        }
    }
}

/// Per-request authenticator failures. Distinct from a missing credential:
/// these always surface as an internal error, never as anonymous access.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("identity store failure: {0}")]
    Store(String),
    #[error("malformed credential state: {0}")]
    Malformed(String),
}

/// Startup-fatal errors from component registration. The process must not
/// begin serving with a partially wired runtime.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("component registry has not been refreshed")]
    NotRefreshed,
    #[error("component registry already refreshed")]
    AlreadyRefreshed,
    #[error("component registry is closed")]
    Closed,
    #[error("duplicate {role} registration: {name}")]
    Duplicate { role: Role, name: String },
    #[error("{} registration(s) failed: {}", failures.len(), failures.join("; "))]
    Registration { failures: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::unauthorized("unauthorized", "no").http_status(), 401);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = AppError::unauthorized("unauthorized", "Credentials are required to access this resource.");
        assert_eq!(e.to_string(), "unauthorized: Credentials are required to access this resource.");
    }

    #[test]
    fn bridge_error_aggregates_failures() {
        let e = BridgeError::Registration { failures: vec!["task/a: dup".into(), "managed/b: dup".into()] };
        let msg = e.to_string();
        assert!(msg.contains("2 registration(s) failed"));
        assert!(msg.contains("task/a"));
    }
}
