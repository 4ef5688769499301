//! Unified application error model and mapping helpers.
//! Every fallible catalog/admin operation returns `AppResult`. The admin gate itself
//! never produces an error; only callers that require privilege raise `Unauthorized`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::backend::BackendError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Unauthorized { code: String, message: String },
    Backend { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Backend { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Backend { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn backend<S: Into<String>>(code: S, msg: S) -> Self { AppError::Backend { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// The one denial every privileged call site surfaces. It deliberately carries no
    /// hint whether the caller was signed out or merely lacked the role.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized { code: "unauthorized".into(), message: "unauthorized".into() }
    }

    pub fn is_unauthorized(&self) -> bool { matches!(self, AppError::Unauthorized { .. }) }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Unauthorized { .. } => 401,
            AppError::Backend { .. } => 502,
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

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match &err {
            // PostgREST answers 401/403 when row-level security rejects the caller
            BackendError::Status { status, .. } if *status == 401 || *status == 403 => AppError::unauthorized(),
            BackendError::Status { status, .. } if *status == 404 => AppError::NotFound { code: "not_found".into(), message: err.to_string() },
            BackendError::NotFound(_) => AppError::NotFound { code: "not_found".into(), message: err.to_string() },
            BackendError::Decode(_) => AppError::Backend { code: "decode_error".into(), message: err.to_string() },
            BackendError::Config(_) => AppError::Internal { code: "config_error".into(), message: err.to_string() },
            _ => AppError::Backend { code: "backend_error".into(), message: err.to_string() },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Backend { code: "decode_error".into(), message: err.to_string() }
    }
}
