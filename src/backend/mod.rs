//! Remote record store and RPC surface of the hosted backend.
//!
//! Everything that touches the network goes through [`Backend`]. The REST flavour
//! lives in [`rest`]; tests plug in in-memory fakes.

mod rest;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::identity::RoleProvider;

pub use rest::RestBackend;

/// PostgREST query pairs, e.g. `("manual_id", "eq.<uuid>")` or `("order", "position.asc")`.
pub type Params = Vec<(String, String)>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() { BackendError::Decode(err.to_string()) } else { BackendError::Transport(err.to_string()) }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self { BackendError::Decode(err.to_string()) }
}

/// Typed CRUD + RPC over backend tables. Row-level authorization is the backend's
/// job; callers gate privileged writes with the admin gate before getting here.
#[async_trait]
pub trait Backend: RoleProvider {
    async fn select(&self, table: &str, params: &[(String, String)]) -> Result<Vec<Value>, BackendError>;

    /// Insert one row and return it as stored (ids and defaults filled in).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Patch the row with primary key `id`. `NotFound` when no row matched.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, BackendError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError>;

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError>;
}

/// `("column", "eq.value")`
pub fn eq<V: std::fmt::Display>(column: &str, value: V) -> (String, String) {
    (column.to_string(), format!("eq.{}", value))
}

pub fn order(spec: &str) -> (String, String) { ("order".to_string(), spec.to_string()) }
