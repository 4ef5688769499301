use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::principal::Identity;
use crate::backend::BackendError;

/// Profile row projected to its role column, `{ "role": string | null }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(default)]
    pub role: Option<String>,
}

impl RoleRecord {
    pub fn new<S: Into<String>>(role: S) -> Self { Self { role: Some(role.into()) } }
}

/// Remote lookup of the stored role attribute for an identity.
///
/// `Ok(None)` means no profile row exists for the identity. A row whose role is null
/// comes back as `Ok(Some(RoleRecord { role: None }))`.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    async fn fetch_role(&self, identity: &Identity) -> Result<Option<RoleRecord>, BackendError>;
}
