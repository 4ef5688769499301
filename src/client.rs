//! Composition root: wires one session store, one backend, the admin gate and the
//! services built on them. Session transitions invalidate the gate synchronously
//! before returning, so the next check never sees the previous identity's role.

use std::sync::Arc;

use crate::admin::AdminService;
use crate::backend::{BackendError, RestBackend};
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::identity::{AdminGate, AuthCache, Identity, Role, Session, SessionStore};

pub struct ManualClient {
    session: Arc<SessionStore>,
    gate: Arc<AdminGate>,
    catalog: Catalog,
    admin: AdminService,
}

impl ManualClient {
    pub fn connect(cfg: &ClientConfig) -> Result<Self, BackendError> {
        let session = Arc::new(SessionStore::new());
        let backend = Arc::new(RestBackend::new(cfg, session.clone())?);
        Ok(Self::assemble(cfg, session, backend))
    }

    /// Build around any backend; tests use this with in-memory fakes.
    pub fn assemble<B>(cfg: &ClientConfig, session: Arc<SessionStore>, backend: Arc<B>) -> Self
    where
        B: crate::backend::Backend + 'static,
    {
        let cache = Arc::new(AuthCache::new(cfg.role_ttl));
        let gate = Arc::new(AdminGate::with_cache(session.clone(), backend.clone(), cache));
        let catalog = Catalog::new(backend.clone(), session.clone());
        let admin = AdminService::new(gate.clone(), backend);
        Self { session, gate, catalog, admin }
    }

    pub fn sign_in<S: Into<String>>(&self, identity: Identity, access_token: S) -> Session {
        let sess = self.session.sign_in(identity, access_token);
        self.gate.invalidate();
        sess
    }

    pub fn refresh_token<S: Into<String>>(&self, access_token: S) -> bool {
        let ok = self.session.refresh_token(access_token);
        self.gate.invalidate();
        ok
    }

    pub fn sign_out(&self) -> bool {
        let ok = self.session.sign_out();
        self.gate.invalidate();
        ok
    }

    pub async fn is_admin(&self) -> bool { self.gate.is_admin().await }

    pub async fn role(&self) -> Role { self.gate.role().await }

    pub fn session(&self) -> &Arc<SessionStore> { &self.session }
    pub fn gate(&self) -> &Arc<AdminGate> { &self.gate }
    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn admin(&self) -> &AdminService { &self.admin }
}
