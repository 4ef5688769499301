//! Admin authorization gate.
//!
//! Answers "is the current identity an admin" and "which role does it hold" from a
//! single-slot TTL cache, falling back to one remote lookup per miss. Concurrent
//! misses for the same identity and epoch join the same in-flight lookup.
//!
//! Every failure resolves to the least-privileged outcome. The gate never returns
//! an error; privileged callers turn a negative answer into `AppError::Unauthorized`
//! via [`AdminGate::require_admin`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::cache::{AuthCache, CacheEntry};
use super::principal::{Identity, Role};
use super::provider::RoleProvider;
use super::session::{AuthEvent, SessionSource};
use crate::error::{AppError, AppResult};

/// Outcome of one gate consultation. UI code usually only needs [`Resolution::is_admin`];
/// `LookupFailed` is kept apart from a legitimate `Resolved(User)` so it can be logged
/// or surfaced differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Unauthenticated,
    LookupFailed,
    Resolved(Role),
}

impl Resolution {
    pub fn role(self) -> Role {
        match self {
            Resolution::Resolved(r) => r,
            Resolution::Unauthenticated | Resolution::LookupFailed => Role::User,
        }
    }

    pub fn is_admin(self) -> bool { self.role().is_admin() }
}

type LookupFuture = Shared<BoxFuture<'static, Resolution>>;

struct InFlight {
    identity: Identity,
    epoch: u64,
    fut: LookupFuture,
}

pub struct AdminGate {
    session: Arc<dyn SessionSource>,
    provider: Arc<dyn RoleProvider>,
    cache: Arc<AuthCache>,
    inflight: Arc<Mutex<Option<InFlight>>>,
}

impl AdminGate {
    pub fn new(session: Arc<dyn SessionSource>, provider: Arc<dyn RoleProvider>, ttl: Duration) -> Self {
        Self::with_cache(session, provider, Arc::new(AuthCache::new(ttl)))
    }

    pub fn with_cache(session: Arc<dyn SessionSource>, provider: Arc<dyn RoleProvider>, cache: Arc<AuthCache>) -> Self {
        Self { session, provider, cache, inflight: Arc::new(Mutex::new(None)) }
    }

    pub fn cache(&self) -> &AuthCache { &self.cache }

    pub async fn is_admin(&self) -> bool { self.resolve().await.is_admin() }

    pub async fn role(&self) -> Role { self.resolve().await.role() }

    pub async fn resolve(&self) -> Resolution { self.resolve_identity().await.1 }

    /// Precondition for privileged operations. Returns the admin identity or the
    /// generic unauthorized error.
    pub async fn require_admin(&self) -> AppResult<Identity> {
        match self.resolve_identity().await {
            (Some(identity), Resolution::Resolved(Role::Admin)) => Ok(identity),
            (identity, res) => {
                debug!(user = ?identity.as_ref().map(Identity::as_str), resolution = ?res, "admin_gate.denied");
                Err(AppError::unauthorized())
            }
        }
    }

    /// Forget the cached decision. Lookups already in flight may still answer their
    /// own callers but can no longer populate the cache or be joined.
    pub fn invalidate(&self) {
        let epoch = self.cache.invalidate();
        debug!(epoch, "admin_gate.invalidate");
    }

    pub fn on_auth_event(&self, ev: AuthEvent) {
        debug!(event = ?ev, "admin_gate.auth_event");
        self.invalidate();
    }

    /// Invalidate on every event received from `events` until the sender is dropped.
    /// A lagged receiver invalidates too since it may have missed a sign-out.
    pub fn spawn_auth_listener(self: &Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) -> JoinHandle<()> {
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ev) => gate.on_auth_event(ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "admin_gate.auth_events_lagged");
                        gate.invalidate();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn resolve_identity(&self) -> (Option<Identity>, Resolution) {
        let Some(identity) = self.session.current_identity() else {
            self.cache.clear();
            debug!("admin_gate.unauthenticated");
            return (None, Resolution::Unauthenticated);
        };
        if let Some(CacheEntry { role, .. }) = self.cache.get(&identity) {
            debug!(user = %identity, %role, "admin_gate.cache_hit");
            return (Some(identity), Resolution::Resolved(role));
        }
        let fut = self.join_or_start(&identity);
        (Some(identity), fut.await)
    }

    fn join_or_start(&self, identity: &Identity) -> LookupFuture {
        let mut slot = self.inflight.lock();
        let epoch = self.cache.epoch();
        if let Some(cur) = slot.as_ref() {
            if &cur.identity == identity && cur.epoch == epoch {
                debug!(user = %identity, "admin_gate.join_inflight");
                return cur.fut.clone();
            }
        }
        debug!(user = %identity, epoch, "admin_gate.cache_miss");

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let inflight = Arc::clone(&self.inflight);
        let id = identity.clone();
        let fut = async move {
            let res = lookup(provider.as_ref(), &cache, epoch, &id).await;
            let mut slot = inflight.lock();
            if slot.as_ref().is_some_and(|cur| cur.identity == id && cur.epoch == epoch) {
                *slot = None;
            }
            res
        }
        .boxed()
        .shared();

        *slot = Some(InFlight { identity: identity.clone(), epoch, fut: fut.clone() });
        fut
    }
}

async fn lookup(provider: &dyn RoleProvider, cache: &AuthCache, epoch: u64, identity: &Identity) -> Resolution {
    match provider.fetch_role(identity).await {
        Ok(Some(record)) => {
            let role = Role::classify(record.role.as_deref());
            if !cache.store(epoch, identity.clone(), role) {
                debug!(user = %identity, epoch, "admin_gate.stale_lookup_discarded");
            }
            debug!(user = %identity, %role, "admin_gate.resolved");
            Resolution::Resolved(role)
        }
        Ok(None) => {
            cache.clear_at(epoch);
            warn!(user = %identity, "admin_gate.lookup_failed: no profile record");
            Resolution::LookupFailed
        }
        Err(e) => {
            cache.clear_at(epoch);
            warn!(user = %identity, error = %e, "admin_gate.lookup_failed");
            Resolution::LookupFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::identity::provider::RoleRecord;
    use crate::identity::session::SessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        reply: Result<Option<RoleRecord>, BackendError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RoleProvider for Fixed {
        async fn fetch_role(&self, _identity: &Identity) -> Result<Option<RoleRecord>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn gate_with(reply: Result<Option<RoleRecord>, BackendError>) -> (Arc<SessionStore>, Arc<Fixed>, AdminGate) {
        let session = Arc::new(SessionStore::new());
        let provider = Arc::new(Fixed { reply, calls: AtomicUsize::new(0) });
        let gate = AdminGate::new(session.clone(), provider.clone(), Duration::from_secs(300));
        (session, provider, gate)
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_distinguishes_failure_from_plain_user() {
        let (session, _, gate) = gate_with(Err(BackendError::Transport("connection reset".into())));
        assert_eq!(gate.resolve().await, Resolution::Unauthenticated);
        session.sign_in(Identity::new("u1"), "t");
        assert_eq!(gate.resolve().await, Resolution::LookupFailed);

        let (session, _, gate) = gate_with(Ok(Some(RoleRecord::new("user"))));
        session.sign_in(Identity::new("u1"), "t");
        assert_eq!(gate.resolve().await, Resolution::Resolved(Role::User));
    }

    #[tokio::test(start_paused = true)]
    async fn null_role_resolves_to_user_and_is_cached() {
        let (session, provider, gate) = gate_with(Ok(Some(RoleRecord { role: None })));
        session.sign_in(Identity::new("u1"), "t");
        assert_eq!(gate.role().await, Role::User);
        assert!(!gate.is_admin().await);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_record_fails_closed_and_is_not_cached() {
        let (session, provider, gate) = gate_with(Ok(None));
        session.sign_in(Identity::new("u1"), "t");
        assert_eq!(gate.resolve().await, Resolution::LookupFailed);
        assert!(gate.cache().peek().is_none());
        assert!(!gate.is_admin().await);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn require_admin_returns_identity_or_unauthorized() {
        let (session, _, gate) = gate_with(Ok(Some(RoleRecord::new("ADMIN"))));
        assert!(gate.require_admin().await.unwrap_err().is_unauthorized());
        session.sign_in(Identity::new("root"), "t");
        assert_eq!(gate.require_admin().await.unwrap(), Identity::new("root"));

        let (session, _, gate) = gate_with(Ok(Some(RoleRecord::new("manager"))));
        session.sign_in(Identity::new("m"), "t");
        let err = gate.require_admin().await.unwrap_err();
        assert_eq!(err, AppError::unauthorized());
    }
}
