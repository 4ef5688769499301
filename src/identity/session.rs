use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::info;

use super::principal::Identity;

/// Session lifecycle notifications. Subscribers (the admin gate in particular) treat
/// every variant as "privilege state may have changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
}

/// Read side of a session that the admin gate depends on.
pub trait SessionSource: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

/// Process-local holder of the current auth session. Owned by the composition root
/// and shared via `Arc`; there is at most one signed-in identity at a time.
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { current: RwLock::new(None), events }
    }

    pub fn sign_in<S: Into<String>>(&self, identity: Identity, access_token: S) -> Session {
        let sess = Session { identity: identity.clone(), access_token: access_token.into() };
        *self.current.write() = Some(sess.clone());
        info!(user = %identity, "session.sign_in");
        self.emit(AuthEvent::SignedIn);
        sess
    }

    /// Swap the access token of the current session. Returns false when nobody is signed in.
    pub fn refresh_token<S: Into<String>>(&self, access_token: S) -> bool {
        let refreshed = {
            let mut cur = self.current.write();
            match cur.as_mut() {
                Some(sess) => {
                    sess.access_token = access_token.into();
                    true
                }
                None => false,
            }
        };
        if refreshed {
            info!("session.token_refreshed");
            self.emit(AuthEvent::TokenRefreshed);
        }
        refreshed
    }

    pub fn sign_out(&self) -> bool {
        let prev = self.current.write().take();
        match prev {
            Some(sess) => {
                info!(user = %sess.identity, "session.sign_out");
                self.emit(AuthEvent::SignedOut);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<Session> { self.current.read().clone() }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

    fn emit(&self, ev: AuthEvent) {
        // No receivers is fine: nothing is listening yet
        let _ = self.events.send(ev);
    }
}

impl SessionSource for SessionStore {
    fn current_identity(&self) -> Option<Identity> {
        self.current.read().as_ref().map(|s| s.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_emits_events_in_order() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.sign_in(Identity::new("u1"), "t1");
        assert!(store.refresh_token("t2"));
        assert_eq!(store.access_token().as_deref(), Some("t2"));
        assert!(store.sign_out());

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedIn);
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::TokenRefreshed);
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(store.current_identity().is_none());
    }

    #[test]
    fn refresh_and_sign_out_without_session_are_noops() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert!(!store.refresh_token("t"));
        assert!(!store.sign_out());
        assert!(rx.try_recv().is_err());
    }
}
