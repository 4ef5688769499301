//! Single-slot, time-boxed memo of the last resolved identity/role pair.
//!
//! The slot carries an epoch that `invalidate` bumps; writers must present the epoch
//! they observed when their lookup began, so a response that lands after an
//! invalidation is dropped instead of resurrecting stale privilege.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::principal::{Identity, Role};

pub const DEFAULT_ROLE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub identity: Identity,
    pub role: Role,
    pub resolved_at: Instant,
}

impl CacheEntry {
    pub fn is_admin(&self) -> bool { self.role.is_admin() }
}

#[derive(Debug, Default)]
struct Slot {
    entry: Option<CacheEntry>,
    epoch: u64,
}

#[derive(Debug)]
pub struct AuthCache {
    ttl: Duration,
    slot: Mutex<Slot>,
}

impl Default for AuthCache {
    fn default() -> Self { Self::new(DEFAULT_ROLE_TTL) }
}

impl AuthCache {
    pub fn new(ttl: Duration) -> Self { Self { ttl, slot: Mutex::new(Slot::default()) } }

    /// Fresh entry for `identity`, if any. An entry for a different identity or one
    /// at least `ttl` old is a miss.
    pub fn get(&self, identity: &Identity) -> Option<CacheEntry> {
        let slot = self.slot.lock();
        let ent = slot.entry.as_ref()?;
        if &ent.identity != identity { return None; }
        if ent.resolved_at.elapsed() >= self.ttl { return None; }
        Some(ent.clone())
    }

    pub fn epoch(&self) -> u64 { self.slot.lock().epoch }

    /// Store a resolution made under `epoch`. Returns false (and stores nothing) when
    /// the cache was invalidated since then.
    pub fn store(&self, epoch: u64, identity: Identity, role: Role) -> bool {
        let mut slot = self.slot.lock();
        if slot.epoch != epoch { return false; }
        let mut resolved_at = Instant::now();
        if let Some(prev) = slot.entry.as_ref() {
            if prev.identity == identity && prev.resolved_at > resolved_at {
                resolved_at = prev.resolved_at;
            }
        }
        slot.entry = Some(CacheEntry { identity, role, resolved_at });
        true
    }

    /// Drop the entry without touching the epoch. Used when the session is gone;
    /// in-flight lookups stay eligible to store.
    pub fn clear(&self) { self.slot.lock().entry = None; }

    /// Drop the entry for a failed lookup made under `epoch`. A no-op once the cache
    /// has moved to a newer epoch, whose entry the failure knows nothing about.
    pub fn clear_at(&self, epoch: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.epoch != epoch { return false; }
        slot.entry = None;
        true
    }

    /// Drop the entry and bump the epoch. Returns the new epoch.
    pub fn invalidate(&self) -> u64 {
        let mut slot = self.slot.lock();
        slot.entry = None;
        slot.epoch += 1;
        slot.epoch
    }

    pub fn peek(&self) -> Option<CacheEntry> { self.slot.lock().entry.clone() }
}
