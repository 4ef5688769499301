//! In-memory backend used by the integration tests. Tables are JSON rows with a
//! generated `id`; selects honour `eq.` filters plus `limit`/`offset`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use manualbase::backend::{Backend, BackendError};
use manualbase::config::ClientConfig;
use manualbase::identity::{Identity, RoleProvider, RoleRecord, SessionStore};
use manualbase::ManualClient;

#[derive(Default)]
pub struct FakeBackend {
    roles: Mutex<HashMap<String, Result<Option<RoleRecord>, BackendError>>>,
    lookup_delay: Mutex<Option<Duration>>,
    pub role_calls: AtomicUsize,
    pub writes: AtomicUsize,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    rpc_replies: Mutex<HashMap<String, Value>>,
    pub rpc_calls: Mutex<Vec<(String, Value)>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn set_role(&self, user: &str, role: Option<&str>) {
        self.roles.lock().insert(user.to_string(), Ok(Some(RoleRecord { role: role.map(str::to_string) })));
    }

    pub fn set_role_error(&self, user: &str, err: BackendError) {
        self.roles.lock().insert(user.to_string(), Err(err));
    }

    pub fn remove_profile(&self, user: &str) { self.roles.lock().remove(user); }

    /// Make every role lookup sleep first (pairs with paused tokio time).
    pub fn set_lookup_delay(&self, d: Duration) { *self.lookup_delay.lock() = Some(d); }

    pub fn set_rpc_reply(&self, name: &str, reply: Value) { self.rpc_replies.lock().insert(name.to_string(), reply); }

    pub fn seed(&self, table: &str, row: Value) { self.tables.lock().entry(table.to_string()).or_default().push(row); }

    pub fn rows(&self, table: &str) -> Vec<Value> { self.tables.lock().get(table).cloned().unwrap_or_default() }

    pub fn role_calls(&self) -> usize { self.role_calls.load(Ordering::SeqCst) }

    pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }
}

fn cell(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RoleProvider for FakeBackend {
    async fn fetch_role(&self, identity: &Identity) -> Result<Option<RoleRecord>, BackendError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.lookup_delay.lock();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.roles.lock().get(identity.as_str()).cloned().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn select(&self, table: &str, params: &[(String, String)]) -> Result<Vec<Value>, BackendError> {
        let mut rows = self.rows(table);
        let mut limit = usize::MAX;
        let mut offset = 0usize;
        for (k, v) in params {
            match k.as_str() {
                "select" | "order" => {}
                "limit" => limit = v.parse().unwrap_or(usize::MAX),
                "offset" => offset = v.parse().unwrap_or(0),
                col => {
                    if let Some(want) = v.strip_prefix("eq.") {
                        rows.retain(|r| r.get(col).map(cell).as_deref() == Some(want));
                    }
                }
            }
        }
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value, BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(obj) = row.as_object_mut() {
            obj.entry("id").or_insert_with(|| json!(uuid::Uuid::new_v4()));
            obj.entry("created_at").or_insert_with(|| json!("2026-10-01T12:00:00Z"));
        }
        self.seed(table, row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").map(cell).as_deref() == Some(id))
            .ok_or_else(|| BackendError::NotFound(format!("{} {}", table, id)))?;
        if let (Some(dst), Some(src)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in src {
                dst.insert(k.clone(), v.clone());
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(rows) = self.tables.lock().get_mut(table) {
            rows.retain(|r| r.get("id").map(cell).as_deref() != Some(id));
        }
        Ok(())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.rpc_calls.lock().push((name.to_string(), args));
        Ok(self.rpc_replies.lock().get(name).cloned().unwrap_or(Value::Null))
    }
}

pub fn client_with(backend: &Arc<FakeBackend>) -> ManualClient {
    let cfg = ClientConfig::new("http://fake.invalid", "anon");
    ManualClient::assemble(&cfg, Arc::new(SessionStore::new()), backend.clone())
}
