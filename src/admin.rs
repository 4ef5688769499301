//! Privileged operations: manual/section/article/question CRUD, publish and version
//! toggles, admin statistics and note moderation.
//!
//! Every method consults the admin gate first and returns `AppError::Unauthorized`
//! before validating input or touching the backend. The backend's own RPCs re-check
//! privilege server side.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::Backend;
use crate::catalog::{decode_row, decode_rows};
use crate::error::{AppError, AppResult};
use crate::identity::AdminGate;
use crate::model::*;
use crate::notes::NotesQuery;
use crate::validate;

pub struct AdminService {
    gate: Arc<AdminGate>,
    backend: Arc<dyn Backend>,
}

impl AdminService {
    pub fn new(gate: Arc<AdminGate>, backend: Arc<dyn Backend>) -> Self { Self { gate, backend } }

    async fn insert<D: Serialize, T: serde::de::DeserializeOwned>(&self, table: &str, draft: &D) -> AppResult<T> {
        let row = serde_json::to_value(draft)?;
        decode_row(self.backend.insert(table, row).await?)
    }

    async fn update<D: Serialize, T: serde::de::DeserializeOwned>(&self, table: &str, id: Uuid, draft: &D) -> AppResult<T> {
        let patch = serde_json::to_value(draft)?;
        decode_row(self.backend.update(table, &id.to_string(), patch).await?)
    }

    async fn delete(&self, table: &str, id: Uuid) -> AppResult<()> {
        self.backend.delete(table, &id.to_string()).await?;
        Ok(())
    }

    // --- manuals ---

    pub async fn create_manual(&self, draft: &ManualDraft) -> AppResult<Manual> {
        let admin = self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::manual(draft)?;
        info!(user = %admin, title = %draft.title, "admin.create_manual");
        self.insert(TABLE_MANUALS, draft).await
    }

    /// Replaces the editable fields. `description: None` clears the stored description.
    pub async fn update_manual(&self, id: Uuid, draft: &ManualDraft) -> AppResult<Manual> {
        let admin = self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::manual(draft)?;
        info!(user = %admin, manual = %id, "admin.update_manual");
        self.update(TABLE_MANUALS, id, draft).await
    }

    pub async fn delete_manual(&self, id: Uuid) -> AppResult<()> {
        let admin = self.gate.require_admin().await?;
        info!(user = %admin, manual = %id, "admin.delete_manual");
        self.delete(TABLE_MANUALS, id).await
    }

    /// Flip `is_published`; returns the new state reported by the backend.
    pub async fn toggle_manual_publish(&self, manual_id: Uuid) -> AppResult<bool> {
        let admin = self.gate.require_admin().await?;
        let v = self.backend.rpc(RPC_TOGGLE_PUBLISH, json!({ "p_manual_id": manual_id })).await?;
        let published = published_flag(&v)
            .ok_or_else(|| AppError::backend("decode_error".to_string(), format!("unexpected {} reply: {}", RPC_TOGGLE_PUBLISH, v)))?;
        info!(user = %admin, manual = %manual_id, published, "admin.toggle_manual_publish");
        Ok(published)
    }

    /// Bump the manual version; returns the new version number.
    pub async fn increment_manual_version(&self, manual_id: Uuid) -> AppResult<i64> {
        let admin = self.gate.require_admin().await?;
        let v = self.backend.rpc(RPC_INCREMENT_VERSION, json!({ "p_manual_id": manual_id })).await?;
        let version = version_number(&v)
            .ok_or_else(|| AppError::backend("decode_error".to_string(), format!("unexpected {} reply: {}", RPC_INCREMENT_VERSION, v)))?;
        info!(user = %admin, manual = %manual_id, version, "admin.increment_manual_version");
        Ok(version)
    }

    pub async fn manual_admin_stats(&self, manual_id: Uuid) -> AppResult<ManualAdminStats> {
        self.gate.require_admin().await?;
        let v = self.backend.rpc(RPC_ADMIN_STATS, json!({ "p_manual_id": manual_id })).await?;
        // set-returning functions come back as a one-row array
        let row = match v {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Value::Array(_) | Value::Null => {
                return Err(AppError::NotFound { code: "stats_not_found".into(), message: format!("no statistics for manual {}", manual_id) })
            }
            other => other,
        };
        decode_row(row)
    }

    // --- sections / articles / questions ---

    pub async fn create_section(&self, draft: &SectionDraft) -> AppResult<Section> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::section(draft)?;
        self.insert(TABLE_SECTIONS, draft).await
    }

    pub async fn update_section(&self, id: Uuid, draft: &SectionDraft) -> AppResult<Section> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::section(draft)?;
        self.update(TABLE_SECTIONS, id, draft).await
    }

    pub async fn delete_section(&self, id: Uuid) -> AppResult<()> {
        self.gate.require_admin().await?;
        self.delete(TABLE_SECTIONS, id).await
    }

    pub async fn create_article(&self, draft: &ArticleDraft) -> AppResult<Article> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::article(draft)?;
        self.insert(TABLE_ARTICLES, draft).await
    }

    pub async fn update_article(&self, id: Uuid, draft: &ArticleDraft) -> AppResult<Article> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::article(draft)?;
        self.update(TABLE_ARTICLES, id, draft).await
    }

    pub async fn delete_article(&self, id: Uuid) -> AppResult<()> {
        self.gate.require_admin().await?;
        self.delete(TABLE_ARTICLES, id).await
    }

    pub async fn create_question(&self, draft: &QuestionDraft) -> AppResult<Question> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::question(draft)?;
        self.insert(TABLE_QUESTIONS, draft).await
    }

    pub async fn update_question(&self, id: Uuid, draft: &QuestionDraft) -> AppResult<Question> {
        self.gate.require_admin().await?;
        let draft = &draft.trimmed();
        validate::question(draft)?;
        self.update(TABLE_QUESTIONS, id, draft).await
    }

    pub async fn delete_question(&self, id: Uuid) -> AppResult<()> {
        self.gate.require_admin().await?;
        self.delete(TABLE_QUESTIONS, id).await
    }

    // --- note moderation ---

    /// Moderation feed: hidden notes included.
    pub async fn all_notes(&self, query: &NotesQuery) -> AppResult<Page<ManualNote>> {
        self.gate.require_admin().await?;
        let q = NotesQuery { include_hidden: true, ..query.clone() };
        let rows = self.backend.select(VIEW_NOTES_WITH_STATS, &q.to_params()).await?;
        Ok(q.into_page(decode_rows(rows)?))
    }

    pub async fn set_note_hidden(&self, note_id: Uuid, hidden: bool) -> AppResult<()> {
        let admin = self.gate.require_admin().await?;
        debug!(user = %admin, note = %note_id, hidden, "admin.set_note_hidden");
        self.backend.update(TABLE_NOTES, &note_id.to_string(), json!({ "is_hidden": hidden })).await?;
        Ok(())
    }

    pub async fn delete_note(&self, note_id: Uuid) -> AppResult<()> {
        let admin = self.gate.require_admin().await?;
        debug!(user = %admin, note = %note_id, "admin.delete_note");
        self.delete(TABLE_NOTES, note_id).await
    }
}

/// Accept a bare boolean or a row carrying `is_published`.
fn published_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Object(m) => m.get("is_published").and_then(Value::as_bool),
        Value::Array(rows) => rows.first().and_then(published_flag),
        _ => None,
    }
}

/// Accept a bare integer or a row carrying `version`.
fn version_number(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::Object(m) => m.get("version").and_then(Value::as_i64),
        Value::Array(rows) => rows.first().and_then(version_number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_reply_shapes() {
        assert_eq!(published_flag(&json!(true)), Some(true));
        assert_eq!(published_flag(&json!({"id": "x", "is_published": false})), Some(false));
        assert_eq!(published_flag(&json!([{"is_published": true}])), Some(true));
        assert_eq!(published_flag(&json!("yes")), None);

        assert_eq!(version_number(&json!(4)), Some(4));
        assert_eq!(version_number(&json!({"version": 7})), Some(7));
        assert_eq!(version_number(&json!([])), None);
    }
}
