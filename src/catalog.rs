//! Reader-side operations: browsing published manuals, the notes feed, adding
//! notes and acknowledging a manual. None of these need the admin role; writes
//! need a signed-in identity.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::backend::{eq, order, Backend, Params};
use crate::error::{AppError, AppResult};
use crate::identity::{Identity, SessionSource};
use crate::model::*;
use crate::notes::NotesQuery;
use crate::validate;

pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> AppResult<Vec<T>> {
    rows.into_iter().map(|r| serde_json::from_value(r).map_err(AppError::from)).collect()
}

pub(crate) fn decode_row<T: DeserializeOwned>(row: Value) -> AppResult<T> {
    Ok(serde_json::from_value(row)?)
}

pub struct Catalog {
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionSource>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<dyn SessionSource>) -> Self { Self { backend, session } }

    fn signed_in(&self) -> AppResult<Identity> {
        self.session.current_identity().ok_or_else(AppError::unauthorized)
    }

    async fn rows<T: DeserializeOwned>(&self, table: &str, params: Params) -> AppResult<Vec<T>> {
        decode_rows(self.backend.select(table, &params).await?)
    }

    pub async fn list_published_manuals(&self) -> AppResult<Vec<Manual>> {
        self.rows(TABLE_MANUALS, vec![eq("is_published", true), order("title.asc")]).await
    }

    pub async fn manual(&self, id: Uuid) -> AppResult<Manual> {
        let mut found: Vec<Manual> = self.rows(TABLE_MANUALS, vec![eq("id", id), ("limit".into(), "1".into())]).await?;
        found.pop().ok_or_else(|| AppError::NotFound { code: "manual_not_found".into(), message: format!("manual {} not found", id) })
    }

    pub async fn sections(&self, manual_id: Uuid) -> AppResult<Vec<Section>> {
        self.rows(TABLE_SECTIONS, vec![eq("manual_id", manual_id), order("position.asc")]).await
    }

    pub async fn articles(&self, section_id: Uuid) -> AppResult<Vec<Article>> {
        self.rows(TABLE_ARTICLES, vec![eq("section_id", section_id), order("position.asc")]).await
    }

    pub async fn questions(&self, article_id: Uuid) -> AppResult<Vec<Question>> {
        self.rows(TABLE_QUESTIONS, vec![eq("article_id", article_id), order("id.asc")]).await
    }

    /// Reader feed. Hidden (moderated) notes are never included here regardless of
    /// what the query asks for; moderators use `AdminService::all_notes`.
    pub async fn notes(&self, query: &NotesQuery) -> AppResult<Page<ManualNote>> {
        let q = NotesQuery { include_hidden: false, ..query.clone() };
        let rows: Vec<ManualNote> = self.rows(VIEW_NOTES_WITH_STATS, q.to_params()).await?;
        Ok(q.into_page(rows))
    }

    pub async fn add_note(&self, draft: &NoteDraft) -> AppResult<ManualNote> {
        let user = self.signed_in()?;
        let draft = &draft.trimmed();
        validate::note(draft)?;
        let row = json!({
            "manual_id": draft.manual_id,
            "user_id": user.as_str(),
            "body": draft.body,
        });
        debug!(user = %user, manual = %draft.manual_id, "catalog.add_note");
        decode_row(self.backend.insert(TABLE_NOTES, row).await?)
    }

    pub async fn acknowledge_manual(&self, manual_id: Uuid) -> AppResult<()> {
        let user = self.signed_in()?;
        debug!(user = %user, manual = %manual_id, "catalog.acknowledge_manual");
        self.backend.rpc(RPC_ACKNOWLEDGE, json!({ "p_manual_id": manual_id })).await?;
        Ok(())
    }
}
