//! Backend payload types. The backend owns these rows; the client only decodes
//! them and builds drafts for writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TABLE_MANUALS: &str = "manuals";
pub const TABLE_SECTIONS: &str = "sections";
pub const TABLE_ARTICLES: &str = "articles";
pub const TABLE_QUESTIONS: &str = "questions";
pub const TABLE_NOTES: &str = "manual_notes";
pub const VIEW_NOTES_WITH_STATS: &str = "v_manual_notes_with_stats";

pub const RPC_TOGGLE_PUBLISH: &str = "toggle_manual_publish";
pub const RPC_INCREMENT_VERSION: &str = "increment_manual_version";
pub const RPC_ADMIN_STATS: &str = "get_manual_admin_stats";
pub const RPC_ACKNOWLEDGE: &str = "acknowledge_manual";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manual {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default = "first_version")]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn first_version() -> i64 { 1 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub manual_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub position: i32,
}

/// Quiz question attached to an article. `correct_index` points into `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub article_id: Uuid,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Row of `v_manual_notes_with_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualNote {
    pub id: Uuid,
    pub manual_id: Uuid,
    pub user_id: String,
    pub body: String,
    #[serde(default)]
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub replies: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAdminStats {
    pub manual_id: Uuid,
    #[serde(default)]
    pub readers: i64,
    #[serde(default)]
    pub acknowledgements: i64,
    #[serde(default)]
    pub notes: i64,
    #[serde(default)]
    pub questions: i64,
}

/// Editable fields of a manual. Sent whole on update, so `description: None`
/// clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualDraft {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub manual_id: Uuid,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub section_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub article_id: Uuid,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub manual_id: Uuid,
    pub body: String,
}

impl ManualDraft {
    /// Copy with surrounding whitespace removed; a blank description becomes `None`.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
        }
    }
}

impl SectionDraft {
    pub fn trimmed(&self) -> Self { Self { title: self.title.trim().to_string(), ..self.clone() } }
}

impl ArticleDraft {
    pub fn trimmed(&self) -> Self {
        Self { title: self.title.trim().to_string(), body: self.body.trim().to_string(), ..self.clone() }
    }
}

impl QuestionDraft {
    pub fn trimmed(&self) -> Self {
        Self {
            prompt: self.prompt.trim().to_string(),
            options: self.options.iter().map(|o| o.trim().to_string()).collect(),
            ..self.clone()
        }
    }
}

impl NoteDraft {
    pub fn trimmed(&self) -> Self { Self { body: self.body.trim().to_string(), ..self.clone() } }
}

/// One page of a feed plus whether another page follows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_defaults_fill_missing_columns() {
        let v = serde_json::json!({
            "id": "6f1c1f5e-1b8e-4a2b-9f0a-1f2e3d4c5b6a",
            "title": "Forklift safety",
            "created_at": "2026-01-05T10:00:00Z"
        });
        let m: Manual = serde_json::from_value(v).unwrap();
        assert_eq!(m.version, 1);
        assert!(!m.is_published);
        assert!(m.description.is_none());
    }

    #[test]
    fn manual_draft_sends_null_description() {
        let v = serde_json::to_value(ManualDraft { title: "T".into(), description: None }).unwrap();
        assert_eq!(v["description"], serde_json::Value::Null);
    }

    #[test]
    fn trimmed_drafts() {
        let m = ManualDraft { title: "  Forklift  ".into(), description: Some("   ".into()) }.trimmed();
        assert_eq!(m.title, "Forklift");
        assert!(m.description.is_none());

        let q = QuestionDraft {
            article_id: Uuid::nil(),
            prompt: " Which? ".into(),
            options: vec![" a ".into(), "b\n".into()],
            correct_index: 0,
        }
        .trimmed();
        assert_eq!(q.prompt, "Which?");
        assert_eq!(q.options, vec!["a".to_string(), "b".to_string()]);
    }
}
