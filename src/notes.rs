//! Pagination and sort plumbing for the notes feed (`v_manual_notes_with_stats`).

use uuid::Uuid;

use crate::backend::{eq, order, Params};
use crate::model::Page;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteSort {
    #[default]
    Newest,
    Oldest,
    MostLiked,
}

impl NoteSort {
    pub fn order_spec(self) -> &'static str {
        match self {
            NoteSort::Newest => "created_at.desc",
            NoteSort::Oldest => "created_at.asc",
            // tie-break so pages stay stable between requests
            NoteSort::MostLiked => "likes.desc,created_at.desc",
        }
    }

    pub fn parse(raw: &str) -> Option<NoteSort> {
        match raw.to_ascii_lowercase().as_str() {
            "newest" | "new" => Some(NoteSort::Newest),
            "oldest" | "old" => Some(NoteSort::Oldest),
            "most_liked" | "liked" | "top" => Some(NoteSort::MostLiked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesQuery {
    pub manual_id: Option<Uuid>,
    /// Zero based.
    pub page: u32,
    pub page_size: u32,
    pub sort: NoteSort,
    pub include_hidden: bool,
}

impl Default for NotesQuery {
    fn default() -> Self {
        Self { manual_id: None, page: 0, page_size: DEFAULT_PAGE_SIZE, sort: NoteSort::default(), include_hidden: false }
    }
}

impl NotesQuery {
    pub fn for_manual(manual_id: Uuid) -> Self { Self { manual_id: Some(manual_id), ..Self::default() } }

    pub fn page(mut self, page: u32) -> Self { self.page = page; self }
    pub fn page_size(mut self, size: u32) -> Self { self.page_size = size; self }
    pub fn sort(mut self, sort: NoteSort) -> Self { self.sort = sort; self }
    pub fn include_hidden(mut self, yes: bool) -> Self { self.include_hidden = yes; self }

    pub fn effective_page_size(&self) -> u32 { self.page_size.clamp(1, MAX_PAGE_SIZE) }

    pub fn offset(&self) -> u64 { self.page as u64 * self.effective_page_size() as u64 }

    /// PostgREST parameters. One row beyond the page is requested so the caller can
    /// tell whether another page exists without a count query.
    pub fn to_params(&self) -> Params {
        let mut params: Params = vec![("select".to_string(), "*".to_string())];
        if let Some(id) = self.manual_id {
            params.push(eq("manual_id", id));
        }
        if !self.include_hidden {
            params.push(eq("is_hidden", false));
        }
        params.push(order(self.sort.order_spec()));
        params.push(("limit".to_string(), (self.effective_page_size() + 1).to_string()));
        params.push(("offset".to_string(), self.offset().to_string()));
        params
    }

    /// Trim the look-ahead row fetched by `to_params` and record whether it existed.
    pub fn into_page<T>(&self, mut rows: Vec<T>) -> Page<T> {
        let size = self.effective_page_size();
        let has_more = rows.len() > size as usize;
        rows.truncate(size as usize);
        Page { items: rows, page: self.page, page_size: size, has_more }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn defaults_hide_moderated_notes_newest_first() {
        let p = NotesQuery::default().to_params();
        assert_eq!(get(&p, "is_hidden"), Some("eq.false"));
        assert_eq!(get(&p, "order"), Some("created_at.desc"));
        assert_eq!(get(&p, "limit"), Some("21"));
        assert_eq!(get(&p, "offset"), Some("0"));
        assert_eq!(get(&p, "manual_id"), None);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(NotesQuery::default().page_size(0).effective_page_size(), 1);
        assert_eq!(NotesQuery::default().page_size(500).effective_page_size(), 100);
        let q = NotesQuery::default().page_size(500).page(3);
        assert_eq!(q.offset(), 300);
        assert_eq!(get(&q.to_params(), "limit"), Some("101"));
    }

    #[test]
    fn manual_filter_sort_and_hidden() {
        let id = Uuid::nil();
        let p = NotesQuery::for_manual(id).sort(NoteSort::MostLiked).include_hidden(true).to_params();
        assert_eq!(get(&p, "manual_id"), Some("eq.00000000-0000-0000-0000-000000000000"));
        assert_eq!(get(&p, "order"), Some("likes.desc,created_at.desc"));
        assert_eq!(get(&p, "is_hidden"), None);
    }

    #[test]
    fn into_page_drops_lookahead_row() {
        let q = NotesQuery::default().page_size(2);
        let page = q.into_page(vec![1, 2, 3]);
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);
        let last = q.into_page(vec![4]);
        assert!(!last.has_more);
    }

    #[test]
    fn sort_parse() {
        assert_eq!(NoteSort::parse("Top"), Some(NoteSort::MostLiked));
        assert_eq!(NoteSort::parse("oldest"), Some(NoteSort::Oldest));
        assert_eq!(NoteSort::parse("random"), None);
    }
}
