//! Note search criteria.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::html::strip_html;
use crate::models::Note;
use crate::temporal::DateRange;

/// Filter over an owner's notes.
///
/// All present criteria must hold: the text query is a case-insensitive
/// substring of the title or the stripped content, every listed tag is on
/// the note, and the date range matches `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl NoteQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// True when no criterion is set (matches every note).
    pub fn is_unfiltered(&self) -> bool {
        self.query.as_deref().map(str::trim).unwrap_or("").is_empty()
            && self.tags.is_empty()
            && self.date_range.is_none()
    }

    pub fn matches(&self, note: &Note, now: DateTime<Utc>) -> bool {
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let in_title = note.title.to_lowercase().contains(&needle);
            if !in_title && !strip_html(&note.content).to_lowercase().contains(&needle) {
                return false;
            }
        }
        if !self.tags.iter().all(|t| note.has_tag(t)) {
            return false;
        }
        match self.date_range {
            Some(range) => range.matches(note, now),
            None => true,
        }
    }

    /// Apply the filter to a slice, preserving order.
    pub fn filter<'a>(&self, notes: &'a [Note], now: DateTime<Utc>) -> Vec<&'a Note> {
        notes.iter().filter(|n| self.matches(n, now)).collect()
    }
}
