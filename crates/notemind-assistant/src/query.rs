//! Read-only actions over the notes fetched for the turn.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use notemind_core::defaults::SEARCH_PREVIEW_LIMIT;
use notemind_core::{Note, NoteQuery};

use crate::action::SummaryKind;

/// Matches for a search, in list order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub notes: Vec<Note>,
    pub note_ids: Vec<i64>,
    pub total: usize,
}

pub fn search(notes: &[Note], query: &NoteQuery, now: DateTime<Utc>) -> SearchResult {
    let matched: Vec<Note> = query.filter(notes, now).into_iter().cloned().collect();
    SearchResult {
        note_ids: matched.iter().map(|n| n.id).collect(),
        total: matched.len(),
        notes: matched,
    }
}

/// Up to five titles, then an overflow count.
pub fn describe_search(result: &SearchResult) -> String {
    if result.notes.is_empty() {
        return "I couldn't find any notes matching that.".to_string();
    }
    let noun = if result.total == 1 { "note" } else { "notes" };
    let mut out = format!("I found {} {}:", result.total, noun);
    for note in result.notes.iter().take(SEARCH_PREVIEW_LIMIT) {
        out.push_str(&format!("\n- {} (#{})", note.title, note.id));
    }
    if result.total > SEARCH_PREVIEW_LIMIT {
        out.push_str(&format!("\n...and {} more.", result.total - SEARCH_PREVIEW_LIMIT));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Short note reference for summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRef {
    pub id: i64,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Summary {
    #[serde(rename_all = "camelCase")]
    Overview {
        total: usize,
        pinned: usize,
        tag_count: usize,
        tags: Vec<String>,
    },
    ByTag {
        tags: Vec<TagCount>,
    },
    Recent {
        notes: Vec<NoteRef>,
    },
}

pub fn summarize(notes: &[Note], kind: SummaryKind) -> Summary {
    match kind {
        SummaryKind::Overview => {
            let mut tags: Vec<String> = notes.iter().flat_map(|n| n.tags.iter().cloned()).collect();
            tags.sort();
            tags.dedup();
            Summary::Overview {
                total: notes.len(),
                pinned: notes.iter().filter(|n| n.pinned).count(),
                tag_count: tags.len(),
                tags,
            }
        }
        SummaryKind::ByTag => {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for tag in notes.iter().flat_map(|n| n.tags.iter()) {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
            let mut tags: Vec<TagCount> = counts
                .into_iter()
                .map(|(tag, count)| TagCount {
                    tag: tag.to_string(),
                    count,
                })
                .collect();
            // Stable sort keeps ties in name order.
            tags.sort_by(|a, b| b.count.cmp(&a.count));
            Summary::ByTag { tags }
        }
        SummaryKind::Recent { count } => {
            let mut sorted: Vec<&Note> = notes.iter().collect();
            sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
            Summary::Recent {
                notes: sorted
                    .into_iter()
                    .take(count)
                    .map(|n| NoteRef {
                        id: n.id,
                        title: n.title.clone(),
                        updated_at: n.updated_at,
                    })
                    .collect(),
            }
        }
    }
}

pub fn describe_summary(summary: &Summary) -> String {
    match summary {
        Summary::Overview {
            total,
            pinned,
            tag_count,
            tags,
        } => {
            let mut out = format!(
                "You have {} note{}, {} pinned, using {} tag{}.",
                total,
                if *total == 1 { "" } else { "s" },
                pinned,
                tag_count,
                if *tag_count == 1 { "" } else { "s" },
            );
            if !tags.is_empty() {
                out.push_str(&format!(" Tags: {}.", tags.join(", ")));
            }
            out
        }
        Summary::ByTag { tags } => {
            if tags.is_empty() {
                return "None of your notes are tagged yet.".to_string();
            }
            let mut out = String::from("Notes per tag:");
            for t in tags {
                out.push_str(&format!("\n- {}: {}", t.tag, t.count));
            }
            out
        }
        Summary::Recent { notes } => {
            if notes.is_empty() {
                return "You don't have any notes yet.".to_string();
            }
            let mut out = String::from("Your most recent notes:");
            for n in notes {
                out.push_str(&format!(
                    "\n- {} (#{}, updated {})",
                    n.title,
                    n.id,
                    n.updated_at.format("%Y-%m-%d")
                ));
            }
            out
        }
    }
}
