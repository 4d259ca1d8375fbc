//! Action schema and validation.
//!
//! A proposal is the untyped object the model returned. Validation turns it
//! into a typed [`Action`], a clarification request, or an unknown-action
//! no-op. Nothing here touches the note store.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use notemind_core::defaults::{RECENT_SUMMARY_COUNT, UNTITLED_NOTE};
use notemind_core::{DateRange, NoteQuery};

/// The closed set of actions the assistant can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    CreateNote,
    CreateMultipleNotes,
    UpdateNote,
    PinNote,
    DeleteNote,
    DeleteMultipleNotes,
    RequestDeleteConfirmation,
    SearchNotes,
    SummarizeNotes,
    AnswerQuestion,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::CreateNote,
        ActionKind::CreateMultipleNotes,
        ActionKind::UpdateNote,
        ActionKind::PinNote,
        ActionKind::DeleteNote,
        ActionKind::DeleteMultipleNotes,
        ActionKind::RequestDeleteConfirmation,
        ActionKind::SearchNotes,
        ActionKind::SummarizeNotes,
        ActionKind::AnswerQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateNote => "CREATE_NOTE",
            ActionKind::CreateMultipleNotes => "CREATE_MULTIPLE_NOTES",
            ActionKind::UpdateNote => "UPDATE_NOTE",
            ActionKind::PinNote => "PIN_NOTE",
            ActionKind::DeleteNote => "DELETE_NOTE",
            ActionKind::DeleteMultipleNotes => "DELETE_MULTIPLE_NOTES",
            ActionKind::RequestDeleteConfirmation => "REQUEST_DELETE_CONFIRMATION",
            ActionKind::SearchNotes => "SEARCH_NOTES",
            ActionKind::SummarizeNotes => "SUMMARIZE_NOTES",
            ActionKind::AnswerQuestion => "ANSWER_QUESTION",
        }
    }

    /// Parse a kind name, tolerating case and `-`/space separators.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Parameter documentation for the capability manifest:
    /// (required, optional, example parameters).
    pub fn parameter_docs(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ActionKind::CreateNote => (
                "title",
                "content, tags",
                r#"{"title":"Groceries","content":"milk, eggs","tags":["shopping"]}"#,
            ),
            ActionKind::CreateMultipleNotes => (
                "notes (list of {title, content?, tags?})",
                "",
                r#"{"notes":[{"title":"Day 1"},{"title":"Day 2","tags":["trip"]}]}"#,
            ),
            ActionKind::UpdateNote => (
                "noteId, title",
                "content, tags",
                r#"{"noteId":42,"title":"Groceries (updated)","content":"milk"}"#,
            ),
            ActionKind::PinNote => ("noteId", "", r#"{"noteId":42}"#),
            ActionKind::DeleteNote => ("noteId", "", r#"{"noteId":42}"#),
            ActionKind::DeleteMultipleNotes => ("noteIds", "", r#"{"noteIds":[3,7]}"#),
            ActionKind::RequestDeleteConfirmation => (
                "noteIds, reason",
                "",
                r#"{"noteIds":[3,7],"reason":"These are your notes tagged \"old\"."}"#,
            ),
            ActionKind::SearchNotes => (
                "",
                "query, tags, dateRange (today, this_week, last_week, last_month, last_year, pinned)",
                r#"{"query":"budget","tags":["work"],"dateRange":"this_week"}"#,
            ),
            ActionKind::SummarizeNotes => (
                "type (overview, by_tag, recent)",
                "count (recent only)",
                r#"{"type":"recent","count":3}"#,
            ),
            ActionKind::AnswerQuestion => ("", "", "{}"),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The untyped action object returned by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionProposal {
    pub kind: String,
    pub parameters: Map<String, Value>,
    pub message: String,
}

impl ActionProposal {
    /// Read a proposal from an unwrapped JSON object.
    ///
    /// The kind is read from `action` (or `type`), parameters from
    /// `parameters` (or `params`). A missing kind means a plain answer.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let kind = obj
            .get("action")
            .or_else(|| obj.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("ANSWER_QUESTION")
            .to_string();
        let parameters = obj
            .get("parameters")
            .or_else(|| obj.get("params"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let message = obj
            .get("message")
            .or_else(|| obj.get("response"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            kind,
            parameters,
            message,
        }
    }

    /// A plain-text reply wrapped as an answer.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::AnswerQuestion.as_str().to_string(),
            parameters: Map::new(),
            message: text.into(),
        }
    }
}

/// A note to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Summary flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Overview,
    ByTag,
    Recent { count: usize },
}

/// A validated action with typed parameters.
///
/// Batch deletes have no variant here. They run only from a confirmed
/// [`crate::confirmation::PendingConfirmation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateNote(NoteDraft),
    CreateMultipleNotes(Vec<NoteDraft>),
    UpdateNote {
        note_id: i64,
        title: String,
        content: Option<String>,
        tags: Option<Vec<String>>,
    },
    PinNote {
        note_id: i64,
    },
    DeleteNote {
        note_id: i64,
    },
    RequestDeleteConfirmation {
        note_ids: Vec<i64>,
        reason: String,
    },
    SearchNotes(NoteQuery),
    SummarizeNotes(SummaryKind),
    AnswerQuestion {
        message: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateNote(_) => ActionKind::CreateNote,
            Action::CreateMultipleNotes(_) => ActionKind::CreateMultipleNotes,
            Action::UpdateNote { .. } => ActionKind::UpdateNote,
            Action::PinNote { .. } => ActionKind::PinNote,
            Action::DeleteNote { .. } => ActionKind::DeleteNote,
            Action::RequestDeleteConfirmation { .. } => ActionKind::RequestDeleteConfirmation,
            Action::SearchNotes(_) => ActionKind::SearchNotes,
            Action::SummarizeNotes(_) => ActionKind::SummarizeNotes,
            Action::AnswerQuestion { .. } => ActionKind::AnswerQuestion,
        }
    }

    /// Parameters echoed back to the client, in wire naming.
    pub fn parameters(&self) -> Value {
        match self {
            Action::CreateNote(draft) => draft_json(draft),
            Action::CreateMultipleNotes(drafts) => {
                json!({ "notes": drafts.iter().map(draft_json).collect::<Vec<_>>() })
            }
            Action::UpdateNote {
                note_id,
                title,
                content,
                tags,
            } => {
                let mut obj = json!({ "noteId": note_id, "title": title });
                if let Some(content) = content {
                    obj["content"] = json!(content);
                }
                if let Some(tags) = tags {
                    obj["tags"] = json!(tags);
                }
                obj
            }
            Action::PinNote { note_id } | Action::DeleteNote { note_id } => {
                json!({ "noteId": note_id })
            }
            Action::RequestDeleteConfirmation { note_ids, reason } => {
                json!({ "noteIds": note_ids, "reason": reason })
            }
            Action::SearchNotes(query) => serde_json::to_value(query).unwrap_or(Value::Null),
            Action::SummarizeNotes(kind) => match kind {
                SummaryKind::Overview => json!({ "type": "overview" }),
                SummaryKind::ByTag => json!({ "type": "by_tag" }),
                SummaryKind::Recent { count } => json!({ "type": "recent", "count": count }),
            },
            Action::AnswerQuestion { .. } => json!({}),
        }
    }
}

fn draft_json(draft: &NoteDraft) -> Value {
    json!({ "title": draft.title, "content": draft.content, "tags": draft.tags })
}

/// Result of validating a proposal.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// Ready to execute.
    Action(Action),
    /// A required parameter is missing or malformed. Nothing is executed and
    /// the user is asked for the missing piece.
    Clarify { kind: ActionKind, message: String },
    /// The model named an action outside the schema.
    Unknown { name: String },
}

/// Validate a proposal against the action schema.
///
/// Batch deletions proposed directly by the model never execute here: two or
/// more ids become a confirmation request, and a single id becomes an ordinary
/// single-note delete. Executing a confirmed batch goes through
/// [`crate::confirmation::PendingConfirmation::confirm`] instead.
pub fn validate(proposal: &ActionProposal) -> Validated {
    let Some(kind) = ActionKind::parse(&proposal.kind) else {
        return Validated::Unknown {
            name: proposal.kind.clone(),
        };
    };
    let params = &proposal.parameters;
    let clarify = |message: &str| Validated::Clarify {
        kind,
        message: message.to_string(),
    };

    let action = match kind {
        ActionKind::CreateNote => {
            let Some(title) = string_param(params, "title") else {
                return clarify("What should the new note be titled?");
            };
            Action::CreateNote(NoteDraft {
                title,
                content: string_param(params, "content").unwrap_or_default(),
                tags: tags_param(params).unwrap_or_default(),
            })
        }
        ActionKind::CreateMultipleNotes => {
            let drafts: Vec<NoteDraft> = params
                .get("notes")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|item| NoteDraft {
                            title: string_param(item, "title")
                                .unwrap_or_else(|| UNTITLED_NOTE.to_string()),
                            content: string_param(item, "content").unwrap_or_default(),
                            tags: tags_param(item).unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            if drafts.is_empty() {
                return clarify("Which notes would you like me to create?");
            }
            Action::CreateMultipleNotes(drafts)
        }
        ActionKind::UpdateNote => {
            let Some(note_id) = id_param(params, "noteId") else {
                return clarify("I need the ID of the note you want to update.");
            };
            let Some(title) = string_param(params, "title") else {
                return clarify("What title should the updated note have?");
            };
            Action::UpdateNote {
                note_id,
                title,
                content: params
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                tags: tags_param(params),
            }
        }
        ActionKind::PinNote => match id_param(params, "noteId") {
            Some(note_id) => Action::PinNote { note_id },
            None => return clarify("I need the ID of the note you want to pin or unpin."),
        },
        ActionKind::DeleteNote => match id_param(params, "noteId") {
            Some(note_id) => Action::DeleteNote { note_id },
            None => return clarify("I need the ID of the note you want to delete."),
        },
        ActionKind::DeleteMultipleNotes => {
            let note_ids = ids_param(params);
            match note_ids.len() {
                0 => return clarify("Which notes should I delete?"),
                1 => Action::DeleteNote {
                    note_id: note_ids[0],
                },
                _ => Action::RequestDeleteConfirmation {
                    reason: string_param(params, "reason")
                        .unwrap_or_else(|| proposal.message.trim().to_string()),
                    note_ids,
                },
            }
        }
        ActionKind::RequestDeleteConfirmation => {
            let note_ids = ids_param(params);
            if note_ids.is_empty() {
                return clarify("Which notes should I delete?");
            }
            Action::RequestDeleteConfirmation {
                reason: string_param(params, "reason")
                    .unwrap_or_else(|| proposal.message.trim().to_string()),
                note_ids,
            }
        }
        ActionKind::SearchNotes => {
            let mut query = NoteQuery {
                query: string_param(params, "query"),
                ..Default::default()
            };
            if let Some(tags) = tags_param(params) {
                query = query.with_tags(tags);
            }
            // Unknown ranges are ignored rather than failing the search.
            if let Some(range) = params
                .get("dateRange")
                .and_then(Value::as_str)
                .and_then(DateRange::parse)
            {
                query = query.with_date_range(range);
            }
            Action::SearchNotes(query)
        }
        ActionKind::SummarizeNotes => {
            let kind = params
                .get("type")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_ascii_lowercase().replace(['-', ' '], "_"));
            match kind.as_deref() {
                Some("overview") => Action::SummarizeNotes(SummaryKind::Overview),
                Some("by_tag") | Some("bytag") | Some("tags") => {
                    Action::SummarizeNotes(SummaryKind::ByTag)
                }
                Some("recent") => {
                    let count = params
                        .get("count")
                        .and_then(count_value)
                        .unwrap_or(RECENT_SUMMARY_COUNT);
                    Action::SummarizeNotes(SummaryKind::Recent { count })
                }
                _ => {
                    return clarify(
                        "Should I give an overview, a breakdown by tag, or your recent notes?",
                    )
                }
            }
        }
        ActionKind::AnswerQuestion => Action::AnswerQuestion {
            message: proposal.message.trim().to_string(),
        },
    };

    Validated::Action(action)
}

/// A non-blank string parameter, trimmed.
fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Tags given as a list of strings or a comma-separated string.
fn tags_param(params: &Map<String, Value>) -> Option<Vec<String>> {
    match params.get("tags")? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

/// Note ids arrive as numbers, numeric strings, or `#`-prefixed strings.
fn id_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn id_param(params: &Map<String, Value>, key: &str) -> Option<i64> {
    params.get(key).and_then(id_value)
}

/// `noteIds` as a de-duplicated list in the order given. A lone `noteId` is
/// accepted too.
fn ids_param(params: &Map<String, Value>) -> Vec<i64> {
    let raw: Vec<i64> = match params.get("noteIds") {
        Some(Value::Array(items)) => items.iter().filter_map(id_value).collect(),
        Some(other) => id_value(other).into_iter().collect(),
        None => id_param(params, "noteId").into_iter().collect(),
    };
    let mut ids = Vec::with_capacity(raw.len());
    for id in raw {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn count_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| *n > 0)
}
