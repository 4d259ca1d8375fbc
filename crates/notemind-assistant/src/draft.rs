//! Single-shot note drafting from a freeform prompt.
//!
//! Nothing is persisted; the caller decides whether to save the draft.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use notemind_core::defaults::{MODEL_CALL_TIMEOUT_SECS, TITLE_MAX_LEN, UNTITLED_NOTE};
use notemind_core::{Error, GenerationBackend, Result};

const DRAFT_SYSTEM_PROMPT: &str = "\
You write notes for a personal note-taking app. Given the user's request, \
write one note. Put a short title on the first line and the note body below it. \
Do not add any commentary before or after the note.";

/// A generated title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraftText {
    pub title: String,
    pub content: String,
}

/// Split generated text into a title and body.
///
/// The first non-empty line becomes the title once Markdown heading marks,
/// bold markers, and a `Title:` label are removed. Everything after it is the
/// body.
pub fn split_draft(text: &str) -> NoteDraftText {
    let mut lines = text.trim().lines();
    let mut title = String::new();
    for line in lines.by_ref() {
        let cleaned = clean_title_line(line);
        if !cleaned.is_empty() {
            title = cleaned;
            break;
        }
    }
    let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    if title.is_empty() {
        title = UNTITLED_NOTE.to_string();
    }
    if title.chars().count() > TITLE_MAX_LEN {
        title = title.chars().take(TITLE_MAX_LEN).collect();
    }
    NoteDraftText { title, content }
}

fn clean_title_line(line: &str) -> String {
    let mut s = line.trim().trim_start_matches('#').trim();
    s = s.trim_matches('*').trim();
    if let Some(rest) = s
        .get(..6)
        .filter(|p| p.eq_ignore_ascii_case("title:"))
        .and_then(|_| s.get(6..))
    {
        s = rest.trim();
    }
    s.trim_matches('*').trim().to_string()
}

/// Legacy one-call note generator.
pub struct NoteDrafter {
    model: Arc<dyn GenerationBackend>,
    timeout: Duration,
}

impl NoteDrafter {
    pub fn new(model: Arc<dyn GenerationBackend>) -> Self {
        Self {
            model,
            timeout: Duration::from_secs(MODEL_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate a draft. Provider failures and timeouts are returned as
    /// errors for the caller to map.
    pub async fn draft(&self, prompt: &str) -> Result<NoteDraftText> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::InvalidInput("Prompt is required".to_string()));
        }

        let text = tokio::time::timeout(
            self.timeout,
            self.model.generate_with_system(DRAFT_SYSTEM_PROMPT, prompt),
        )
        .await
        .map_err(|_| {
            warn!(
                subsystem = "assistant",
                component = "draft",
                timeout_secs = self.timeout.as_secs(),
                "Draft generation timed out"
            );
            Error::Timeout(format!(
                "Model did not answer within {}s",
                self.timeout.as_secs()
            ))
        })??;

        let draft = split_draft(&text);
        debug!(
            subsystem = "assistant",
            component = "draft",
            model = self.model.model_name(),
            prompt_len = prompt.len(),
            response_len = text.len(),
            "Generated note draft"
        );
        Ok(draft)
    }
}
