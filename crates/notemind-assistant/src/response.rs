//! Chat turn response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use notemind_core::ChatRole;

use crate::action::ActionKind;

/// The assistant turn to append to the client's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub role: ChatRole,
    pub content: String,
}

/// What a chat turn returns to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub action: ActionKind,
    pub action_result: Option<Value>,
    pub parameters: Value,
    pub requires_confirmation: bool,
    /// Whether notes were changed, so the caller knows to refresh.
    pub action_performed: bool,
    pub conversation_context: ConversationContext,
}

impl ChatResponse {
    pub fn new(action: ActionKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            conversation_context: ConversationContext {
                role: ChatRole::Assistant,
                content: message.clone(),
            },
            message,
            action,
            action_result: None,
            parameters: Value::Object(Default::default()),
            requires_confirmation: false,
            action_performed: false,
        }
    }

    /// A plain answer with no side effects.
    pub fn answer(message: impl Into<String>) -> Self {
        Self::new(ActionKind::AnswerQuestion, message)
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.action_result = Some(result);
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn performed(mut self) -> Self {
        self.action_performed = true;
        self
    }

    pub fn awaiting_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let resp = ChatResponse::new(ActionKind::RequestDeleteConfirmation, "Sure?")
            .with_parameters(serde_json::json!({"noteIds": [1, 2]}))
            .awaiting_confirmation();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["action"], "REQUEST_DELETE_CONFIRMATION");
        assert_eq!(json["requiresConfirmation"], true);
        assert_eq!(json["actionResult"], Value::Null);
        assert_eq!(json["parameters"]["noteIds"][1], 2);
        assert_eq!(json["conversationContext"]["role"], "assistant");
        assert_eq!(json["conversationContext"]["content"], "Sure?");
    }
}
