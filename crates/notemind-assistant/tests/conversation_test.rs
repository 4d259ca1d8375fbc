//! Multi-turn conversation scenarios against the in-memory store and a
//! scripted model.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use notemind_assistant::{ActionKind, Assistant, ConversationState, TurnInput};
use notemind_core::test_fixtures::InMemoryNoteStore;
use notemind_core::{ConversationTurn, NoteStore};
use notemind_inference::MockGenerationBackend;

const OWNER: i64 = 1;
const OTHER: i64 = 2;

fn assistant(store: &InMemoryNoteStore, mock: &MockGenerationBackend) -> Assistant {
    Assistant::new(Arc::new(store.clone()), Arc::new(mock.clone()))
}

#[tokio::test]
async fn test_confirm_flow_deletes_after_yes() {
    let store = InMemoryNoteStore::new();
    let now = Utc::now();
    let w1 = store.seed(OWNER, "Standup", &["work"], false, now).await;
    let w2 = store.seed(OWNER, "Roadmap", &["work"], false, now).await;
    let w3 = store.seed(OWNER, "Retro", &["work"], false, now).await;
    let keep = store.seed(OWNER, "Recipes", &["home"], false, now).await;

    let reply = json!({
        "action": "REQUEST_DELETE_CONFIRMATION",
        "parameters": {"noteIds": [w1.id, w2.id, w3.id], "reason": "These are your 3 notes tagged work."},
        "message": "I found 3 notes tagged work."
    });
    let mock = MockGenerationBackend::new().with_script([format!("```json\n{}\n```", reply)]);
    let assistant = assistant(&store, &mock);

    let (state, first) = assistant
        .handle_turn(
            OWNER,
            ConversationState::Idle,
            TurnInput::new("delete all notes tagged work"),
        )
        .await
        .unwrap();

    assert_eq!(first.action, ActionKind::RequestDeleteConfirmation);
    assert!(first.requires_confirmation);
    assert_eq!(first.parameters["noteIds"].as_array().unwrap().len(), 3);
    assert!(first.message.contains("Roadmap"));
    assert_eq!(store.delete_count(), 0);

    let history = vec![
        ConversationTurn::user("delete all notes tagged work"),
        ConversationTurn::assistant(first.conversation_context.content.clone()),
    ];
    let (state, second) = assistant
        .handle_turn(
            OWNER,
            state,
            TurnInput::new("yes, delete them").with_history(history),
        )
        .await
        .unwrap();

    assert!(state.is_idle());
    assert_eq!(second.action, ActionKind::DeleteMultipleNotes);
    assert!(second.action_performed);
    assert_eq!(mock.call_count(), 1, "confirmation must not consult the model");

    let remaining: Vec<i64> = store
        .list_notes(OWNER)
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(remaining, vec![keep.id]);
    // Tag definitions outlive their notes.
    assert!(store.tag_names(OWNER).await.contains(&"work".to_string()));
}

#[tokio::test]
async fn test_model_batch_delete_is_never_executed_directly() {
    let store = InMemoryNoteStore::new();
    let now = Utc::now();
    let a = store.seed(OWNER, "A", &["old"], false, now).await;
    let b = store.seed(OWNER, "B", &["old"], false, now).await;

    let mock = MockGenerationBackend::new().with_script([json!({
        "action": "DELETE_MULTIPLE_NOTES",
        "parameters": {"noteIds": [a.id, b.id]},
        "message": "Deleted them."
    })
    .to_string()]);

    let (state, resp) = assistant(&store, &mock)
        .handle_turn(OWNER, ConversationState::Idle, TurnInput::new("delete old notes"))
        .await
        .unwrap();

    assert_eq!(resp.action, ActionKind::RequestDeleteConfirmation);
    assert!(resp.requires_confirmation);
    assert!(!resp.action_performed);
    assert!(state.pending().is_some());
    assert_eq!(store.delete_count(), 0);
    assert_eq!(store.list_notes(OWNER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_single_delete_skips_confirmation() {
    let store = InMemoryNoteStore::new();
    let target = store.seed(OWNER, "Old draft", &[], false, Utc::now()).await;
    let mock = MockGenerationBackend::new().with_script([json!({
        "action": "DELETE_NOTE",
        "parameters": {"noteId": target.id},
        "message": "Deleting it."
    })
    .to_string()]);

    let (state, resp) = assistant(&store, &mock)
        .handle_turn(
            OWNER,
            ConversationState::Idle,
            TurnInput::new(format!("delete note {}", target.id)),
        )
        .await
        .unwrap();

    assert!(state.is_idle());
    assert_eq!(resp.action, ActionKind::DeleteNote);
    assert!(!resp.requires_confirmation);
    assert!(resp.action_performed);
    assert_eq!(resp.action_result.unwrap()["note"]["id"], target.id);
    assert!(store.list_notes(OWNER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_plain_text_reply_becomes_answer() {
    let store = InMemoryNoteStore::new();
    let prose = "You don't have any notes about taxes yet. Want me to create one?";
    let mock = MockGenerationBackend::new().with_script([prose]);

    let (_, resp) = assistant(&store, &mock)
        .handle_turn(OWNER, ConversationState::Idle, TurnInput::new("what about taxes?"))
        .await
        .unwrap();

    assert_eq!(resp.action, ActionKind::AnswerQuestion);
    assert_eq!(resp.message, prose);
    assert_eq!(resp.conversation_context.content, prose);
}

#[tokio::test]
async fn test_other_owners_notes_are_not_found() {
    let store = InMemoryNoteStore::new();
    let theirs = store.seed(OTHER, "Private", &[], false, Utc::now()).await;
    let mock = MockGenerationBackend::new().with_script([
        json!({"action": "DELETE_NOTE", "parameters": {"noteId": theirs.id}}).to_string(),
        json!({"action": "PIN_NOTE", "parameters": {"noteId": theirs.id}}).to_string(),
        json!({
            "action": "REQUEST_DELETE_CONFIRMATION",
            "parameters": {"noteIds": [theirs.id], "reason": "x"}
        })
        .to_string(),
    ]);
    let assistant = assistant(&store, &mock);

    for text in ["delete it", "pin it", "delete those"] {
        let (state, resp) = assistant
            .handle_turn(OWNER, ConversationState::Idle, TurnInput::new(text))
            .await
            .unwrap();
        assert!(state.is_idle());
        assert!(!resp.action_performed);
        assert!(resp.message.starts_with("I couldn't find"), "{}", resp.message);
        assert!(!resp.message.contains("Private"));
    }

    let untouched = store.get_note(OTHER, theirs.id).await.unwrap().unwrap();
    assert!(!untouched.pinned);
    assert_eq!(store.delete_count(), 0);
}

#[tokio::test]
async fn test_history_sent_to_model_starts_with_user() {
    let store = InMemoryNoteStore::new();
    let mock = MockGenerationBackend::new()
        .with_script([json!({"action": "ANSWER_QUESTION", "message": "Hi!"}).to_string()]);

    let history = vec![
        ConversationTurn::assistant("Hello! I can help with your notes."),
        ConversationTurn::user("hi"),
        ConversationTurn::assistant("Hi there."),
    ];
    assistant(&store, &mock)
        .handle_turn(
            OWNER,
            ConversationState::Idle,
            TurnInput::new("what can you do?").with_history(history),
        )
        .await
        .unwrap();

    let prompt = mock.last_prompt().unwrap();
    assert_eq!(prompt.history.len(), 2);
    assert_eq!(prompt.history[0].content, "hi");
    assert_eq!(prompt.message, "what can you do?");
}

#[tokio::test]
async fn test_create_multiple_then_search_by_tags() {
    let store = InMemoryNoteStore::new();
    let mock = MockGenerationBackend::new().with_script([
        json!({
            "action": "CREATE_MULTIPLE_NOTES",
            "parameters": {"notes": [
                {"title": "Ship v2", "tags": ["work", "urgent"]},
                {"title": "Team lunch", "tags": ["work"]},
                {"title": "Dentist", "tags": ["urgent"]}
            ]}
        })
        .to_string(),
        json!({
            "action": "SEARCH_NOTES",
            "parameters": {"tags": ["work", "urgent"]}
        })
        .to_string(),
    ]);
    let assistant = assistant(&store, &mock);

    let (_, created) = assistant
        .handle_turn(OWNER, ConversationState::Idle, TurnInput::new("make three notes"))
        .await
        .unwrap();
    assert!(created.action_performed);
    assert_eq!(created.action_result.unwrap()["notes"].as_array().unwrap().len(), 3);

    let (_, found) = assistant
        .handle_turn(
            OWNER,
            ConversationState::Idle,
            TurnInput::new("what's urgent at work?"),
        )
        .await
        .unwrap();
    assert_eq!(found.action, ActionKind::SearchNotes);
    let result = found.action_result.unwrap();
    assert_eq!(result["total"], 1);
    assert_eq!(result["notes"][0]["title"], "Ship v2");
    assert!(found.message.contains("Ship v2"));
}
