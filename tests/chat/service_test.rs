//! Tests for `src/chat.rs`.

use std::sync::Arc;

use leadline::chat::{ChatError, ChatService};
use leadline::leads::pipeline::LeadCapturePipeline;
use leadline::leads::CaptureOutcome;
use leadline::notify::NotificationQueue;
use leadline::persona;

use crate::common::{next_alert, ChannelSink, RecordingStore, ScriptedGenerator};

#[tokio::test]
async fn reply_is_sanitized_and_lead_recorded() {
    let generator =
        ScriptedGenerator::replying("Gracias Ana! ||LEAD:Ana - +56 9 1234|| Hasta pronto.");
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let chat = ChatService::new(
        generator.clone(),
        LeadCapturePipeline::new(store.clone(), queue),
        "sys".to_owned(),
    );

    let processed = chat
        .respond("soy Ana, mi fono es +56 9 1234")
        .await
        .expect("turn should succeed");

    assert_eq!(processed.text, "Gracias Ana!  Hasta pronto.");
    assert_eq!(processed.outcome, CaptureOutcome::LeadCaptured { id: 1 });

    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ana");
    assert_eq!(records[0].contact, "+56 9 1234");
    assert_eq!(records[0].original_message, "soy Ana, mi fono es +56 9 1234");

    assert!(next_alert(&mut rx).await.contains("Ana"));
}

#[tokio::test]
async fn generator_receives_message_and_instruction() {
    let generator = ScriptedGenerator::replying("hi");
    let (sink, _rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let instruction = persona::system_instruction(persona::DEFAULT_PERSONA);
    let chat = ChatService::new(
        generator.clone(),
        LeadCapturePipeline::new(Arc::new(RecordingStore::default()), queue),
        instruction.clone(),
    );

    let processed = chat.respond("hello").await.expect("turn should succeed");
    assert_eq!(processed.text, "hi");
    assert_eq!(processed.outcome, CaptureOutcome::NoLead);

    let calls = generator.calls.lock().expect("generator lock").clone();
    assert_eq!(calls, vec![("hello".to_owned(), instruction)]);
}

#[tokio::test]
async fn generation_failure_skips_capture() {
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let chat = ChatService::new(
        ScriptedGenerator::failing("SAFETY"),
        LeadCapturePipeline::new(store.clone(), queue),
        "sys".to_owned(),
    );

    let result = chat.respond("hello").await;
    assert!(matches!(result, Err(ChatError::Generation(_))));
    assert!(store.snapshot().is_empty());

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[test]
fn persona_rule_teaches_marker_syntax() {
    let rule = persona::lead_capture_rule();
    assert!(rule.contains("||LEAD:<name> - <contact>||"));

    let instruction = persona::system_instruction("  Be nice.  ");
    assert!(instruction.starts_with("Be nice.\n\n"));
    assert!(instruction.ends_with(&rule));
}

#[test]
fn persona_file_replaces_default_text() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("persona.md");
    std::fs::write(&path, "You sell bicycles.").expect("write persona");

    let instruction =
        persona::load_system_instruction(Some(&path)).expect("persona should load");
    assert!(instruction.starts_with("You sell bicycles."));
    assert!(!instruction.contains("software studio"));

    assert!(persona::load_system_instruction(Some(&tmp.path().join("absent.md"))).is_err());
}
