//! Tests for `src/leads/pipeline.rs`: ordering and fault isolation.

use std::sync::Arc;
use std::time::Duration;

use leadline::leads::pipeline::LeadCapturePipeline;
use leadline::leads::CaptureOutcome;
use leadline::notify::NotificationQueue;
use leadline::store::{LeadStore, SqliteLeadStore};

use crate::common::{next_alert, ChannelSink, FailingSink, FailingStore, GatedSink, RecordingStore};

const LEAD_REPLY: &str = "Listo, datos capturados. ||LEAD: Ana Perez - ana@x.com|| Adios.";

#[tokio::test]
async fn reply_without_marker_is_untouched() {
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let reply = "  Depends how broken your system is.  ";
    let processed = pipeline.process(reply, "how much?").await;

    assert_eq!(processed.text, reply);
    assert_eq!(processed.outcome, CaptureOutcome::NoLead);
    assert!(store.snapshot().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "no alert should be scheduled");
}

#[tokio::test]
async fn unterminated_marker_behaves_like_no_marker() {
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let reply = "Bye ||LEAD: Ana Perez - ana@x.com";
    let processed = pipeline.process(reply, "I'm Ana").await;

    assert_eq!(processed.text, reply);
    assert_eq!(processed.outcome, CaptureOutcome::NoLead);
    assert!(store.snapshot().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "no alert should be scheduled");
}

#[tokio::test]
async fn lead_is_stored_alerted_and_stripped() {
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let message = "Soy Ana Perez, ana@x.com";
    let processed = pipeline.process(LEAD_REPLY, message).await;

    assert_eq!(processed.text, "Listo, datos capturados.  Adios.");
    assert_eq!(processed.outcome, CaptureOutcome::LeadCaptured { id: 1 });

    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ana Perez");
    assert_eq!(records[0].contact, "ana@x.com");
    assert_eq!(records[0].original_message, message);

    let alert = next_alert(&mut rx).await;
    assert!(alert.contains("Name: Ana Perez"));
    assert!(alert.contains("Contact: ana@x.com"));
}

#[tokio::test]
async fn persistence_failure_does_not_affect_reply_or_alert() {
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(Arc::new(FailingStore), queue);

    let processed = pipeline.process(LEAD_REPLY, "Soy Ana").await;

    assert_eq!(processed.text, "Listo, datos capturados.  Adios.");
    assert_eq!(
        processed.outcome,
        CaptureOutcome::LeadCapturedPersistFailed
    );
    assert_eq!(processed.outcome.as_str(), "lead-captured-persist-failed");

    let alert = next_alert(&mut rx).await;
    assert!(alert.contains("Ana Perez"));
}

#[tokio::test]
async fn failing_sink_is_invisible_to_the_caller() {
    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(FailingSink::default());
    let (queue, _worker) = NotificationQueue::spawn(sink.clone(), 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let processed = pipeline.process(LEAD_REPLY, "Soy Ana").await;
    assert_eq!(processed.outcome, CaptureOutcome::LeadCaptured { id: 1 });
    assert_eq!(processed.text, "Listo, datos capturados.  Adios.");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*sink.attempts.lock().expect("sink lock"), 1);
}

#[tokio::test]
async fn slow_sink_never_delays_the_reply() {
    let store = Arc::new(RecordingStore::default());
    let sink = GatedSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink.clone(), 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let processed = tokio::time::timeout(
        Duration::from_millis(500),
        pipeline.process(LEAD_REPLY, "Soy Ana"),
    )
    .await
    .expect("process must not wait for alert delivery");
    assert!(processed.outcome.lead_detected());
    assert!(sink.delivered().is_empty());

    sink.release(1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test]
async fn full_queue_drops_alert_but_still_answers() {
    let store = Arc::new(RecordingStore::default());
    let sink = GatedSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink.clone(), 1);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    for _ in 0..4 {
        let processed = pipeline.process(LEAD_REPLY, "Soy Ana").await;
        assert_eq!(processed.text, "Listo, datos capturados.  Adios.");
    }
    assert_eq!(store.snapshot().len(), 4);

    sink.release(4);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let delivered = sink.delivered().len();
    assert!(delivered >= 1, "at least one alert should be delivered");
    assert!(delivered < 4, "alerts beyond the queue bound are dropped");
}

#[tokio::test]
async fn two_blocks_yield_one_lead_from_the_first() {
    let store = Arc::new(RecordingStore::default());
    let (sink, mut rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let reply = "Ok ||LEAD:Ana - ana@x.com|| and ||LEAD:Bob - bob@y.com|| bye";
    let processed = pipeline.process(reply, "two people").await;

    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ana");
    assert_eq!(records[0].contact, "ana@x.com");
    assert!(!processed.text.contains("||LEAD:"));
    assert_eq!(processed.text, "Ok  and  bye");

    let alert = next_alert(&mut rx).await;
    assert!(alert.contains("Ana"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "only one alert per turn");
}

#[tokio::test]
async fn malformed_payload_is_still_captured() {
    let store = Arc::new(RecordingStore::default());
    let (sink, _rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let pipeline = LeadCapturePipeline::new(store.clone(), queue);

    let processed = pipeline.process("Bye ||LEAD:555-123-4567||", "call me").await;

    assert_eq!(processed.text, "Bye");
    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "555-123-4567");
    assert_eq!(records[0].contact, "not detected");
}

#[tokio::test]
async fn sqlite_store_receives_the_lead() {
    let store = SqliteLeadStore::from_pool(crate::common::memory_pool().await)
        .await
        .expect("schema should apply");
    let store = Arc::new(store);
    let (sink, _rx) = ChannelSink::new();
    let (queue, _worker) = NotificationQueue::spawn(sink, 8);
    let dyn_store: Arc<dyn LeadStore> = store.clone();
    let pipeline = LeadCapturePipeline::new(dyn_store, queue);

    let processed = pipeline.process(LEAD_REPLY, "Soy Ana").await;
    let CaptureOutcome::LeadCaptured { id } = processed.outcome else {
        panic!("expected a stored lead, got {:?}", processed.outcome);
    };

    let leads = store.recent(10).await.expect("read should succeed");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].id, id);
    assert_eq!(leads[0].original_message, "Soy Ana");
}
