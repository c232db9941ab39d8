//! Detect → parse → persist → notify → sanitize, for one model reply.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::marker;
use super::parser;
use super::{CaptureOutcome, LeadRecord, ProcessedReply};
use crate::notify::{LeadAlert, NotificationQueue};
use crate::store::LeadStore;

/// Runs lead capture against model replies.
///
/// Every step after detection is fault-isolated: a store failure only
/// changes the outcome, and alert delivery happens on the notification
/// worker, never on the caller's task. [`process`](Self::process) cannot
/// fail.
#[derive(Clone)]
pub struct LeadCapturePipeline {
    store: Arc<dyn LeadStore>,
    notifications: NotificationQueue,
}

impl std::fmt::Debug for LeadCapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadCapturePipeline")
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

impl LeadCapturePipeline {
    /// Create a pipeline writing to `store` and alerting through `notifications`.
    pub fn new(store: Arc<dyn LeadStore>, notifications: NotificationQueue) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Process one model reply produced for `original_message`.
    ///
    /// At most one lead is captured per call, taken from the first complete
    /// lead block.
    pub async fn process(&self, reply: &str, original_message: &str) -> ProcessedReply {
        let Some(found) = marker::scan(reply) else {
            debug!("no lead marker in reply");
            return ProcessedReply {
                text: reply.to_owned(),
                outcome: CaptureOutcome::NoLead,
            };
        };

        let parsed = parser::parse_payload(found.payload);
        let record = LeadRecord::new(parsed, original_message, Utc::now());

        let outcome = match self.store.append(&record).await {
            Ok(id) => {
                info!(lead_id = id, name = %record.name, "lead saved");
                CaptureOutcome::LeadCaptured { id }
            }
            Err(e) => {
                error!(error = %e, name = %record.name, "failed to persist lead");
                CaptureOutcome::LeadCapturedPersistFailed
            }
        };

        if let Err(e) = self.notifications.enqueue(LeadAlert::from(&record)) {
            warn!(error = %e, "lead alert dropped");
        }

        ProcessedReply {
            text: marker::sanitize(reply, Some(&found)),
            outcome,
        }
    }
}
