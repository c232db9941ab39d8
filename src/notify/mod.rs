//! Operator alerts for captured leads.
//!
//! Alerts are fire-and-forget from the request's point of view: the capture
//! pipeline pushes a [`LeadAlert`] onto a bounded [`NotificationQueue`]
//! without waiting, and a single background worker ([`run_worker`]) delivers
//! it through a [`NotificationSink`]. Delivery failures are logged and
//! otherwise swallowed.

pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::leads::LeadRecord;

/// Errors from alert delivery or scheduling.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Telegram API call failed.
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// The queue is at capacity; the alert was not scheduled.
    #[error("notification queue is full")]
    QueueFull,

    /// The worker has stopped; the alert was not scheduled.
    #[error("notification worker stopped")]
    QueueClosed,
}

/// Outbound channel for operator alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one alert message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails. The worker logs it and
    /// moves on.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sink used when no Telegram credentials are configured.
///
/// Logs each alert it would have sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        warn!(
            alert_len = text.len(),
            "telegram credentials missing, lead alert not delivered"
        );
        Ok(())
    }
}

/// Name and contact of a captured lead, as forwarded to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadAlert {
    /// Lead name.
    pub name: String,
    /// Contact detail.
    pub contact: String,
}

impl From<&LeadRecord> for LeadAlert {
    fn from(record: &LeadRecord) -> Self {
        Self {
            name: record.name.clone(),
            contact: record.contact.clone(),
        }
    }
}

impl LeadAlert {
    /// Render the alert as Telegram HTML.
    pub fn render(&self) -> String {
        format!(
            "<b>\u{1f6a8} New lead captured</b>\n\n\
             Name: {name}\n\
             Contact: {contact}\n\n\
             Check the lead database or reach out now.",
            name = html_escape(&self.name),
            contact = html_escape(&self.contact),
        )
    }
}

/// Escape HTML special characters for Telegram.
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Sending half of the alert queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<LeadAlert>,
}

impl NotificationQueue {
    /// Spawn the delivery worker on the current Tokio runtime.
    ///
    /// `capacity` bounds the number of undelivered alerts; a zero capacity
    /// is raised to one.
    pub fn spawn(sink: Arc<dyn NotificationSink>, capacity: usize) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(sink, rx));
        (Self { tx }, NotificationWorker { handle })
    }

    /// Schedule an alert without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::QueueFull`] or [`NotifyError::QueueClosed`]
    /// when the alert cannot be scheduled.
    pub fn enqueue(&self, alert: LeadAlert) -> Result<(), NotifyError> {
        self.tx.try_send(alert).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })?;
        trace!("lead alert queued");
        Ok(())
    }
}

/// Handle to the running delivery worker.
#[derive(Debug)]
pub struct NotificationWorker {
    handle: tokio::task::JoinHandle<()>,
}

impl NotificationWorker {
    /// Wait for the worker to drain once every [`NotificationQueue`] clone
    /// has been dropped, giving up after `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(_) => info!("notification worker drained"),
            Err(_) => warn!(
                timeout_secs = timeout.as_secs(),
                "notification worker did not drain in time, abandoning pending alerts"
            ),
        }
    }
}

/// Deliver alerts until every sender is dropped.
pub async fn run_worker(sink: Arc<dyn NotificationSink>, mut rx: mpsc::Receiver<LeadAlert>) {
    while let Some(alert) = rx.recv().await {
        match sink.send(&alert.render()).await {
            Ok(()) => debug!("lead alert delivered"),
            Err(e) => warn!(error = %e, "lead alert delivery failed"),
        }
    }
    trace!("notification worker stopped");
}
