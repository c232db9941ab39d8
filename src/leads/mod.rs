//! Lead detection and capture.
//!
//! A model reply may carry one `||LEAD:<name> - <contact>||` block. The
//! [`pipeline::LeadCapturePipeline`] scans for it ([`marker`]), splits the
//! payload ([`parser`]), persists a [`LeadRecord`], queues an operator alert
//! and hands back the reply with the block removed.

pub mod marker;
pub mod parser;
pub mod pipeline;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use self::parser::ParsedLead;

/// A captured lead as handed to the store.
///
/// Records are append-only: once stored they are never updated or merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Lead name, possibly empty when the payload was unparsable.
    pub name: String,
    /// Contact detail, or `"not detected"`.
    pub contact: String,
    /// The user message that triggered the reply, verbatim.
    pub original_message: String,
    /// When the lead was captured.
    pub captured_at: DateTime<Utc>,
}

impl LeadRecord {
    /// Build a record from a parsed payload and its triggering message.
    pub fn new(parsed: ParsedLead, original_message: &str, captured_at: DateTime<Utc>) -> Self {
        Self {
            name: parsed.name,
            contact: parsed.contact,
            original_message: original_message.to_owned(),
            captured_at,
        }
    }
}

/// What happened to the lead (if any) found in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CaptureOutcome {
    /// The reply carried no complete lead block.
    NoLead,
    /// A lead was parsed and stored.
    LeadCaptured {
        /// Row id assigned by the store.
        id: i64,
    },
    /// A lead was parsed but the store write failed.
    LeadCapturedPersistFailed,
}

impl CaptureOutcome {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoLead => "no-lead",
            Self::LeadCaptured { .. } => "lead-captured",
            Self::LeadCapturedPersistFailed => "lead-captured-persist-failed",
        }
    }

    /// Whether a lead block was found, regardless of persistence.
    pub fn lead_detected(&self) -> bool {
        !matches!(self, Self::NoLead)
    }
}

/// A sanitized reply plus the capture outcome for the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedReply {
    /// Reply text with lead syntax removed; what the user sees.
    pub text: String,
    /// Capture outcome.
    pub outcome: CaptureOutcome,
}
