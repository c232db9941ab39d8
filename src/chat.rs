//! One chat turn: generate a reply, then run lead capture on it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::leads::pipeline::LeadCapturePipeline;
use crate::leads::ProcessedReply;
use crate::providers::{ProviderError, TextGenerator};

/// Errors that abort a chat turn.
///
/// Only the generation call can fail; lead capture never does.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The text-generation backend failed.
    #[error("generation failed: {0}")]
    Generation(#[from] ProviderError),
}

/// Glue between the generation backend and the capture pipeline.
pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
    pipeline: LeadCapturePipeline,
    system_instruction: String,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("model", &self.generator.model_id())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Create a chat service.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        pipeline: LeadCapturePipeline,
        system_instruction: String,
    ) -> Self {
        Self {
            generator,
            pipeline,
            system_instruction,
        }
    }

    /// Answer one user message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Generation`] if the backend call fails; the
    /// capture pipeline is not run in that case.
    pub async fn respond(&self, message: &str) -> Result<ProcessedReply, ChatError> {
        let reply = self
            .generator
            .generate(message, &self.system_instruction)
            .await
            .map_err(|e| {
                warn!(model = self.generator.model_id(), error = %e, "generation failed");
                e
            })?;

        let processed = self.pipeline.process(&reply, message).await;
        if processed.outcome.lead_detected() {
            info!(outcome = processed.outcome.as_str(), "chat turn captured a lead");
        }
        Ok(processed)
    }
}
