//! Task generation
//!
//! Turns one user submission plus the current garden and batch into a new
//! batch of tasks. Generation never fails from the caller's point of view:
//! any error is logged and replaced by [`Guidance::fallback`].

mod context;
mod input;
mod parse;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{Guidance, ProgressionState, TaskBatch};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::{CoachPromptContext, PromptLoader};

pub use context::{garden_summary, history_summary};
pub use input::{Attachment, AttachmentKind, UserInput};
pub use parse::parse_guidance;

/// Why a generation attempt fell back
#[derive(Debug, Error)]
pub enum CoachError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Could not parse model output: {0}")]
    Parse(String),
}

/// Builds requests, calls the model and parses its answer
pub struct Coach {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl Coach {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Generate guidance, falling back to the canned response on any error
    pub async fn generate(&self, input: &UserInput, batch: &TaskBatch, progress: &ProgressionState) -> Guidance {
        debug!(energy = %input.energy, "generate: called");
        match self.try_generate(input, batch, progress).await {
            Ok(guidance) => {
                info!(
                    task_count = guidance.tasks.len(),
                    emotion = %guidance.emotion(),
                    "Generated task batch"
                );
                guidance
            }
            Err(CoachError::Llm(e)) if e.is_rate_limit() => {
                warn!(
                    provider = %self.llm.provider(),
                    retry_after = ?e.retry_after(),
                    "Provider rate limited the request, using fallback"
                );
                Guidance::fallback()
            }
            Err(e) => {
                error!(provider = %self.llm.provider(), error = %e, "Task generation failed, using fallback");
                Guidance::fallback()
            }
        }
    }

    /// Single attempt, no retries
    pub async fn try_generate(
        &self,
        input: &UserInput,
        batch: &TaskBatch,
        progress: &ProgressionState,
    ) -> Result<Guidance, CoachError> {
        let context = CoachPromptContext::new(input.energy, garden_summary(progress), history_summary(batch));
        let system_prompt = self
            .prompts
            .coach_prompt(&context)
            .map_err(|e| CoachError::Prompt(e.to_string()))?;

        let request = CompletionRequest::new(system_prompt, input.to_parts(), self.max_tokens);
        let response = self.llm.complete(request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "try_generate: response received"
        );

        let text = response.content.ok_or(CoachError::EmptyResponse)?;
        parse_guidance(&text)
    }
}
