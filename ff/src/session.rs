//! FocusSession - the application shell
//!
//! Wires the coach to the state actor: a submission becomes a new batch,
//! completions feed the garden through the deposit queue.

use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use kvstore::{KvBackend, KvStore};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::coach::{Coach, UserInput};
use crate::config::Config;
use crate::domain::{Completion, Guidance, MANUAL_GROW_REWARD, ProgressionState, TaskBatch};
use crate::llm::{LlmClient, create_client};
use crate::prompts::PromptLoader;
use crate::state::{GardenStore, StateEvent, StateManager, StateResponse};

pub struct FocusSession {
    state: StateManager,
    coach: Coach,
}

impl FocusSession {
    pub fn new(state: StateManager, coach: Coach) -> Self {
        Self { state, coach }
    }

    /// Build a session from configuration
    ///
    /// Opens the on-disk store, creates the configured LLM client and looks
    /// for prompt overrides under `root`. Must be called inside a tokio
    /// runtime.
    pub fn from_config(config: &Config, root: impl AsRef<Path>) -> Result<Self> {
        debug!(store_dir = %config.storage.store_dir.display(), "from_config: called");
        let store = KvStore::open(&config.storage.store_dir)
            .context(format!("Failed to open store at {}", config.storage.store_dir.display()))?;
        let llm = create_client(&config.llm).context("Failed to create LLM client")?;

        Ok(Self::with_parts(
            Arc::new(store),
            llm,
            PromptLoader::new(root),
            config,
        ))
    }

    /// Build a session from explicit backend and client
    pub fn with_parts(
        backend: Arc<dyn KvBackend>,
        llm: Arc<dyn LlmClient>,
        prompts: PromptLoader,
        config: &Config,
    ) -> Self {
        let state = StateManager::spawn(GardenStore::new(backend), config.garden.deposit_delay());
        let coach = Coach::new(llm, prompts, config.llm.max_tokens);
        Self::new(state, coach)
    }

    /// Ask for a new batch
    ///
    /// Returns `None` without calling the model when there is nothing to
    /// send. Otherwise the current batch is replaced by the generated one
    /// (or by the fallback batch if generation failed).
    pub async fn submit(&self, input: UserInput) -> StateResponse<Option<Guidance>> {
        debug!(text_len = input.text.len(), "submit: called");
        if input.is_empty() {
            debug!("submit: empty input, ignoring");
            return Ok(None);
        }

        let batch = self.state.batch().await?;
        let progress = self.state.progress().await?;
        let guidance = self.coach.generate(&input, &batch, &progress).await;

        self.state.replace_batch(TaskBatch::new(guidance.tasks.clone())).await?;
        info!(task_count = guidance.tasks.len(), "Batch replaced");
        Ok(Some(guidance))
    }

    /// Complete a task in the current batch
    pub async fn complete_task(&self, id: &str) -> StateResponse<Completion> {
        self.state.complete_task(id).await
    }

    /// Manual growth trigger, worth a fixed amount of XP
    pub async fn grow(&self) -> StateResponse<()> {
        debug!("grow: called");
        self.state.deposit(MANUAL_GROW_REWARD).await
    }

    /// Drop the current batch; garden progress is kept
    pub async fn reset(&self) -> StateResponse<()> {
        debug!("reset: called");
        self.state.clear_batch().await
    }

    pub async fn progress(&self) -> StateResponse<ProgressionState> {
        self.state.progress().await
    }

    pub async fn batch(&self) -> StateResponse<TaskBatch> {
        self.state.batch().await
    }

    /// Wait for queued deposits to land
    pub async fn settle(&self) -> StateResponse<()> {
        self.state.settle().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StateEvent> {
        self.state.subscribe_events()
    }

    pub async fn shutdown(&self) -> StateResponse<()> {
        self.state.shutdown().await
    }
}
