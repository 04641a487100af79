//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Completion, Growth, ProgressionState, TaskBatch};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    GetProgress {
        reply: oneshot::Sender<ProgressionState>,
    },
    GetBatch {
        reply: oneshot::Sender<TaskBatch>,
    },

    /// Swap in a new batch, discarding the old one
    ReplaceBatch {
        batch: TaskBatch,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    /// Mark a task completed and queue its reward
    CompleteTask {
        id: String,
        reply: oneshot::Sender<StateResponse<Completion>>,
    },

    /// Queue a deposit that is not tied to a task
    QueueDeposit {
        amount: u32,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    /// Apply a deposit now (sent by the deposit queue once it is due)
    ApplyDeposit {
        amount: u32,
        reply: oneshot::Sender<StateResponse<Growth>>,
    },

    /// Remove the batch from memory and storage
    ClearBatch {
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Shutdown
    Shutdown,
}

/// Event broadcast when state changes that a UI should react to
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    BatchReplaced { task_count: usize },
    TaskCompleted { id: String, reward: u32 },
    ExperienceApplied(Growth),
    BatchCleared,
}
