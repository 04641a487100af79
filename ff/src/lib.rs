//! Focus Flow - LLM-guided task breakdown with a growing garden
//!
//! A submission (text, energy level, optional image or voice recording) is
//! sent to an LLM, which answers with a small batch of tasks. Completing a
//! task deposits its XP into a garden that grows through five stages and
//! then starts a new cycle.
//!
//! The garden and the batch are owned by a single actor
//! ([`state::StateManager`]) and persisted to a [`kvstore`] backend.

pub mod cli;
pub mod coach;
pub mod config;
pub mod domain;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod state;

pub use coach::{Attachment, AttachmentKind, Coach, UserInput};
pub use config::Config;
pub use domain::{
    Completion, Difficulty, Emotion, EnergyLevel, GardenStage, Growth, Guidance, ProgressionState, Task, TaskBatch,
    add_experience,
};
pub use llm::{LlmClient, LlmError, create_client};
pub use session::FocusSession;
pub use state::{StateError, StateManager};
