//! Domain types for Focus Flow
//!
//! - [`ProgressionState`] and [`add_experience`]: the garden state machine
//! - [`Task`] / [`TaskBatch`]: the current batch and its one-way completions
//! - [`Guidance`]: what the coach returns for one request

mod guidance;
mod id;
mod progression;
mod task;

pub use guidance::{Emotion, EnergyLevel, Guidance};
pub use id::{ID_LEN, assign_ids, generate_id};
pub use progression::{
    DEFAULT_TASK_REWARD, GardenStage, Growth, MANUAL_GROW_REWARD, MAX_STAGE, ProgressionState, STAGE_COUNT,
    XP_TO_LEVEL_UP, add_experience,
};
pub use task::{Completion, Difficulty, Task, TaskBatch};
