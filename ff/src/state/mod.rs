//! State management with actor pattern
//!
//! StateManager owns garden progress and the task batch and processes
//! messages via channels. Rewards pass through a delayed, strictly ordered
//! deposit queue before they reach the actor.

mod manager;
mod messages;
mod persistence;
mod queue;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateEvent, StateResponse};
pub use persistence::{GARDEN_KEY, GardenStore, TASKS_KEY};
pub use queue::DepositQueue;
