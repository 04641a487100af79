//! Task and TaskBatch domain types
//!
//! A batch is the set of tasks returned by one generation request. It is
//! replaced wholesale on the next request; individual tasks only ever move
//! from pending to completed.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::progression::DEFAULT_TASK_REWARD;

/// Task difficulty as judged by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    /// Anything the model invents that we do not recognize
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single actionable step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique within the current batch
    #[serde(default)]
    pub id: String,

    /// Short imperative title
    pub title: String,

    /// Free-text time estimate ("2 mins")
    #[serde(default)]
    pub duration: String,

    /// One-way flag, false until the user finishes the task
    #[serde(default)]
    pub completed: bool,

    /// XP granted on completion; `None` when the model gave no usable value
    #[serde(default, deserialize_with = "lenient_reward", skip_serializing_if = "Option::is_none")]
    pub xp_reward: Option<u32>,

    #[serde(default)]
    pub difficulty: Difficulty,

    /// Model's explanation for the task, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration: duration.into(),
            completed: false,
            xp_reward: None,
            difficulty: Difficulty::default(),
            reasoning: None,
        }
    }

    pub fn with_reward(mut self, xp: u32) -> Self {
        self.xp_reward = Some(xp);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// XP this task deposits when completed
    pub fn reward(&self) -> u32 {
        self.xp_reward.unwrap_or(DEFAULT_TASK_REWARD)
    }
}

/// Accept any JSON number for `xpReward`
///
/// Fractions are rounded; zero, negatives, non-numbers and overflow all map
/// to `None` so the default reward applies instead of a corrupt deposit.
fn lenient_reward<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let reward = value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    Ok(reward.and_then(|r| {
        let rounded = r.round();
        if rounded >= 1.0 && rounded <= f64::from(u32::MAX) {
            Some(rounded as u32)
        } else {
            None
        }
    }))
}

/// Result of asking a batch to complete a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Task moved from pending to completed; `reward` XP is owed
    Completed { id: String, reward: u32 },
    /// Task was already completed; nothing is owed
    AlreadyCompleted { id: String },
    /// No task with this id in the current batch
    NotFound { id: String },
}

impl Completion {
    /// XP owed by this completion, if any
    pub fn reward(&self) -> Option<u32> {
        match self {
            Self::Completed { reward, .. } => Some(*reward),
            _ => None,
        }
    }
}

/// The current batch of tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskBatch {
    tasks: Vec<Task>,
}

impl TaskBatch {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks not yet completed, in batch order
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// XP earned by the completed tasks in this batch
    pub fn earned_xp(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| u64::from(t.reward()))
            .sum()
    }

    /// True once every task is done (false for an empty batch)
    pub fn all_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed)
    }

    /// Completion percentage in `[0, 100]`, zero for an empty batch
    pub fn progress_percent(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.tasks.len() as f64 * 100.0
    }

    /// Mark a task completed
    ///
    /// The transition happens at most once per task: repeating it reports
    /// `AlreadyCompleted` and owes nothing.
    pub fn complete(&mut self, id: &str) -> Completion {
        debug!(%id, "TaskBatch::complete: called");
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) if task.completed => {
                debug!(%id, "TaskBatch::complete: already completed");
                Completion::AlreadyCompleted { id: id.to_string() }
            }
            Some(task) => {
                task.completed = true;
                let reward = task.reward();
                debug!(%id, reward, "TaskBatch::complete: completed");
                Completion::Completed {
                    id: id.to_string(),
                    reward,
                }
            }
            None => {
                debug!(%id, "TaskBatch::complete: not found");
                Completion::NotFound { id: id.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> TaskBatch {
        TaskBatch::new(vec![
            Task::new("a1b2c3", "Pick up one sock", "1 min").with_reward(30),
            Task::new("d4e5f6", "Open the laptop", "2 mins"),
        ])
    }

    #[test]
    fn test_complete_is_one_way() {
        let mut b = batch();

        assert_eq!(
            b.complete("a1b2c3"),
            Completion::Completed {
                id: "a1b2c3".to_string(),
                reward: 30
            }
        );
        assert_eq!(
            b.complete("a1b2c3"),
            Completion::AlreadyCompleted {
                id: "a1b2c3".to_string()
            }
        );
        assert!(b.get("a1b2c3").unwrap().completed);
    }

    #[test]
    fn test_missing_reward_defaults_to_twenty() {
        let mut b = batch();
        assert_eq!(b.complete("d4e5f6").reward(), Some(DEFAULT_TASK_REWARD));
        assert_eq!(DEFAULT_TASK_REWARD, 20);
    }

    #[test]
    fn test_unknown_id() {
        let mut b = batch();
        assert!(matches!(b.complete("nope"), Completion::NotFound { .. }));
        assert_eq!(b.completed_count(), 0);
    }

    #[test]
    fn test_progress_and_earned_xp() {
        let mut b = batch();
        assert_eq!(b.progress_percent(), 0.0);
        assert!(!b.all_completed());

        b.complete("a1b2c3");
        assert_eq!(b.progress_percent(), 50.0);
        assert_eq!(b.earned_xp(), 30);
        assert_eq!(b.pending().count(), 1);

        b.complete("d4e5f6");
        assert!(b.all_completed());
        assert_eq!(b.earned_xp(), 50);
    }

    #[test]
    fn test_empty_batch_is_not_all_completed() {
        let b = TaskBatch::default();
        assert!(!b.all_completed());
        assert_eq!(b.progress_percent(), 0.0);
    }

    #[test]
    fn test_lenient_reward_parsing() {
        let parse = |json: &str| serde_json::from_str::<Task>(json).unwrap().xp_reward;

        assert_eq!(parse(r#"{"title":"t","xpReward":45}"#), Some(45));
        assert_eq!(parse(r#"{"title":"t","xpReward":44.6}"#), Some(45));
        assert_eq!(parse(r#"{"title":"t","xpReward":"60"}"#), Some(60));
        assert_eq!(parse(r#"{"title":"t","xpReward":0}"#), None);
        assert_eq!(parse(r#"{"title":"t","xpReward":-15}"#), None);
        assert_eq!(parse(r#"{"title":"t","xpReward":null}"#), None);
        assert_eq!(parse(r#"{"title":"t"}"#), None);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let task = Task::new("x1y2z3", "Drink water", "1 min")
            .with_reward(10)
            .with_difficulty(Difficulty::Easy);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["xpReward"], 10);
        assert_eq!(json["difficulty"], "easy");
        assert_eq!(json["completed"], false);

        let batch_json = serde_json::to_value(TaskBatch::new(vec![task])).unwrap();
        assert!(batch_json.is_array());
    }

    #[test]
    fn test_unknown_difficulty() {
        let task: Task = serde_json::from_str(r#"{"title":"t","difficulty":"legendary"}"#).unwrap();
        assert_eq!(task.difficulty, Difficulty::Unknown);
    }
}
