//! Context summaries sent along with every generation request

use serde::Serialize;
use tracing::debug;

use crate::domain::{Difficulty, ProgressionState, TaskBatch};

/// Tasks from the current batch included in the summary
const RECENT_TASK_LIMIT: usize = 5;

const NO_HISTORY: &str = "No recent history.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistorySummary<'a> {
    stats: String,
    recent_tasks: Vec<RecentTask<'a>>,
}

#[derive(Serialize)]
struct RecentTask<'a> {
    title: &'a str,
    difficulty: Difficulty,
    completed: bool,
    xp: u32,
}

/// Compact JSON digest of the current batch
///
/// Stats cover the whole batch; only the first few tasks are listed to
/// keep the prompt small.
pub fn history_summary(batch: &TaskBatch) -> String {
    debug!(task_count = batch.len(), "history_summary: called");
    if batch.is_empty() {
        return NO_HISTORY.to_string();
    }

    let summary = HistorySummary {
        stats: format!(
            "User has {} XP total. Completed {}/{} recent tasks.",
            batch.earned_xp(),
            batch.completed_count(),
            batch.len()
        ),
        recent_tasks: batch
            .tasks()
            .iter()
            .take(RECENT_TASK_LIMIT)
            .map(|t| RecentTask {
                title: &t.title,
                difficulty: t.difficulty,
                completed: t.completed,
                xp: t.reward(),
            })
            .collect(),
    };

    serde_json::to_string(&summary).unwrap_or_else(|e| {
        debug!(error = %e, "history_summary: serialization failed");
        NO_HISTORY.to_string()
    })
}

/// One-line garden description, e.g. `Stage: Sapling, XP: 120`
pub fn garden_summary(progress: &ProgressionState) -> String {
    format!("Stage: {}, XP: {}", progress.garden_stage().label(), progress.xp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;

    #[test]
    fn test_history_empty_batch() {
        assert_eq!(history_summary(&TaskBatch::default()), "No recent history.");
    }

    #[test]
    fn test_history_stats_and_limit() {
        let mut tasks: Vec<Task> = (0..7)
            .map(|i| Task::new(format!("id-{i}"), format!("Task {i}"), "1 min").with_reward(10))
            .collect();
        tasks[0].completed = true;
        tasks[6].completed = true;
        // no reward: counts as the default
        tasks[6].xp_reward = None;

        let summary = history_summary(&TaskBatch::new(tasks));
        let value: serde_json::Value = serde_json::from_str(&summary).unwrap();

        assert_eq!(value["stats"], "User has 30 XP total. Completed 2/7 recent tasks.");
        let recent = value["recentTasks"].as_array().unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0]["title"], "Task 0");
        assert_eq!(recent[0]["completed"], true);
        assert_eq!(recent[0]["xp"], 10);
        assert_eq!(recent[0]["difficulty"], "medium");
    }

    #[test]
    fn test_garden_summary() {
        assert_eq!(garden_summary(&ProgressionState::ZERO), "Stage: Seed, XP: 0");

        let state = ProgressionState {
            xp: 120,
            stage: 2,
            cycle: 1,
        };
        assert_eq!(garden_summary(&state), "Stage: Sapling, XP: 120");
    }
}
