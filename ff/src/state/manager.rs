//! StateManager - actor that owns garden progress and the task batch
//!
//! All reads and writes go through one channel and are applied in arrival
//! order by a single task. Every mutation is persisted before the next
//! command is handled.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info};

use crate::domain::{Completion, ProgressionState, TaskBatch};

use super::messages::{StateCommand, StateError, StateEvent, StateResponse};
use super::persistence::GardenStore;
use super::queue::DepositQueue;

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
    queue: DepositQueue,
    /// Broadcast sender for state change notifications
    event_tx: broadcast::Sender<StateEvent>,
}

impl StateManager {
    /// Spawn a new StateManager actor
    ///
    /// Loads the stored state (falling back to defaults) and starts the actor
    /// and its deposit queue. Must be called inside a tokio runtime.
    pub fn spawn(store: GardenStore, deposit_delay: Duration) -> Self {
        debug!(delay_ms = deposit_delay.as_millis() as u64, "spawn: called");
        let progress = store.load_progress();
        let batch = store.load_batch();
        info!(
            xp = progress.xp,
            stage = progress.stage,
            cycle = progress.cycle,
            task_count = batch.len(),
            "Loaded garden state"
        );

        let (tx, rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);
        let queue = DepositQueue::spawn(&tx, deposit_delay);

        let actor = Actor {
            store,
            progress,
            batch,
            queue: queue.clone(),
            event_tx: event_tx.clone(),
        };
        tokio::spawn(actor.run(rx));

        info!("StateManager spawned");

        Self { tx, queue, event_tx }
    }

    /// Subscribe to state change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)
    }

    /// Current garden progress
    pub async fn progress(&self) -> StateResponse<ProgressionState> {
        debug!("progress: called");
        self.request(|reply| StateCommand::GetProgress { reply }).await
    }

    /// Snapshot of the current batch
    pub async fn batch(&self) -> StateResponse<TaskBatch> {
        debug!("batch: called");
        self.request(|reply| StateCommand::GetBatch { reply }).await
    }

    /// Replace the batch wholesale, discarding any unfinished tasks
    pub async fn replace_batch(&self, batch: TaskBatch) -> StateResponse<()> {
        debug!(task_count = batch.len(), "replace_batch: called");
        self.request(|reply| StateCommand::ReplaceBatch { batch, reply }).await?
    }

    /// Mark a task completed; a fresh completion queues its reward
    pub async fn complete_task(&self, id: &str) -> StateResponse<Completion> {
        debug!(%id, "complete_task: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::CompleteTask { id, reply }).await?
    }

    /// Queue a deposit not tied to a task (the manual grow trigger)
    pub async fn deposit(&self, amount: u32) -> StateResponse<()> {
        debug!(amount, "deposit: called");
        self.request(|reply| StateCommand::QueueDeposit { amount, reply }).await?
    }

    /// Drop the batch and remove it from storage
    pub async fn clear_batch(&self) -> StateResponse<()> {
        debug!("clear_batch: called");
        self.request(|reply| StateCommand::ClearBatch { reply }).await?
    }

    /// Wait until every deposit queued so far has been applied
    pub async fn settle(&self) -> StateResponse<()> {
        debug!("settle: called");
        self.queue.flush().await
    }

    /// Apply outstanding deposits, then stop the actor
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.settle().await?;
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// State owned by the actor task
struct Actor {
    store: GardenStore,
    progress: ProgressionState,
    batch: TaskBatch,
    queue: DepositQueue,
    event_tx: broadcast::Sender<StateEvent>,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::Receiver<StateCommand>) {
        debug!("StateManager actor started");

        while let Some(cmd) = rx.recv().await {
            match cmd {
                StateCommand::GetProgress { reply } => {
                    let _ = reply.send(self.progress);
                }

                StateCommand::GetBatch { reply } => {
                    let _ = reply.send(self.batch.clone());
                }

                StateCommand::ReplaceBatch { batch, reply } => {
                    debug!(task_count = batch.len(), "actor: ReplaceBatch command");
                    let task_count = batch.len();
                    self.batch = batch;
                    let result = self.store.save_batch(&self.batch);
                    self.notify(StateEvent::BatchReplaced { task_count });
                    let _ = reply.send(result);
                }

                StateCommand::CompleteTask { id, reply } => {
                    debug!(%id, "actor: CompleteTask command");
                    let _ = reply.send(self.complete_task(&id));
                }

                StateCommand::QueueDeposit { amount, reply } => {
                    debug!(amount, "actor: QueueDeposit command");
                    let result = if amount == 0 { Ok(()) } else { self.queue.enqueue(amount) };
                    let _ = reply.send(result);
                }

                StateCommand::ApplyDeposit { amount, reply } => {
                    debug!(amount, "actor: ApplyDeposit command");
                    let growth = self.progress.deposit(amount);
                    self.progress = growth.after;
                    if growth.leveled_up() {
                        info!(
                            stage = %growth.after.garden_stage(),
                            cycle = growth.after.cycle,
                            level = growth.after.level(),
                            "Garden grew"
                        );
                    }
                    let result = self.store.save_progress(&self.progress).map(|_| growth);
                    if let Err(e) = &result {
                        error!(error = %e, "Failed to persist garden progress");
                    }
                    self.notify(StateEvent::ExperienceApplied(growth));
                    let _ = reply.send(result);
                }

                StateCommand::ClearBatch { reply } => {
                    debug!("actor: ClearBatch command");
                    self.batch = TaskBatch::default();
                    let result = self.store.clear_batch();
                    self.notify(StateEvent::BatchCleared);
                    let _ = reply.send(result);
                }

                StateCommand::Shutdown => {
                    info!("StateManager shutting down");
                    break;
                }
            }
        }

        debug!("StateManager actor stopped");
    }

    fn complete_task(&mut self, id: &str) -> StateResponse<Completion> {
        let completion = self.batch.complete(id);

        if let Completion::Completed { id, reward } = &completion {
            if let Err(e) = self.store.save_batch(&self.batch) {
                error!(%id, error = %e, "Failed to persist completed task");
            }
            self.queue.enqueue(*reward)?;
            self.notify(StateEvent::TaskCompleted {
                id: id.clone(),
                reward: *reward,
            });
        }

        Ok(completion)
    }

    fn notify(&self, event: StateEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use crate::state::persistence::{GARDEN_KEY, TASKS_KEY};
    use kvstore::{KvBackend, MemoryStore};
    use std::sync::Arc;

    fn spawn_with(delay_ms: u64) -> (Arc<MemoryStore>, StateManager) {
        let backend = Arc::new(MemoryStore::new());
        let manager = StateManager::spawn(GardenStore::new(backend.clone()), Duration::from_millis(delay_ms));
        (backend, manager)
    }

    fn batch_of(rewards: &[u32]) -> TaskBatch {
        TaskBatch::new(
            rewards
                .iter()
                .enumerate()
                .map(|(i, r)| Task::new(format!("task-{i}"), format!("Task {i}"), "1 min").with_reward(*r))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_completion_deposits_after_settle() {
        let (backend, manager) = spawn_with(5);
        manager.replace_batch(batch_of(&[100])).await.unwrap();

        let completion = manager.complete_task("task-0").await.unwrap();
        assert_eq!(completion.reward(), Some(100));

        manager.settle().await.unwrap();
        assert_eq!(manager.progress().await.unwrap().xp, 100);

        let stored = backend.get(GARDEN_KEY).unwrap().unwrap();
        assert!(stored.contains(r#""xp":100"#));

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_repeat_completion_deposits_once() {
        let (_, manager) = spawn_with(0);
        manager.replace_batch(batch_of(&[40])).await.unwrap();

        manager.complete_task("task-0").await.unwrap();
        let again = manager.complete_task("task-0").await.unwrap();
        assert!(matches!(again, Completion::AlreadyCompleted { .. }));

        manager.settle().await.unwrap();
        assert_eq!(manager.progress().await.unwrap().xp, 40);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rapid_completions_all_apply() {
        let (_, manager) = spawn_with(10);
        // 7 x 100 = 700 -> two stages and 100 xp
        manager.replace_batch(batch_of(&[100; 7])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..7 {
            let m = manager.clone();
            handles.push(tokio::spawn(async move { m.complete_task(&format!("task-{i}")).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        manager.settle().await.unwrap();
        assert_eq!(
            manager.progress().await.unwrap(),
            ProgressionState {
                xp: 100,
                stage: 2,
                cycle: 0
            }
        );

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_deposits_wait_for_delay() {
        let (_, manager) = spawn_with(200);
        manager.deposit(50).await.unwrap();

        // Not applied yet
        assert_eq!(manager.progress().await.unwrap().xp, 0);

        manager.settle().await.unwrap();
        assert_eq!(manager.progress().await.unwrap().xp, 50);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let (_, manager) = spawn_with(0);
        let mut events = manager.subscribe_events();

        manager.replace_batch(batch_of(&[300])).await.unwrap();
        manager.complete_task("task-0").await.unwrap();
        manager.settle().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StateEvent::BatchReplaced { task_count: 1 });
        assert_eq!(
            events.recv().await.unwrap(),
            StateEvent::TaskCompleted {
                id: "task-0".to_string(),
                reward: 300
            }
        );
        match events.recv().await.unwrap() {
            StateEvent::ExperienceApplied(growth) => {
                assert_eq!(growth.after.stage, 1);
                assert!(growth.leveled_up());
            }
            other => panic!("unexpected event: {:?}", other),
        }

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_batch_removes_key() {
        let (backend, manager) = spawn_with(0);
        manager.replace_batch(batch_of(&[10, 20])).await.unwrap();
        assert!(backend.get(TASKS_KEY).unwrap().is_some());

        manager.clear_batch().await.unwrap();
        assert!(backend.get(TASKS_KEY).unwrap().is_none());
        assert!(manager.batch().await.unwrap().is_empty());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_reloads_from_store() {
        let backend = Arc::new(MemoryStore::new());
        {
            let manager = StateManager::spawn(GardenStore::new(backend.clone()), Duration::ZERO);
            manager.deposit(650).await.unwrap();
            manager.shutdown().await.unwrap();
        }

        let manager = StateManager::spawn(GardenStore::new(backend.clone()), Duration::ZERO);
        assert_eq!(
            manager.progress().await.unwrap(),
            ProgressionState {
                xp: 50,
                stage: 2,
                cycle: 0
            }
        );
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_actor() {
        let (_, manager) = spawn_with(0);
        let mut events = manager.subscribe_events();
        manager.deposit(10).await.unwrap();
        manager.settle().await.unwrap();
        assert!(matches!(events.recv().await, Ok(StateEvent::ExperienceApplied(_))));

        drop(manager);

        // the actor owns the last event sender
        let closed = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("actor should stop once every handle is dropped");
        assert!(matches!(closed, Err(broadcast::error::RecvError::Closed)));
    }
}
