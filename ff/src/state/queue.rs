//! Deposit queue
//!
//! Completed tasks pay out after a short presentation delay. Deposits are
//! queued in completion order and forwarded to the StateManager actor one
//! at a time, each only after the previous one has been applied, so no
//! deposit ever starts from a stale base state. Each deposit waits for its
//! own due time, so delays overlap instead of adding up.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::messages::{StateCommand, StateError, StateResponse};

#[derive(Debug)]
enum QueueItem {
    Deposit { amount: u32, due: Instant },
    Flush { reply: oneshot::Sender<()> },
}

/// Handle for queueing deposits
#[derive(Clone)]
pub struct DepositQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    delay: Duration,
}

impl DepositQueue {
    /// Spawn the queue task, forwarding due deposits to `state_tx`
    ///
    /// The task only holds a weak sender, so it never keeps the actor alive
    /// once every handle is gone.
    pub fn spawn(state_tx: &mpsc::Sender<StateCommand>, delay: Duration) -> Self {
        debug!(delay_ms = delay.as_millis() as u64, "DepositQueue::spawn: called");
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(queue_loop(rx, state_tx.downgrade()));
        Self { tx, delay }
    }

    /// Queue `amount` XP, due after the configured delay
    ///
    /// Never blocks, so the actor can call it while handling a command.
    pub fn enqueue(&self, amount: u32) -> StateResponse<()> {
        debug!(amount, "DepositQueue::enqueue: called");
        let due = Instant::now() + self.delay;
        self.tx
            .send(QueueItem::Deposit { amount, due })
            .map_err(|_| StateError::ChannelError)
    }

    /// Wait until every deposit queued before this call has been applied
    pub async fn flush(&self) -> StateResponse<()> {
        debug!("DepositQueue::flush: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(QueueItem::Flush { reply: reply_tx })
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)
    }
}

async fn queue_loop(mut rx: mpsc::UnboundedReceiver<QueueItem>, state_tx: mpsc::WeakSender<StateCommand>) {
    debug!("DepositQueue task started");

    while let Some(item) = rx.recv().await {
        match item {
            QueueItem::Deposit { amount, due } => {
                tokio::time::sleep_until(due).await;

                let Some(state_tx) = state_tx.upgrade() else {
                    warn!(amount, "StateManager gone, dropping queued deposit");
                    break;
                };
                let (reply_tx, reply_rx) = oneshot::channel();
                if state_tx
                    .send(StateCommand::ApplyDeposit {
                        amount,
                        reply: reply_tx,
                    })
                    .await
                    .is_err()
                {
                    warn!(amount, "StateManager gone, dropping queued deposit");
                    break;
                }

                match reply_rx.await {
                    Ok(Ok(growth)) => {
                        debug!(amount, after = ?growth.after, "queue_loop: deposit applied");
                    }
                    Ok(Err(e)) => {
                        warn!(amount, error = %e, "queue_loop: deposit applied but not persisted");
                    }
                    Err(_) => {
                        warn!(amount, "StateManager dropped deposit reply");
                        break;
                    }
                }
            }
            QueueItem::Flush { reply } => {
                debug!("queue_loop: flush reached");
                let _ = reply.send(());
            }
        }
    }

    debug!("DepositQueue task stopped");
}
