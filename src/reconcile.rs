//! Reconciliation engine: the sole writer of authoritative snapshots.
//!
//! Three sources feed the same refresh path: manual refresh, the
//! fixed-interval poll, and push events (which carry no payload and only
//! trigger a re-fetch). Snapshots overwrite whole store slices, so fetch
//! races are benign: the last completed fetch wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::CoreResult;
use crate::gateway::client::ApiClient;
use crate::gateway::events::{PushChannel, PushEvent};
use crate::store::EntityStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

pub struct Reconciler {
    api: Arc<ApiClient>,
    store: Arc<EntityStore>,
    poll_interval: Duration,
}

impl Reconciler {
    pub fn new(api: Arc<ApiClient>, store: Arc<EntityStore>, poll_interval: Duration) -> Self {
        Self {
            api,
            store,
            poll_interval,
        }
    }

    /// One full authoritative refresh of both store slices.
    pub async fn refresh(&self) -> CoreResult<()> {
        let user = self.api.fetch_me().await?;
        self.store.apply_user_snapshot(user);

        let transactions = self.api.fetch_transactions().await?;
        self.store.apply_transactions_snapshot(transactions);
        Ok(())
    }

    /// Spawns the poll loop and, when given, the push subscription. Both
    /// tasks stop deterministically through the returned handle.
    pub fn spawn(self: Arc<Self>, push: Option<PushChannel>) -> ReconcilerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, event_rx) = mpsc::channel(16);

        let mut tasks = Vec::new();
        if let Some(push) = push {
            tasks.push(tokio::spawn(push.run(event_tx, shutdown_rx.clone())));
        }
        // without a push channel the sender drops here and the event branch
        // goes quiet after the first recv
        tasks.push(tokio::spawn(run_loop(self, event_rx, shutdown_rx)));

        ReconcilerHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }
}

async fn run_loop(
    reconciler: Arc<Reconciler>,
    mut events: mpsc::Receiver<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(reconciler.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if let Err(e) = reconciler.refresh().await {
                    tracing::warn!("poll refresh failed: {e}");
                }
            }
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    tracing::debug!(?event, "push event received, refreshing");
                    if let Err(e) = reconciler.refresh().await {
                        tracing::warn!("push refresh failed: {e}");
                    }
                }
                None => events_open = false,
            },
        }
    }
    tracing::debug!("reconciler stopped");
}

/// Owns the reconciliation tasks for one watch session. `shutdown` stops
/// them deterministically; dropping the handle aborts whatever remains.
pub struct ReconcilerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Signals every task and waits for each to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
