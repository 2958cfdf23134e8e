//! Periodic background sync.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use super::{SyncReport, SyncService, SyncStatus};
use crate::error::Result;

/// Delay before the next attempt while the remote is unreachable: doubled,
/// never below the regular interval and never above `max`.
fn next_backoff(current: Duration, interval: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max).max(interval)
}

/// Control handle of a background sync task.
pub struct SyncHandle {
    trigger: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<SyncStatus>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Run a pass now instead of waiting for the timer.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Stop the task. A pass already running completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl SyncService {
    /// Sync every `interval` until shut down.
    ///
    /// While the remote is unreachable the delay doubles up to the
    /// configured maximum and falls back to `interval` after a success.
    pub fn spawn_background(&self, interval: Duration) -> SyncHandle {
        let trigger = Arc::new(Notify::new());
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let service = self.clone();
        let notified = trigger.clone();
        let max_backoff = self.config.max_backoff().max(interval);

        let task = tokio::spawn(async move {
            info!("⏰ Background sync every {:?}", interval);
            let mut delay = interval;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = notified.notified() => debug!("Sync triggered"),
                    _ = shutdown_rx.changed() => break,
                }

                delay = match service.sync().await {
                    Err(e) if e.is_unavailable() => {
                        let next = next_backoff(delay, interval, max_backoff);
                        info!("⏳ Retrying sync in {:?}", next);
                        next
                    }
                    // Local failures are reported through the status; retry on schedule.
                    Ok(_) | Err(_) => interval,
                };
            }
            info!("🛑 Background sync stopped");
        });

        SyncHandle {
            trigger,
            shutdown,
            status: self.subscribe_status(),
            task,
        }
    }

    /// Run one sync pass on its own task.
    ///
    /// The pass completes even if the returned handle is dropped.
    pub fn spawn_sync(&self) -> JoinHandle<Result<SyncReport>> {
        let service = self.clone();
        tokio::spawn(async move { service.sync().await })
    }
}
