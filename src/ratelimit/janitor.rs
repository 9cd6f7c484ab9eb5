//! Periodic eviction of expired window records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::store::WindowStore;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Background task that sweeps a [`WindowStore`] on a fixed interval.
pub struct Janitor;

impl Janitor {
    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first sweep happens one `interval` after spawning. The loop runs
    /// until [`JanitorHandle::shutdown`] is called or the handle is dropped.
    pub fn spawn(
        store: Arc<WindowStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> JanitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        // tokio intervals panic on a zero period.
        let interval = if interval.is_zero() {
            warn!("Janitor interval of zero requested, using one second");
            Duration::from_secs(1)
        } else {
            interval
        };

        info!(interval_secs = interval.as_secs_f64(), "Starting store janitor");

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = store.sweep(clock.now_millis());
                        if evicted > 0 {
                            info!(evicted, remaining = store.len(), "Evicted expired windows");
                        } else {
                            debug!(remaining = store.len(), "Janitor sweep found nothing to evict");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        info!("Store janitor stopped");
                        break;
                    }
                }
            }
        });

        JanitorHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owns the janitor task. Dropping it stops the task.
pub struct JanitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl JanitorHandle {
    /// Signal the janitor to stop and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Store janitor task ended abnormally");
            }
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for JanitorHandle {
    fn drop(&mut self) {
        // Dropping the sender wakes the select above.
        self.shutdown.take();
    }
}
