//! Scheduling helpers: one-shot deferred execution and a stoppable ticker.
//!
//! Both run on the ambient tokio runtime. The ticker follows the same
//! shutdown discipline as a long-running engine loop: a broadcast channel
//! signals termination, and the loop selects on it with priority.

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Runs an async closure once after `delay`, on a spawned task.
///
/// The returned handle can be awaited for the closure's output, or aborted
/// to cancel a pending execution.
pub fn defer<F, Fut, T>(delay: Duration, f: F) -> JoinHandle<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        f().await
    })
}

/// A repeating callback driven by a spawned interval loop.
///
/// The first fire happens one full `period` after spawning; ticks missed
/// while the callback runs long are skipped rather than bunched. Dropping
/// the `Ticker` closes the shutdown channel, which also stops the loop.
pub struct Ticker {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the tick loop, firing `tick` every `period`.
    pub fn spawn(period: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = interval.tick() => {
                        trace!("ticker fired");
                        tick();
                    }
                }
            }
        });
        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signals the tick loop to stop. Safe to call more than once.
    pub fn stop(&self) {
        self.shutdown_tx.send(()).ok();
    }

    /// Stops the tick loop and waits for it to exit.
    pub async fn join(self) {
        self.stop();
        self.handle.await.ok();
    }
}
