// --- File: crates/calbridge_gcal/src/sweeper.rs ---
//! Periodic redelivery of queued event creations.
//!
//! Every tick walks the entries present when the tick starts, front to back.
//! Each attempt increments the entry's counter first; an entry leaves the
//! queue when delivery succeeds, when its timestamps turn out invalid, or when
//! a failed attempt brings it to the ceiling. Retries run at the fixed
//! interval, there is no backoff.

use calbridge_common::services::CalendarGateway;
use calbridge_config::RetryConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::queue::{Attempt, PendingEventQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

impl SweeperSettings {
    /// Intervals below one second are raised to one second.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs.max(1)),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose counter was incremented this pass
    pub attempted: usize,
    pub delivered: usize,
    /// Failed and kept for the next tick
    pub retried: usize,
    /// Dropped after reaching the attempt ceiling
    pub abandoned: usize,
    /// Dropped because their time range can never be delivered
    pub invalid: usize,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        *self == SweepReport::default()
    }
}

pub struct RetrySweeper {
    queue: Arc<PendingEventQueue>,
    gateway: Arc<dyn CalendarGateway>,
    settings: SweeperSettings,
    pass_lock: Mutex<()>,
}

impl RetrySweeper {
    pub fn new(
        queue: Arc<PendingEventQueue>,
        gateway: Arc<dyn CalendarGateway>,
        settings: SweeperSettings,
    ) -> Self {
        Self {
            queue,
            gateway,
            settings,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> SweeperSettings {
        self.settings
    }

    /// Runs one pass over the queue. Concurrent callers wait for the running
    /// pass to finish; passes never overlap.
    pub async fn sweep_once(&self) -> SweepReport {
        let _pass = self.pass_lock.lock().await;
        let mut report = SweepReport::default();
        let max_attempts = self.settings.max_attempts;

        for id in self.queue.ids() {
            let entry = match self.queue.begin_attempt(&id, max_attempts) {
                Some(Attempt::Ready(entry)) => entry,
                Some(Attempt::Exhausted(entry)) => {
                    warn!(
                        "Dropping queued event {} ({}): already at {} attempts",
                        entry.id, entry.summary, entry.attempts
                    );
                    report.abandoned += 1;
                    continue;
                }
                None => continue,
            };
            report.attempted += 1;

            let draft = match entry.to_draft() {
                Ok(draft) => draft,
                Err(reason) => {
                    self.queue.remove(&entry.id);
                    error!(
                        "Dropping queued event {} ({}): invalid time range: {}",
                        entry.id, entry.summary, reason
                    );
                    report.invalid += 1;
                    continue;
                }
            };

            match self.gateway.create_event(&entry.calendar_id, draft).await {
                Ok(created) => {
                    self.queue.remove(&entry.id);
                    info!(
                        "Delivered queued event {} as {} on attempt {}",
                        entry.id, created.id, entry.attempts
                    );
                    report.delivered += 1;
                }
                Err(e) if entry.attempts >= max_attempts => {
                    self.queue.remove(&entry.id);
                    warn!(
                        "Giving up on queued event {} ({}) after {} attempts: {}",
                        entry.id, entry.summary, entry.attempts, e
                    );
                    report.abandoned += 1;
                }
                Err(e) => {
                    debug!(
                        "Redelivery of {} failed (attempt {}/{}): {}",
                        entry.id, entry.attempts, max_attempts, e
                    );
                    report.retried += 1;
                }
            }
        }

        report
    }

    /// Spawns the periodic loop. The first tick fires one interval from now.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.settings.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "Retry sweeper running every {}s, at most {} attempts",
                period.as_secs(),
                self.settings.max_attempts
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.queue.is_empty() {
                            continue;
                        }
                        let report = self.sweep_once().await;
                        if !report.is_idle() {
                            info!(
                                "Sweep: {} attempted, {} delivered, {} retrying, {} abandoned, {} invalid, {} pending",
                                report.attempted,
                                report.delivered,
                                report.retried,
                                report.abandoned,
                                report.invalid,
                                self.queue.len()
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Retry sweeper loop exited");
        });

        SweeperHandle {
            shutdown_tx,
            handle,
        }
    }
}

/// Running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals shutdown and waits for the loop to exit. A pass in progress is
    /// allowed to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        match self.handle.await {
            Ok(()) => info!("Retry sweeper stopped"),
            Err(e) => error!("Retry sweeper task failed: {}", e),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
