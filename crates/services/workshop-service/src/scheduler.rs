//! Recurring background execution of the auto-cancel sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::service::AutoCancelSweep;

pub struct SweepScheduler {
    sweep: Arc<AutoCancelSweep>,
    period: Duration,
}

impl SweepScheduler {
    pub fn new(sweep: Arc<AutoCancelSweep>, period: Duration) -> Self {
        Self { sweep, period }
    }

    /// Start the loop. The first sweep runs immediately; a failing sweep is
    /// logged and retried on the next tick.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(period_secs = self.period.as_secs(), "Auto-cancel scheduler started");

            loop {
                ticker.tick().await;
                match self.sweep.run_once(Utc::now()).await {
                    Ok(report) => {
                        tracing::debug!(cancelled = report.cancelled, "Sweep tick complete");
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Auto-cancel sweep failed");
                    }
                }
            }
        })
    }
}
