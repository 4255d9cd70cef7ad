//! Automatic cancellation of stale pending records.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use common::AppResult;
use domain::AUTO_CANCEL_NOTE;

use crate::events::{EventPublisher, ServiceEvent};
use crate::repository::ServiceRecordRepository;
use crate::service::views::RecordAssembler;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records moved to cancelled (and published) by this run
    pub cancelled: usize,
}

/// Cancels pending records whose scheduled date is older than the
/// staleness threshold. Safe to run repeatedly or concurrently: only
/// records still pending at write time are touched.
pub struct AutoCancelSweep {
    records: Arc<dyn ServiceRecordRepository>,
    assembler: Arc<RecordAssembler>,
    publisher: Arc<dyn EventPublisher>,
    stale_after: chrono::Duration,
}

impl AutoCancelSweep {
    pub fn new(
        records: Arc<dyn ServiceRecordRepository>,
        assembler: Arc<RecordAssembler>,
        publisher: Arc<dyn EventPublisher>,
        stale_after: chrono::Duration,
    ) -> Self {
        Self {
            records,
            assembler,
            publisher,
            stale_after,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.stale_after
    }

    /// Run one sweep as of `now`.
    ///
    /// Staleness is measured on `scheduled_date` alone (it defaults to the
    /// booking time), so a booking dated in the future is never stale.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let cancelled = self
            .records
            .cancel_stale_pending(self.cutoff(now), AUTO_CANCEL_NOTE.to_string())
            .await?;

        let report = SweepReport {
            cancelled: cancelled.len(),
        };

        for record in cancelled {
            let view = self.assembler.load(record).await;
            self.publisher.publish(ServiceEvent::service_update(view));
        }

        if report.cancelled > 0 {
            tracing::info!(cancelled = report.cancelled, "Auto-cancel sweep finished");
        }
        Ok(report)
    }
}
