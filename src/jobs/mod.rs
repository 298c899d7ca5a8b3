//! Scheduled jobs
//!
//! The pending-transaction sweep: a periodic background task that retries
//! queued transactions whose exchange rate was unavailable when they were
//! requested. Each row is retried independently; one row's failure never
//! aborts the sweep for the others.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::interval;

use crate::services::{PendingOutcome, TransactionService};
use crate::store::PendingStore;

/// Claims older than this are assumed to belong to a crashed sweep and are
/// returned to the queue.
const STALE_CLAIM_SECS: i64 = 900;

/// Rows claimed per pass.
const CLAIM_BATCH_SIZE: i64 = 100;

/// Configuration for the sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often a full sweep runs (default: 2 hours)
    pub sweep_interval: Duration,
    /// Retry budget per pending transaction (default: 10)
    pub max_retries: i32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(7200),
            max_retries: 10,
        }
    }
}

/// Report from one sweep pass
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub claimed: usize,
    pub applied: usize,
    pub retried: usize,
    pub exhausted: usize,
    pub errors: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Periodic retry of queued transactions
pub struct PendingSweeper {
    transactions: TransactionService,
    pending: PendingStore,
    config: SweeperConfig,
}

impl PendingSweeper {
    pub fn new(transactions: TransactionService, pending: PendingStore) -> Self {
        Self {
            transactions,
            pending,
            config: SweeperConfig::default(),
        }
    }

    pub fn with_config(
        transactions: TransactionService,
        pending: PendingStore,
        config: SweeperConfig,
    ) -> Self {
        Self {
            transactions,
            pending,
            config,
        }
    }

    /// Start the sweeper in the background.
    /// Returns a handle that can be used to abort it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            max_retries = self.config.max_retries,
            "pending sweeper started"
        );

        let mut ticker = interval(self.config.sweep_interval);
        loop {
            ticker.tick().await;
            let report = self.run_once().await;
            tracing::info!(
                claimed = report.claimed,
                applied = report.applied,
                retried = report.retried,
                exhausted = report.exhausted,
                errors = report.errors.len(),
                "sweep pass finished"
            );
        }
    }

    /// Run one sweep pass (also used by tests and manual triggers).
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        // Reclaim rows a crashed sweep left behind.
        match self.pending.release_stale(STALE_CLAIM_SECS).await {
            Ok(released) if released > 0 => {
                tracing::warn!(released, "released stale pending claims");
            }
            Ok(_) => {}
            Err(e) => report.errors.push(format!("stale release: {}", e)),
        }

        let rows = match self
            .pending
            .claim_batch(self.config.max_retries, CLAIM_BATCH_SIZE)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                report.errors.push(format!("claim: {}", e));
                report.completed_at = Some(Utc::now());
                return report;
            }
        };

        if rows.is_empty() {
            report.completed_at = Some(Utc::now());
            return report;
        }

        report.claimed = rows.len();
        tracing::info!(count = rows.len(), "processing pending transactions");

        for row in &rows {
            match self.transactions.apply_pending(row).await {
                Ok(PendingOutcome::Applied(record)) => {
                    report.applied += 1;
                    tracing::info!(
                        pending_id = %row.id,
                        transaction_id = %record.id,
                        kind = %row.kind,
                        "pending transaction applied"
                    );
                }
                Ok(PendingOutcome::StillUnavailable { reason }) => {
                    self.record_failure(row.id, &reason, &mut report).await;
                }
                Err(e) => {
                    // The row stays queued with the error attached; the
                    // sweep moves on to the next one.
                    self.record_failure(row.id, &e.to_string(), &mut report)
                        .await;
                    report.errors.push(format!("row {}: {}", row.id, e));
                }
            }
        }

        report.completed_at = Some(Utc::now());
        report
    }

    async fn record_failure(&self, id: uuid::Uuid, reason: &str, report: &mut SweepReport) {
        use crate::domain::PendingStatus;

        match self
            .pending
            .record_failure(id, reason, self.config.max_retries)
            .await
        {
            Ok(PendingStatus::Exhausted) => {
                report.exhausted += 1;
                tracing::warn!(
                    pending_id = %id,
                    max_retries = self.config.max_retries,
                    last_error = reason,
                    "pending transaction exhausted its retry budget; manual review needed"
                );
            }
            Ok(_) => {
                report.retried += 1;
                tracing::debug!(pending_id = %id, last_error = reason, "pending retry failed");
            }
            Err(e) => {
                report.errors.push(format!("record failure {}: {}", id, e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweeper_config_default() {
        let config = SweeperConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(7200));
        assert_eq!(config.max_retries, 10);
    }

    #[test]
    fn test_sweep_report_default() {
        let report = SweepReport::default();
        assert_eq!(report.claimed, 0);
        assert_eq!(report.applied, 0);
        assert!(report.errors.is_empty());
        assert!(report.completed_at.is_none());
    }
}
