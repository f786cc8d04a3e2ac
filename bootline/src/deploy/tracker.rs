//! Deployment completion tracker
//!
//! Counts outcomes for a fixed number of deployments and resolves the round's
//! completion sink once the last one reports in. Safe to call from any number
//! of tasks or threads at once.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, info, warn, Span};

use crate::deploy::completion::CompletionSink;
use crate::errors::BootlineError;
use crate::models::unit::{AggregateResult, DeploymentOutcome};

// remaining lives in the high half, failures in the low half, so both move in
// a single compare-and-swap.
const FAILURES_MASK: u64 = 0xFFFF_FFFF;

fn pack(remaining: u32, failures: u32) -> u64 {
    ((remaining as u64) << 32) | failures as u64
}

fn unpack(counters: u64) -> (u32, u32) {
    ((counters >> 32) as u32, (counters & FAILURES_MASK) as u32)
}

/// Result of a single `report` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Outcome recorded, more are expected
    Pending { remaining: usize },

    /// Outcome recorded and the round was resolved by this call
    Completed,

    /// Round already complete, outcome discarded
    Ignored,
}

/// Tracks outstanding deployments for one round
pub struct DeploymentTracker {
    total: usize,
    counters: AtomicU64,
    sink: CompletionSink,
    span: Span,
}

impl DeploymentTracker {
    /// Create a tracker expecting `total` outcomes.
    ///
    /// A tracker with `total == 0` never fires; callers must resolve empty
    /// rounds themselves.
    pub fn new(total: usize, sink: CompletionSink, span: Span) -> Result<Self, BootlineError> {
        let expected = u32::try_from(total).map_err(|_| {
            BootlineError::ConfigError(format!("Too many deployments in one round: {}", total))
        })?;

        Ok(Self {
            total,
            counters: AtomicU64::new(pack(expected, 0)),
            sink,
            span,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        unpack(self.counters.load(Ordering::Acquire)).0 as usize
    }

    #[cfg(test)]
    fn failures(&self) -> usize {
        unpack(self.counters.load(Ordering::Acquire)).1 as usize
    }

    /// Whether the completion sink has fired
    pub fn is_complete(&self) -> bool {
        self.sink.is_resolved()
    }

    /// Record one deployment outcome
    pub fn report(&self, outcome: DeploymentOutcome) -> ReportStatus {
        let _enter = self.span.enter();
        let failed = u32::from(outcome.is_failure());

        // Failures are logged before they are counted so none can follow the summary.
        match &outcome {
            DeploymentOutcome::Failure(e) => {
                error!("Caught error; failed to deploy unit: {}", e);
            }
            DeploymentOutcome::Success(id) if id.is_empty() => {
                error!("Empty deployment ID; failed to deploy unit");
            }
            DeploymentOutcome::Success(_) => {}
        }

        let previous = self
            .counters
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let (remaining, failures) = unpack(current);
                if remaining == 0 {
                    return None;
                }
                Some(pack(remaining - 1, failures + failed))
            });

        let (remaining, failures) = match previous {
            Ok(previous) => {
                let (remaining, failures) = unpack(previous);
                (remaining - 1, failures + failed)
            }
            Err(_) => {
                warn!(
                    "Deployment reported after round completed, ignoring: {:?}",
                    outcome
                );
                return ReportStatus::Ignored;
            }
        };

        if let DeploymentOutcome::Success(id) = &outcome {
            if !id.is_empty() {
                info!(deployment_id = %id, remaining, "Unit deployed");
            }
        }

        if remaining == 0 {
            self.complete(failures as usize);
            ReportStatus::Completed
        } else {
            ReportStatus::Pending {
                remaining: remaining as usize,
            }
        }
    }

    fn complete(&self, failures: usize) {
        let result = AggregateResult::from_counts(failures, self.total);
        if result.is_success() {
            info!("{}", result);
        } else {
            error!("{}", result);
        }

        if !self.sink.resolve(result) {
            warn!("Completion sink already resolved");
        }
    }
}
