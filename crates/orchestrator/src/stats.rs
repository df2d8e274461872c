//! Per-run statistics

use std::time::Duration;

use contracts::{ResultSlot, StepKind, StepOutcome};
use observability::{record_step, StepMetricsAggregator};

/// What happened during one run, beyond the aggregate itself
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Backend calls issued (always 9 for a full run)
    pub backend_calls: usize,
    pub analysis_outcome: StepOutcome,
    pub slots_filled: usize,
    /// Slots left unset, in task order
    pub failed_slots: Vec<ResultSlot>,
    pub duration: Duration,
    pub steps: StepMetricsAggregator,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            backend_calls: 0,
            analysis_outcome: StepOutcome::Failed,
            slots_filled: 0,
            failed_slots: Vec::new(),
            duration: Duration::ZERO,
            steps: StepMetricsAggregator::new(),
        }
    }
}

impl RunStats {
    /// Record a finished step locally and through the metrics facade
    pub(crate) fn record(&mut self, step: StepKind, outcome: StepOutcome, latency_ms: f64) {
        self.backend_calls += 1;
        self.steps.update(step, outcome, latency_ms);
        record_step(step, outcome, latency_ms);

        match step {
            StepKind::Analysis => self.analysis_outcome = outcome,
            StepKind::Image(slot) => {
                if outcome == StepOutcome::Succeeded {
                    self.slots_filled += 1;
                } else {
                    self.failed_slots.push(slot);
                }
            }
        }
    }
}
