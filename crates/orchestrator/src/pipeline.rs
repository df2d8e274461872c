//! Generation pipeline
//!
//! One analysis call, then the eight image tasks in table order. Every call
//! runs to completion before the next one starts, each image call is preceded
//! by the pacing delay, and a failed step never aborts the run.

use backend::GenerationBackend;
use contracts::{
    GenerationTask, InlineImage, PacingSettings, ParentPhoto, ProgressUpdate, ResultAggregate,
    StepKind, StepOutcome, ANALYSIS_EMPTY, ANALYSIS_UNAVAILABLE, TASK_TABLE,
};
use observability::record_run_completed;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::StepError;
use crate::observer::ProgressObserver;
use crate::pacer::Pacer;
use crate::prompts::{image_prompt, ParentParts, ANALYSIS_PROMPT};
use crate::stats::RunStats;

/// Drives a generation backend through the fixed task sequence
#[derive(Debug)]
pub struct Orchestrator<B> {
    backend: B,
    pacer: Pacer,
}

impl<B: GenerationBackend> Orchestrator<B> {
    pub fn new(backend: B, pacer: Pacer) -> Self {
        Self { backend, pacer }
    }

    pub fn from_settings(backend: B, pacing: &PacingSettings) -> Self {
        Self::new(backend, Pacer::from_settings(pacing))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Run the full pipeline and return the aggregate
    ///
    /// Never fails. The analysis field is always populated (with a fallback
    /// text if the backend did not deliver); image slots that could not be
    /// generated stay empty.
    pub async fn run<O>(
        &self,
        parent1: &ParentPhoto,
        parent2: &ParentPhoto,
        observer: &mut O,
    ) -> ResultAggregate
    where
        O: ProgressObserver + ?Sized,
    {
        self.run_with_stats(parent1, parent2, observer).await.0
    }

    /// Like [`Orchestrator::run`], also returning per-step statistics
    #[instrument(
        name = "orchestrator_run",
        skip_all,
        fields(model = %self.backend.model(), pacing_ms = self.pacer.interval().as_millis() as u64)
    )]
    pub async fn run_with_stats<O>(
        &self,
        parent1: &ParentPhoto,
        parent2: &ParentPhoto,
        observer: &mut O,
    ) -> (ResultAggregate, RunStats)
    where
        O: ProgressObserver + ?Sized,
    {
        let started = Instant::now();
        let parents = ParentParts::new(parent1, parent2);
        let mut aggregate = ResultAggregate::new();
        let mut stats = RunStats::default();

        info!(tasks = TASK_TABLE.len(), "Pipeline started");

        let analysis = self.analysis_step(&parents, &mut stats).await;
        publish(&mut aggregate, observer, ProgressUpdate::Analysis(analysis));

        for task in &TASK_TABLE {
            self.pacer.wait().await;

            if let Some(image) = self.image_step(&parents, task, &mut stats).await {
                publish(
                    &mut aggregate,
                    observer,
                    ProgressUpdate::Image {
                        slot: task.slot,
                        image,
                    },
                );
            }
        }

        stats.duration = started.elapsed();
        record_run_completed(aggregate.filled_count(), stats.duration.as_secs_f64() * 1000.0);

        info!(
            slots_filled = stats.slots_filled,
            failed_slots = stats.failed_slots.len(),
            analysis = stats.analysis_outcome.as_str(),
            duration_ms = stats.duration.as_millis() as u64,
            "Pipeline finished"
        );

        (aggregate, stats)
    }

    /// Analysis call; always yields a text
    #[instrument(name = "analysis_step", skip_all)]
    async fn analysis_step(&self, parents: &ParentParts, stats: &mut RunStats) -> String {
        let request = parents.request(self.backend.model(), ANALYSIS_PROMPT);

        let started = Instant::now();
        let result = self.backend.generate_content(&request).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (text, outcome) = match result {
            Ok(response) => match response.text() {
                Some(text) => {
                    info!(chars = text.chars().count(), latency_ms, "Analysis received");
                    (text, StepOutcome::Succeeded)
                }
                None => {
                    warn!("Analysis response carried no text");
                    (ANALYSIS_EMPTY.to_string(), StepOutcome::Empty)
                }
            },
            Err(e) => {
                warn!(error = %e, "Analysis failed, using fallback text");
                (ANALYSIS_UNAVAILABLE.to_string(), StepOutcome::Failed)
            }
        };

        stats.record(StepKind::Analysis, outcome, latency_ms);
        text
    }

    /// One image call; `None` leaves the slot unset
    #[instrument(name = "image_step", skip_all, fields(slot = %task.slot))]
    async fn image_step(
        &self,
        parents: &ParentParts,
        task: &GenerationTask,
        stats: &mut RunStats,
    ) -> Option<InlineImage> {
        let request = parents.request(self.backend.model(), image_prompt(task));

        let started = Instant::now();
        let result = self
            .backend
            .generate_content(&request)
            .await
            .map_err(StepError::from)
            .and_then(|response| {
                response
                    .first_inline_image()
                    .cloned()
                    .ok_or(StepError::NoImage)
            });
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let step = StepKind::Image(task.slot);

        match result {
            Ok(image) => {
                info!(bytes = image.encoded_len(), latency_ms, "Image generated");
                stats.record(step, StepOutcome::Succeeded, latency_ms);
                Some(image)
            }
            Err(e) => {
                warn!(error = %e, "Image step produced no result, slot left empty");
                stats.record(step, e.outcome(), latency_ms);
                None
            }
        }
    }
}

/// Store an update in the aggregate, then hand it to the observer
fn publish<O>(aggregate: &mut ResultAggregate, observer: &mut O, update: ProgressUpdate)
where
    O: ProgressObserver + ?Sized,
{
    if let Err(e) = aggregate.apply(&update) {
        // Each step writes its own field exactly once
        warn!(error = %e, "Dropping duplicate update");
        return;
    }
    observer.on_progress(update);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use backend::{MockBackend, MockConfig, MockReply};
    use contracts::{InlineImage, ParentRole, ResultSlot, RunStatus};

    fn parents() -> (ParentPhoto, ParentPhoto) {
        (
            ParentPhoto::new(ParentRole::Parent1, InlineImage::new("image/jpeg", "cDE=")),
            ParentPhoto::new(ParentRole::Parent2, InlineImage::new("image/jpeg", "cDI=")),
        )
    }

    fn orchestrator(config: MockConfig) -> Orchestrator<MockBackend> {
        Orchestrator::new(MockBackend::with_config(config), Pacer::default())
    }

    async fn run_collect(
        orchestrator: &Orchestrator<MockBackend>,
    ) -> (ResultAggregate, RunStats, Vec<ProgressUpdate>) {
        let (p1, p2) = parents();
        let mut updates = Vec::new();
        let (aggregate, stats) = orchestrator
            .run_with_stats(&p1, &p2, &mut |update: ProgressUpdate| updates.push(update))
            .await;
        (aggregate, stats, updates)
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_steps_succeed() {
        let orchestrator = orchestrator(MockConfig::default().with_text("Likely brown eyes."));
        let (aggregate, stats, updates) = run_collect(&orchestrator).await;

        assert_eq!(aggregate.analysis(), "Likely brown eyes.");
        assert_eq!(aggregate.filled_count(), 8);
        assert_eq!(aggregate.status(), RunStatus::Complete);
        assert_eq!(stats.backend_calls, 9);
        assert_eq!(orchestrator.backend().call_count(), 9);

        let fields: Vec<_> = updates.iter().map(|u| u.field_name()).collect();
        let mut expected = vec!["analysis"];
        expected.extend(ResultSlot::ALL.iter().map(|s| s.field_name()));
        assert_eq!(fields, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_receives_image_from_its_own_call() {
        let orchestrator = orchestrator(MockConfig::default());
        let (aggregate, _, _) = run_collect(&orchestrator).await;

        for (i, slot) in ResultSlot::ALL.iter().enumerate() {
            assert_eq!(aggregate.slot(*slot), Some(&MockBackend::image_for_call(i + 1)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_failure_uses_fallback_and_continues() {
        let orchestrator = orchestrator(MockConfig::default().fail_call(0));
        let (aggregate, stats, updates) = run_collect(&orchestrator).await;

        assert_eq!(aggregate.analysis(), ANALYSIS_UNAVAILABLE);
        assert_eq!(aggregate.filled_count(), 8);
        assert_eq!(stats.analysis_outcome, StepOutcome::Failed);
        assert_eq!(updates.len(), 9);
        assert_eq!(
            updates[0],
            ProgressUpdate::Analysis(ANALYSIS_UNAVAILABLE.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_without_text_uses_empty_fallback() {
        let orchestrator = orchestrator(MockConfig::default().reply(0, MockReply::ImageOnly));
        let (aggregate, stats, _) = run_collect(&orchestrator).await;

        assert_eq!(aggregate.analysis(), ANALYSIS_EMPTY);
        assert_eq!(stats.analysis_outcome, StepOutcome::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_failures_leave_slots_empty() {
        // calls 2 and 5 are the infantGirl and childBoy tasks
        let orchestrator = orchestrator(
            MockConfig::default()
                .fail_call(2)
                .reply(5, MockReply::TextOnly),
        );
        let (aggregate, stats, updates) = run_collect(&orchestrator).await;

        assert_eq!(aggregate.filled_count(), 6);
        assert!(aggregate.slot(ResultSlot::InfantGirl).is_none());
        assert!(aggregate.slot(ResultSlot::ChildBoy).is_none());
        assert_eq!(
            stats.failed_slots,
            vec![ResultSlot::InfantGirl, ResultSlot::ChildBoy]
        );
        assert_eq!(stats.steps.failed, 1);
        assert_eq!(stats.steps.empty, 1);
        assert_eq!(orchestrator.backend().call_count(), 9);
        assert_eq!(updates.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_everything_fails() {
        let orchestrator = orchestrator(MockConfig::default().fail_all(9));
        let (aggregate, stats, updates) = run_collect(&orchestrator).await;

        assert_eq!(aggregate.analysis(), ANALYSIS_UNAVAILABLE);
        assert_eq!(aggregate.status(), RunStatus::NothingGenerated);
        assert_eq!(stats.backend_calls, 9);
        assert_eq!(updates.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_sequential_and_paced() {
        let backend = MockBackend::with_config(
            MockConfig::default().with_latency(Duration::from_millis(1200)),
        );
        let orchestrator = Orchestrator::new(backend, Pacer::new(Duration::from_millis(500)));
        let (_, stats, _) = run_collect(&orchestrator).await;

        let calls = orchestrator.backend().calls();
        assert_eq!(calls.len(), 9);
        assert_eq!(orchestrator.backend().max_in_flight(), 1);

        for pair in calls.windows(2) {
            assert!(pair[1].started_at - pair[0].finished_at >= Duration::from_millis(500));
        }

        // 9 calls at 1.2s plus 8 pacing delays
        assert!(stats.duration >= Duration::from_millis(9 * 1200 + 8 * 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_analysis_prompt() {
        let orchestrator = orchestrator(MockConfig::default());
        run_collect(&orchestrator).await;

        let calls = orchestrator.backend().calls();
        assert_eq!(calls[0].prompt, ANALYSIS_PROMPT);
        assert!(calls[1].prompt.contains("biological boy (age 1 year"));
        assert!(calls.iter().all(|c| c.image_parts == 2));
    }
}
