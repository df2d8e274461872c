//! # Integration Tests
//!
//! 基于 mock 后端的生成管道端到端测试。
//!
//! 覆盖：
//! - 契约快照（任务表、字段名）
//! - 完整运行场景：全部成功、分析失败、缺少一张图、全部失败
//! - 顺序、隔离、只写一次与节流等性质
//! - 通过 channel observer 从独立任务中流式接收

#[cfg(test)]
mod support {
    use std::time::Duration;

    use backend::{MockBackend, MockConfig};
    use contracts::{InlineImage, ParentPhoto, ParentRole, ProgressUpdate, ResultAggregate};
    use orchestrator::{Orchestrator, Pacer, RunStats};

    pub fn parents() -> (ParentPhoto, ParentPhoto) {
        (
            ParentPhoto::from_data_url(ParentRole::Parent1, "data:image/jpeg;base64,bW9t")
                .unwrap(),
            ParentPhoto::new(ParentRole::Parent2, InlineImage::new("image/png", "ZGFk")),
        )
    }

    pub fn mock_orchestrator(config: MockConfig) -> Orchestrator<MockBackend> {
        Orchestrator::new(
            MockBackend::with_config(config),
            Pacer::new(Duration::from_millis(500)),
        )
    }

    pub async fn run(
        orchestrator: &Orchestrator<MockBackend>,
    ) -> (ResultAggregate, RunStats, Vec<ProgressUpdate>) {
        let (p1, p2) = parents();
        let mut updates = Vec::new();
        let (aggregate, stats) = orchestrator
            .run_with_stats(&p1, &p2, &mut |update: ProgressUpdate| updates.push(update))
            .await;
        (aggregate, stats, updates)
    }

    pub fn field_names(updates: &[ProgressUpdate]) -> Vec<&'static str> {
        updates.iter().map(|u| u.field_name()).collect()
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{ResultSlot, TASK_TABLE};

    #[test]
    fn test_task_table_snapshot() {
        let fields: Vec<_> = TASK_TABLE.iter().map(|t| t.slot.field_name()).collect();
        assert_eq!(
            fields,
            vec![
                "infantBoy",
                "infantGirl",
                "toddlerBoy",
                "toddlerGirl",
                "childBoy",
                "childGirl",
                "teenBoy",
                "teenGirl"
            ]
        );
        assert_eq!(
            TASK_TABLE.iter().map(|t| t.slot).collect::<Vec<_>>(),
            ResultSlot::ALL.to_vec()
        );
    }

    #[test]
    fn test_aggregate_json_shape() {
        let aggregate = contracts::ResultAggregate::new();
        let json = serde_json::to_value(&aggregate).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 9);
        assert!(object.contains_key("analysis"));
        assert!(object.contains_key("toddlerGirl"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use backend::{MockBackend, MockConfig, MockReply};
    use contracts::{
        ProgressUpdate, ResultSlot, RunStatus, StepOutcome, ANALYSIS_UNAVAILABLE, TASK_TABLE,
    };
    use orchestrator::Orchestrator;

    use crate::support::{field_names, mock_orchestrator, run};

    /// All nine calls succeed
    #[tokio::test(start_paused = true)]
    async fn test_scenario_all_succeed() {
        let orchestrator = mock_orchestrator(MockConfig::default().with_text("X"));
        let (aggregate, stats, updates) = run(&orchestrator).await;

        assert_eq!(aggregate.analysis(), "X");
        assert_eq!(aggregate.filled_count(), 8);
        assert_eq!(aggregate.status(), RunStatus::Complete);

        // 每个槽位持有各自调用产生的不同图像
        let mut seen = std::collections::HashSet::new();
        for (i, slot) in ResultSlot::ALL.iter().enumerate() {
            let image = aggregate.slot(*slot).unwrap();
            assert_eq!(image, &MockBackend::image_for_call(i + 1));
            assert!(seen.insert(image.data.clone()));
        }

        assert_eq!(updates.len(), 9);
        assert_eq!(updates[0], ProgressUpdate::Analysis("X".into()));
        assert_eq!(orchestrator.backend().call_count(), 9);
        assert_eq!(stats.backend_calls, 9);
        assert!(stats.failed_slots.is_empty());
    }

    /// Analysis call fails, images unaffected
    #[tokio::test(start_paused = true)]
    async fn test_scenario_analysis_fails() {
        let orchestrator = mock_orchestrator(MockConfig::default().fail_call(0));
        let (aggregate, stats, updates) = run(&orchestrator).await;

        assert_eq!(aggregate.analysis(), ANALYSIS_UNAVAILABLE);
        assert_eq!(aggregate.filled_count(), 8);
        assert_eq!(stats.analysis_outcome, StepOutcome::Failed);
        assert_eq!(updates.len(), 9);
    }

    /// Third image task answers without an image part
    #[tokio::test(start_paused = true)]
    async fn test_scenario_one_image_missing() {
        let third = TASK_TABLE[2].slot;
        let orchestrator = mock_orchestrator(MockConfig::default().reply(3, MockReply::TextOnly));
        let (aggregate, stats, updates) = run(&orchestrator).await;

        assert!(aggregate.slot(third).is_none());
        assert_eq!(aggregate.filled_count(), 7);
        assert_eq!(stats.failed_slots, vec![third]);

        let image_updates = updates.iter().filter(|u| u.slot().is_some()).count();
        assert_eq!(image_updates, 7);
        assert!(!field_names(&updates).contains(&third.field_name()));
    }

    /// Every call fails; the run still resolves
    #[tokio::test(start_paused = true)]
    async fn test_scenario_everything_fails() {
        let orchestrator = mock_orchestrator(MockConfig::default().fail_all(9));
        let (aggregate, stats, updates) = run(&orchestrator).await;

        assert_eq!(aggregate.analysis(), ANALYSIS_UNAVAILABLE);
        assert!(aggregate.is_empty_result());
        assert_eq!(aggregate.status(), RunStatus::NothingGenerated);
        assert_eq!(updates, vec![ProgressUpdate::Analysis(ANALYSIS_UNAVAILABLE.into())]);
        assert_eq!(stats.steps.failed, 9);
        assert_eq!(orchestrator.backend().call_count(), 9);
    }

    /// Settings loaded from TOML drive the pacing interval
    #[tokio::test(start_paused = true)]
    async fn test_settings_drive_pacing() {
        let settings = config_loader::ConfigLoader::load_from_str(
            "[pacing]\ninterval_ms = 1500\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let orchestrator = Orchestrator::from_settings(MockBackend::new(), &settings.pacing);
        let (p1, p2) = crate::support::parents();
        let (_, stats) = orchestrator.run_with_stats(&p1, &p2, &mut |_: ProgressUpdate| {}).await;

        assert!(stats.duration >= std::time::Duration::from_millis(8 * 1500));
    }

    /// interval_ms = 0 加载时被拒绝；手工构造时仍按下限节流
    #[tokio::test(start_paused = true)]
    async fn test_zero_pacing_never_disables_delay() {
        let rejected = config_loader::ConfigLoader::load_from_str(
            "[pacing]\ninterval_ms = 0\n",
            config_loader::ConfigFormat::Toml,
        );
        assert!(rejected.is_err());

        let pacing = contracts::PacingSettings { interval_ms: 0 };
        let orchestrator = Orchestrator::from_settings(MockBackend::new(), &pacing);
        let (p1, p2) = crate::support::parents();
        orchestrator.run_with_stats(&p1, &p2, &mut |_: ProgressUpdate| {}).await;

        let calls = orchestrator.backend().calls();
        assert_eq!(calls.len(), 9);
        for pair in calls.windows(2) {
            let gap = pair[1].started_at - pair[0].finished_at;
            assert!(
                gap >= std::time::Duration::from_millis(contracts::MIN_PACING_INTERVAL_MS),
                "gap {gap:?} before call {}",
                pair[1].index
            );
        }
    }
}

#[cfg(test)]
mod property_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use backend::{MockConfig, MockReply};
    use contracts::{ProgressUpdate, ResultSlot, ANALYSIS_FIELD};
    use orchestrator::progress_channel;
    use tokio::time::Instant;

    use crate::support::{field_names, mock_orchestrator, parents, run};

    /// Notifications follow table order, whatever subset succeeds
    #[tokio::test(start_paused = true)]
    async fn test_notification_order() {
        let orchestrator = mock_orchestrator(
            MockConfig::default()
                .fail_call(1)
                .reply(4, MockReply::NoCandidates)
                .fail_call(8),
        );
        let (_, _, updates) = run(&orchestrator).await;

        let expected: Vec<_> = std::iter::once(ANALYSIS_FIELD)
            .chain(
                ResultSlot::ALL
                    .iter()
                    .filter(|s| {
                        !matches!(
                            s,
                            ResultSlot::InfantBoy | ResultSlot::ToddlerGirl | ResultSlot::TeenGirl
                        )
                    })
                    .map(|s| s.field_name()),
            )
            .collect();
        assert_eq!(field_names(&updates), expected);
    }

    /// A failing step never prevents later steps from being attempted
    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated() {
        for failing in 0..9 {
            let orchestrator = mock_orchestrator(MockConfig::default().fail_call(failing));
            let (aggregate, _, _) = run(&orchestrator).await;

            assert_eq!(orchestrator.backend().call_count(), 9);
            let expected = if failing == 0 { 8 } else { 7 };
            assert_eq!(aggregate.filled_count(), expected, "failing call {failing}");
        }
    }

    /// Each field is reported once and the final aggregate agrees with the stream
    #[tokio::test(start_paused = true)]
    async fn test_fields_written_once() {
        let orchestrator = mock_orchestrator(MockConfig::default());
        let (aggregate, _, updates) = run(&orchestrator).await;

        let mut names = field_names(&updates);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), updates.len());

        // 将进度流重放到最终结果上不应产生任何变化
        let mut replay = aggregate.clone();
        for update in &updates {
            assert!(!replay.merge(update));
        }
        assert_eq!(replay, aggregate);

        let mut rebuilt = contracts::ResultAggregate::new();
        for update in &updates {
            assert!(rebuilt.merge(update));
        }
        assert_eq!(rebuilt, aggregate);
    }

    /// Image calls start no sooner than the interval after the previous call finished
    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_calls() {
        let orchestrator = mock_orchestrator(
            MockConfig::default()
                .with_latency(Duration::from_millis(300))
                .fail_call(2),
        );
        run(&orchestrator).await;

        let calls = orchestrator.backend().calls();
        assert_eq!(calls.len(), 9);
        assert_eq!(orchestrator.backend().max_in_flight(), 1);
        for pair in calls.windows(2) {
            let gap = pair[1].started_at - pair[0].finished_at;
            assert!(gap >= Duration::from_millis(500), "gap {gap:?} before call {}", pair[1].index);
        }
    }

    /// Updates are delivered as soon as their step finishes, not at the end
    #[tokio::test(start_paused = true)]
    async fn test_updates_are_incremental() {
        let orchestrator =
            mock_orchestrator(MockConfig::default().with_latency(Duration::from_millis(200)));
        let (p1, p2) = parents();
        let start = Instant::now();
        let mut arrivals = Vec::new();

        orchestrator
            .run(&p1, &p2, &mut |_: ProgressUpdate| arrivals.push(start.elapsed()))
            .await;

        let calls = orchestrator.backend().calls();
        assert_eq!(arrivals.len(), 9);
        for (arrival, call) in arrivals.iter().zip(&calls) {
            assert_eq!(*arrival, call.finished_at - start);
        }
    }

    /// A spawned run streams through a channel and keeps going if the receiver goes away
    #[tokio::test(start_paused = true)]
    async fn test_channel_observer_from_spawned_run() {
        let orchestrator = Arc::new(mock_orchestrator(MockConfig::default()));
        let (mut observer, mut rx) = progress_channel();

        let task = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let (p1, p2) = parents();
                orchestrator.run(&p1, &p2, &mut observer).await
            })
        };

        let mut received = Vec::new();
        while let Some(update) = rx.recv().await {
            received.push(update.field_name());
            if received.len() == 3 {
                break;
            }
        }
        drop(rx);

        let aggregate = task.await.unwrap();
        assert_eq!(aggregate.filled_count(), 8);
        assert_eq!(orchestrator.backend().call_count(), 9);
        assert_eq!(received, vec!["analysis", "infantBoy", "infantGirl"]);
    }
}
