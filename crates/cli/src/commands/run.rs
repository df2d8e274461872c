//! `run` command implementation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use backend::{GeminiBackend, GenerationBackend, MockBackend, MockConfig};
use contracts::{
    ParentPhoto, ParentRole, PipelineSettings, ProgressUpdate, ResultAggregate, RunStatus,
};
use orchestrator::{progress_channel, Orchestrator, RunStats};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::photo::load_photo;

/// One line of progress output
#[derive(Serialize)]
struct ProgressLine<'a> {
    field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoded_bytes: Option<usize>,
}

impl<'a> From<&'a ProgressUpdate> for ProgressLine<'a> {
    fn from(update: &'a ProgressUpdate) -> Self {
        match update {
            ProgressUpdate::Analysis(text) => Self {
                field: update.field_name(),
                analysis: Some(text.as_str()),
                mime_type: None,
                encoded_bytes: None,
            },
            ProgressUpdate::Image { image, .. } => Self {
                field: update.field_name(),
                analysis: None,
                mime_type: Some(image.mime_type.as_str()),
                encoded_bytes: Some(image.encoded_len()),
            },
        }
    }
}

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args)?;

    info!(
        model = %settings.backend.model,
        pacing_ms = settings.pacing.interval_ms,
        mock = args.mock,
        "Configuration loaded"
    );

    let parent1 = load_photo(&args.parent1, ParentRole::Parent1)
        .with_context(|| format!("Failed to load {}", args.parent1.display()))?;
    let parent2 = load_photo(&args.parent2, ParentRole::Parent2)
        .with_context(|| format!("Failed to load {}", args.parent2.display()))?;

    let (aggregate, stats) = if args.mock {
        let mut config = MockConfig::default();
        for call in &args.mock_fail {
            config = config.fail_call(*call);
        }
        let orchestrator =
            Orchestrator::from_settings(MockBackend::with_config(config), &settings.pacing);
        execute(&orchestrator, &parent1, &parent2).await?
    } else {
        let backend = GeminiBackend::from_settings(&settings.backend)
            .context("Backend credential unavailable")?;
        let orchestrator = Orchestrator::from_settings(backend, &settings.pacing);
        execute(&orchestrator, &parent1, &parent2).await?
    };

    print_summary(&aggregate, &stats);

    if let Some(ref path) = args.output {
        write_aggregate(path, &aggregate)?;
        info!(path = %path.display(), "Result aggregate written");
    }

    if aggregate.status() == RunStatus::NothingGenerated {
        warn!("No images were generated");
    }

    Ok(())
}

/// Load settings and apply CLI overrides
fn load_settings(args: &RunArgs) -> Result<PipelineSettings> {
    let mut settings = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(ref model) = args.model {
        info!(model = %model, "Overriding model from CLI");
        settings.backend.model = model.clone();
    }
    if let Some(pacing_ms) = args.pacing_ms {
        info!(pacing_ms, "Overriding pacing interval from CLI");
        settings.pacing.interval_ms = pacing_ms;
    }

    config_loader::ConfigLoader::validate(&settings).context("Invalid settings after overrides")?;
    Ok(settings)
}

/// Run the pipeline while a printer task streams progress lines to stdout
async fn execute<B: GenerationBackend>(
    orchestrator: &Orchestrator<B>,
    parent1: &ParentPhoto,
    parent2: &ParentPhoto,
) -> Result<(ResultAggregate, RunStats)> {
    let (mut observer, rx) = progress_channel();
    let printer = tokio::spawn(print_progress(rx));

    info!("Starting pipeline...");

    let run = orchestrator.run_with_stats(parent1, parent2, &mut observer);
    let result = tokio::select! {
        result = run => result,
        _ = shutdown_signal() => {
            anyhow::bail!("Interrupted before the pipeline finished");
        }
    };

    // Closing the sender lets the printer drain and exit
    drop(observer);
    printer.await.context("Progress printer task failed")?;

    Ok(result)
}

async fn print_progress(mut rx: UnboundedReceiver<ProgressUpdate>) {
    while let Some(update) = rx.recv().await {
        match serde_json::to_string(&ProgressLine::from(&update)) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Failed to render progress line"),
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn write_aggregate(path: &Path, aggregate: &ResultAggregate) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), aggregate)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_summary(aggregate: &ResultAggregate, stats: &RunStats) {
    println!("\n=== Run Summary ===\n");
    println!("Duration: {:.2}s", stats.duration.as_secs_f64());
    println!("Backend calls: {}", stats.backend_calls);
    println!("Analysis ({}): {}", stats.analysis_outcome.as_str(), aggregate.analysis());
    println!("Images: {}/8", aggregate.filled_count());

    let missing = aggregate.missing_slots();
    if !missing.is_empty() {
        println!("Missing:");
        for slot in missing {
            println!("  - {}", slot.field_name());
        }
    }

    println!("\n{}", stats.steps.summary());
}
