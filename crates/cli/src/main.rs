//! # Babycast CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 调用远端后端或进程内 mock 运行生成管道
//! - 流式进度输出与可选的 JSON 报告

mod cli;
mod commands;
mod error;
mod photo;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_pipeline, run_tasks, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Babycast CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Tasks(args) => run_tasks(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// 根据命令行选项构造可观测性配置
///
/// `--quiet` 忽略 RUST_LOG；只有 `run` 会启动 Prometheus 端点。
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let metrics_port = match &cli.command {
        Commands::Run(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };

    ObservabilityConfig {
        log_format: cli.log_format.clone().into(),
        metrics_port,
        default_log_level: default_log_level.to_string(),
        ignore_env_filter: cli.quiet,
    }
}
