// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent-runner: CLI for the autonomous AI-agent scheduler

mod commands;
mod exit_error;

use clap::{Args, Parser, Subcommand};
use exit_error::ExitError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agent-runner", version, about = "Autonomous AI-agent scheduler for GitHub repositories")]
struct Cli {
    /// Path to the runner config file
    #[arg(long, global = true, default_value = "agent-runner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Run exactly one cycle, then exit
    #[arg(long)]
    once: bool,
    /// Seconds between cycles (overrides config)
    #[arg(long)]
    interval: Option<u64>,
    /// Global parallel-run budget (overrides config)
    #[arg(long)]
    concurrency: Option<usize>,
    /// Show what would happen without mutating anything
    #[arg(long)]
    dry_run: bool,
    /// Confirm mutating operation
    #[arg(long)]
    yes: bool,
    /// Machine-readable output
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct ConfirmArgs {
    /// Show what would happen without mutating anything
    #[arg(long)]
    dry_run: bool,
    /// Confirm mutating operation
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long)]
    port: u16,
}

#[derive(Args, Clone)]
struct WebhookServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long)]
    port: u16,
    /// URL path the webhook listens on
    #[arg(long, default_value = "/webhook")]
    path: String,
}

#[derive(Subcommand, Clone)]
enum LabelsCommand {
    /// Create or update the agent labels across target repos
    Sync(ConfirmArgs),
}

#[derive(Subcommand, Clone)]
enum PruneCommand {
    /// Delete entries older than the configured retention
    Prune(ConfirmArgs),
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Run the scheduling loop (default) or a single cycle
    Run(RunArgs),
    /// Label maintenance
    Labels {
        #[command(subcommand)]
        command: LabelsCommand,
    },
    /// Run-log maintenance
    Logs {
        #[command(subcommand)]
        command: PruneCommand,
    },
    /// Idle-report maintenance
    Reports {
        #[command(subcommand)]
        command: PruneCommand,
    },
    /// Print a status snapshot
    Status {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },
    /// Request the loop to stop scheduling new work
    Stop,
    /// Clear a previous stop request
    Resume,
    /// Serve the HTML status page
    Ui(ServeArgs),
    /// Serve the webhook endpoint
    Webhook(WebhookServeArgs),
}

/// Initialize tracing; when a log dir is given, also append to a daily
/// rolling file (the returned guard must stay alive).
fn init_tracing(log_dir: Option<&std::path::Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "runner.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr.and(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

/// Load the config, tolerating a missing file by using defaults.
fn load_config(path: &std::path::Path) -> anyhow::Result<ar_core::RunnerConfig> {
    if path.exists() {
        Ok(ar_core::RunnerConfig::load(path)?)
    } else {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        Ok(ar_core::RunnerConfig::default())
    }
}

async fn run_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run(RunArgs {
        once: false,
        interval: None,
        concurrency: None,
        dry_run: false,
        yes: false,
        json: false,
    }));

    match command {
        Command::Run(args) => {
            let config = load_config(&cli.config)?;
            std::fs::create_dir_all(config.logs_dir())?;
            let _guard = init_tracing(Some(&config.logs_dir()));
            commands::run::run(config, args).await
        }
        Command::Labels { command: LabelsCommand::Sync(args) } => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::labels::sync(config, args).await
        }
        Command::Logs { command: PruneCommand::Prune(args) } => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::prune::logs(config, args)
        }
        Command::Reports { command: PruneCommand::Prune(args) } => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::prune::reports(config, args)
        }
        Command::Status { json } => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::status::status(config, json)
        }
        Command::Stop => {
            let config = load_config(&cli.config)?;
            commands::stop::stop(config)
        }
        Command::Resume => {
            let config = load_config(&cli.config)?;
            commands::stop::resume(config)
        }
        Command::Ui(args) => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::ui::serve(config, &args.host, args.port).await
        }
        Command::Webhook(args) => {
            let config = load_config(&cli.config)?;
            let _guard = init_tracing(None);
            commands::webhook::serve(config, &args.host, args.port, &args.path).await
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            error.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(1)
        }
    };
    std::process::exit(code);
}
