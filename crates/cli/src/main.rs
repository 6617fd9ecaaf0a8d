mod cli;
mod executor;
mod program;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use diffexec_core::config::load_dotenv;
use diffexec_core::Config;
use diffexec_queue::{QueueError, Scheduler};

use crate::cli::CliArgs;
use crate::executor::{ExecOutcome, SimulatedExecutor};
use crate::program::SyntheticProgram;

/// How submissions ended, summed over all submitters.
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    completed: usize,
    failed_calls: usize,
    timed_out: usize,
    abandoned: usize,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.completed += other.completed;
        self.failed_calls += other.failed_calls;
        self.timed_out += other.timed_out;
        self.abandoned += other.abandoned;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("failed to load config from environment")?,
    };
    if let Some(dispatchers) = args.dispatchers {
        config.scheduler.dispatchers = dispatchers;
    }
    config.log_summary();

    let scheduler: Arc<Scheduler<SyntheticProgram, ExecOutcome>> =
        Arc::new(Scheduler::new(config.scheduler.clone()));

    // The dispatcher loop blocks, so it gets a blocking-pool thread.
    let runner = Arc::clone(&scheduler);
    let executor = SimulatedExecutor::new(Duration::from_millis(args.exec_delay_ms));
    let dispatcher = tokio::task::spawn_blocking(move || runner.run(&executor));

    let submitters = args.submitters.max(1);
    let mut handles = Vec::with_capacity(submitters);
    for worker in 0..submitters {
        let scheduler = Arc::clone(&scheduler);
        let programs: Vec<usize> = (worker..args.programs).step_by(submitters).collect();
        handles.push(tokio::spawn(submit_all(scheduler, programs)));
    }

    let mut summary = RunSummary::default();
    tokio::select! {
        results = collect(handles) => {
            for result in results? {
                summary.merge(result);
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    scheduler.shutdown();
    dispatcher
        .await
        .context("dispatcher loop panicked")?
        .context("dispatcher loop failed")?;

    let metrics = scheduler.metrics();
    info!(
        completed = summary.completed,
        failed_calls = summary.failed_calls,
        timed_out = summary.timed_out,
        abandoned = summary.abandoned,
        avg_execution_ms = metrics.avg_execution.as_millis() as u64,
        max_queue_depth = metrics.max_queue_depth,
        "run finished"
    );

    if args.json {
        let report = serde_json::json!({
            "config": config.summary(),
            "summary": summary,
            "metrics": metrics,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Submit each program in turn and wait for its outcome.
async fn submit_all(
    scheduler: Arc<Scheduler<SyntheticProgram, ExecOutcome>>,
    programs: Vec<usize>,
) -> Result<RunSummary> {
    let timeout = scheduler.task_timeout();
    let mut summary = RunSummary::default();

    for n in programs {
        let program = SyntheticProgram::generate(n);
        let priority = program.priority();
        let submission = match scheduler.submit(program, priority) {
            Ok(submission) => submission,
            Err(QueueError::ShutDown) => break,
            Err(e) => return Err(e).context("task submission failed"),
        };

        match submission.wait_for(timeout).await {
            Ok(outcome) => {
                summary.completed += 1;
                summary.failed_calls += outcome.failed_calls();
            }
            Err(QueueError::Timeout { id, after }) => {
                warn!(task_id = id, ?after, "gave up waiting for outcome");
                summary.timed_out += 1;
            }
            Err(QueueError::Abandoned(_)) => summary.abandoned += 1,
            Err(e) => return Err(e).context("waiting for outcome failed"),
        }
    }

    Ok(summary)
}

async fn collect(
    handles: Vec<tokio::task::JoinHandle<Result<RunSummary>>>,
) -> Result<Vec<RunSummary>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.context("submitter task panicked")??);
    }
    Ok(results)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
