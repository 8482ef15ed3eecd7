//! Periodic cycle runner
//!
//! Runs [`UpdatePipeline::run_cycle`] on a fixed interval until a shutdown
//! signal arrives. Cycles never overlap within one scheduler: a tick that
//! fires while a cycle is still running is delayed, not queued up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::SchedulerConfig;
use crate::crawler::pipeline::{CycleReport, UpdatePipeline};

/// Interval-driven runner for the update pipeline
pub struct CycleScheduler {
    pipeline: Arc<UpdatePipeline>,
    interval: Duration,
    run_on_startup: bool,
}

impl CycleScheduler {
    pub fn new(pipeline: Arc<UpdatePipeline>, config: &SchedulerConfig) -> Self {
        Self {
            pipeline,
            interval: config.interval(),
            run_on_startup: config.run_on_startup,
        }
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> usize {
        let (tx, rx) = watch::channel(false);

        let signal = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received, stopping after the current cycle");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to wait for Ctrl+C");
                }
            }
            let _ = tx.send(true);
        });

        let cycles = self.run_until_shutdown(rx).await;
        signal.abort();
        cycles
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped
    ///
    /// Returns the number of cycles that ran.
    pub async fn run_until_shutdown(&self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.run_on_startup {
            // The first tick of an interval completes immediately
            ticker.tick().await;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Scheduler started"
        );

        let mut cycles = 0usize;
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.pipeline.run_cycle().await;
                    cycles += 1;
                    log_report(cycles, &report);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(cycles, "Scheduler stopped");
        cycles
    }
}

fn log_report(cycle: usize, report: &CycleReport) {
    if report.needs_attention() {
        tracing::error!(cycle, duration_ms = report.duration_ms, "{report}");
    } else if report.is_completed() && report.failures.is_empty() {
        tracing::info!(cycle, duration_ms = report.duration_ms, "{report}");
    } else {
        tracing::warn!(cycle, duration_ms = report.duration_ms, "{report}");
    }

    for failure in &report.failures {
        tracing::warn!(
            cycle,
            number = %failure.number,
            category = %failure.category,
            recoverable = failure.recoverable,
            "{}",
            failure.message
        );
    }
}
