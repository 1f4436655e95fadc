use std::sync::Arc;
use std::thread;

use log::{error, info};
use thiserror::Error;

use crate::config::{Axis, ConfigError, RunConfig};
use crate::ipc::{LogSink, StopSignal};
use crate::metrics::MetricsReport;
use crate::robot::{Chassis, Imu, MotionOutcome};

use super::sampling_thread::{spawn_sampling_thread, LoopStats, RunSummary, SamplingLoop};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid run config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn sampling thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("sampling thread panicked")]
    SamplerPanicked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub motion: MotionOutcome,
    pub summary: RunSummary,
    pub metrics: MetricsReport,
}

/// Runs one tuning motion while the sampling thread logs the controller.
pub struct RunCoordinator {
    chassis: Arc<dyn Chassis>,
    imu: Arc<dyn Imu>,
}

impl RunCoordinator {
    pub fn new(chassis: Arc<dyn Chassis>, imu: Arc<dyn Imu>) -> Self {
        Self { chassis, imu }
    }

    /// Blocks until the motion returns. A fatal sample or a failed read ends
    /// sampling within one period, but the motion still runs until it settles
    /// or times out.
    pub fn run(&self, config: RunConfig, sink: Box<dyn LogSink>) -> Result<RunReport, RunError> {
        self.run_with_signal(config, sink, StopSignal::new())
    }

    /// Like [`run`](Self::run), but with a caller-held signal. Raising it
    /// ends sampling early; the motion call itself still runs to completion.
    pub fn run_with_signal(
        &self,
        config: RunConfig,
        sink: Box<dyn LogSink>,
        stop: StopSignal,
    ) -> Result<RunReport, RunError> {
        self.run_with_stats(config, sink, stop, LoopStats::new())
    }

    /// Like [`run_with_signal`](Self::run_with_signal), counting into
    /// caller-held `stats` that can be read from any thread during the run.
    pub fn run_with_stats(
        &self,
        config: RunConfig,
        sink: Box<dyn LogSink>,
        stop: StopSignal,
        stats: Arc<LoopStats>,
    ) -> Result<RunReport, RunError> {
        config.validate()?;

        let sampling = SamplingLoop::new(
            config.clone(),
            self.chassis.clone(),
            self.imu.clone(),
            sink,
            stop.clone(),
        )
        .with_stats(stats);
        let metrics = sampling.metrics();
        let handle = spawn_sampling_thread(sampling).map_err(RunError::Spawn)?;

        // Let the sampler take its first readings before anything moves
        thread::sleep(config.startup_delay());

        let motion = self.execute_motion(&config);
        info!("{} motion finished: {}", config.axis, motion);

        stop.request_stop();
        let summary = handle.join().map_err(|_| {
            error!("sampling thread panicked");
            RunError::SamplerPanicked
        })?;

        Ok(RunReport {
            motion,
            summary,
            metrics: metrics.report(),
        })
    }

    fn execute_motion(&self, config: &RunConfig) -> MotionOutcome {
        let options = config.motion_options();
        match config.axis {
            Axis::Angular => self
                .chassis
                .turn_to_heading(config.target, config.timeout(), options),
            Axis::Lateral => self
                .chassis
                .move_to_pose(0.0, config.target, 0.0, config.timeout(), options),
        }
    }
}
