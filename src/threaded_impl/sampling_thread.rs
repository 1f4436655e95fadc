use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::{Axis, RunConfig};
use crate::control::{InputValidator, PIDController, SampleValues, ValidationIssue, ValidationOutcome};
use crate::ipc::{LogEntry, LogSink, SampleRecord, StopSignal};
use crate::metrics::LoopMetrics;
use crate::robot::{Chassis, DeviceError, Imu};

/// Fatal errors stop counting here so a stuck fault does not flood the count.
pub const MAX_FATAL_ERRORS: u64 = 5;

// ============================================================================
// LOOP STATS - Counters readable while the loop runs
// ============================================================================

#[derive(Debug, Default)]
pub struct LoopStats {
    iterations: AtomicU64,
    samples_logged: AtomicU64,
    recoverable_errors: AtomicU64,
    fatal_errors: AtomicU64,
}

impl LoopStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn samples_logged(&self) -> u64 {
        self.samples_logged.load(Ordering::Relaxed)
    }

    pub fn recoverable_errors(&self) -> u64 {
        self.recoverable_errors.load(Ordering::Relaxed)
    }

    pub fn fatal_errors(&self) -> u64 {
        self.fatal_errors.load(Ordering::Relaxed)
    }

    fn record_fatal(&self) {
        let _ = self
            .fatal_errors
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < MAX_FATAL_ERRORS).then_some(n + 1)
            });
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The stop signal was raised from outside the loop.
    Stopped,
    /// A sample failed validation with a fatal issue.
    Fatal(ValidationIssue),
    /// A sensor or pose read failed; the loop exited on the spot.
    DeviceFailure(DeviceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Error of the last controller update, logged or not.
    pub last_error: f64,
    pub recoverable_errors: u64,
    pub fatal_errors: u64,
    pub samples_logged: u64,
    pub iterations: u64,
    pub termination: Termination,
}

// ============================================================================
// SAMPLING LOOP
// ============================================================================

/// Owns everything one tuning run samples with: the controller, the sink and
/// the counters. Runs until its [`StopSignal`] is raised.
pub struct SamplingLoop {
    config: RunConfig,
    chassis: Arc<dyn Chassis>,
    imu: Arc<dyn Imu>,
    sink: Box<dyn LogSink>,
    stop: StopSignal,
    stats: Arc<LoopStats>,
    metrics: LoopMetrics,
    controller: PIDController,
    validator: InputValidator,
    sink_errors: u64,
}

impl SamplingLoop {
    pub fn new(
        config: RunConfig,
        chassis: Arc<dyn Chassis>,
        imu: Arc<dyn Imu>,
        sink: Box<dyn LogSink>,
        stop: StopSignal,
    ) -> Self {
        let controller = PIDController::new(config.gains);
        let validator = InputValidator::new(config.rate_limit);
        Self {
            config,
            chassis,
            imu,
            sink,
            stop,
            stats: LoopStats::new(),
            metrics: LoopMetrics::new(),
            controller,
            validator,
            sink_errors: 0,
        }
    }

    /// Counts into `stats` instead of a fresh set, so a caller holding the
    /// same `Arc` can watch the run live.
    pub fn with_stats(mut self, stats: Arc<LoopStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<LoopStats> {
        self.stats.clone()
    }

    pub fn metrics(&self) -> LoopMetrics {
        self.metrics.clone()
    }

    /// Measured value and rate for the configured axis.
    fn read_axis(&self) -> Result<(f64, f64), DeviceError> {
        let pose = self.chassis.pose()?;
        match self.config.axis {
            Axis::Angular => Ok((pose.theta, self.imu.gyro_rate()?)),
            Axis::Lateral => Ok((pose.y, self.imu.acceleration()?.y)),
        }
    }

    fn emit(&mut self, entry: LogEntry) {
        if let Err(e) = self.sink.write(entry) {
            if self.sink_errors == 0 {
                warn!("log sink write failed: {}", e);
            }
            self.sink_errors += 1;
        }
    }

    pub fn run(mut self) -> RunSummary {
        let target = self.config.target;
        let period = self.config.sample_period();
        let run_start = Instant::now();
        let clock_ms = |t: Instant| t.duration_since(run_start).as_secs_f64() * 1000.0;

        self.controller.reset(clock_ms(Instant::now()));
        self.emit(LogEntry::Header);
        info!(
            "{} sampling started (target {}, period {:?})",
            self.config.axis, target, period
        );

        let mut termination = Termination::Stopped;
        let mut previous_start: Option<Instant> = None;

        while !self.stop.is_stop_requested() {
            let cycle_start = Instant::now();
            if let Some(previous) = previous_start {
                self.metrics.record_period(cycle_start - previous, period);
            }
            previous_start = Some(cycle_start);
            let now_ms = clock_ms(cycle_start);
            self.stats.iterations.fetch_add(1, Ordering::Relaxed);

            let (measured, rate) = match self.read_axis() {
                Ok(reading) => reading,
                Err(e) => {
                    error!("Sensor read failed, aborting run: {}", e);
                    self.stop.request_stop();
                    termination = Termination::DeviceFailure(e);
                    break;
                }
            };

            let output = self.controller.update(target, measured, rate, now_ms);
            let values = SampleValues {
                rate,
                time_ms: now_ms,
                target,
                measured,
                p: self.controller.get_p(),
                i: self.controller.get_i(),
                d: self.controller.get_d(),
                output,
            };

            match self.validator.validate(&values) {
                ValidationOutcome::Ok => {
                    let error = self.controller.get_error();
                    self.emit(LogEntry::Sample(SampleRecord {
                        time_ms: now_ms,
                        target,
                        measured,
                        rate,
                        error,
                        p: values.p,
                        i: values.i,
                        d: values.d,
                        output,
                    }));
                    self.stats.samples_logged.fetch_add(1, Ordering::Relaxed);
                }
                ValidationOutcome::Recoverable(issues) => {
                    self.stats.recoverable_errors.fetch_add(1, Ordering::Relaxed);
                    if let Some(issue) = issues.first() {
                        debug!("sample at {:.0} ms dropped: {}", now_ms, issue);
                    }
                }
                ValidationOutcome::Fatal(issues) => {
                    if let Some((first, rest)) = issues.split_first() {
                        error!("Input validation error: {}", first);
                        for issue in rest {
                            debug!("also failed: {}", issue);
                        }
                        if termination == Termination::Stopped {
                            termination = Termination::Fatal(*first);
                        }
                    }
                    self.stop.request_stop();
                    self.stats.record_fatal();
                }
            }

            let elapsed = cycle_start.elapsed();
            self.metrics.record_work(elapsed, period);
            if elapsed < period && !self.stop.is_stop_requested() {
                thread::sleep(period - elapsed);
            }
        }

        let summary = RunSummary {
            last_error: self.controller.get_error(),
            recoverable_errors: self.stats.recoverable_errors(),
            fatal_errors: self.stats.fatal_errors(),
            samples_logged: self.stats.samples_logged(),
            iterations: self.stats.iterations(),
            termination,
        };

        self.emit(LogEntry::Summary(summary.clone()));
        if let Err(e) = self.sink.flush() {
            warn!("log sink flush failed: {}", e);
        }
        if self.sink_errors > 0 {
            warn!("{} log sink writes failed during the run", self.sink_errors);
        }
        info!(
            "{} sampling stopped after {} iterations ({} logged)",
            self.config.axis, summary.iterations, summary.samples_logged
        );

        summary
    }
}

/// Starts `sampling` on its own named thread.
pub fn spawn_sampling_thread(sampling: SamplingLoop) -> io::Result<thread::JoinHandle<RunSummary>> {
    thread::Builder::new()
        .name("pid-sampler".into())
        .spawn(move || sampling.run())
}
