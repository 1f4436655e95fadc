use std::process::ExitCode;
use std::sync::Arc;

use log::{error, warn, LevelFilter};

use pid_tuning_logger::{
    load_config, logger, RunConfig, RunCoordinator, SimulatedRobot, Termination, WriterSink,
};

const DEFAULT_CONFIG_PATH: &str = "config/tuning.toml";

fn main() -> ExitCode {
    if let Err(e) = logger::init(LevelFilter::Info) {
        eprintln!("logger already initialized: {}", e);
    }

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{} ({}), using defaults", e, path);
            RunConfig::default()
        }
    };

    eprintln!("===========================================");
    eprintln!("PID tuning run: {} axis, target {}", config.axis, config.target);
    eprintln!(
        "kP={} kI={} kD={}, period {} ms, timeout {} ms",
        config.gains.kp, config.gains.ki, config.gains.kd, config.sample_period_ms, config.timeout_ms
    );
    eprintln!("===========================================\n");

    let robot = Arc::new(SimulatedRobot::new(42));
    let coordinator = RunCoordinator::new(robot.clone(), robot);

    let report = match coordinator.run(config, Box::new(WriterSink::stdout())) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let metrics = &report.metrics;
    eprintln!("\n=== Run Results ===");
    eprintln!("Motion: {}", report.motion);
    eprintln!(
        "Samples logged: {} of {} iterations",
        report.summary.samples_logged, report.summary.iterations
    );
    eprintln!("Loop work P50: {:?}, P99: {:?}, max: {:?}", metrics.work_p50, metrics.work_p99, metrics.work_max);
    eprintln!(
        "Loop period P50: {:?}, P99: {:?}, jitter P99: {:?}, overruns: {}",
        metrics.period_p50, metrics.period_p99, metrics.jitter_p99, metrics.overruns
    );

    match report.summary.termination {
        Termination::Stopped => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
