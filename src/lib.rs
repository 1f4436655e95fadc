pub mod config;
pub mod control;
pub mod ipc;
pub mod logger;
pub mod metrics;
pub mod robot;
pub mod threaded_impl;

pub use config::{load_config, Axis, ConfigError, RunConfig};
pub use control::{
    Gains, InputValidator, PIDController, Quantity, SampleValues, Severity, ValidationIssue,
    ValidationOutcome,
};
pub use ipc::{ChannelSink, LogEntry, LogSink, MemorySink, SampleRecord, StopSignal, WriterSink};
pub use metrics::{LoopMetrics, MetricsReport};
pub use robot::{Chassis, DeviceError, Imu, MotionOptions, MotionOutcome, Pose, SimulatedRobot, Vector3};
pub use threaded_impl::{
    LoopStats, RunCoordinator, RunError, RunReport, RunSummary, SamplingLoop, Termination,
};
