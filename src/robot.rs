//! Robot module - The drivetrain and inertial sensor a tuning run talks to
//!
//! Both traits are read from the sampling thread while the coordinator's
//! thread is blocked inside a motion call, so implementations must tolerate
//! pose and sensor reads concurrent with motion execution.

pub mod simulated;

use std::time::Duration;

use thiserror::Error;

pub use simulated::SimulatedRobot;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// Heading in degrees.
    pub theta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    #[error("{device} is disconnected")]
    Disconnected { device: &'static str },
    #[error("{device} read failed: {reason}")]
    ReadFailed { device: &'static str, reason: String },
}

/// Knobs forwarded to the drivetrain's own motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionOptions {
    /// Upper bound on drive speed, `None` for the drivetrain default.
    pub max_speed: Option<f64>,
    /// Drive backwards to reach the pose.
    pub reverse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    Settled,
    TimedOut,
    Interrupted,
}

impl std::fmt::Display for MotionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionOutcome::Settled => write!(f, "Settled"),
            MotionOutcome::TimedOut => write!(f, "TimedOut"),
            MotionOutcome::Interrupted => write!(f, "Interrupted"),
        }
    }
}

pub trait Chassis: Send + Sync {
    /// Latest odometry pose. Must not block.
    fn pose(&self) -> Result<Pose, DeviceError>;

    /// Blocks until the heading is reached or `timeout` elapses.
    fn turn_to_heading(&self, heading: f64, timeout: Duration, options: MotionOptions) -> MotionOutcome;

    /// Blocks until the pose is reached or `timeout` elapses.
    fn move_to_pose(
        &self,
        x: f64,
        y: f64,
        heading: f64,
        timeout: Duration,
        options: MotionOptions,
    ) -> MotionOutcome;
}

pub trait Imu: Send + Sync {
    /// Yaw rate in deg/s.
    fn gyro_rate(&self) -> Result<f64, DeviceError>;

    fn acceleration(&self) -> Result<Vector3, DeviceError>;
}
