//! Scripted robot for end-to-end runs: constant readings with per-sample
//! overrides and a motion call that just blocks for a fixed time.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pid_tuning_logger::{
    Chassis, DeviceError, Imu, MotionOptions, MotionOutcome, Pose, StopSignal, Vector3,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCall {
    Turn { heading: f64, timeout: Duration },
    Move { x: f64, y: f64, heading: f64, timeout: Duration },
}

pub struct ScriptedRobot {
    measured: f64,
    rate: f64,
    motion_duration: Duration,
    measured_at: HashMap<u64, f64>,
    rate_at: HashMap<u64, f64>,
    pose_failure_at: Option<u64>,
    watched: Option<StopSignal>,
    reads: AtomicU64,
    pub calls: Mutex<Vec<MotionCall>>,
    /// Whether the stop signal was already raised when the motion returned.
    pub stop_seen_at_return: Mutex<Option<bool>>,
}

impl ScriptedRobot {
    pub fn constant(measured: f64, rate: f64, motion_duration: Duration) -> Self {
        Self {
            measured,
            rate,
            motion_duration,
            measured_at: HashMap::new(),
            rate_at: HashMap::new(),
            pose_failure_at: None,
            watched: None,
            reads: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            stop_seen_at_return: Mutex::new(None),
        }
    }

    /// Overrides the measured value of the `sample`-th read (0-based).
    pub fn with_measured_at(mut self, sample: u64, measured: f64) -> Self {
        self.measured_at.insert(sample, measured);
        self
    }

    pub fn with_rate_at(mut self, sample: u64, rate: f64) -> Self {
        self.rate_at.insert(sample, rate);
        self
    }

    pub fn with_pose_failure_at(mut self, sample: u64) -> Self {
        self.pose_failure_at = Some(sample);
        self
    }

    pub fn watching(mut self, stop: StopSignal) -> Self {
        self.watched = Some(stop);
        self
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn current_sample(&self) -> u64 {
        self.reads.load(Ordering::SeqCst).saturating_sub(1)
    }

    fn current_rate(&self) -> f64 {
        let sample = self.current_sample();
        self.rate_at.get(&sample).copied().unwrap_or(self.rate)
    }

    fn block(&self, call: MotionCall) -> MotionOutcome {
        self.calls.lock().push(call);
        thread::sleep(self.motion_duration);
        if let Some(stop) = &self.watched {
            *self.stop_seen_at_return.lock() = Some(stop.is_stop_requested());
        }
        MotionOutcome::Settled
    }
}

impl Chassis for ScriptedRobot {
    fn pose(&self) -> Result<Pose, DeviceError> {
        let sample = self.reads.fetch_add(1, Ordering::SeqCst);
        if self.pose_failure_at == Some(sample) {
            return Err(DeviceError::Disconnected { device: "odometry" });
        }
        let measured = self.measured_at.get(&sample).copied().unwrap_or(self.measured);
        Ok(Pose {
            x: 0.0,
            y: measured,
            theta: measured,
        })
    }

    fn turn_to_heading(&self, heading: f64, timeout: Duration, _options: MotionOptions) -> MotionOutcome {
        self.block(MotionCall::Turn { heading, timeout })
    }

    fn move_to_pose(
        &self,
        x: f64,
        y: f64,
        heading: f64,
        timeout: Duration,
        _options: MotionOptions,
    ) -> MotionOutcome {
        self.block(MotionCall::Move { x, y, heading, timeout })
    }
}

impl Imu for ScriptedRobot {
    fn gyro_rate(&self) -> Result<f64, DeviceError> {
        Ok(self.current_rate())
    }

    fn acceleration(&self) -> Result<Vector3, DeviceError> {
        Ok(Vector3 {
            x: 0.0,
            y: self.current_rate(),
            z: 9.81,
        })
    }
}
