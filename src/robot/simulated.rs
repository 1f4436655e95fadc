use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Chassis, DeviceError, Imu, MotionOptions, MotionOutcome, Pose, Vector3};

const STEP: Duration = Duration::from_millis(10);
const HEADING_TOLERANCE_DEG: f64 = 0.5;
const POSITION_TOLERANCE: f64 = 0.25;

struct SimState {
    rng: StdRng,
    pose: Pose,
    yaw_rate: f64,
    velocity_y: f64,
    accel_y: f64,
    // One-shot faults, consumed by the next matching read
    rate_spike: Option<f64>,
    heading_fault: Option<f64>,
}

/// First-order drivetrain model with noisy sensors.
///
/// Motion calls step the model in real time on the calling thread, so pose
/// and sensor reads from another thread see it move.
pub struct SimulatedRobot {
    state: Mutex<SimState>,
    interrupted: AtomicBool,
    pub max_turn_rate: f64,
    pub max_speed: f64,
    pub response: f64,
    pub noise_amplitude: f64,
}

impl SimulatedRobot {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                rng: StdRng::seed_from_u64(seed),
                pose: Pose::default(),
                yaw_rate: 0.0,
                velocity_y: 0.0,
                accel_y: 0.0,
                rate_spike: None,
                heading_fault: None,
            }),
            interrupted: AtomicBool::new(false),
            max_turn_rate: 360.0,
            max_speed: 60.0,
            response: 0.3,
            noise_amplitude: 0.5,
        }
    }

    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    pub fn set_pose(&self, pose: Pose) {
        self.state.lock().pose = pose;
    }

    /// The next gyro read returns `rate` instead of the modelled value.
    pub fn inject_rate_spike(&self, rate: f64) {
        self.state.lock().rate_spike = Some(rate);
    }

    /// The next pose read reports `heading` instead of the modelled value.
    pub fn inject_heading_fault(&self, heading: f64) {
        self.state.lock().heading_fault = Some(heading);
    }

    /// Ends the motion in progress at its next step.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    fn noise(&self, state: &mut SimState) -> f64 {
        if self.noise_amplitude > 0.0 {
            state.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        }
    }

    /// Steps the model until `settled` holds, the timeout runs out or the
    /// motion is interrupted.
    fn drive<F, S>(&self, timeout: Duration, mut step: F, settled: S) -> MotionOutcome
    where
        F: FnMut(&mut SimState, f64),
        S: Fn(&SimState) -> bool,
    {
        let start = Instant::now();
        let dt = STEP.as_secs_f64();
        loop {
            if self.interrupted.swap(false, Ordering::AcqRel) {
                return MotionOutcome::Interrupted;
            }
            if start.elapsed() >= timeout {
                return MotionOutcome::TimedOut;
            }
            {
                let mut state = self.state.lock();
                step(&mut *state, dt);
                if settled(&*state) {
                    return MotionOutcome::Settled;
                }
            }
            thread::sleep(STEP);
        }
    }
}

impl Chassis for SimulatedRobot {
    fn pose(&self) -> Result<Pose, DeviceError> {
        let mut state = self.state.lock();
        let mut pose = state.pose;
        if let Some(heading) = state.heading_fault.take() {
            pose.theta = heading;
        }
        Ok(pose)
    }

    fn turn_to_heading(&self, heading: f64, timeout: Duration, options: MotionOptions) -> MotionOutcome {
        let max_rate = options.max_speed.unwrap_or(self.max_turn_rate).abs();
        let response = self.response;
        self.drive(
            timeout,
            |state, dt| {
                let error = heading - state.pose.theta;
                let desired = (error * 4.0).clamp(-max_rate, max_rate);
                state.yaw_rate += (desired - state.yaw_rate) * response;
                state.pose.theta += state.yaw_rate * dt;
            },
            |state| {
                (heading - state.pose.theta).abs() < HEADING_TOLERANCE_DEG && state.yaw_rate.abs() < 5.0
            },
        )
    }

    fn move_to_pose(
        &self,
        x: f64,
        y: f64,
        heading: f64,
        timeout: Duration,
        options: MotionOptions,
    ) -> MotionOutcome {
        let max_speed = options.max_speed.unwrap_or(self.max_speed).abs();
        let response = self.response;
        self.drive(
            timeout,
            |state, dt| {
                let error = y - state.pose.y;
                let desired = (error * 3.0).clamp(-max_speed, max_speed);
                let previous = state.velocity_y;
                state.velocity_y += (desired - state.velocity_y) * response;
                state.accel_y = (state.velocity_y - previous) / dt;
                state.pose.y += state.velocity_y * dt;
                state.pose.x += (x - state.pose.x) * response;
                state.pose.theta += (heading - state.pose.theta) * response;
            },
            |state| (y - state.pose.y).abs() < POSITION_TOLERANCE && state.velocity_y.abs() < 1.0,
        )
    }
}

impl Imu for SimulatedRobot {
    fn gyro_rate(&self) -> Result<f64, DeviceError> {
        let mut state = self.state.lock();
        if let Some(spike) = state.rate_spike.take() {
            return Ok(spike);
        }
        let noise = self.noise(&mut *state);
        Ok(state.yaw_rate + noise * 0.1)
    }

    fn acceleration(&self) -> Result<Vector3, DeviceError> {
        let mut state = self.state.lock();
        let noise = self.noise(&mut *state);
        Ok(Vector3 {
            x: 0.0,
            y: state.accel_y + noise,
            z: 9.81,
        })
    }
}
