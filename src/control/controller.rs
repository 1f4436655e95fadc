use serde::Deserialize;

/// Substituted for the elapsed time when two samples share a timestamp or the
/// clock steps backwards.
pub const DT_EPSILON_MS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// Single-axis PID controller that keeps every term of its last computation
/// around so a logger can read them back.
///
/// Timestamps are milliseconds, so the integral accumulates `error * ms` and
/// the finite-difference derivative is per millisecond. Nothing here checks
/// its inputs: NaN and infinities flow straight into the state and out of the
/// accessors. Run the values through [`InputValidator`](super::InputValidator)
/// after each [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct PIDController {
    gains: Gains,

    // State
    i_error: f64,
    last_error: f64,
    last_time_ms: f64,

    // Terms of the last update
    p: f64,
    i: f64,
    d: f64,
    output: f64,
}

impl PIDController {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            i_error: 0.0,
            last_error: 0.0,
            last_time_ms: 0.0,
            p: 0.0,
            i: 0.0,
            d: 0.0,
            output: 0.0,
        }
    }

    /// Clears the accumulator and all terms and takes `now_ms` as the time
    /// baseline for the first [`update`](Self::update). Call before every run.
    pub fn reset(&mut self, now_ms: f64) {
        self.i_error = 0.0;
        self.last_error = 0.0;
        self.last_time_ms = now_ms;
        self.p = 0.0;
        self.i = 0.0;
        self.d = 0.0;
        self.output = 0.0;
    }

    /// Runs one step and returns the output.
    ///
    /// `rate` is the externally measured rate of the process variable (a gyro
    /// for heading, say). When it is not NaN the derivative term is `-rate`
    /// and the error difference is ignored. Pass `f64::NAN` to fall back to
    /// `(error - last_error) / dt`.
    pub fn update(&mut self, target: f64, measured: f64, rate: f64, time_ms: f64) -> f64 {
        let error = target - measured;

        let elapsed = time_ms - self.last_time_ms;
        let dt = if elapsed > 0.0 { elapsed } else { DT_EPSILON_MS };

        self.i_error += error * dt;

        let derivative = if rate.is_nan() {
            (error - self.last_error) / dt
        } else {
            -rate
        };

        self.p = self.gains.kp * error;
        self.i = self.gains.ki * self.i_error;
        self.d = self.gains.kd * derivative;
        self.output = self.p + self.i + self.d;

        self.last_error = error;
        self.last_time_ms = time_ms;

        self.output
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn get_p(&self) -> f64 {
        self.p
    }

    pub fn get_i(&self) -> f64 {
        self.i
    }

    pub fn get_d(&self) -> f64 {
        self.d
    }

    /// Error of the last update.
    pub fn get_error(&self) -> f64 {
        self.last_error
    }

    pub fn get_output(&self) -> f64 {
        self.output
    }

    /// Time-weighted error sum, before `ki` is applied.
    pub fn integral(&self) -> f64 {
        self.i_error
    }
}
