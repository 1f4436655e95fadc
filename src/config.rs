//! Run configuration, loaded from TOML

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::control::{Gains, DEFAULT_RATE_LIMIT};
use crate::robot::MotionOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("gains must be finite (kp={kp}, ki={ki}, kd={kd})")]
    NonFiniteGains { kp: f64, ki: f64, kd: f64 },
    #[error("target must be finite, got {0}")]
    NonFiniteTarget(f64),
    #[error("rate limit must be finite and positive, got {0}")]
    InvalidRateLimit(f64),
    #[error("sample period must be at least 1 ms")]
    ZeroSamplePeriod,
}

/// Which loop is being tuned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Heading against gyro yaw rate, driven by a turn-to-heading.
    Angular,
    /// Position along the robot's y axis against y acceleration, driven by a
    /// move-to-pose.
    Lateral,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Angular => write!(f, "angular"),
            Axis::Lateral => write!(f, "lateral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub axis: Axis,
    pub gains: Gains,
    pub target: f64,
    pub timeout_ms: u64,
    pub sample_period_ms: u64,
    pub rate_limit: f64,
    /// Head start the sampling thread gets before the motion is issued.
    pub startup_delay_ms: u64,
    pub max_speed: Option<f64>,
    pub reverse: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Angular,
            gains: Gains::default(),
            target: 90.0,
            timeout_ms: 2000,
            sample_period_ms: 20,
            rate_limit: DEFAULT_RATE_LIMIT,
            startup_delay_ms: 100,
            max_speed: None,
            reverse: false,
        }
    }
}

impl RunConfig {
    pub fn angular(gains: Gains, target: f64) -> Self {
        Self {
            axis: Axis::Angular,
            gains,
            target,
            ..Self::default()
        }
    }

    pub fn lateral(gains: Gains, target: f64) -> Self {
        Self {
            axis: Axis::Lateral,
            gains,
            target,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gains.is_finite() {
            return Err(ConfigError::NonFiniteGains {
                kp: self.gains.kp,
                ki: self.gains.ki,
                kd: self.gains.kd,
            });
        }
        if !self.target.is_finite() {
            return Err(ConfigError::NonFiniteTarget(self.target));
        }
        if !(self.rate_limit.is_finite() && self.rate_limit > 0.0) {
            return Err(ConfigError::InvalidRateLimit(self.rate_limit));
        }
        if self.sample_period_ms == 0 {
            return Err(ConfigError::ZeroSamplePeriod);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn motion_options(&self) -> MotionOptions {
        MotionOptions {
            max_speed: self.max_speed,
            reverse: self.reverse,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigError> {
    let s = std::fs::read_to_string(path)?;
    RunConfig::from_toml_str(&s)
}
