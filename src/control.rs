//! Control module - PID computation and the sanity gate in front of it

pub mod controller;
pub mod validator;

pub use controller::{Gains, PIDController, DT_EPSILON_MS};
pub use validator::{
    InputValidator, Quantity, SampleValues, Severity, ValidationIssue, ValidationOutcome,
    DEFAULT_RATE_LIMIT,
};
