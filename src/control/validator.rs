use std::fmt;

use thiserror::Error;

/// Default bound on the rate magnitude, in deg/s for a gyro.
pub const DEFAULT_RATE_LIMIT: f64 = 600.0;

// ============================================================================
// QUANTITIES AND ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Rate,
    Time,
    Target,
    Measured,
    P,
    I,
    D,
    Output,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Rate => write!(f, "Rate"),
            Quantity::Time => write!(f, "Time"),
            Quantity::Target => write!(f, "Target"),
            Quantity::Measured => write!(f, "Measured value"),
            Quantity::P => write!(f, "P"),
            Quantity::I => write!(f, "I"),
            Quantity::D => write!(f, "D"),
            Quantity::Output => write!(f, "Output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Finite but physically implausible. Drop the sample and keep going.
    Recoverable,
    /// The controller state cannot be trusted any more.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("{0} is NaN")]
    NotANumber(Quantity),
    #[error("{0} is Infinity")]
    Infinite(Quantity),
    #[error("{0} is negative ({1})")]
    Negative(Quantity, f64),
    #[error("{quantity} is out of range (|{value}| > {limit})")]
    OutOfRange {
        quantity: Quantity,
        value: f64,
        limit: f64,
    },
}

impl ValidationIssue {
    pub fn quantity(&self) -> Quantity {
        match *self {
            ValidationIssue::NotANumber(q)
            | ValidationIssue::Infinite(q)
            | ValidationIssue::Negative(q, _) => q,
            ValidationIssue::OutOfRange { quantity, .. } => quantity,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::OutOfRange { .. } => Severity::Recoverable,
            _ => Severity::Fatal,
        }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Everything one sample touched: the inputs handed to the controller and
/// the terms it produced from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleValues {
    pub rate: f64,
    pub time_ms: f64,
    pub target: f64,
    pub measured: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub output: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Ok,
    /// Only recoverable issues were found.
    Recoverable(Vec<ValidationIssue>),
    /// At least one fatal issue. All issues are listed in check order; the
    /// first element is the first fatal one.
    Fatal(Vec<ValidationIssue>),
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok)
    }

    /// The issue that decided the classification.
    pub fn primary(&self) -> Option<&ValidationIssue> {
        match self {
            ValidationOutcome::Ok => None,
            ValidationOutcome::Recoverable(issues) | ValidationOutcome::Fatal(issues) => issues.first(),
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputValidator {
    rate_limit: f64,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}

impl InputValidator {
    pub fn new(rate_limit: f64) -> Self {
        Self { rate_limit }
    }

    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    /// Collects every issue in a fixed order. A later field is still checked
    /// after an earlier one failed.
    pub fn issues(&self, v: &SampleValues) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        check_finite(&mut issues, Quantity::Rate, v.rate);
        if v.rate.is_finite() && v.rate.abs() > self.rate_limit {
            issues.push(ValidationIssue::OutOfRange {
                quantity: Quantity::Rate,
                value: v.rate,
                limit: self.rate_limit,
            });
        }

        if v.time_ms < 0.0 {
            issues.push(ValidationIssue::Negative(Quantity::Time, v.time_ms));
        }
        check_finite(&mut issues, Quantity::Time, v.time_ms);

        check_finite(&mut issues, Quantity::Target, v.target);
        check_finite(&mut issues, Quantity::Measured, v.measured);
        check_finite(&mut issues, Quantity::P, v.p);
        check_finite(&mut issues, Quantity::I, v.i);
        check_finite(&mut issues, Quantity::D, v.d);
        check_finite(&mut issues, Quantity::Output, v.output);

        issues
    }

    pub fn validate(&self, values: &SampleValues) -> ValidationOutcome {
        let mut issues = self.issues(values);
        if issues.is_empty() {
            return ValidationOutcome::Ok;
        }

        match issues.iter().position(|i| i.severity() == Severity::Fatal) {
            Some(first_fatal) => {
                // Keep check order but surface the first fatal issue first.
                let fatal = issues.remove(first_fatal);
                issues.insert(0, fatal);
                ValidationOutcome::Fatal(issues)
            }
            None => ValidationOutcome::Recoverable(issues),
        }
    }
}

fn check_finite(issues: &mut Vec<ValidationIssue>, quantity: Quantity, value: f64) {
    if value.is_nan() {
        issues.push(ValidationIssue::NotANumber(quantity));
    } else if value.is_infinite() {
        issues.push(ValidationIssue::Infinite(quantity));
    }
}
