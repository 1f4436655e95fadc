//! Metrics module - Timing of the sampling loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

fn histogram() -> Histogram<u64> {
    // 3 significant figures is always within hdrhistogram's accepted 0..=5
    Histogram::new(3).expect("valid histogram precision")
}

// ============================================================================
// LOOP METRICS - Shared between the sampling thread and its owner
// ============================================================================

#[derive(Clone)]
pub struct LoopMetrics {
    work_hist: Arc<Mutex<Histogram<u64>>>,
    period_hist: Arc<Mutex<Histogram<u64>>>,
    jitter_hist: Arc<Mutex<Histogram<u64>>>,
    overruns: Arc<AtomicU64>,
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self {
            work_hist: Arc::new(Mutex::new(histogram())),
            period_hist: Arc::new(Mutex::new(histogram())),
            jitter_hist: Arc::new(Mutex::new(histogram())),
            overruns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Time spent reading, computing and logging, before any pacing sleep.
    pub fn record_work(&self, duration: Duration, period: Duration) {
        self.work_hist.lock().record(duration.as_micros() as u64).ok();
        if duration > period {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Start-to-start time between consecutive iterations.
    pub fn record_period(&self, actual: Duration, nominal: Duration) {
        let actual_us = actual.as_micros() as u64;
        let nominal_us = nominal.as_micros() as u64;
        self.period_hist.lock().record(actual_us).ok();
        self.jitter_hist.lock().record(actual_us.abs_diff(nominal_us)).ok();
    }

    pub fn report(&self) -> MetricsReport {
        let work = self.work_hist.lock();
        let period = self.period_hist.lock();
        let jitter = self.jitter_hist.lock();

        MetricsReport {
            iterations: work.len(),
            work_p50: Duration::from_micros(work.value_at_quantile(0.5)),
            work_p99: Duration::from_micros(work.value_at_quantile(0.99)),
            work_max: Duration::from_micros(work.max()),
            period_p50: Duration::from_micros(period.value_at_quantile(0.5)),
            period_p99: Duration::from_micros(period.value_at_quantile(0.99)),
            period_min: Duration::from_micros(period.min()),
            jitter_p99: Duration::from_micros(jitter.value_at_quantile(0.99)),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub iterations: u64,
    pub work_p50: Duration,
    pub work_p99: Duration,
    pub work_max: Duration,
    pub period_p50: Duration,
    pub period_p99: Duration,
    pub period_min: Duration,
    pub jitter_p99: Duration,
    pub overruns: u64,
}
