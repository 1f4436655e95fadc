use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pid_tuning_logger::{Gains, InputValidator, PIDController, SampleValues};

fn benchmark_pid_update(c: &mut Criterion) {
    let mut pid = PIDController::new(Gains::new(2.0, 0.01, 10.0));
    pid.reset(0.0);
    let mut t = 0.0;
    c.bench_function("pid_update", |b| {
        b.iter(|| {
            t += 20.0;
            pid.update(black_box(90.0), black_box(48.0), black_box(f64::NAN), t)
        })
    });
}

fn benchmark_validation(c: &mut Criterion) {
    let validator = InputValidator::default();
    let values = SampleValues {
        rate: 120.0,
        time_ms: 1000.0,
        target: 90.0,
        measured: 48.0,
        p: 84.0,
        i: 0.4,
        d: -1200.0,
        output: -1115.6,
    };
    c.bench_function("validate_sample", |b| b.iter(|| validator.validate(black_box(&values))));
}

criterion_group!(benches, benchmark_pid_update, benchmark_validation);
criterion_main!(benches);
