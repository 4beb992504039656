use akmtastic::{AccelCalibrator, Akmtastic, MagCalibrator};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_pcg::Pcg64;
use std::f32::consts::PI;

/// Driver sensitivity of the simulated accelerometer: 64 counts per m/s²
const SENSITIVITY: f32 = 46080.0;

// Pre-generated sensor data to eliminate RNG overhead during benchmarks
struct PreGeneratedData {
    samples: Vec<(Vector3<f32>, Vector3<f32>)>,
    index: usize,
}

impl PreGeneratedData {
    fn new(count: usize, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut samples = Vec::with_capacity(count);

        for i in 0..count {
            let time = i as f32 * 0.05; // 20Hz sample rate

            // Slow rotation through every attitude so the calibrators keep refitting
            let yaw = time * 0.3 * 2.0 * PI;
            let pitch = (time * 0.11 * 2.0 * PI).sin() * 1.2;

            let accelerometer = Vector3::new(
                -9.8 * pitch.sin() + rng.random_range(-0.05..0.05),
                rng.random_range(-0.05..0.05),
                9.8 * pitch.cos() + rng.random_range(-0.05..0.05),
            ) * 64.0;

            let magnetometer = Vector3::new(
                45.0 * yaw.cos() * pitch.cos() + 12.0 + rng.random_range(-0.3..0.3),
                45.0 * yaw.sin() * pitch.cos() - 7.0 + rng.random_range(-0.3..0.3),
                45.0 * pitch.sin() + 20.0 + rng.random_range(-0.3..0.3),
            );

            samples.push((accelerometer, magnetometer));
        }

        Self { samples, index: 0 }
    }

    fn next(&mut self) -> (Vector3<f32>, Vector3<f32>) {
        let sample = self.samples[self.index];
        self.index = (self.index + 1) % self.samples.len();
        sample
    }
}

fn started_engine() -> Akmtastic {
    let mut engine = Akmtastic::new();
    engine
        .start("/dev/bench")
        .expect("fresh engine always starts");
    engine
}

/// Benchmark accelerometer ingestion: convert, remap, smooth, calibrate
fn bench_push_acceleration(c: &mut Criterion) {
    let mut engine = started_engine();
    let mut data = PreGeneratedData::new(4096, 1);

    c.bench_function("engine_push_acceleration", |b| {
        b.iter(|| {
            let (accelerometer, _) = data.next();
            engine.push_acceleration(black_box(accelerometer), black_box(SENSITIVITY))
        })
    });
}

/// Benchmark magnetometer ingestion, dominated by the ellipsoid refit
fn bench_push_magnetic(c: &mut Criterion) {
    let mut engine = started_engine();
    let mut data = PreGeneratedData::new(4096, 2);

    c.bench_function("engine_push_magnetic", |b| {
        b.iter(|| {
            let (_, magnetometer) = data.next();
            engine.push_magnetic(black_box(magnetometer), black_box(3), black_box(50))
        })
    });
}

/// Benchmark a full sample pair followed by an orientation read
fn bench_sample_pair_and_orientation(c: &mut Criterion) {
    let mut engine = started_engine();
    let mut data = PreGeneratedData::new(4096, 3);

    c.bench_function("engine_sample_pair_orientation", |b| {
        b.iter(|| {
            let (accelerometer, magnetometer) = data.next();
            let _ = engine.push_acceleration(black_box(accelerometer), SENSITIVITY);
            let _ = engine.push_magnetic(black_box(magnetometer), 3, 50);
            black_box(engine.orientation())
        })
    });
}

/// Benchmark reading the cached orientation
fn bench_cached_orientation(c: &mut Criterion) {
    let mut engine = started_engine();
    let mut data = PreGeneratedData::new(64, 4);
    for _ in 0..64 {
        let (accelerometer, magnetometer) = data.next();
        let _ = engine.push_acceleration(accelerometer, SENSITIVITY);
        let _ = engine.push_magnetic(magnetometer, 3, 50);
    }

    c.bench_function("engine_cached_orientation", |b| {
        b.iter(|| black_box(engine.orientation()))
    });
}

/// Benchmark the calibrators on their own
fn bench_calibrators(c: &mut Criterion) {
    let mut data = PreGeneratedData::new(4096, 5);
    let mut accelerometer = AccelCalibrator::new();
    let mut magnetometer = MagCalibrator::new();

    c.bench_function("accel_calibrator_push", |b| {
        b.iter(|| {
            let (sample, _) = data.next();
            accelerometer.push(black_box(sample / 64.0))
        })
    });

    c.bench_function("mag_calibrator_push", |b| {
        b.iter(|| {
            let (_, sample) = data.next();
            magnetometer.push(black_box(sample))
        })
    });
}

/// Benchmark the goodness summary
fn bench_calibration_goodness(c: &mut Criterion) {
    let engine = started_engine();

    c.bench_function("engine_calibration_goodness", |b| {
        b.iter(|| black_box(engine.calibration_goodness()))
    });
}

criterion_group!(
    benches,
    bench_push_acceleration,
    bench_push_magnetic,
    bench_sample_pair_and_orientation,
    bench_cached_orientation,
    bench_calibrators,
    bench_calibration_goodness
);

criterion_main!(benches);
