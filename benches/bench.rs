// Criterion benchmarks for the wingman matching core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use wingman_match::core::{calculate_bounding_box, haversine_miles, Matcher};
use wingman_match::models::{ExperienceLevel, RawCandidate};

const SF: (f64, f64) = (37.7749, -122.4194);

fn build_candidates(count: usize) -> (Vec<RawCandidate>, HashMap<Uuid, ExperienceLevel>) {
    let mut candidates = Vec::with_capacity(count);
    let mut levels = HashMap::with_capacity(count);

    for i in 0..count {
        let id = Uuid::new_v4();
        let lat = SF.0 + (i % 50) as f64 * 0.003;
        let lon = SF.1 + (i % 70) as f64 * 0.003;
        candidates.push(RawCandidate {
            user_id: id,
            distance_miles: haversine_miles(SF.0, SF.1, lat, lon),
        });
        let level = match i % 3 {
            0 => ExperienceLevel::Beginner,
            1 => ExperienceLevel::Intermediate,
            _ => ExperienceLevel::Advanced,
        };
        levels.insert(id, level);
    }

    (candidates, levels)
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_miles", |b| {
        b.iter(|| {
            haversine_miles(
                black_box(SF.0),
                black_box(SF.1),
                black_box(37.8044),
                black_box(-122.2712),
            )
        });
    });
}

fn bench_bounding_box(c: &mut Criterion) {
    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| calculate_bounding_box(black_box(SF.0), black_box(SF.1), black_box(25.0)));
    });
}

fn bench_evaluate_pipeline(c: &mut Criterion) {
    let matcher = Matcher::with_default_policy();
    let requester = Uuid::new_v4();
    let mut group = c.benchmark_group("evaluate_pipeline");

    for size in [100_usize, 1_000, 5_000] {
        let (candidates, levels) = build_candidates(size);
        let recent = HashSet::new();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                matcher.evaluate(
                    black_box(requester),
                    black_box(ExperienceLevel::Intermediate),
                    black_box(&candidates),
                    black_box(&levels),
                    black_box(&recent),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_bounding_box,
    bench_evaluate_pipeline
);
criterion_main!(benches);
