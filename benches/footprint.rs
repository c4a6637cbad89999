use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use glam::Vec2;

use traversability::grid::LayeredGrid;
use traversability::traversability::{CheckSettings, FootprintEvaluator, TraversabilitySnapshot};
use traversability::types::{LAYER_ELEVATION, LAYER_TRAVERSABILITY, MapInfo, Polygon, TRAVERSABILITY_LAYERS};

fn build_snapshot(size: u32) -> TraversabilitySnapshot {
    let mut grid = LayeredGrid::new(MapInfo::centered(size, size, 0.05, Vec2::ZERO), "map");
    for name in TRAVERSABILITY_LAYERS {
        grid.add_layer_filled(name, 1.0);
    }
    grid.add_layer_filled(LAYER_TRAVERSABILITY, 0.9);
    grid.add_layer_filled(LAYER_ELEVATION, 0.0);
    TraversabilitySnapshot::new(grid, 1)
}

fn bench_footprint(c: &mut Criterion) {
    let settings = CheckSettings {
        max_gap_width: 0.3,
        critical_step_height: 0.12,
        check_roughness: true,
        default_traversability: 0.5,
    };
    let footprint = Polygon::rectangle(0.8, 0.5);

    c.bench_function("footprint_polygon_cold_cache", |b| {
        b.iter_batched(
            || build_snapshot(200),
            |mut snapshot| {
                let mut evaluator = FootprintEvaluator::new(&mut snapshot, settings);
                black_box(evaluator.evaluate_polygon(&footprint, false));
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("footprint_circle_sweep_row", |b| {
        b.iter_batched(
            || build_snapshot(200),
            |mut snapshot| {
                let mut evaluator = FootprintEvaluator::new(&mut snapshot, settings);
                for i in 0..100 {
                    let center = Vec2::new(-2.5 + i as f32 * 0.05, 0.0);
                    black_box(evaluator.evaluate_circle(center, 0.45, 0.3, false));
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_footprint);
criterion_main!(benches);
