use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec2;

use traversability::grid::LayeredGrid;
use traversability::iterators::LineIterator;
use traversability::types::{LAYER_TRAVERSABILITY, MapInfo};

fn bench_line_iterator(c: &mut Criterion) {
    let grid = build_grid(256, 256, 0.05);
    let segments = build_segments();

    c.bench_function("line_iterator_steps_only", |b| {
        b.iter(|| {
            let mut steps = 0usize;
            for (start, end) in &segments {
                if let Some(iter) = LineIterator::between_positions(&grid, *start, *end) {
                    steps += iter.count();
                }
            }
            black_box(steps);
        });
    });

    c.bench_function("line_iterator_read_traversability", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for (start, end) in &segments {
                if let Some(iter) = LineIterator::between_positions(&grid, *start, *end) {
                    for cell in iter {
                        sum += grid.value(LAYER_TRAVERSABILITY, cell);
                    }
                }
            }
            black_box(sum);
        });
    });

    c.bench_function("line_iterator_sampled_stride_4", |b| {
        b.iter(|| {
            let mut samples = 0usize;
            for (start, end) in &segments {
                if let Some(iter) = LineIterator::between_positions(&grid, *end, *start) {
                    samples += iter.step_by(4).count();
                }
            }
            black_box(samples);
        });
    });
}

fn build_grid(width: u32, height: u32, resolution: f32) -> LayeredGrid {
    let info = MapInfo {
        width,
        height,
        resolution,
        ..Default::default()
    };
    let mut grid = LayeredGrid::new(info, "map");
    grid.add_layer_filled(LAYER_TRAVERSABILITY, 1.0);
    grid
}

fn build_segments() -> Vec<(Vec2, Vec2)> {
    let mut segments = Vec::new();
    for i in 0..64 {
        let start = Vec2::new(0.1, 0.1 + i as f32 * 0.02);
        let dir = Vec2::new(1.0, (i as f32 * 0.01) - 0.3).normalize();
        segments.push((start, start + dir * 20.0));
    }
    segments.push((Vec2::new(2.0, 2.0), Vec2::new(-13.0, 5.0)));
    segments.push((Vec2::new(6.0, 1.0), Vec2::new(9.0, 16.0)));
    segments
}

criterion_group!(benches, bench_line_iterator);
criterion_main!(benches);
