use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use glam::Vec2;

use traversability::grid::LayeredGrid;
use traversability::iterators::PolygonIterator;
use traversability::types::{MapInfo, Polygon, Pose};

fn bench_polygon_iter(c: &mut Criterion) {
    let info = MapInfo {
        width: 256,
        height: 256,
        resolution: 1.0,
        ..Default::default()
    };
    let grid = LayeredGrid::new(info, "map");

    let square = Polygon::new(vec![
        Vec2::new(10.0, 10.0),
        Vec2::new(110.0, 10.0),
        Vec2::new(110.0, 110.0),
        Vec2::new(10.0, 110.0),
    ]);

    c.bench_function("polygon_iter_rectangle_100x100", |b| {
        b.iter_batched(
            || square.clone(),
            |polygon| {
                let count = PolygonIterator::new(&grid, &polygon).map_or(0, Iterator::count);
                black_box(count);
            },
            BatchSize::SmallInput,
        );
    });

    let rotated = Polygon::rectangle(100.0, 60.0).transform(&Pose::planar(128.0, 128.0, 0.6));
    c.bench_function("polygon_iter_rotated_rectangle", |b| {
        b.iter(|| {
            let count = PolygonIterator::new(&grid, &rotated).map_or(0, Iterator::count);
            black_box(count);
        });
    });
}

criterion_group!(benches, bench_polygon_iter);
criterion_main!(benches);
