use approx::assert_relative_eq;
use glam::{UVec2, Vec2};

use traversability::types::{
    LAYER_ELEVATION, LAYER_SLOPE, LAYER_STEP, LAYER_TRAVERSABILITY, TRAVERSABILITY_LAYERS,
};
use traversability::{
    Footprint, FootprintPath, LayeredGrid, MapInfo, Polygon, Pose, TraversabilityConfig,
    TraversabilityError, TraversabilityMap,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 4 x 4 m map with 0.1 m cells centered on the origin, flat and fully passable.
fn flat_grid(traversability: f32) -> LayeredGrid {
    let mut grid = LayeredGrid::new(MapInfo::centered(40, 40, 0.1, Vec2::ZERO), "map");
    for name in TRAVERSABILITY_LAYERS {
        grid.add_layer_filled(name, 1.0);
    }
    grid.add_layer_filled(LAYER_TRAVERSABILITY, traversability);
    grid.add_layer_filled(LAYER_ELEVATION, 0.0);
    grid
}

fn map_with(grid: LayeredGrid) -> TraversabilityMap {
    init_logging();
    let config = TraversabilityConfig {
        max_gap_width: 0.0,
        ..Default::default()
    };
    let map = TraversabilityMap::new(config, |_: &LayeredGrid| {
        Err::<LayeredGrid, _>(TraversabilityError::PipelineFailure("not used".to_string()))
    });
    map.set_traversability_map(grid, 0.0).unwrap();
    map
}

fn circle_path(points: &[(f32, f32)], radius: f32) -> FootprintPath {
    let poses = points.iter().map(|&(x, y)| Pose::planar(x, y, 0.0)).collect();
    FootprintPath::new(poses, Footprint::Circle { radius })
}

#[test]
fn flat_terrain_is_safe_for_both_footprints() {
    let map = map_with(flat_grid(0.8));

    let check = map.check_footprint_path(&circle_path(&[(-1.0, 0.0), (1.0, 0.0)], 0.2), false);
    assert!(check.result.is_safe);
    assert_relative_eq!(check.result.traversability, 0.8, epsilon = 1e-5);

    let poses = vec![Pose::planar(-1.0, 0.0, 0.0), Pose::planar(1.0, 0.0, 0.0)];
    let path = FootprintPath::new(poses, Footprint::Polygon(Polygon::rectangle(0.6, 0.4)));
    let check = map.check_footprint_path(&path, false);
    assert!(check.result.is_safe);
    assert_relative_eq!(check.result.traversability, 0.8, epsilon = 1e-5);
    // 2 m travel plus the footprint length, 0.4 m wide.
    assert_relative_eq!(check.result.area, 2.6 * 0.4, epsilon = 1e-4);
}

#[test]
fn step_across_the_path_is_unsafe() {
    let mut grid = flat_grid(1.0);
    // Terrain rises by 0.3 m at x = 0.5; the cells on both sides are flagged.
    for y in 0..40 {
        for x in 25..40 {
            grid.set(LAYER_ELEVATION, UVec2::new(x, y), 0.3).unwrap();
        }
        grid.set(LAYER_STEP, UVec2::new(24, y), 0.0).unwrap();
        grid.set(LAYER_STEP, UVec2::new(25, y), 0.0).unwrap();
    }
    let map = map_with(grid);

    let poses = vec![Pose::planar(0.0, 0.0, 0.0), Pose::planar(1.0, 0.0, 0.0)];
    let mut path = FootprintPath::new(poses, Footprint::Polygon(Polygon::rectangle(0.4, 0.3)));
    path.compute_untraversable_polygon = true;
    let check = map.check_footprint_path(&path, true);
    assert!(!check.result.is_safe);
    assert_eq!(check.result.traversability, 0.0);
    assert_eq!(check.untraversable_polygons.len(), 1);

    // Short of the step the same footprint is fine.
    let poses = vec![Pose::planar(-1.0, 0.0, 0.0), Pose::planar(0.0, 0.0, 0.0)];
    let path = FootprintPath::new(poses, Footprint::Polygon(Polygon::rectangle(0.4, 0.3)));
    assert!(map.check_footprint_path(&path, false).result.is_safe);
}

#[test]
fn obstacle_between_waypoints_is_reported() {
    let mut grid = flat_grid(1.0);
    for y in 18..22 {
        for x in 21..25 {
            grid.set(LAYER_SLOPE, UVec2::new(x, y), 0.0).unwrap();
        }
    }
    let map = map_with(grid);

    let mut path = circle_path(&[(-1.5, 0.05), (1.5, 0.05)], 0.2);
    path.compute_untraversable_polygon = true;
    let check = map.check_footprint_path(&path, true);

    assert!(!check.result.is_safe);
    assert_eq!(check.footprint_polygons.len(), 1);
    assert_eq!(check.untraversable_polygons.len(), 1);
    let hull = &check.untraversable_polygons[0];
    assert_eq!(hull.frame_id, "map");
    assert!(hull.polygon.contains(Vec2::new(0.3, 0.0)));
}

#[test]
fn obstacle_in_the_margin_lowers_the_score() {
    let mut grid = flat_grid(1.0);
    // Three cells to the right of the pose: beyond the 0.2 m radius but
    // inside the 0.15 m offset.
    grid.set(LAYER_SLOPE, UVec2::new(23, 20), 0.0).unwrap();
    let map = map_with(grid);

    let check = map.check_footprint_path(&circle_path(&[(0.05, 0.05)], 0.2), false);
    assert!(check.result.is_safe);
    let factor = ((0.1 / 0.15) + 1.0) / 2.0;
    assert_relative_eq!(check.result.traversability, factor, epsilon = 1e-4);
}

#[test]
fn cached_verdicts_do_not_change_answers() {
    let mut grid = flat_grid(0.7);
    grid.set(LAYER_SLOPE, UVec2::new(30, 20), 0.0).unwrap();
    let map = map_with(grid);
    let path = circle_path(&[(-1.0, 0.05), (0.5, 0.05), (1.0, 0.5)], 0.2);

    let first = map.check_footprint_path(&path, false);
    let second = map.check_footprint_path(&path, false);
    assert_eq!(first.result, second.result);

    let generation = map.generation();
    map.reset_footprint_caches();
    assert_ne!(map.generation(), generation);
    let third = map.check_footprint_path(&path, false);
    assert_eq!(first.result, third.result);
}

#[test]
fn unknown_terrain_uses_the_default() {
    let map = map_with(flat_grid(1.0));
    let far = Polygon::rectangle(0.4, 0.4).translate(Vec2::new(10.0, 10.0));

    map.set_default_traversability(0.4);
    let evaluation = map.is_traversable_polygon(&far, false);
    assert!(evaluation.passed);
    assert_relative_eq!(evaluation.traversability, 0.4);

    map.set_default_traversability(0.0);
    assert!(!map.is_traversable_polygon(&far, false).passed);

    map.restore_default_traversability();
    assert_relative_eq!(map.default_traversability(), 0.5);
}

#[test]
fn non_finite_poses_are_unknown_terrain() {
    let map = map_with(flat_grid(1.0));
    map.set_default_traversability(0.0);

    assert!(!map.is_traversable_circle(Vec2::NAN, 0.3, 0.0, false).passed);
    let single = circle_path(&[(f32::NAN, 0.0)], 0.2);
    assert!(!map.check_footprint_path(&single, false).result.is_safe);
    let segment = circle_path(&[(0.0, 0.0), (f32::NAN, 0.5)], 0.2);
    assert!(!map.check_footprint_path(&segment, false).result.is_safe);

    map.restore_default_traversability();
    assert!(map.check_footprint_path(&circle_path(&[(0.0, 0.0)], 0.2), false).result.is_safe);
}
