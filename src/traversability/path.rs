//! Safety check of a footprint swept along a path.

use glam::Vec2;

use crate::grid::Grid;
use crate::iterators::LineIterator;
use crate::traversability::{
    CheckSettings, FootprintEvaluator, TraversabilityConfig, TraversabilitySnapshot,
};
use crate::types::{Footprint, LAYER_ROBOT_SLOPE, Polygon, Pose, StampedPolygon};

/// Every n-th cell on the line between two circular waypoints is evaluated.
const CIRCLE_SAMPLE_STRIDE: usize = 4;

/// Path query: waypoints plus the footprint that is moved along them.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintPath {
    pub poses: Vec<Pose>,
    pub footprint: Footprint,
    /// Extend consecutive polygon footprints toward each other before sweeping.
    pub conservative: bool,
    pub compute_untraversable_polygon: bool,
}

impl FootprintPath {
    pub fn new(poses: Vec<Pose>, footprint: Footprint) -> Self {
        Self {
            poses,
            footprint,
            conservative: false,
            compute_untraversable_polygon: false,
        }
    }

    /// Mean height of the waypoints, used to display polygons.
    pub fn mean_height(&self) -> f32 {
        if self.poses.is_empty() {
            return 0.0;
        }
        self.poses.iter().map(|p| p.position.z).sum::<f32>() / self.poses.len() as f32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraversabilityResult {
    pub is_safe: bool,
    pub traversability: f32,
    /// Swept area of polygon footprints (m^2); 0 for circles.
    pub area: f32,
}

/// Result of a path check plus the polygons produced for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathCheck {
    pub result: TraversabilityResult,
    pub footprint_polygons: Vec<StampedPolygon>,
    pub untraversable_polygons: Vec<StampedPolygon>,
}

pub struct PathAggregator<'a> {
    evaluator: FootprintEvaluator<'a>,
    config: &'a TraversabilityConfig,
}

impl<'a> PathAggregator<'a> {
    pub fn new(
        snapshot: &'a mut TraversabilitySnapshot,
        settings: CheckSettings,
        config: &'a TraversabilityConfig,
    ) -> Self {
        Self {
            evaluator: FootprintEvaluator::new(snapshot, settings),
            config,
        }
    }

    /// Check `path`. Any failure leaves the unsafe default result in place.
    ///
    /// With `publish_polygons` the footprints (and, if the path asks for it,
    /// the untraversable hulls) are collected into the returned [`PathCheck`].
    pub fn check_path(&mut self, path: &FootprintPath, publish_polygons: bool) -> PathCheck {
        if path.poses.is_empty() {
            log::warn!("This path has no poses to check");
            return PathCheck::default();
        }
        let config = self.config;
        let mut check = PathCheck::default();
        let mut out = PolygonSink {
            check: &mut check,
            frame_id: &config.map_frame_id,
            z: path.mean_height(),
            enabled: publish_polygons,
            with_untraversable: path.compute_untraversable_polygon,
        };
        let result = match &path.footprint {
            Footprint::Circle { radius } => self.check_circular(path, *radius, &mut out),
            Footprint::Polygon(polygon) => self.check_polygonal(path, polygon, &mut out),
        };
        if let Some(result) = result {
            check.result = result;
        }
        check
    }

    fn check_circular(
        &mut self,
        path: &FootprintPath,
        radius: f32,
        out: &mut PolygonSink<'_>,
    ) -> Option<TraversabilityResult> {
        let radius_max = radius + self.config.circular_footprint_offset;
        let want_hull = path.compute_untraversable_polygon;

        if let [pose] = path.poses.as_slice() {
            let end = pose.xy();
            if !self.inclination_ok(end, end) {
                return None;
            }
            let evaluation = self.evaluator.evaluate_circle(end, radius_max, radius, want_hull);
            out.push(Polygon::from_circle(end, radius_max), evaluation.untraversable);
            return evaluation.passed.then_some(TraversabilityResult {
                is_safe: true,
                traversability: evaluation.traversability,
                area: 0.0,
            });
        }

        let keep_scanning = want_hull || out.enabled;
        let mut path_length = 0.0;
        let mut traversability = 0.0;
        for pair in path.poses.windows(2) {
            let (start, end) = (pair[0].xy(), pair[1].xy());
            if !self.inclination_ok(start, end) {
                return None;
            }

            let grid = self.evaluator.grid();
            let samples: Vec<Vec2> = LineIterator::between_positions(grid, end, start)
                .into_iter()
                .flatten()
                .step_by(CIRCLE_SAMPLE_STRIDE)
                .map(|cell| grid.cell_center(cell))
                .collect();

            let mut segment_passed = true;
            let mut hull = Polygon::default();
            let mut sum = 0.0;
            for center in &samples {
                let evaluation =
                    self.evaluator
                        .evaluate_circle(*center, radius_max, radius, want_hull);
                segment_passed &= evaluation.passed;
                if !evaluation.untraversable.is_empty() {
                    hull = Polygon::union_hull(&hull, &evaluation.untraversable);
                }
                if !segment_passed && !keep_scanning {
                    return None;
                }
                sum += evaluation.traversability;
            }
            out.push(Polygon::from_circle(end, radius_max), hull);
            if !segment_passed {
                return None;
            }

            let segment_traversability = if samples.is_empty() {
                let default = self.evaluator.default_traversability();
                if default == 0.0 {
                    return None;
                }
                default
            } else {
                sum / samples.len() as f32
            };

            let segment_length = (end - start).length();
            let previous_length = path_length;
            path_length += segment_length;
            traversability = if path_length > 0.0 {
                (segment_length * segment_traversability + previous_length * traversability)
                    / path_length
            } else {
                segment_traversability
            };
        }

        Some(TraversabilityResult {
            is_safe: true,
            traversability,
            area: 0.0,
        })
    }

    fn check_polygonal(
        &mut self,
        path: &FootprintPath,
        footprint: &Polygon,
        out: &mut PolygonSink<'_>,
    ) -> Option<TraversabilityResult> {
        let want_hull = path.compute_untraversable_polygon;

        if let [pose] = path.poses.as_slice() {
            let end = pose.xy();
            let polygon = footprint.transform(pose);
            if !self.inclination_ok(end, end) {
                return None;
            }
            let evaluation = self.evaluator.evaluate_polygon(&polygon, want_hull);
            let area = polygon.area();
            out.push(polygon, evaluation.untraversable);
            return evaluation.passed.then_some(TraversabilityResult {
                is_safe: true,
                traversability: evaluation.traversability,
                area,
            });
        }

        let mut area = 0.0;
        let mut traversability = 0.0;
        let mut previous = footprint.transform(&path.poses[0]);
        for (i, pair) in path.poses.windows(2).enumerate() {
            let (start, end) = (pair[0].xy(), pair[1].xy());
            let mut current = footprint.transform(&pair[1]);
            if path.conservative {
                let delta = end - start;
                let previous_vertices = previous.points.clone();
                let current_vertices = current.points.clone();
                previous
                    .points
                    .extend(current_vertices.iter().map(|v| *v - delta));
                current
                    .points
                    .extend(previous_vertices.iter().map(|v| *v + delta));
            }

            let swept = Polygon::union_hull(&previous, &current);
            if !self.inclination_ok(start, end) {
                return None;
            }
            let evaluation = self.evaluator.evaluate_polygon(&swept, want_hull);
            let swept_area = swept.area();
            out.push(swept, evaluation.untraversable);
            if !evaluation.passed {
                return None;
            }

            if i == 0 {
                area = swept_area;
                traversability = evaluation.traversability;
            } else {
                let increment = swept_area - previous.convex_hull().area();
                let previous_area = area;
                area += increment;
                traversability = if area > 0.0 {
                    (increment * evaluation.traversability + previous_area * traversability) / area
                } else {
                    evaluation.traversability
                };
            }
            // Extended vertices only matter through their hull.
            previous = current.convex_hull();
        }

        Some(TraversabilityResult {
            is_safe: true,
            traversability,
            area,
        })
    }

    /// Chassis inclination gate on the `robot_slope` layer. A zero marks a pose
    /// the robot cannot hold; invalid cells and positions off the map are ignored.
    fn inclination_ok(&self, start: Vec2, end: Vec2) -> bool {
        if !self.config.check_robot_inclination {
            return true;
        }
        let grid = self.evaluator.grid();
        if !grid.exists(LAYER_ROBOT_SLOPE) {
            log::warn!("Inclination check requested but the map has no {LAYER_ROBOT_SLOPE} layer");
            return false;
        }
        if start == end {
            return grid
                .at_position(LAYER_ROBOT_SLOPE, start)
                .is_none_or(|value| value != 0.0);
        }
        LineIterator::between_positions(grid, start, end)
            .into_iter()
            .flatten()
            .all(|cell| grid.value(LAYER_ROBOT_SLOPE, cell) != 0.0)
    }
}

/// Collects display polygons for one path check.
struct PolygonSink<'a> {
    check: &'a mut PathCheck,
    frame_id: &'a str,
    z: f32,
    enabled: bool,
    with_untraversable: bool,
}

impl PolygonSink<'_> {
    fn push(&mut self, footprint: Polygon, untraversable: Polygon) {
        if !self.enabled {
            return;
        }
        self.check
            .footprint_polygons
            .push(StampedPolygon::now(footprint, self.frame_id, self.z));
        if self.with_untraversable && !untraversable.is_empty() {
            self.check
                .untraversable_polygons
                .push(StampedPolygon::now(untraversable, self.frame_id, self.z));
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{Quat, UVec2, Vec3};

    use super::*;
    use crate::grid::LayeredGrid;
    use crate::types::{
        LAYER_ELEVATION, LAYER_SLOPE, LAYER_TRAVERSABILITY, MapInfo, TRAVERSABILITY_LAYERS,
    };

    fn snapshot() -> TraversabilitySnapshot {
        let mut grid = LayeredGrid::new(MapInfo::centered(40, 40, 0.1, Vec2::ZERO), "map");
        for name in TRAVERSABILITY_LAYERS {
            grid.add_layer_filled(name, 1.0);
        }
        grid.add_layer_filled(LAYER_ELEVATION, 0.0);
        grid.add_layer_filled(LAYER_ROBOT_SLOPE, 1.0);
        TraversabilitySnapshot::new(grid, 0)
    }

    fn config() -> TraversabilityConfig {
        TraversabilityConfig {
            max_gap_width: 0.0,
            circular_footprint_offset: 0.0,
            ..Default::default()
        }
    }

    fn circle_path(points: &[(f32, f32)]) -> FootprintPath {
        let poses = points.iter().map(|(x, y)| Pose::planar(*x, *y, 0.0)).collect();
        FootprintPath::new(poses, Footprint::Circle { radius: 0.2 })
    }

    #[test]
    fn empty_path_is_unsafe() {
        let mut snapshot = snapshot();
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);
        let check = aggregator.check_path(&circle_path(&[]), true);
        assert_eq!(check.result, TraversabilityResult::default());
        assert!(check.footprint_polygons.is_empty());
    }

    #[test]
    fn circular_path_length_weighting() {
        let mut snapshot = snapshot();
        // Right half of the map is less traversable.
        let grid = snapshot.grid_mut();
        for y in 0..40 {
            for x in 20..40 {
                grid.set(LAYER_TRAVERSABILITY, UVec2::new(x, y), 0.5).unwrap();
            }
        }
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);

        let first = aggregator.check_path(&circle_path(&[(-1.5, 0.0), (-0.5, 0.0)]), false);
        let second = aggregator.check_path(&circle_path(&[(-0.5, 0.0), (1.5, 0.0)]), false);
        let whole =
            aggregator.check_path(&circle_path(&[(-1.5, 0.0), (-0.5, 0.0), (1.5, 0.0)]), false);

        assert!(first.result.is_safe && second.result.is_safe && whole.result.is_safe);
        let combined =
            (1.0 * first.result.traversability + 2.0 * second.result.traversability) / 3.0;
        assert_relative_eq!(whole.result.traversability, combined, epsilon = 1e-5);
        assert!(whole.result.traversability < 1.0);
    }

    #[test]
    fn obstacle_on_circular_path_is_unsafe_and_reported() {
        let mut snapshot = snapshot();
        // Cell 22 of row 20 is one of the sampled centers.
        let blocked = snapshot.grid().world_to_cell(Vec2::new(0.25, 0.05)).unwrap();
        snapshot.grid_mut().set(LAYER_SLOPE, blocked, 0.0).unwrap();
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);

        let mut path = circle_path(&[(-1.0, 0.05), (1.0, 0.05)]);
        path.compute_untraversable_polygon = true;
        let check = aggregator.check_path(&path, true);
        assert_eq!(check.result, TraversabilityResult::default());
        assert_eq!(check.footprint_polygons.len(), 1);
        assert_eq!(check.untraversable_polygons.len(), 1);
    }

    #[test]
    fn polygon_path_accumulates_swept_area() {
        let mut snapshot = snapshot();
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);
        let poses = vec![
            Pose::planar(-1.0, 0.0, 0.0),
            Pose::planar(0.0, 0.0, 0.0),
            Pose::planar(1.0, 0.0, 0.0),
        ];
        let path = FootprintPath::new(poses, Footprint::Polygon(Polygon::rectangle(0.4, 0.4)));
        let check = aggregator.check_path(&path, false);
        assert!(check.result.is_safe);
        assert_relative_eq!(check.result.traversability, 1.0, epsilon = 1e-5);
        // 1.4 x 0.4 for the first sweep, then 1.0 x 0.4 more.
        assert_relative_eq!(check.result.area, 0.96, epsilon = 1e-4);
    }

    #[test]
    fn polygon_path_split_matches_whole_by_area_weighting() {
        let mut snapshot = snapshot();
        let grid = snapshot.grid_mut();
        for y in 0..40 {
            for x in 20..40 {
                grid.set(LAYER_TRAVERSABILITY, UVec2::new(x, y), 0.5).unwrap();
            }
        }
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);
        let footprint = Polygon::rectangle(0.4, 0.4);
        let polygon_path = |xs: &[f32]| {
            let poses = xs.iter().map(|x| Pose::planar(*x, 0.0, 0.0)).collect();
            FootprintPath::new(poses, Footprint::Polygon(footprint.clone()))
        };

        let first = aggregator.check_path(&polygon_path(&[-1.0, 0.0]), false).result;
        let second = aggregator.check_path(&polygon_path(&[0.0, 1.0]), false).result;
        let whole = aggregator.check_path(&polygon_path(&[-1.0, 0.0, 1.0]), false).result;

        assert!(first.is_safe && second.is_safe && whole.is_safe);
        assert!(first.traversability > second.traversability);
        // The footprint at the shared pose is counted once.
        let shared = footprint.area();
        let added = second.area - shared;
        assert_relative_eq!(whole.area, first.area + added, epsilon = 1e-4);
        let combined =
            (first.area * first.traversability + added * second.traversability) / whole.area;
        assert_relative_eq!(whole.traversability, combined, epsilon = 1e-5);
        assert_relative_eq!(first.traversability, 13.0 / 14.0, epsilon = 1e-5);
        assert_relative_eq!(second.traversability, 8.0 / 14.0, epsilon = 1e-5);
    }

    #[test]
    fn single_pose_polygon_reports_footprint_area() {
        let mut snapshot = snapshot();
        let config = config();
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);
        let pose = Pose::new(Vec3::new(0.3, -0.2, 0.4), Quat::from_rotation_z(0.7));
        let path = FootprintPath::new(vec![pose], Footprint::Polygon(Polygon::rectangle(0.6, 0.4)));
        let check = aggregator.check_path(&path, true);
        assert!(check.result.is_safe);
        assert_relative_eq!(check.result.area, 0.24, epsilon = 1e-4);
        assert_eq!(check.footprint_polygons.len(), 1);
        assert_relative_eq!(check.footprint_polygons[0].z, 0.4);
    }

    #[test]
    fn inclination_gate_blocks_path() {
        let mut snapshot = snapshot();
        let cell = snapshot.grid().world_to_cell(Vec2::new(0.05, 0.05)).unwrap();
        snapshot.grid_mut().set(LAYER_ROBOT_SLOPE, cell, 0.0).unwrap();
        let config = TraversabilityConfig {
            check_robot_inclination: true,
            ..config()
        };
        let mut aggregator =
            PathAggregator::new(&mut snapshot, config.check_settings(0.5), &config);
        assert!(!aggregator.check_path(&circle_path(&[(-1.0, 0.05), (1.0, 0.05)]), false).result.is_safe);
        assert!(!aggregator.check_path(&circle_path(&[(0.05, 0.05)]), false).result.is_safe);
        assert!(aggregator.check_path(&circle_path(&[(-1.0, -1.0)]), false).result.is_safe);
    }
}
