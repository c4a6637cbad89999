//! Owner of the elevation, traversability and terrain maps.
//!
//! Each map sits behind its own lock. Locks are held only for copying a map
//! out, swapping a new one in, or running one query against the current
//! traversability snapshot; the filter pipeline runs on a private copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::{UVec2, Vec2};
use parking_lot::{Mutex, RwLock};

use crate::grid::{Grid, Grid2d, GridMessage, LayeredGrid};
use crate::map::terrain::{assign_terrain_cost, downsample_around};
use crate::map::{FilterPipeline, MapPublisher, NullPublisher, TerrainClassifier, Topic};
use crate::traversability::{
    CheckSettings, FootprintEvaluation, FootprintEvaluator, FootprintPath, PathAggregator,
    PathCheck, TraversabilityConfig, TraversabilitySnapshot, bound_traversability_value,
};
use crate::types::{
    LAYER_LOWER_BOUND, LAYER_TRAVERSABILITY, LAYER_TRAVERSABILITY_ROT, LAYER_TRAVERSABILITY_X,
    LAYER_UNCERTAINTY_RANGE, LAYER_UPPER_BOUND, Polygon, Pose, StampedPolygon,
    TraversabilityError,
};

/// Minimum time between two "map not initialized" warnings.
const UNINITIALIZED_WARNING_PERIOD: Duration = Duration::from_secs(10);

pub struct TraversabilityMap {
    config: TraversabilityConfig,
    default_traversability: RwLock<f32>,
    elevation: Mutex<Option<LayeredGrid>>,
    traversability: Mutex<Option<TraversabilitySnapshot>>,
    terrain: Mutex<Option<LayeredGrid>>,
    elevation_initialized: AtomicBool,
    traversability_initialized: AtomicBool,
    /// Absolute height of the map frame, taken from the last received map.
    z_position: RwLock<f32>,
    robot_position: RwLock<Vec2>,
    pipeline: Mutex<Box<dyn FilterPipeline>>,
    publisher: Box<dyn MapPublisher>,
    classifier: RwLock<Option<Box<dyn TerrainClassifier>>>,
    last_uninitialized_warning: Mutex<Option<Instant>>,
}

impl TraversabilityMap {
    /// A pipeline that fails to configure is reported and kept; the next
    /// [`update_filter`](Self::update_filter) may fix it.
    pub fn new(config: TraversabilityConfig, pipeline: impl FilterPipeline + 'static) -> Self {
        let mut pipeline: Box<dyn FilterPipeline> = Box::new(pipeline);
        if let Err(err) = pipeline.configure() {
            log::error!("Could not configure the filter chain: {err}");
        }
        log::info!("Traversability map started");

        Self {
            default_traversability: RwLock::new(config.traversability_default),
            config,
            elevation: Mutex::new(None),
            traversability: Mutex::new(None),
            terrain: Mutex::new(None),
            elevation_initialized: AtomicBool::new(false),
            traversability_initialized: AtomicBool::new(false),
            z_position: RwLock::new(0.0),
            robot_position: RwLock::new(Vec2::ZERO),
            pipeline: Mutex::new(pipeline),
            publisher: Box::new(NullPublisher),
            classifier: RwLock::new(None),
            last_uninitialized_warning: Mutex::new(None),
        }
    }

    pub fn with_publisher(mut self, publisher: impl MapPublisher + 'static) -> Self {
        self.publisher = Box::new(publisher);
        self
    }

    pub fn with_terrain_classifier(self, classifier: impl TerrainClassifier + 'static) -> Self {
        self.set_terrain_classifier(classifier);
        self
    }

    pub fn set_terrain_classifier(&self, classifier: impl TerrainClassifier + 'static) {
        *self.classifier.write() = Some(Box::new(classifier));
    }

    pub fn config(&self) -> &TraversabilityConfig {
        &self.config
    }

    pub fn map_frame_id(&self) -> &str {
        &self.config.map_frame_id
    }

    pub fn is_initialized(&self) -> bool {
        self.traversability_initialized.load(Ordering::Acquire)
    }

    pub fn z_position(&self) -> f32 {
        *self.z_position.read()
    }

    /// Generation of the current traversability snapshot.
    pub fn generation(&self) -> Option<u64> {
        self.traversability
            .lock()
            .as_ref()
            .map(TraversabilitySnapshot::generation)
    }

    /// Store a new elevation map. It must be in the map frame and carry the
    /// configured elevation layers; otherwise the previous map is kept.
    pub fn set_elevation_map(
        &self,
        elevation: LayeredGrid,
        z_offset: f32,
    ) -> Result<(), TraversabilityError> {
        if elevation.frame_id() != self.config.map_frame_id {
            log::error!(
                "Received elevation map has frame_id '{}', but '{}' is expected",
                elevation.frame_id(),
                self.config.map_frame_id
            );
            return Err(TraversabilityError::FrameMismatch {
                expected: self.config.map_frame_id.clone(),
                received: elevation.frame_id().to_string(),
            });
        }
        if let Err(err) = TraversabilitySnapshot::validate(&elevation, self.config.elevation_layers())
        {
            log::warn!("Can't set elevation map: {err}");
            return Err(err);
        }

        *self.z_position.write() = z_offset;
        *self.elevation.lock() = Some(elevation);
        self.elevation_initialized.store(true, Ordering::Release);
        Ok(())
    }

    pub fn set_elevation_message(&self, message: GridMessage) -> Result<(), TraversabilityError> {
        let (grid, z_offset) = message.into_grid()?;
        self.set_elevation_map(grid, z_offset)
    }

    /// Install an already computed traversability map as a new generation.
    pub fn set_traversability_map(
        &self,
        traversability: LayeredGrid,
        z_offset: f32,
    ) -> Result<(), TraversabilityError> {
        if let Err(err) =
            TraversabilitySnapshot::validate(&traversability, self.config.traversability_layers())
        {
            log::warn!("Can't set traversability map: {err}");
            return Err(err);
        }
        *self.z_position.write() = z_offset;
        self.install(traversability);
        Ok(())
    }

    pub fn set_traversability_message(
        &self,
        message: GridMessage,
    ) -> Result<(), TraversabilityError> {
        let (grid, z_offset) = message.into_grid()?;
        self.set_traversability_map(grid, z_offset)
    }

    /// Swap `grid` in as the next generation with empty caches.
    fn install(&self, grid: LayeredGrid) -> u64 {
        let mut current = self.traversability.lock();
        let generation = current.as_ref().map_or(1, |s| s.generation() + 1);
        *current = Some(TraversabilitySnapshot::new(grid, generation));
        self.traversability_initialized
            .store(true, Ordering::Release);
        generation
    }

    /// Run the filter pipeline on the current elevation map and replace the
    /// traversability and terrain maps with the result.
    ///
    /// On failure the map is marked uninitialized and every query reports
    /// unsafe until the next successful cycle.
    pub fn compute_traversability(&self) -> Result<(), TraversabilityError> {
        let start = Instant::now();

        let elevation = if self.elevation_initialized.load(Ordering::Acquire) {
            self.elevation.lock().clone()
        } else {
            None
        };
        let Some(elevation) = elevation else {
            log::error!("Elevation map is not initialized");
            self.traversability_initialized
                .store(false, Ordering::Release);
            return Err(TraversabilityError::ElevationUninitialized);
        };

        let result = self.pipeline.lock().apply(&elevation);
        let grid = result.and_then(|mut grid| {
            carry_over_layers(&elevation, &mut grid);
            TraversabilitySnapshot::validate(&grid, self.config.traversability_layers())?;
            Ok(grid)
        });
        let grid = match grid {
            Ok(grid) => grid,
            Err(err) => {
                log::error!("Could not update the filter chain, no traversability computed: {err}");
                self.traversability_initialized
                    .store(false, Ordering::Release);
                return Err(if matches!(err, TraversabilityError::PipelineFailure(_)) {
                    err
                } else {
                    TraversabilityError::PipelineFailure(err.to_string())
                });
            }
        };

        let terrain = self.build_terrain(&grid);
        let generation = self.install(grid);
        if let Some(terrain) = terrain {
            *self.terrain.lock() = Some(terrain);
        }

        self.publish_traversability_map();
        self.publish_terrain_map();
        log::debug!(
            "Traversability map generation {generation} has been updated in {:?}",
            start.elapsed()
        );
        Ok(())
    }

    fn build_terrain(&self, grid: &LayeredGrid) -> Option<LayeredGrid> {
        let robot_position = *self.robot_position.read();
        let mut terrain = downsample_around(grid, robot_position)?;
        if let Some(classifier) = self.classifier.read().as_deref() {
            assign_terrain_cost(&mut terrain, classifier);
        }
        Some(terrain)
    }

    /// Reload the filter pipeline configuration.
    pub fn update_filter(&self) -> Result<(), TraversabilityError> {
        self.pipeline.lock().configure().map_err(|err| {
            log::error!("Could not configure the filter chain: {err}");
            TraversabilityError::Configuration(err.to_string())
        })
    }

    /// Drop every cached footprint verdict of the current snapshot.
    pub fn reset_footprint_caches(&self) {
        if let Some(snapshot) = self.traversability.lock().as_mut() {
            snapshot.reset_caches();
        }
    }

    pub fn set_robot_position(&self, position: Vec2) {
        *self.robot_position.write() = position;
    }

    pub fn default_traversability(&self) -> f32 {
        *self.default_traversability.read()
    }

    /// Set the traversability assumed for unknown regions (clamped to the valid range).
    pub fn set_default_traversability(&self, value: f32) {
        *self.default_traversability.write() = bound_traversability_value(value);
    }

    /// Go back to the configured default traversability.
    pub fn restore_default_traversability(&self) {
        self.set_default_traversability(self.config.traversability_default);
    }

    fn check_settings(&self) -> CheckSettings {
        self.config.check_settings(self.default_traversability())
    }

    fn warn_uninitialized(&self, context: &str) {
        let mut last = self.last_uninitialized_warning.lock();
        if last.is_none_or(|at| at.elapsed() >= UNINITIALIZED_WARNING_PERIOD) {
            log::warn!("{context}: traversability map not yet initialized");
            *last = Some(Instant::now());
        }
    }

    /// Run `query` against the current snapshot, `None` when there is none.
    fn with_snapshot<R>(
        &self,
        context: &str,
        query: impl FnOnce(&mut TraversabilitySnapshot, CheckSettings) -> R,
    ) -> Option<R> {
        if !self.is_initialized() {
            self.warn_uninitialized(context);
            return None;
        }
        let settings = self.check_settings();
        let mut guard = self.traversability.lock();
        let snapshot = guard.as_mut()?;
        Some(query(snapshot, settings))
    }

    /// Check a path. Footprint and untraversable polygons are published when
    /// `publish_polygons` is set. Unsafe whenever the map is not initialized.
    pub fn check_footprint_path(&self, path: &FootprintPath, publish_polygons: bool) -> PathCheck {
        let config = &self.config;
        let check = self
            .with_snapshot("Check footprint path", |snapshot, settings| {
                PathAggregator::new(snapshot, settings, config).check_path(path, publish_polygons)
            })
            .unwrap_or_default();

        for polygon in &check.footprint_polygons {
            self.publish_polygon(Topic::FootprintPolygon, polygon);
        }
        for polygon in &check.untraversable_polygons {
            self.publish_polygon(Topic::UntraversablePolygon, polygon);
        }
        check
    }

    pub fn is_traversable_polygon(&self, polygon: &Polygon, want_hull: bool) -> FootprintEvaluation {
        self.with_snapshot("Polygon query", |snapshot, settings| {
            FootprintEvaluator::new(snapshot, settings).evaluate_polygon(polygon, want_hull)
        })
        .unwrap_or_default()
    }

    pub fn is_traversable_circle(
        &self,
        center: Vec2,
        radius_max: f32,
        radius_min: f32,
        want_hull: bool,
    ) -> FootprintEvaluation {
        self.with_snapshot("Circle query", |snapshot, settings| {
            FootprintEvaluator::new(snapshot, settings)
                .evaluate_circle(center, radius_max, radius_min, want_hull)
        })
        .unwrap_or_default()
    }

    /// Evaluate the configured footprint polygon centered on every cell, once
    /// axis aligned and once rotated by `yaw`, into `traversability_x` and
    /// `traversability_rot` (0 where the footprint fails).
    pub fn traversability_footprint_yaw(&self, yaw: f32) -> Result<(), TraversabilityError> {
        let start = Instant::now();
        let footprint = &self.config.footprint_polygon;
        if footprint.len() < 3 {
            return Err(TraversabilityError::Configuration(
                "no footprint polygon configured".to_string(),
            ));
        }
        log::debug!("Footprint yaw: {yaw}");

        self.with_snapshot("Footprint sweep", |snapshot, settings| {
            let info = *snapshot.grid().info();
            let mut evaluator = FootprintEvaluator::new(snapshot, settings);
            let mut axis_aligned = Vec::with_capacity(info.cell_count());
            let mut rotated = Vec::with_capacity(info.cell_count());
            for y in 0..info.height {
                for x in 0..info.width {
                    let center = info.cell_center(UVec2::new(x, y));
                    for (angle, values) in [(0.0, &mut axis_aligned), (yaw, &mut rotated)] {
                        let polygon = footprint.transform(&Pose::planar(center.x, center.y, angle));
                        let evaluation = evaluator.evaluate_polygon(&polygon, false);
                        values.push(if evaluation.passed {
                            evaluation.traversability
                        } else {
                            0.0
                        });
                    }
                }
            }

            let grid = snapshot.grid_mut();
            grid.insert_layer(LAYER_TRAVERSABILITY_X, Grid2d::new(info, axis_aligned)?)?;
            grid.insert_layer(LAYER_TRAVERSABILITY_ROT, Grid2d::new(info, rotated)?)?;
            Ok::<_, TraversabilityError>(())
        })
        .ok_or(TraversabilityError::TraversabilityUninitialized)??;

        self.publish_traversability_map();
        log::info!(
            "Traversability of footprint has been computed in {:?}",
            start.elapsed()
        );
        Ok(())
    }

    /// Fill the circular footprint cache for every cell.
    pub fn traversability_footprint_circle(
        &self,
        radius: f32,
        offset: f32,
    ) -> Result<(), TraversabilityError> {
        self.with_snapshot("Footprint sweep", |snapshot, settings| {
            let info = *snapshot.grid().info();
            let mut evaluator = FootprintEvaluator::new(snapshot, settings);
            for y in 0..info.height {
                for x in 0..info.width {
                    let center = info.cell_center(UVec2::new(x, y));
                    evaluator.evaluate_circle(center, radius + offset, radius, false);
                }
            }
        })
        .ok_or(TraversabilityError::TraversabilityUninitialized)?;

        self.publish_traversability_map();
        Ok(())
    }

    /// Whether the current map has a valid traversability value at `(x, y)`.
    pub fn map_has_valid_traversability_at(&self, x: f32, y: f32) -> bool {
        let guard = self.traversability.lock();
        let Some(snapshot) = guard.as_ref() else {
            return false;
        };
        let grid = snapshot.grid();
        match grid.world_to_cell(Vec2::new(x, y)) {
            Some(cell) => grid.is_valid(LAYER_TRAVERSABILITY, cell),
            None => {
                log::error!("Position ({x}, {y}) is outside of the traversability map");
                false
            }
        }
    }

    /// Copy of the current traversability map, cache layers included.
    pub fn traversability_map(&self) -> Option<LayeredGrid> {
        self.traversability
            .lock()
            .as_ref()
            .map(|snapshot| snapshot.grid().clone())
    }

    pub fn elevation_map(&self) -> Option<LayeredGrid> {
        self.elevation.lock().clone()
    }

    pub fn terrain_map(&self) -> Option<LayeredGrid> {
        self.terrain.lock().clone()
    }

    pub fn publish_traversability_map(&self) {
        if self.publisher.subscriber_count(Topic::TraversabilityMap) == 0 {
            return;
        }
        if let Some(grid) = self.traversability_map() {
            self.publish_grid(Topic::TraversabilityMap, grid);
        }
    }

    pub fn publish_terrain_map(&self) {
        if self.publisher.subscriber_count(Topic::TerrainMap) == 0 {
            return;
        }
        if let Some(grid) = self.terrain_map() {
            self.publish_grid(Topic::TerrainMap, grid);
        }
    }

    fn publish_grid(&self, topic: Topic, mut grid: LayeredGrid) {
        add_uncertainty_range(&mut grid);
        self.publisher
            .publish_map(topic, GridMessage::from_grid(&grid, self.z_position()));
        log::debug!("Publishing the {}", topic.name());
    }

    fn publish_polygon(&self, topic: Topic, polygon: &StampedPolygon) {
        if polygon.polygon.is_empty() || self.publisher.subscriber_count(topic) == 0 {
            return;
        }
        self.publisher.publish_polygon(topic, polygon);
    }
}

/// Copy layers of the elevation map the pipeline output lacks.
fn carry_over_layers(elevation: &LayeredGrid, output: &mut LayeredGrid) {
    if elevation.info() != output.info() {
        return;
    }
    for name in elevation.layer_names() {
        if output.exists(name) {
            continue;
        }
        if let Some(layer) = elevation.layer(name) {
            let _ = output.insert_layer(name, layer.clone());
        }
    }
    if output.frame_id().is_empty() {
        output.set_frame_id(elevation.frame_id());
    }
}

/// Add `upper_bound - lower_bound` as `uncertainty_range` when both exist.
fn add_uncertainty_range(grid: &mut LayeredGrid) {
    let (Some(upper), Some(lower)) = (grid.layer(LAYER_UPPER_BOUND), grid.layer(LAYER_LOWER_BOUND))
    else {
        return;
    };
    let range: Vec<f32> = upper
        .data()
        .iter()
        .zip(lower.data())
        .map(|(u, l)| u - l)
        .collect();
    if let Ok(layer) = Grid2d::new(*grid.info(), range) {
        let _ = grid.insert_layer(LAYER_UNCERTAINTY_RANGE, layer);
    }
}
