//! Per-cell slope, step and roughness checks.
//!
//! Each check reads a raw indicator layer produced by the filter pipeline
//! (non-zero means the cell is fine on its own). Cells flagged by the
//! indicator are looked at again in their neighborhood and the verdict is
//! memoized in the matching `*_footprint` layer of the snapshot.

use glam::{UVec2, Vec2};

use crate::grid::{Grid, LayeredGrid};
use crate::iterators::{CircleIterator, LineIterator, SubmapIterator};
use crate::traversability::{CheckSettings, TraversabilitySnapshot};
use crate::types::{
    LAYER_ELEVATION, LAYER_ROUGHNESS, LAYER_ROUGHNESS_FOOTPRINT, LAYER_SLOPE,
    LAYER_SLOPE_FOOTPRINT, LAYER_STEP, LAYER_STEP_FOOTPRINT,
};

/// Radius of the slope/roughness density window, in cells.
const DENSITY_WINDOW_CELLS: f64 = 3.0;
const SLOPE_DENSITY_FACTOR: f64 = 2.0;
const ROUGHNESS_DENSITY_FACTOR: f64 = 1.5;
/// Radius of the step candidate search and side of the probing window, in cells.
const STEP_WINDOW_CELLS: f32 = 2.5;
/// Probe directions shorter than this (in cells) are ignored.
const MIN_PROBE_CELLS: f32 = 0.25;

const PASS: f32 = 1.0;
const FAIL: f32 = 0.0;

pub struct EligibilityChecker<'a> {
    snapshot: &'a mut TraversabilitySnapshot,
    settings: CheckSettings,
}

impl<'a> EligibilityChecker<'a> {
    pub fn new(snapshot: &'a mut TraversabilitySnapshot, settings: CheckSettings) -> Self {
        Self { snapshot, settings }
    }

    pub fn settings(&self) -> &CheckSettings {
        &self.settings
    }

    pub fn grid(&self) -> &LayeredGrid {
        self.snapshot.grid()
    }

    /// Whether the cell is locally traversable: slope, then step, then (if enabled)
    /// roughness, stopping at the first failing check.
    pub fn is_eligible(&mut self, cell: UVec2) -> bool {
        self.slope_ok(cell)
            && self.step_ok(cell)
            && (!self.settings.check_roughness || self.roughness_ok(cell))
    }

    pub fn slope_ok(&mut self, cell: UVec2) -> bool {
        self.density_check(cell, LAYER_SLOPE, LAYER_SLOPE_FOOTPRINT, SLOPE_DENSITY_FACTOR)
    }

    pub fn roughness_ok(&mut self, cell: UVec2) -> bool {
        self.density_check(
            cell,
            LAYER_ROUGHNESS,
            LAYER_ROUGHNESS_FOOTPRINT,
            ROUGHNESS_DENSITY_FACTOR,
        )
    }

    pub fn step_ok(&mut self, cell: UVec2) -> bool {
        if let Some(verdict) = self.shortcut(cell, LAYER_STEP, LAYER_STEP_FOOTPRINT) {
            return verdict;
        }
        let ok = self.bridges_step(cell);
        self.store(LAYER_STEP_FOOTPRINT, cell, if ok { PASS } else { FAIL });
        ok
    }

    /// Write a memoized value for `cell`. Cache layers exist on every snapshot.
    pub(crate) fn store(&mut self, layer: &str, cell: UVec2, value: f32) {
        let _ = self.snapshot.grid_mut().set(layer, cell, value);
    }

    /// Verdict available without looking at the neighborhood: the raw indicator
    /// passes (anything but an exact zero, NaN included), or a verdict is cached.
    fn shortcut(&self, cell: UVec2, indicator: &str, cache: &str) -> Option<bool> {
        let grid = self.grid();
        if grid.value(indicator, cell) != 0.0 {
            return Some(true);
        }
        let cached = grid.value(cache, cell);
        cached.is_finite().then_some(cached != 0.0)
    }

    fn density_check(&mut self, cell: UVec2, indicator: &str, cache: &str, factor: f64) -> bool {
        if let Some(verdict) = self.shortcut(cell, indicator, cache) {
            return verdict;
        }

        let grid = self.grid();
        let resolution = grid.resolution() as f64;
        let window_radius = DENSITY_WINDOW_CELLS * resolution;
        let critical_length = self.settings.max_gap_width as f64 / 3.0;
        let critical = (factor * window_radius * critical_length / resolution.powi(2)).floor();

        let mut count = 0.0;
        let mut ok = true;
        let window = CircleIterator::new(grid, grid.cell_center(cell), window_radius as f32);
        for neighbor in window.into_iter().flatten() {
            if grid.value(indicator, neighbor) == 0.0 {
                count += 1.0;
                if count > critical {
                    ok = false;
                    break;
                }
            }
        }

        self.store(cache, cell, if ok { PASS } else { FAIL });
        ok
    }

    /// Whether the step flagged at `cell` is a gap narrow enough to cross.
    ///
    /// Higher neighbors that are flagged as well become candidates (or the cell
    /// itself when there are none). From each candidate the map is probed along
    /// the directions of lower flagged cells, up to `max_gap_width`. A probe that
    /// meets terrain higher than the candidate, or that drops and never comes
    /// back up, marks a real step.
    fn bridges_step(&self, cell: UVec2) -> bool {
        let grid = self.grid();
        let resolution = grid.resolution();
        let critical_height = self.settings.critical_step_height;
        let max_gap_width = self.settings.max_gap_width;
        let window = STEP_WINDOW_CELLS * resolution;
        let min_probe = MIN_PROBE_CELLS * resolution;

        let center = grid.cell_center(cell);
        let height = grid.value(LAYER_ELEVATION, cell);
        let mut candidates: Vec<UVec2> = CircleIterator::new(grid, center, window)
            .into_iter()
            .flatten()
            .filter(|c| {
                grid.value(LAYER_ELEVATION, *c) > height + critical_height
                    && grid.value(LAYER_STEP, *c) == 0.0
            })
            .collect();
        if candidates.is_empty() {
            candidates.push(cell);
        }

        for candidate in candidates {
            let origin = grid.cell_center(candidate);
            let to_center = center - origin;
            let Some(probe_window) = SubmapIterator::new(grid, origin, Vec2::splat(window)) else {
                log::warn!("Step check could not retrieve the window around cell {candidate}");
                return false;
            };
            let candidate_height = grid.value(LAYER_ELEVATION, candidate);

            for probe_cell in probe_window {
                let lower = grid.value(LAYER_ELEVATION, probe_cell) < candidate_height - critical_height;
                if grid.value(LAYER_STEP, probe_cell) != 0.0 || !lower {
                    continue;
                }
                let direction = grid.cell_center(probe_cell) - origin;
                if direction.length() < min_probe {
                    continue;
                }
                if to_center.length() > min_probe && to_center.dot(direction) < 0.0 {
                    continue;
                }

                let far = probe_end(grid, origin, direction, max_gap_width);
                let Some(far_cell) = grid.world_to_cell(far) else {
                    continue;
                };
                if !crosses_gap(grid, candidate, far_cell, candidate_height, critical_height) {
                    return false;
                }
            }
        }
        true
    }
}

/// Walk from `origin` in steps of `direction` while staying within `max_length`
/// and inside the map.
fn probe_end(grid: &LayeredGrid, origin: Vec2, direction: Vec2, max_length: f32) -> Vec2 {
    let mut pos = origin + direction;
    while (pos - origin + direction).length() < max_length && grid.is_inside(pos + direction) {
        pos += direction;
    }
    pos
}

/// Trace from `from` to `to`: false on a rise above the band around `height`
/// or on a drop below it that does not close again.
fn crosses_gap(grid: &LayeredGrid, from: UVec2, to: UVec2, height: f32, band: f32) -> bool {
    let mut gap_start = false;
    for cell in LineIterator::new(grid, from, to).into_iter().flatten() {
        let elevation = grid.value(LAYER_ELEVATION, cell);
        if elevation > height + band {
            return false;
        }
        if elevation < height - band || !elevation.is_finite() {
            gap_start = true;
        } else if gap_start {
            return true;
        }
    }
    !gap_start
}
