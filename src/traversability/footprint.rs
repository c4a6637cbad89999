//! Circular and polygonal footprint evaluation.

use glam::{UVec2, Vec2};

use crate::grid::{Grid, LayeredGrid};
use crate::iterators::{PolygonIterator, SpiralCell, SpiralIterator};
use crate::traversability::{CheckSettings, EligibilityChecker, TraversabilitySnapshot};
use crate::types::{LAYER_TRAVERSABILITY, LAYER_TRAVERSABILITY_FOOTPRINT, Polygon};

/// Outcome of evaluating one footprint placement. The default is the unsafe verdict.
///
/// A failed evaluation always carries a traversability of 0, even when a hull was
/// requested and some covered cells were eligible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootprintEvaluation {
    pub passed: bool,
    /// Mean traversability of the covered cells.
    pub traversability: f32,
    /// Convex hull of the obstructing cells. Only filled when requested and failed.
    pub untraversable: Polygon,
}

impl FootprintEvaluation {
    fn passed(traversability: f32) -> Self {
        Self {
            passed: true,
            traversability,
            untraversable: Polygon::default(),
        }
    }

    fn failed(untraversable: Polygon) -> Self {
        Self {
            passed: false,
            traversability: 0.0,
            untraversable,
        }
    }
}

pub struct FootprintEvaluator<'a> {
    checker: EligibilityChecker<'a>,
}

impl<'a> FootprintEvaluator<'a> {
    pub fn new(snapshot: &'a mut TraversabilitySnapshot, settings: CheckSettings) -> Self {
        Self {
            checker: EligibilityChecker::new(snapshot, settings),
        }
    }

    pub fn checker(&mut self) -> &mut EligibilityChecker<'a> {
        &mut self.checker
    }

    pub fn grid(&self) -> &LayeredGrid {
        self.checker.grid()
    }

    pub fn default_traversability(&self) -> f32 {
        self.checker.settings().default_traversability
    }

    /// Result for a footprint that covers no map data.
    fn unknown(&self, hull: impl FnOnce() -> Polygon, want_hull: bool) -> FootprintEvaluation {
        let default = self.default_traversability();
        if default != 0.0 {
            FootprintEvaluation::passed(default)
        } else if want_hull {
            FootprintEvaluation::failed(hull())
        } else {
            FootprintEvaluation::failed(Polygon::default())
        }
    }

    fn traversability_at(&self, cell: UVec2) -> f32 {
        let value = self.grid().value(LAYER_TRAVERSABILITY, cell);
        if value.is_finite() {
            value
        } else {
            self.default_traversability()
        }
    }

    /// Evaluate every cell whose center lies inside `polygon` (world frame).
    ///
    /// Without `want_hull` the scan stops at the first ineligible cell.
    pub fn evaluate_polygon(&mut self, polygon: &Polygon, want_hull: bool) -> FootprintEvaluation {
        let mut sum = 0.0;
        let mut n_cells = 0usize;
        let mut obstructions: Vec<Vec2> = Vec::new();

        let cells = PolygonIterator::new(self.grid(), polygon);
        for cell in cells.into_iter().flatten() {
            if self.checker.is_eligible(cell) {
                sum += self.traversability_at(cell);
                n_cells += 1;
                continue;
            }
            if !want_hull {
                return FootprintEvaluation::failed(Polygon::default());
            }
            obstructions.push(self.grid().cell_center(cell));
        }

        if !obstructions.is_empty() {
            return FootprintEvaluation::failed(Polygon::convex_hull_of_points(&obstructions));
        }
        if n_cells == 0 {
            log::debug!("No cells within polygon, using the default traversability");
            return self.unknown(Polygon::default, false);
        }
        FootprintEvaluation::passed(sum / n_cells as f32)
    }

    /// Evaluate the disc of `radius_max` around `center`, spiralling outwards.
    ///
    /// Obstacles within `radius_min` (or anywhere, when `radius_min` is 0) fail
    /// the footprint. The first obstacle in the annulus beyond `radius_min` ends
    /// the scan and scales the score down by its distance instead; closer
    /// obstacles further along the spiral are not looked for. The verdict is
    /// cached per center cell in `traversability_footprint`.
    pub fn evaluate_circle(
        &mut self,
        center: Vec2,
        radius_max: f32,
        radius_min: f32,
        want_hull: bool,
    ) -> FootprintEvaluation {
        let circle = || Polygon::from_circle(center, radius_max);
        let Some(center_cell) = self.grid().world_to_cell(center) else {
            return self.unknown(circle, want_hull);
        };

        let cached = self.grid().value(LAYER_TRAVERSABILITY_FOOTPRINT, center_cell);
        if cached.is_finite() {
            return if cached != 0.0 {
                FootprintEvaluation::passed(cached)
            } else if want_hull {
                FootprintEvaluation::failed(circle())
            } else {
                FootprintEvaluation::failed(Polygon::default())
            };
        }

        let Some(spiral) = SpiralIterator::new(self.grid(), center, radius_max) else {
            return self.unknown(circle, want_hull);
        };

        let mut sum = 0.0;
        let mut n_cells = 0usize;
        let mut obstructions: Vec<Vec2> = Vec::new();
        for SpiralCell { cell, radius } in spiral {
            if self.checker.is_eligible(cell) {
                sum += self.traversability_at(cell);
                n_cells += 1;
                continue;
            }

            if radius_min == 0.0 || radius <= radius_min {
                self.checker
                    .store(LAYER_TRAVERSABILITY_FOOTPRINT, center_cell, 0.0);
                obstructions.push(self.grid().cell_center(cell));
            } else if obstructions.is_empty() {
                let span = (radius_max - radius_min).max(f32::EPSILON);
                let factor = (((radius - radius_min) / span).min(1.0) + 1.0) / 2.0;
                let value = sum * factor / n_cells.max(1) as f32;
                self.checker
                    .store(LAYER_TRAVERSABILITY_FOOTPRINT, center_cell, value);
                return FootprintEvaluation::passed(value);
            }

            if !want_hull {
                return FootprintEvaluation::failed(Polygon::default());
            }
        }

        if !obstructions.is_empty() {
            return FootprintEvaluation::failed(Polygon::convex_hull_of_points(&obstructions));
        }
        let value = sum / n_cells.max(1) as f32;
        self.checker
            .store(LAYER_TRAVERSABILITY_FOOTPRINT, center_cell, value);
        FootprintEvaluation::passed(value)
    }
}
