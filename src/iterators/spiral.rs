use std::collections::VecDeque;

use glam::{IVec2, UVec2, Vec2};

use crate::grid::Grid;
use crate::types::MapInfo;

/// Cell produced by [`SpiralIterator`] with its distance from the start cell (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralCell {
    pub cell: UVec2,
    pub radius: f32,
}

/// Visits cells in rings of growing distance around the cell containing `center`.
///
/// The start cell comes first with radius 0. Ring `d` holds the offsets whose
/// length (in cells) rounds down to `d`, ordered by angle. Only cells inside the
/// map whose center is within `radius` of `center` are produced.
#[derive(Debug, Clone)]
pub struct SpiralIterator {
    info: MapInfo,
    start: IVec2,
    center: Vec2,
    radius: f32,
    ring: u32,
    max_ring: u32,
    pending: VecDeque<SpiralCell>,
}

impl SpiralIterator {
    /// Returns `None` if `center` is outside the map.
    pub fn new<G: Grid + ?Sized>(grid: &G, center: Vec2, radius: f32) -> Option<Self> {
        let info = *grid.info();
        let start = info.world_to_cell(center)?;
        // No map cell lies beyond the ring of the farthest corner.
        let far_x = start.x.max(info.width - 1 - start.x);
        let far_y = start.y.max(info.height - 1 - start.y);
        let corner_ring = floor_sqrt(i64::from(far_x).pow(2) + i64::from(far_y).pow(2)) as u32;
        let max_ring = ((radius.max(0.0) / info.resolution).ceil() as u32).min(corner_ring);
        let mut pending = VecDeque::new();
        pending.push_back(SpiralCell {
            cell: start,
            radius: 0.0,
        });
        Some(Self {
            info,
            start: start.as_ivec2(),
            center,
            radius,
            ring: 0,
            max_ring,
            pending,
        })
    }

    fn fill_ring(&mut self, ring: u32) {
        let d = i64::from(ring);
        let inner_sq = d * d;
        let outer_sq = (d + 1) * (d + 1);
        // Each row holds the band of dx with d^2 <= dx^2 + dy^2 < (d + 1)^2.
        let mut offsets = Vec::new();
        for dy in -d..=d {
            let row = self.start.y as i64 + dy;
            if row < 0 || row >= i64::from(self.info.height) {
                continue;
            }
            let dy_sq = dy * dy;
            let lo = ceil_sqrt((inner_sq - dy_sq).max(0));
            let hi = floor_sqrt(outer_sq - dy_sq - 1);
            for dx in lo..=hi {
                offsets.push(IVec2::new(dx as i32, dy as i32));
                if dx > 0 {
                    offsets.push(IVec2::new(-dx as i32, dy as i32));
                }
            }
        }
        offsets.sort_unstable_by(|a, b| {
            let ta = (a.y as f32).atan2(a.x as f32);
            let tb = (b.y as f32).atan2(b.x as f32);
            ta.total_cmp(&tb)
        });

        let radius_sq = self.radius * self.radius;
        for offset in offsets {
            let cell = self.start + offset;
            if cell.x < 0 || cell.y < 0 {
                continue;
            }
            let cell = cell.as_uvec2();
            if !self.info.contains_cell(cell) {
                continue;
            }
            if self.info.cell_center(cell).distance_squared(self.center) > radius_sq {
                continue;
            }
            self.pending.push_back(SpiralCell {
                cell,
                radius: offset.as_vec2().length() * self.info.resolution,
            });
        }
    }
}

fn floor_sqrt(value: i64) -> i64 {
    if value <= 0 {
        return 0;
    }
    let mut root = (value as f64).sqrt() as i64;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}

fn ceil_sqrt(value: i64) -> i64 {
    let root = floor_sqrt(value);
    if root * root < value {
        root + 1
    } else {
        root
    }
}

impl Iterator for SpiralIterator {
    type Item = SpiralCell;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cell) = self.pending.pop_front() {
                return Some(cell);
            }
            if self.ring >= self.max_ring {
                return None;
            }
            self.ring += 1;
            self.fill_ring(self.ring);
        }
    }
}
