use glam::UVec2;

use crate::grid::Grid;
use crate::types::{MapInfo, TraversabilityError};

/// Dense row-major raster with one value per cell.
#[derive(Debug, Clone)]
pub struct Grid2d<T> {
    info: MapInfo,
    data: Vec<T>,
}

impl<T> Grid2d<T> {
    pub fn new(info: MapInfo, data: Vec<T>) -> Result<Self, TraversabilityError> {
        let expected_len = info.cell_count();
        if data.len() != expected_len {
            return Err(TraversabilityError::InvalidMetadata(format!(
                "data length {} does not match map size {}",
                data.len(),
                expected_len
            )));
        }

        Ok(Self { info, data })
    }

    pub fn filled(info: MapInfo, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: vec![value; info.cell_count()],
            info,
        }
    }

    pub fn from_fn(info: MapInfo, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity(info.cell_count());
        for y in 0..info.height {
            for x in 0..info.width {
                data.push(f(x, y));
            }
        }
        Self { info, data }
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn get(&self, cell: UVec2) -> Option<&T> {
        if !self.info.contains_cell(cell) {
            return None;
        }
        Some(&self.data[self.info.linear_index(cell)])
    }

    pub fn get_mut(&mut self, cell: UVec2) -> Option<&mut T> {
        if !self.info.contains_cell(cell) {
            return None;
        }
        let idx = self.info.linear_index(cell);
        Some(&mut self.data[idx])
    }

    pub fn set(&mut self, cell: UVec2, value: T) -> Result<(), TraversabilityError> {
        match self.get_mut(cell) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TraversabilityError::OutOfBounds(format!(
                "cell ({}, {}) out of bounds for map {}x{}",
                cell.x, cell.y, self.info.width, self.info.height
            ))),
        }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    /// All cells with their values in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (UVec2, &T)> {
        let width = self.info.width.max(1);
        self.data.iter().enumerate().map(move |(i, value)| {
            let i = i as u32;
            (UVec2::new(i % width, i / width), value)
        })
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T> Grid for Grid2d<T> {
    fn info(&self) -> &MapInfo {
        &self.info
    }
}
