use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::entities::{space, warehouse};

/// 0/1 occupancy view of a warehouse, shelves blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cells: Vec<Vec<u8>>,
}

impl OccupancyGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![0; width]; height],
        }
    }

    /// Allocates `width * height` cells; callers check `fits_grid` first.
    pub fn from_spaces(warehouse: &warehouse::Model, spaces: &[space::Model]) -> Self {
        let mut grid = Self::new(
            warehouse.width.max(0) as usize,
            warehouse.height.max(0) as usize,
        );

        for space in spaces.iter().filter(|s| s.is_shelf()) {
            if !grid.set_obstacle(space.x_pos, space.y_pos) {
                warn!(
                    warehouse_id = warehouse.warehouse_id,
                    x = space.x_pos,
                    y = space.y_pos,
                    "shelf outside warehouse bounds skipped"
                );
            }
        }

        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Marks a cell blocked. Returns false when the cell is out of range.
    pub fn set_obstacle(&mut self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some((x, y)) => {
                self.cells[y][x] = 1;
                true
            }
            None => false,
        }
    }

    /// Out-of-range cells are never free.
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|(x, y)| self.cells[y][x] == 0)
            .unwrap_or(false)
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|(x, y)| self.cells[y][x] == 1)
            .unwrap_or(false)
    }

    pub fn obstacles(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|c| **c == 1).count())
            .sum()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.cells
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
