//! Text layouts of a warehouse grid.
//!
//! One line per row, top row first. `P` marks a path cell and `S` a shelf
//! cell; any other character marks a cell that has no `spaces` row.
//! Blank lines are ignored and each line is trimmed at both ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::{
    space::{self, SpaceKind},
    warehouse::{self, MAX_GRID_CELLS},
};

const PATH_CHAR: char = 'P';
const SHELF_CHAR: char = 'S';
const EMPTY_CHAR: char = '.';
const UNKNOWN_CHAR: char = '?';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,

    #[error("line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("layout dimension {0} does not fit in a grid coordinate")]
    TooLarge(usize),

    #[error("{width}x{height} exceeds the {limit}-cell grid limit")]
    ExtentTooLarge { width: i32, height: i32, limit: i64 },

    #[error("failed to read layout: {0}")]
    Io(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutCell {
    Path,
    Shelf,
    /// A cell that is part of the rectangle but has no `spaces` row.
    Empty,
    /// A cell whose `type` label is neither `path` nor `shelf`.
    Other,
}

impl LayoutCell {
    fn from_char(c: char) -> Self {
        match c {
            PATH_CHAR => LayoutCell::Path,
            SHELF_CHAR => LayoutCell::Shelf,
            _ => LayoutCell::Empty,
        }
    }

    fn as_char(self) -> char {
        match self {
            LayoutCell::Path => PATH_CHAR,
            LayoutCell::Shelf => SHELF_CHAR,
            LayoutCell::Empty => EMPTY_CHAR,
            LayoutCell::Other => UNKNOWN_CHAR,
        }
    }

    /// The `type` label stored for this cell, if it is stored at all.
    pub fn kind(self) -> Option<SpaceKind> {
        match self {
            LayoutCell::Path => Some(SpaceKind::Path),
            LayoutCell::Shelf => Some(SpaceKind::Shelf),
            LayoutCell::Empty | LayoutCell::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    width: i32,
    height: i32,
    rows: Vec<Vec<LayoutCell>>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut rows: Vec<Vec<LayoutCell>> = Vec::new();
        let mut expected: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let row: Vec<LayoutCell> = line.chars().map(LayoutCell::from_char).collect();
            match expected {
                None => expected = Some(row.len()),
                Some(width) if width != row.len() => {
                    return Err(LayoutError::RaggedRow {
                        line: idx + 1,
                        expected: width,
                        found: row.len(),
                    })
                }
                Some(_) => {}
            }
            rows.push(row);
        }

        let width = expected.ok_or(LayoutError::Empty)?;
        Ok(Self {
            width: to_coord(width)?,
            height: to_coord(rows.len())?,
            rows,
        })
    }

    /// Rebuilds a layout from stored rows. Rows outside the rectangle are
    /// dropped; cells without a row render as empty.
    pub fn from_spaces(
        width: i32,
        height: i32,
        spaces: &[space::Model],
    ) -> Result<Self, LayoutError> {
        if !warehouse::fits_grid(width, height) {
            return Err(LayoutError::ExtentTooLarge {
                width,
                height,
                limit: MAX_GRID_CELLS,
            });
        }

        let w = width.max(0) as usize;
        let h = height.max(0) as usize;
        let mut rows = vec![vec![LayoutCell::Empty; w]; h];

        for space in spaces {
            if space.x_pos < 0 || space.y_pos < 0 || space.x_pos >= width || space.y_pos >= height
            {
                continue;
            }
            let cell = match space.space_kind() {
                Some(SpaceKind::Path) => LayoutCell::Path,
                Some(SpaceKind::Shelf) => LayoutCell::Shelf,
                None => LayoutCell::Other,
            };
            rows[space.y_pos as usize][space.x_pos as usize] = cell;
        }

        Ok(Self {
            width,
            height,
            rows,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<LayoutCell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Iterates `(x, y, cell)` row by row.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, LayoutCell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, cell)| (x as i32, y as i32, *cell))
        })
    }

    pub fn count(&self, kind: SpaceKind) -> usize {
        self.cells()
            .filter(|(_, _, cell)| cell.kind() == Some(kind))
            .count()
    }
}

fn to_coord(n: usize) -> Result<i32, LayoutError> {
    i32::try_from(n).map_err(|_| LayoutError::TooLarge(n))
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::parse(s)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let line: String = row.iter().map(|cell| cell.as_char()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
