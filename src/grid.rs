//! Bounded rectangular grid of cells.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Offsets of the Moore neighborhood (radius 1).
const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Contents of a single cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    AgentA,
    AgentB,
}

impl CellState {
    pub fn is_empty(self) -> bool {
        self == CellState::Empty
    }
}

/// Location of a cell, with `x` in `[0, x_size)` and `y` in `[0, y_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position ({x}, {y}) is outside of the {x_size}x{y_size} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        x_size: usize,
        y_size: usize,
    },
}

/// Fixed-size 2D array of cell states.
///
/// Cells are stored row by row (`y` major), so that a row of the grid is a
/// contiguous slice. The dimensions never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    x_size: usize,
    y_size: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Create a grid of `x_size * y_size` empty cells.
    pub fn new(x_size: usize, y_size: usize) -> Self {
        Self {
            x_size,
            y_size,
            cells: vec![CellState::Empty; x_size * y_size],
        }
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Position of the cell stored at linear index `idx`.
    pub fn position_of(&self, idx: usize) -> Position {
        Position::new(idx % self.x_size, idx / self.x_size)
    }

    fn index_of(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if x >= self.x_size || y >= self.y_size {
            return Err(GridError::OutOfBounds {
                x,
                y,
                x_size: self.x_size,
                y_size: self.y_size,
            });
        }
        Ok(y * self.x_size + x)
    }

    /// Get the contents of the cell at `(x, y)`.
    pub fn occupant_at(&self, x: usize, y: usize) -> Result<CellState, GridError> {
        let idx = self.index_of(x, y)?;
        Ok(self.cells[idx])
    }

    /// Overwrite the cell at `(x, y)`.
    ///
    /// Only bounds are checked; keeping agents unique is up to the caller.
    pub fn set_occupant(&mut self, x: usize, y: usize, state: CellState) -> Result<(), GridError> {
        let idx = self.index_of(x, y)?;
        self.cells[idx] = state;
        Ok(())
    }

    /// Get the in-bounds Moore neighbors of `(x, y)` together with their contents.
    ///
    /// Interior cells have 8 neighbors, edge cells 5 and corner cells 3.
    pub fn neighbors_of(&self, x: usize, y: usize) -> Result<Vec<(Position, CellState)>, GridError> {
        self.index_of(x, y)?;

        let mut neighbors = Vec::with_capacity(MOORE_OFFSETS.len());
        for (dx, dy) in MOORE_OFFSETS {
            let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };
            if nx >= self.x_size || ny >= self.y_size {
                continue;
            }
            neighbors.push((Position::new(nx, ny), self.cells[ny * self.x_size + nx]));
        }
        Ok(neighbors)
    }

    /// Get all empty positions, in storage order.
    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions_where(|state| state.is_empty())
    }

    /// Get all occupied positions, in storage order.
    pub fn occupied_positions(&self) -> Vec<Position> {
        self.positions_where(|state| !state.is_empty())
    }

    /// Count the cells holding `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }

    /// Take a read-only copy of the current cell contents.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            x_size: self.x_size,
            y_size: self.y_size,
            cells: self.cells.clone(),
        }
    }

    fn positions_where<F>(&self, pred: F) -> Vec<Position>
    where
        F: Fn(CellState) -> bool,
    {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &state)| pred(state))
            .map(|(idx, _)| self.position_of(idx))
            .collect()
    }
}

/// Copy of the grid contents at some point of a simulation.
///
/// This is what renderers consume; it cannot be used to mutate the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub x_size: usize,
    pub y_size: usize,
    cells: Vec<CellState>,
}

impl GridSnapshot {
    /// Get the cell at `(x, y)`, or `None` if it lies outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<CellState> {
        if x >= self.x_size || y >= self.y_size {
            return None;
        }
        Some(self.cells[y * self.x_size + x])
    }

    /// Iterate over every cell together with its position.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.cells.iter().enumerate().map(|(idx, &state)| {
            (Position::new(idx % self.x_size, idx / self.x_size), state)
        })
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.n_cells(), 12);
        assert_eq!(grid.empty_positions().len(), 12);
        assert!(grid.occupied_positions().is_empty());
        assert_eq!(grid.occupant_at(3, 2), Ok(CellState::Empty));
    }

    #[test]
    fn out_of_bounds_queries_fail() {
        let mut grid = Grid::new(4, 3);
        let err = GridError::OutOfBounds {
            x: 4,
            y: 0,
            x_size: 4,
            y_size: 3,
        };
        assert_eq!(grid.occupant_at(4, 0), Err(err.clone()));
        assert_eq!(grid.set_occupant(4, 0, CellState::AgentA), Err(err.clone()));
        assert_eq!(grid.neighbors_of(4, 0), Err(err));
        assert!(grid.occupant_at(0, 3).is_err());
    }

    #[test]
    fn set_occupant_updates_position_lists() {
        let mut grid = Grid::new(3, 3);
        grid.set_occupant(1, 2, CellState::AgentA).unwrap();
        grid.set_occupant(2, 0, CellState::AgentB).unwrap();

        assert_eq!(grid.occupant_at(1, 2), Ok(CellState::AgentA));
        assert_eq!(
            grid.occupied_positions(),
            vec![Position::new(2, 0), Position::new(1, 2)]
        );
        assert_eq!(grid.empty_positions().len(), 7);
        assert_eq!(grid.count(CellState::AgentA), 1);
        assert_eq!(grid.count(CellState::AgentB), 1);

        grid.set_occupant(1, 2, CellState::Empty).unwrap();
        assert_eq!(grid.occupied_positions(), vec![Position::new(2, 0)]);
    }

    #[test]
    fn neighbor_counts_depend_on_location() {
        let grid = Grid::new(5, 4);
        assert_eq!(grid.neighbors_of(0, 0).unwrap().len(), 3);
        assert_eq!(grid.neighbors_of(4, 3).unwrap().len(), 3);
        assert_eq!(grid.neighbors_of(2, 0).unwrap().len(), 5);
        assert_eq!(grid.neighbors_of(0, 2).unwrap().len(), 5);
        assert_eq!(grid.neighbors_of(2, 2).unwrap().len(), 8);
    }

    #[test]
    fn neighbors_exclude_center_and_report_contents() {
        let mut grid = Grid::new(3, 3);
        grid.set_occupant(0, 0, CellState::AgentB).unwrap();
        grid.set_occupant(1, 1, CellState::AgentA).unwrap();

        let neighbors = grid.neighbors_of(1, 1).unwrap();
        let positions: HashSet<_> = neighbors.iter().map(|&(pos, _)| pos).collect();
        assert_eq!(positions.len(), 8);
        assert!(!positions.contains(&Position::new(1, 1)));

        let occupied: Vec<_> = neighbors
            .iter()
            .filter(|(_, state)| !state.is_empty())
            .collect();
        assert_eq!(occupied, vec![&(Position::new(0, 0), CellState::AgentB)]);
    }

    #[test]
    fn single_row_grid_has_side_neighbors_only() {
        let grid = Grid::new(2, 1);
        let neighbors = grid.neighbors_of(0, 0).unwrap();
        assert_eq!(neighbors, vec![(Position::new(1, 0), CellState::Empty)]);
    }

    #[test]
    fn snapshot_reflects_grid_at_call_time() {
        let mut grid = Grid::new(3, 2);
        grid.set_occupant(2, 1, CellState::AgentB).unwrap();
        let snapshot = grid.snapshot();
        grid.set_occupant(2, 1, CellState::Empty).unwrap();

        assert_eq!(snapshot.get(2, 1), Some(CellState::AgentB));
        assert_eq!(snapshot.get(3, 1), None);
        assert_eq!(snapshot.count(CellState::AgentB), 1);

        assert_eq!(snapshot.get(0, 1), Some(CellState::Empty));

        let occupied: Vec<_> = snapshot.iter().filter(|(_, s)| !s.is_empty()).collect();
        assert_eq!(occupied, vec![(Position::new(2, 1), CellState::AgentB)]);
    }
}
