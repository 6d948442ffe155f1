//! Constraint-based inference for Minesweeper boards.
//!
//! Revealed clues are turned into sum constraints over the unknown cells next
//! to them. A cheap fixed-point propagator looks for certain moves first; when
//! it finds none, an exhaustive backtracking search enumerates every
//! consistent assignment of the frontier (up to a cap) and either proves
//! cells safe/mined or recommends the cell least likely to hold a mine.
//!
//! The inference entry point is [`infer`], which only reads a [`BoardView`].
//! [`Board`] is a complete game store implementing that view.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod board;
pub mod constraint;
pub mod estimate;
pub mod infer;
pub mod propagate;
pub mod sat;
pub mod search;
pub mod view;

pub use board::{Board, GameState};
pub use constraint::{Constraint, build_constraints, frontier};
pub use infer::{Basis, InferenceConfig, InferenceResult, infer, infer_from_constraints};
pub use propagate::{Deductions, Propagation, propagate};
pub use search::{SolutionSet, enumerate};
pub use view::{BoardView, Snapshot};

/// A cell position on the board. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub const fn new(row: usize, col: usize) -> Self {
        Coordinate { row, col }
    }

    /// All in-bounds neighbours of this coordinate on a `width` x `height` board.
    /// Board edges and corners yield fewer than eight cells.
    pub fn neighbors(self, width: usize, height: usize) -> impl Iterator<Item = Coordinate> {
        (-1..=1isize).flat_map(move |dr| {
            (-1..=1isize).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let nr = self.row as isize + dr;
                let nc = self.col as isize + dc;

                if nr >= 0 && nr < height as isize && nc >= 0 && nc < width as isize {
                    Some(Coordinate::new(nr as usize, nc as usize))
                } else {
                    None
                }
            })
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The state of a cell as seen by the player (and so by the inference core).
/// Whether an unknown cell actually holds a mine is never visible here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Unknown,
    Flagged,
    Revealed(u8), // Number of adjacent mines.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_counts() {
        // Corners, edges and interior cells have 3, 5 and 8 neighbours
        let corner: Vec<Coordinate> = Coordinate::new(0, 0).neighbors(3, 3).collect();
        assert_eq!(corner.len(), 3);

        let edge: Vec<Coordinate> = Coordinate::new(0, 1).neighbors(3, 3).collect();
        assert_eq!(edge.len(), 5);

        let center: Vec<Coordinate> = Coordinate::new(1, 1).neighbors(3, 3).collect();
        assert_eq!(center.len(), 8);
        assert!(!center.contains(&Coordinate::new(1, 1)));
    }

    #[test]
    fn test_neighbors_on_non_square_board() {
        // A 1-row board only has horizontal neighbours
        let neighbors: Vec<Coordinate> = Coordinate::new(0, 2).neighbors(4, 1).collect();
        assert_eq!(neighbors, vec![Coordinate::new(0, 1), Coordinate::new(0, 3)]);
    }

    #[test]
    fn test_row_major_ordering() {
        // Row dominates column when comparing coordinates
        assert!(Coordinate::new(0, 5) < Coordinate::new(1, 0));
        assert!(Coordinate::new(2, 1) < Coordinate::new(2, 3));
    }
}
