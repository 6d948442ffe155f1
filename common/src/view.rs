use crate::{CellState, Coordinate};
use std::str::FromStr;

/// Read-only access to the visible state of a board.
///
/// This is everything the inference core is allowed to know. Implementors only
/// need to supply the dimensions and per-cell state; the rest has defaults.
pub trait BoardView {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// The visible state of `at`. Callers must keep `at` within bounds.
    fn cell_state(&self, at: Coordinate) -> CellState;

    fn is_revealed(&self, at: Coordinate) -> bool {
        matches!(self.cell_state(at), CellState::Revealed(_))
    }

    fn is_flagged(&self, at: Coordinate) -> bool {
        self.cell_state(at) == CellState::Flagged
    }

    /// The clue of a revealed cell, `None` otherwise.
    fn clue(&self, at: Coordinate) -> Option<u8> {
        match self.cell_state(at) {
            CellState::Revealed(n) => Some(n),
            _ => None,
        }
    }

    fn contains(&self, at: Coordinate) -> bool {
        at.row < self.height() && at.col < self.width()
    }

    fn neighbors(&self, at: Coordinate) -> impl Iterator<Item = Coordinate> {
        at.neighbors(self.width(), self.height())
    }

    /// Every coordinate on the board in row-major order.
    fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        let width = self.width();
        (0..self.height()).flat_map(move |row| (0..width).map(move |col| Coordinate::new(row, col)))
    }
}

/// A board view built directly from visible cell states.
///
/// Parses from text with one row per line: `?` unknown, `F` flagged and
/// `0`-`8` for revealed clues. Whitespace inside a row is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl Snapshot {
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            anyhow::bail!("empty_board");
        }
        if let Some(row) = rows.iter().position(|r| r.len() != width) {
            anyhow::bail!("row {row} has {} cells, expected {width}", rows[row].len());
        }

        Ok(Snapshot {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Copies the visible state of any other view.
    pub fn capture(view: &impl BoardView) -> Self {
        Snapshot {
            width: view.width(),
            height: view.height(),
            cells: view.coordinates().map(|at| view.cell_state(at)).collect(),
        }
    }
}

impl FromStr for Snapshot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .filter(|ch| !ch.is_whitespace())
                    .map(|ch| match ch {
                        '?' => Ok(CellState::Unknown),
                        'F' | 'f' => Ok(CellState::Flagged),
                        '0'..='8' => Ok(CellState::Revealed(ch as u8 - b'0')),
                        other => Err(anyhow::anyhow!("unexpected cell symbol {other:?}")),
                    })
                    .collect::<anyhow::Result<Vec<CellState>>>()
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Snapshot::from_rows(rows)
    }
}

impl BoardView for Snapshot {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn cell_state(&self, at: Coordinate) -> CellState {
        self.cells[at.row * self.width + at.col]
    }
}
