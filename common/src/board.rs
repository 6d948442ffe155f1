use crate::{BoardView, CellState, Coordinate};
use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

/// How a square is shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Cover {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct Square {
    mine: bool,
    adjacent: u8, // Number of adjacent mines.
    cover: Cover,
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// A full game: mine layout plus what the player has uncovered and flagged.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    squares: Vec<Vec<Square>>,
    pub total_mines: usize,
    pub game_state: GameState,
}

impl Board {
    /// Creates a board with mines at exactly the given coordinates.
    pub fn with_mines(
        width: usize,
        height: usize,
        mines: impl IntoIterator<Item = Coordinate>,
    ) -> anyhow::Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("board dimensions must be positive");
        }
        let mines: BTreeSet<Coordinate> = mines.into_iter().collect();
        if let Some(outside) = mines.iter().find(|at| at.row >= height || at.col >= width) {
            anyhow::bail!("mine {outside} is outside the {width}x{height} board");
        }
        if mines.len() >= width * height {
            anyhow::bail!("Total mines must be less than the number of cells on the board.");
        }

        let mut squares = vec![
            vec![
                Square {
                    mine: false,
                    adjacent: 0,
                    cover: Cover::Hidden,
                };
                width
            ];
            height
        ];
        for &at in &mines {
            squares[at.row][at.col].mine = true;
            for neighbor in at.neighbors(width, height) {
                squares[neighbor.row][neighbor.col].adjacent += 1;
            }
        }

        Ok(Board {
            width,
            height,
            squares,
            total_mines: mines.len(),
            game_state: GameState::Playing,
        })
    }

    /// Places `total_mines` mines uniformly at random, never on `start`,
    /// so the first click is always safe.
    pub fn random(
        width: usize,
        height: usize,
        total_mines: usize,
        start: Coordinate,
        rng: &mut impl Rng,
    ) -> anyhow::Result<Self> {
        if start.row >= height || start.col >= width {
            anyhow::bail!("start {start} is outside the {width}x{height} board");
        }
        let candidates: Vec<Coordinate> = (0..height)
            .flat_map(|row| (0..width).map(move |col| Coordinate::new(row, col)))
            .filter(|&at| at != start)
            .collect();
        if total_mines > candidates.len() {
            anyhow::bail!("Total mines must be less than the number of cells on the board.");
        }

        let mines: Vec<Coordinate> = candidates
            .choose_multiple(rng, total_mines)
            .copied()
            .collect();
        Board::with_mines(width, height, mines)
    }

    /// Deserializes a game state from bytes, rejecting states whose grid does
    /// not match the stored dimensions or mine count.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        let board: Board = bcs::from_bytes(bts)?;
        board.check_shape()?;
        Ok(board)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Reveals a cell. Returns `false` if it held a mine, which ends the game.
    ///
    /// Flagged and already revealed cells are left alone. Revealing a cell with
    /// no adjacent mines opens its neighbours, cascading through zeros.
    pub fn reveal(&mut self, at: Coordinate) -> anyhow::Result<bool> {
        self.check_bounds(at)?;
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        let square = self.squares[at.row][at.col];
        if square.cover != Cover::Hidden {
            return Ok(true);
        }
        if square.mine {
            self.squares[at.row][at.col].cover = Cover::Revealed;
            self.game_state = GameState::Lost;
            return Ok(false);
        }

        let opened = self.flood_fill_reveal(at);
        debug!("revealing {at} opened {opened} cells");

        if self.is_solved() {
            self.game_state = GameState::Won;
        }
        Ok(true)
    }

    /// Flags a hidden cell. Revealed cells cannot be flagged.
    pub fn flag(&mut self, at: Coordinate) -> anyhow::Result<()> {
        self.check_bounds(at)?;
        let square = &mut self.squares[at.row][at.col];
        if square.cover == Cover::Hidden {
            square.cover = Cover::Flagged;
        }
        Ok(())
    }

    pub fn unflag(&mut self, at: Coordinate) -> anyhow::Result<()> {
        self.check_bounds(at)?;
        let square = &mut self.squares[at.row][at.col];
        if square.cover == Cover::Flagged {
            square.cover = Cover::Hidden;
        }
        Ok(())
    }

    /// Solved once every non-mine cell is revealed.
    pub fn is_solved(&self) -> bool {
        let revealed = self
            .squares
            .iter()
            .flatten()
            .filter(|sq| sq.cover == Cover::Revealed && !sq.mine)
            .count();
        revealed == self.width * self.height - self.total_mines
    }

    pub fn is_mine(&self, at: Coordinate) -> bool {
        self.squares[at.row][at.col].mine
    }

    pub fn flag_count(&self) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|sq| sq.cover == Cover::Flagged)
            .count()
    }

    fn check_bounds(&self, at: Coordinate) -> anyhow::Result<()> {
        if at.row >= self.height || at.col >= self.width {
            anyhow::bail!("{at} is outside the {}x{} board", self.width, self.height);
        }
        Ok(())
    }

    fn check_shape(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("board dimensions must be positive");
        }
        if self.squares.len() != self.height
            || self.squares.iter().any(|row| row.len() != self.width)
        {
            anyhow::bail!("grid does not match the {}x{} board", self.width, self.height);
        }
        let mines = self.squares.iter().flatten().filter(|sq| sq.mine).count();
        if mines != self.total_mines || mines >= self.width * self.height {
            anyhow::bail!("board holds {mines} mines but records {}", self.total_mines);
        }
        Ok(())
    }

    /// Opens `start` and, through every zero it reaches, the surrounding cells.
    /// Uses a worklist so large empty areas cannot overflow the stack.
    fn flood_fill_reveal(&mut self, start: Coordinate) -> usize {
        let mut opened = 0;
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);

        while let Some(at) = queue.pop_front() {
            let square = &mut self.squares[at.row][at.col];
            if square.cover != Cover::Hidden {
                continue;
            }
            square.cover = Cover::Revealed;
            opened += 1;

            // If it's a 0, none of its neighbours is a mine.
            if square.adjacent == 0 {
                for neighbor in at.neighbors(self.width, self.height) {
                    if self.squares[neighbor.row][neighbor.col].cover == Cover::Hidden
                        && visited.insert(neighbor)
                    {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        opened
    }
}

impl BoardView for Board {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    /// A mine revealed by losing is reported as flagged: it is a known mine, not a clue.
    fn cell_state(&self, at: Coordinate) -> CellState {
        let square = self.squares[at.row][at.col];
        match square.cover {
            Cover::Hidden => CellState::Unknown,
            Cover::Flagged => CellState::Flagged,
            Cover::Revealed if square.mine => CellState::Flagged,
            Cover::Revealed => CellState::Revealed(square.adjacent),
        }
    }
}

/// The player's view: `?` hidden, `F` flagged, digits for revealed cells.
/// Once the game is lost every mine is shown as `*`.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.width {
            write!(f, "{:^3}", col)?;
        }
        writeln!(f, "\n  +{}", "---".repeat(self.width))?;

        for (row, squares) in self.squares.iter().enumerate() {
            write!(f, "{:^2}|", row)?;
            for square in squares {
                let symbol = match square.cover {
                    _ if square.mine && self.game_state == GameState::Lost => "*".to_string(),
                    Cover::Flagged => "F".to_string(),
                    Cover::Hidden => "?".to_string(),
                    Cover::Revealed => square.adjacent.to_string(),
                };
                write!(f, "{:^3}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
