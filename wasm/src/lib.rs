use mine_inference as mi;
use mi::BoardView;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::num::NonZeroUsize;
use wasm_bindgen::prelude::*;

fn load(bts: &[u8]) -> Result<mi::Board, String> {
    mi::Board::deserialize(bts).map_err(|e| e.to_string())
}

fn save(board: &mi::Board) -> Result<Vec<u8>, String> {
    board.serialize().map_err(|e| e.to_string())
}

fn config(max_solutions: usize) -> mi::InferenceConfig {
    let config = mi::InferenceConfig::default();
    match NonZeroUsize::new(max_solutions) {
        Some(max) => config.with_max_solutions(max),
        None => config,
    }
}

/// Creates a game with seeded mine placement and makes the (always safe) first click.
#[wasm_bindgen]
pub fn create_game(
    width: usize,
    height: usize,
    mines: usize,
    seed: u64,
    start_row: usize,
    start_col: usize,
) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let start = mi::Coordinate::new(start_row, start_col);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board =
        mi::Board::random(width, height, mines, start, &mut rng).map_err(|e| e.to_string())?;
    board.reveal(start).map_err(|e| e.to_string())?;
    save(&board)
}

/// Reveals a cell. The returned state has one extra trailing byte: 0 if the cell was safe, 1 if it was a mine.
#[wasm_bindgen]
pub fn reveal(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut board = load(&bts)?;
    let safe = board
        .reveal(mi::Coordinate::new(row, col))
        .map_err(|e| e.to_string())?;
    let mut xs = save(&board)?;
    xs.push(if safe { 0 } else { 1 });
    Ok(xs)
}

#[wasm_bindgen]
pub fn flag(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut board = load(&bts)?;
    board
        .flag(mi::Coordinate::new(row, col))
        .map_err(|e| e.to_string())?;
    save(&board)
}

/// Whether every safe cell has been revealed.
#[wasm_bindgen]
pub fn validate(bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    Ok(load(&bts)?.is_solved())
}

/// Visible cells in row-major order: -1 hidden, -2 flagged, otherwise the clue.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = load(&bts)?;
    Ok(board
        .coordinates()
        .map(|at| match board.cell_state(at) {
            mi::CellState::Unknown => -1,
            mi::CellState::Flagged => -2,
            mi::CellState::Revealed(n) => n as i8,
        })
        .collect())
}

/// Inference advice per cell in row-major order:
/// -1 nothing known, 0 proven safe, 1 proven mine, 2 recommended guess.
#[wasm_bindgen]
pub fn classify(bts: Vec<u8>, max_solutions: usize) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = load(&bts)?;
    let result = mi::infer(&board, &config(max_solutions));
    Ok(board
        .coordinates()
        .map(|at| {
            if result.safe.contains(&at) {
                0
            } else if result.mines.contains(&at) {
                1
            } else if result.guess.is_some_and(|(guess, _)| guess == at) {
                2
            } else {
                -1
            }
        })
        .collect())
}

/// Mine probability of the recommended guess, if inference fell back to guessing.
#[wasm_bindgen]
pub fn guess_probability(bts: Vec<u8>, max_solutions: usize) -> Result<Option<f64>, String> {
    console_error_panic_hook::set_once();

    let board = load(&bts)?;
    let result = mi::infer(&board, &config(max_solutions));
    Ok(result.guess.map(|(_, probability)| probability))
}
