use clap::Parser;
use log::{info, warn};
use mine_inference::sat::certify;
use mine_inference::*;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

/// Plays Minesweeper on its own: proven moves first, lowest-risk guesses otherwise.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value_t = 8)]
    width: usize,

    #[arg(long, default_value_t = 8)]
    height: usize,

    #[arg(long, default_value_t = 10)]
    mines: usize,

    /// Seed for mine placement and fallback guesses. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Row of the first click, which is never a mine.
    #[arg(long, default_value_t = 0)]
    start_row: usize,

    #[arg(long, default_value_t = 0)]
    start_col: usize,

    /// Stop enumerating after this many solutions.
    #[arg(long, default_value_t = infer::DEFAULT_MAX_SOLUTIONS)]
    max_solutions: NonZeroUsize,

    /// Skip the propagator and always run the exhaustive search.
    #[arg(long)]
    no_propagation: bool,

    /// Check every proven move against the SAT solver.
    #[arg(long)]
    cross_check: bool,

    /// Pause between moves, to make the game watchable.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[derive(Debug, Default)]
struct Stats {
    steps: usize,
    forced_moves: usize,
    guesses: usize,
}

impl Stats {
    fn summary(&self, board: &Board) -> String {
        format!(
            "steps={}, forced_moves={}, guesses={}, flags={}",
            self.steps,
            self.forced_moves,
            self.guesses,
            board.flag_count()
        )
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // --- 1. Initialization ---
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Coordinate::new(args.start_row, args.start_col);
    let mut board = Board::random(args.width, args.height, args.mines, start, &mut rng)?;
    let config = InferenceConfig::default()
        .with_max_solutions(args.max_solutions)
        .with_propagation(!args.no_propagation);

    println!("--- Autonomous Minesweeper Bot ---");
    println!(
        "{}x{} board, {} mines, seed {seed}",
        args.width, args.height, args.mines
    );

    if !board.reveal(start)? {
        println!("{board}");
        println!("BOOM - hit a mine on the first click (should not happen).");
        return Ok(());
    }

    // --- 2. Game Loop ---
    let mut stats = Stats::default();
    loop {
        stats.steps += 1;
        println!("\n--- Move #{} ---", stats.steps);
        println!("{board}");

        match board.game_state {
            GameState::Won => {
                println!("Solved! {}", stats.summary(&board));
                return Ok(());
            }
            GameState::Lost => {
                println!("Game over. {}", stats.summary(&board));
                return Ok(());
            }
            GameState::Playing => {}
        }

        // --- 3. Bot's Decision Logic ---
        let result = infer(&board, &config);
        info!(
            "{:?}: {} safe, {} mines",
            result.basis,
            result.safe.len(),
            result.mines.len()
        );
        if args.cross_check && result.has_forced_moves() {
            cross_check(&board, &result)?;
        }

        for &at in &result.mines {
            board.flag(at)?;
        }

        if !result.safe.is_empty() {
            println!("Logic found {} guaranteed safe cells.", result.safe.len());
            stats.forced_moves += result.safe.len();
            for &at in &result.safe {
                if board.game_state != GameState::Playing {
                    break;
                }
                if !board.reveal(at)? {
                    println!("{board}");
                    println!("BOOM - inferred safe but hit a mine at {at} (should not happen).");
                    return Ok(());
                }
            }
            continue;
        }
        if !result.mines.is_empty() {
            // Flags alone change the clues; infer again before guessing.
            stats.forced_moves += result.mines.len();
            continue;
        }

        // --- 4. No proven move, so guess ---
        let unknown: Vec<Coordinate> = board
            .coordinates()
            .filter(|&at| !board.is_revealed(at) && !board.is_flagged(at))
            .collect();
        if unknown.is_empty() {
            println!("No moves left. {}", stats.summary(&board));
            return Ok(());
        }

        let (at, probability) = match result.guess {
            Some((at, probability)) if unknown.contains(&at) => (at, Some(probability)),
            _ => {
                let at = unknown
                    .choose(&mut rng)
                    .copied()
                    .ok_or(anyhow::anyhow!("no_unknown_cells"))?;
                (at, None)
            }
        };
        stats.guesses += 1;
        match probability {
            Some(p) => println!("Guessing {at} with mine probability {p:.3}."),
            None => println!("Guessing {at} at random."),
        }

        if !board.reveal(at)? {
            println!("{board}");
            println!("BOOM - guessed {at}. Game over. {}", stats.summary(&board));
            return Ok(());
        }

        if args.delay_ms > 0 {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }
}

/// Compares the proven moves with the SAT classification of the same board.
fn cross_check(board: &Board, result: &InferenceResult) -> anyhow::Result<()> {
    let constraints = build_constraints(board);
    let Some(certificate) = certify(&constraints)? else {
        warn!("SAT solver finds the board inconsistent");
        return Ok(());
    };

    let proven = certificate.forced();
    if !result.safe.is_subset(&proven.safe) || !result.mines.is_subset(&proven.mines) {
        warn!(
            "inference disagrees with SAT: safe {:?} vs {:?}, mines {:?} vs {:?}",
            result.safe, proven.safe, result.mines, proven.mines
        );
    }
    Ok(())
}
