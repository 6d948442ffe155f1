use crate::estimate::recommend_guess;
use crate::{
    BoardView, Constraint, Coordinate, Deductions, Propagation, build_constraints, enumerate,
    propagate,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

pub const DEFAULT_MAX_SOLUTIONS: NonZeroUsize = NonZeroUsize::new(50_000).unwrap();

/// Tuning for one [`infer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Enumeration stops after this many solutions.
    pub max_solutions: NonZeroUsize,
    /// Try the cheap propagator before exhaustive search.
    pub propagate_first: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            max_solutions: DEFAULT_MAX_SOLUTIONS,
            propagate_first: true,
        }
    }
}

impl InferenceConfig {
    pub fn with_max_solutions(self, max_solutions: NonZeroUsize) -> Self {
        InferenceConfig {
            max_solutions,
            ..self
        }
    }

    pub fn with_propagation(self, propagate_first: bool) -> Self {
        InferenceConfig {
            propagate_first,
            ..self
        }
    }
}

/// Which stage produced an [`InferenceResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    /// Nothing revealed carries information.
    NoConstraints,
    /// The constraints contradict each other, most likely through a wrong flag.
    Inconsistent,
    /// Forced cells found by the propagator.
    Propagation,
    /// Forced cells found by complete enumeration.
    Exhaustive,
    /// No forced cells; `guess` (if any) comes from solution counts, which are
    /// approximate when `truncated`.
    Estimate { truncated: bool },
}

/// Cells proven safe or mined, or failing that a single recommended guess.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub safe: BTreeSet<Coordinate>,
    pub mines: BTreeSet<Coordinate>,
    /// Only set when `safe` and `mines` are both empty.
    pub guess: Option<(Coordinate, f64)>,
    pub basis: Basis,
}

impl InferenceResult {
    fn empty(basis: Basis) -> Self {
        InferenceResult {
            safe: BTreeSet::new(),
            mines: BTreeSet::new(),
            guess: None,
            basis,
        }
    }

    fn forced(deductions: Deductions, basis: Basis) -> Self {
        InferenceResult {
            safe: deductions.safe,
            mines: deductions.mines,
            guess: None,
            basis,
        }
    }

    pub fn has_forced_moves(&self) -> bool {
        !self.safe.is_empty() || !self.mines.is_empty()
    }
}

/// Classifies the unknown cells of `view`.
///
/// The propagator runs first (unless disabled); its deductions are only
/// reported once a single consistent assignment is known to exist. If it
/// proves nothing, the frontier is enumerated. Forced cells from enumeration are only reported when
/// the solution cap was not reached. Otherwise the least likely mine among the
/// still-unknown frontier cells is recommended.
pub fn infer(view: &impl BoardView, config: &InferenceConfig) -> InferenceResult {
    let constraints = build_constraints(view);
    infer_from_constraints(&constraints, view, config)
}

/// Same as [`infer`] with constraints that were already built.
/// `view` is only used to filter guess candidates.
pub fn infer_from_constraints(
    constraints: &[Constraint],
    view: &impl BoardView,
    config: &InferenceConfig,
) -> InferenceResult {
    if constraints.is_empty() {
        debug!("no informative clues");
        return InferenceResult::empty(Basis::NoConstraints);
    }
    debug!("inferring over {} constraints", constraints.len());

    if config.propagate_first {
        match propagate(constraints, Deductions::default()) {
            Propagation::Contradiction => {
                warn!("inconsistent board: propagation found a violated clue");
                return InferenceResult::empty(Basis::Inconsistent);
            }
            Propagation::Consistent(deductions) if !deductions.is_empty() => {
                // No single clue is broken, but the clues together may still be.
                if enumerate(constraints, NonZeroUsize::MIN).is_empty() {
                    warn!("inconsistent board: no assignment satisfies every clue");
                    return InferenceResult::empty(Basis::Inconsistent);
                }
                return InferenceResult::forced(deductions, Basis::Propagation);
            }
            Propagation::Consistent(_) => {}
        }
    }

    let solutions = enumerate(constraints, config.max_solutions);
    if solutions.is_empty() {
        warn!("inconsistent board: no assignment satisfies every clue");
        return InferenceResult::empty(Basis::Inconsistent);
    }

    let truncated = solutions.is_truncated();
    if truncated {
        warn!(
            "solution cap of {} reached; falling back to approximate probabilities",
            config.max_solutions
        );
    } else {
        let forced = solutions.forced();
        if !forced.is_empty() {
            return InferenceResult::forced(forced, Basis::Exhaustive);
        }
    }

    let guess = recommend_guess(&solutions, view);
    if let Some((at, probability)) = guess {
        debug!("best guess {at} with mine probability {probability:.3}");
    }
    InferenceResult {
        safe: BTreeSet::new(),
        mines: BTreeSet::new(),
        guess,
        basis: Basis::Estimate { truncated },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Snapshot;

    fn c(row: usize, col: usize) -> Coordinate {
        Coordinate::new(row, col)
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_nothing_revealed() {
        // A fresh board has no constraints and so no advice
        let view: Snapshot = "???\n???".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result, InferenceResult::empty(Basis::NoConstraints));
    }

    #[test]
    fn test_all_zero_clues() {
        // Zeros are uninformative
        let view: Snapshot = "00\n00".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());
        assert_eq!(result.basis, Basis::NoConstraints);
        assert!(result.guess.is_none());
    }

    #[test]
    fn test_corner_mine_on_two_by_two() {
        // (0,0) shows '1' and its other neighbours are revealed, so (0,1) is the mine
        let view: Snapshot = "1?\n11".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result.mines, BTreeSet::from([c(0, 1)]));
        assert!(result.safe.is_empty());
        assert!(result.guess.is_none());

        // The exhaustive path agrees when the propagator is skipped
        let exhaustive = infer(&view, &InferenceConfig::default().with_propagation(false));
        assert_eq!(exhaustive.mines, BTreeSet::from([c(0, 1)]));
        assert_eq!(exhaustive.basis, Basis::Exhaustive);
    }

    #[test]
    fn test_propagator_handles_easy_boards() {
        let view: Snapshot = "111\n1?1\n111".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result.basis, Basis::Propagation);
        assert_eq!(result.mines, BTreeSet::from([c(1, 1)]));
    }

    #[test]
    fn test_search_finds_what_propagation_misses() {
        // 1-2-1 along the top edge of a 2x3 board: the outer cells are mines
        // and the middle one is safe, which needs constraints combined
        let view: Snapshot = "121\n???".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result.basis, Basis::Exhaustive);
        assert_eq!(result.mines, BTreeSet::from([c(1, 0), c(1, 2)]));
        assert_eq!(result.safe, BTreeSet::from([c(1, 1)]));
        assert!(result.guess.is_none());
    }

    #[test]
    fn test_contradictory_constraints() {
        // {(0,0)}=1 and {(0,0),(0,1)}=0 cannot both hold
        let constraints = vec![
            Constraint::new([c(0, 0)], 1),
            Constraint::new([c(0, 0), c(0, 1)], 0),
        ];
        let view: Snapshot = "??\n??".parse().unwrap();

        for propagate_first in [true, false] {
            let config = InferenceConfig::default().with_propagation(propagate_first);
            let result = infer_from_constraints(&constraints, &view, &config);
            assert_eq!(result, InferenceResult::empty(Basis::Inconsistent));
        }
    }

    #[test]
    fn test_odd_cycle_is_inconsistent_with_propagation() {
        // Each clue alone is fine and (0,0) looks like a mine, but "exactly one
        // of each pair" around a triangle has no solution
        let constraints = vec![
            Constraint::new([c(0, 0)], 1),
            Constraint::new([c(2, 0), c(2, 1)], 1),
            Constraint::new([c(2, 1), c(2, 2)], 1),
            Constraint::new([c(2, 0), c(2, 2)], 1),
        ];
        let view: Snapshot = "???\n???\n???".parse().unwrap();

        for propagate_first in [true, false] {
            let config = InferenceConfig::default().with_propagation(propagate_first);
            let result = infer_from_constraints(&constraints, &view, &config);
            assert_eq!(result, InferenceResult::empty(Basis::Inconsistent));
        }
    }

    #[test]
    fn test_over_flagged_board_is_inconsistent() {
        // The '1' already has two flagged neighbours
        let view: Snapshot = "1F\nF?".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result.basis, Basis::Inconsistent);
        assert!(!result.has_forced_moves());
        assert!(result.guess.is_none());
    }

    #[test]
    fn test_ambiguous_board_guesses() {
        // A lone '1' in a corner: three unknown neighbours with one mine among them
        let view: Snapshot = "1?\n??".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());

        assert_eq!(result.basis, Basis::Estimate { truncated: false });
        assert!(!result.has_forced_moves());
        let (at, probability) = result.guess.unwrap();
        assert_eq!(at, c(0, 1));
        assert!((probability - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_truncation_suppresses_forced_cells() {
        // With a cap of 1 the only recorded solution would "force" every cell;
        // those claims must not be reported
        let view: Snapshot = "1?\n??".parse().unwrap();
        let config = InferenceConfig::default().with_max_solutions(cap(1));
        let result = infer(&view, &config);

        assert_eq!(result.basis, Basis::Estimate { truncated: true });
        assert!(!result.has_forced_moves());
        let (_, probability) = result.guess.unwrap();
        assert_eq!(probability, 0.0);
    }

    #[test]
    fn test_forced_moves_exclude_guess() {
        let view: Snapshot = "1?\n11".parse().unwrap();
        let result = infer(&view, &InferenceConfig::default());
        assert!(result.has_forced_moves());
        assert!(result.guess.is_none());
        assert!(result.safe.is_disjoint(&result.mines));
    }

    #[test]
    fn test_config_builders() {
        let config = InferenceConfig::default()
            .with_max_solutions(cap(10))
            .with_propagation(false);
        assert_eq!(config.max_solutions.get(), 10);
        assert!(!config.propagate_first);
        assert_eq!(InferenceConfig::default().max_solutions, DEFAULT_MAX_SOLUTIONS);
    }
}
