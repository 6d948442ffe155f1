//! Mine probabilities from an enumerated solution set.
//!
//! Each frontier cell's probability is the share of recorded solutions that
//! mine it, i.e. a uniform prior over the recorded solutions. When the set was
//! truncated by the solution cap this is only an approximation: search tries
//! safe before mine, so the recorded solutions lean toward whatever the first
//! branched cells look like when they are safe. The bias is left uncorrected.

use crate::{BoardView, Coordinate, SolutionSet};
use std::collections::BTreeMap;

/// Mine probability of every frontier cell. Empty when there are no solutions.
pub fn mine_probabilities(solutions: &SolutionSet) -> BTreeMap<Coordinate, f64> {
    let total = solutions.len();
    if total == 0 {
        return BTreeMap::new();
    }

    solutions
        .frontier()
        .iter()
        .zip(solutions.mine_counts())
        .map(|(&at, count)| (at, count as f64 / total as f64))
        .collect()
}

/// The frontier cell least likely to be a mine, with its probability.
///
/// Only cells the view still shows as unknown are candidates. Ties go to the
/// first cell in row-major order.
pub fn recommend_guess(
    solutions: &SolutionSet,
    view: &impl BoardView,
) -> Option<(Coordinate, f64)> {
    mine_probabilities(solutions)
        .into_iter()
        .filter(|&(at, _)| view.contains(at) && !view.is_revealed(at) && !view.is_flagged(at))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
