//! Exhaustive enumeration of frontier assignments.
//!
//! Depth-first backtracking over the frontier cells, each either safe (0) or a
//! mine (1). Cells touching the most constraints are branched on first and 0 is
//! tried before 1. Every constraint keeps a running count of assigned mines and
//! unassigned cells, so a branch is cut the moment some constraint has too
//! many mines or too few cells left to reach its sum.
//!
//! At most `max_solutions` assignments are kept. The search looks for one
//! more; if it exists the set is marked truncated: every recorded assignment
//! is still valid, but cells that agree across all of them are no longer
//! proven.

use crate::{Constraint, Coordinate, Deductions, frontier};
use itertools::Itertools;
use log::{debug, warn};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// The recorded solutions of one enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionSet {
    frontier: Vec<Coordinate>,
    /// One entry per solution; `true` marks a mine. Indexed like `frontier`.
    solutions: Vec<Vec<bool>>,
    truncated: bool,
}

impl SolutionSet {
    pub fn frontier(&self) -> &[Coordinate] {
        &self.frontier
    }

    pub fn solutions(&self) -> &[Vec<bool>] {
        &self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// No consistent assignment exists.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Enumeration hit the solution cap, so the set may be incomplete.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// How many recorded solutions put a mine on each frontier cell.
    pub fn mine_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.frontier.len()];
        for solution in &self.solutions {
            for (count, &mine) in counts.iter_mut().zip(solution) {
                *count += usize::from(mine);
            }
        }
        counts
    }

    /// Each solution as the set of cells it mines.
    pub fn mine_sets(&self) -> impl Iterator<Item = BTreeSet<Coordinate>> + '_ {
        self.solutions.iter().map(|solution| {
            self.frontier
                .iter()
                .zip(solution)
                .filter(|&(_, &mine)| mine)
                .map(|(&at, _)| at)
                .collect()
        })
    }

    /// Cells that take the same value in every recorded solution.
    ///
    /// This is only a proof when the set is not truncated; callers must check
    /// [`SolutionSet::is_truncated`] before treating the result as certain.
    pub fn forced(&self) -> Deductions {
        let mut forced = Deductions::default();
        let total = self.solutions.len();
        if total == 0 {
            return forced;
        }

        for (&at, count) in self.frontier.iter().zip(self.mine_counts()) {
            if count == 0 {
                forced.safe.insert(at);
            } else if count == total {
                forced.mines.insert(at);
            }
        }
        forced
    }
}

/// Enumerates every assignment of the frontier that satisfies all constraints,
/// stopping after `max_solutions`.
pub fn enumerate(constraints: &[Constraint], max_solutions: NonZeroUsize) -> SolutionSet {
    let cells = frontier(constraints);

    // Constraints referencing each frontier cell, by frontier index.
    let mut links: Vec<Vec<usize>> = vec![Vec::new(); cells.len()];
    for (index, constraint) in constraints.iter().enumerate() {
        for at in constraint.variables() {
            if let Ok(var) = cells.binary_search(at) {
                links[var].push(index);
            }
        }
    }

    if let Some(bad) = constraints.iter().find(|c| c.is_unsatisfiable()) {
        warn!(
            "constraint over {} cells cannot reach sum {}",
            bad.len(),
            bad.required_sum()
        );
        return SolutionSet {
            frontier: cells,
            solutions: Vec::new(),
            truncated: false,
        };
    }

    // Every domain has two values, so minimum-remaining-values ordering
    // comes down to its tie-break: highest degree first, then row-major.
    let order: Vec<usize> = (0..cells.len())
        .sorted_by_key(|&var| (Reverse(links[var].len()), var))
        .collect();

    let mut search = Search {
        links: &links,
        order,
        required: constraints.iter().map(Constraint::required_sum).collect(),
        assigned_sum: vec![0; constraints.len()],
        unassigned: constraints.iter().map(|c| c.len() as i32).collect(),
        values: vec![false; cells.len()],
        solutions: Vec::new(),
        // One past the cap tells a full set apart from a cut-off one.
        limit: max_solutions.get().saturating_add(1),
    };
    search.descend(0);

    let truncated = search.solutions.len() > max_solutions.get();
    search.solutions.truncate(max_solutions.get());
    debug!(
        "enumerated {} solutions over {} frontier cells{}",
        search.solutions.len(),
        cells.len(),
        if truncated { " (truncated)" } else { "" }
    );

    SolutionSet {
        frontier: cells,
        solutions: search.solutions,
        truncated,
    }
}

struct Search<'a> {
    links: &'a [Vec<usize>],
    order: Vec<usize>,
    required: Vec<i32>,
    /// Per constraint: mines among its assigned cells.
    assigned_sum: Vec<i32>,
    /// Per constraint: cells not yet assigned.
    unassigned: Vec<i32>,
    values: Vec<bool>,
    solutions: Vec<Vec<bool>>,
    limit: usize,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize) {
        if self.is_full() {
            return;
        }
        if depth == self.order.len() {
            self.solutions.push(self.values.clone());
            return;
        }

        let var = self.order[depth];
        for value in [false, true] {
            if self.assign(var, value) {
                self.descend(depth + 1);
            }
            self.unassign(var, value);

            if self.is_full() {
                return;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.solutions.len() >= self.limit
    }

    /// Assigns `var` and returns whether every touched constraint is still feasible.
    /// Counters are updated even on failure; `unassign` always undoes them.
    fn assign(&mut self, var: usize, value: bool) -> bool {
        let links = self.links;
        let delta = i32::from(value);
        let mut feasible = true;

        for &c in &links[var] {
            self.assigned_sum[c] += delta;
            self.unassigned[c] -= 1;
            feasible &= self.assigned_sum[c] <= self.required[c]
                && self.assigned_sum[c] + self.unassigned[c] >= self.required[c];
        }
        self.values[var] = value;
        feasible
    }

    fn unassign(&mut self, var: usize, value: bool) {
        let links = self.links;
        let delta = i32::from(value);

        for &c in &links[var] {
            self.assigned_sum[c] -= delta;
            self.unassigned[c] += 1;
        }
        self.values[var] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(row: usize, col: usize) -> Coordinate {
        Coordinate::new(row, col)
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_single_forced_mine() {
        // One cell, one mine: exactly one solution, and the cell is forced
        let constraints = vec![Constraint::new([c(0, 1)], 1)];
        let solutions = enumerate(&constraints, cap(100));

        assert_eq!(solutions.len(), 1);
        assert!(!solutions.is_truncated());
        let forced = solutions.forced();
        assert_eq!(forced.mines, BTreeSet::from([c(0, 1)]));
        assert!(forced.safe.is_empty());
    }

    #[test]
    fn test_contradiction_has_no_solutions() {
        // (0,0) must be a mine and must also be safe
        let constraints = vec![
            Constraint::new([c(0, 0)], 1),
            Constraint::new([c(0, 0), c(0, 1)], 0),
        ];
        let solutions = enumerate(&constraints, cap(100));

        assert!(solutions.is_empty());
        assert!(!solutions.is_truncated());
        assert!(solutions.forced().is_empty());
    }

    #[test]
    fn test_out_of_range_sum_has_no_solutions() {
        // Over-flagging shows up as a negative sum
        let constraints = vec![
            Constraint::new([c(0, 0), c(0, 1)], 1),
            Constraint::new([c(1, 1)], -1),
        ];
        let solutions = enumerate(&constraints, cap(100));
        assert!(solutions.is_empty());
        assert_eq!(solutions.frontier().len(), 3);
    }

    #[test]
    fn test_subset_reasoning_needs_search() {
        // {a,b,c}=2 and {a,b}=1 force c to be a mine; no single constraint shows it
        let constraints = vec![
            Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 2),
            Constraint::new([c(0, 0), c(0, 1)], 1),
        ];
        let solutions = enumerate(&constraints, cap(100));

        assert_eq!(solutions.len(), 2);
        let forced = solutions.forced();
        assert_eq!(forced.mines, BTreeSet::from([c(0, 2)]));
        assert!(forced.safe.is_empty());
    }

    #[test]
    fn test_every_solution_satisfies_every_constraint() {
        // A small 1-2-1 style pattern: each recorded solution must be consistent
        let constraints = vec![
            Constraint::new([c(1, 0), c(1, 1)], 1),
            Constraint::new([c(1, 0), c(1, 1), c(1, 2)], 2),
            Constraint::new([c(1, 1), c(1, 2), c(1, 3)], 1),
            Constraint::new([c(1, 2), c(1, 3)], 1),
        ];
        let solutions = enumerate(&constraints, cap(100));

        assert!(!solutions.is_empty());
        for mines in solutions.mine_sets() {
            for constraint in &constraints {
                assert!(constraint.is_satisfied_by(&mines));
            }
        }
    }

    #[test]
    fn test_solutions_are_distinct_and_complete() {
        // Two mines among four independent cells: C(4,2) = 6 solutions
        let constraints = vec![Constraint::new([c(0, 0), c(0, 1), c(0, 2), c(0, 3)], 2)];
        let solutions = enumerate(&constraints, cap(100));

        assert_eq!(solutions.len(), 6);
        let distinct: BTreeSet<BTreeSet<Coordinate>> = solutions.mine_sets().collect();
        assert_eq!(distinct.len(), 6);
        assert_eq!(solutions.mine_counts(), vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_cap_truncates() {
        // Six solutions exist but only three may be recorded
        let constraints = vec![Constraint::new([c(0, 0), c(0, 1), c(0, 2), c(0, 3)], 2)];
        let solutions = enumerate(&constraints, cap(3));

        assert_eq!(solutions.len(), 3);
        assert!(solutions.is_truncated());
    }

    #[test]
    fn test_cap_equal_to_solution_count_is_complete() {
        // Exactly two solutions and a cap of two: nothing was cut off,
        // so the forced mine still stands
        let constraints = vec![
            Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 2),
            Constraint::new([c(0, 0), c(0, 1)], 1),
        ];
        let solutions = enumerate(&constraints, cap(2));

        assert_eq!(solutions.len(), 2);
        assert!(!solutions.is_truncated());
        assert_eq!(solutions.forced().mines, BTreeSet::from([c(0, 2)]));

        let single = enumerate(&[Constraint::new([c(0, 1)], 1)], cap(1));
        assert_eq!(single.len(), 1);
        assert!(!single.is_truncated());
    }

    #[test]
    fn test_truncation_biases_toward_safe_first() {
        // With 0 tried first the earliest solutions leave the first branched cell safe,
        // so a truncated set can make an undetermined cell look forced
        let constraints = vec![Constraint::new([c(0, 0), c(0, 1), c(0, 2), c(0, 3)], 2)];
        let solutions = enumerate(&constraints, cap(3));

        let forced = solutions.forced();
        assert_eq!(forced.safe, BTreeSet::from([c(0, 0)]));

        let complete = enumerate(&constraints, cap(100));
        assert!(complete.forced().is_empty());
    }

    #[test]
    fn test_high_degree_cells_branch_first() {
        // (0,1) is in both constraints, so it is decided first; with 0 first the
        // first solution found leaves it safe
        let constraints = vec![
            Constraint::new([c(0, 0), c(0, 1)], 1),
            Constraint::new([c(0, 1), c(0, 2)], 1),
        ];
        let solutions = enumerate(&constraints, cap(1));

        assert!(solutions.is_truncated());
        let first: Vec<BTreeSet<Coordinate>> = solutions.mine_sets().collect();
        assert_eq!(first, vec![BTreeSet::from([c(0, 0), c(0, 2)])]);
    }
}
