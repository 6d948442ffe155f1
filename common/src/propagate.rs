//! Fixed-point deduction over single constraints.
//!
//! Two rules are applied to every constraint until nothing changes: if the
//! constraint's known mines already meet its sum, its other cells are safe;
//! if its open cells are exactly as many as the mines still missing, they are
//! all mines. The rules are sound but incomplete; deductions that need two
//! constraints combined are left to the exhaustive search.

use crate::{Constraint, Coordinate};
use log::debug;
use std::collections::BTreeSet;

/// Cells known to be safe or mined. The two sets never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    pub safe: BTreeSet<Coordinate>,
    pub mines: BTreeSet<Coordinate>,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.safe.is_empty() && self.mines.is_empty()
    }

    pub fn knows(&self, at: &Coordinate) -> bool {
        self.safe.contains(at) || self.mines.contains(at)
    }
}

/// Outcome of [`propagate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// All known facts, seed facts included.
    Consistent(Deductions),
    /// Some constraint cannot be met by the derived facts.
    Contradiction,
}

/// Runs both rules to a fixed point, starting from `seed`.
///
/// `seed` must be disjoint; it is returned extended with the new deductions.
pub fn propagate(constraints: &[Constraint], seed: Deductions) -> Propagation {
    debug_assert!(seed.safe.is_disjoint(&seed.mines));
    let mut known = seed;
    let mut passes = 0;

    loop {
        passes += 1;
        let mut changed = false;

        for constraint in constraints {
            let unknown: Vec<Coordinate> = constraint
                .variables()
                .iter()
                .filter(|at| !known.knows(at))
                .copied()
                .collect();
            if unknown.is_empty() {
                continue;
            }

            let mines_already = count_in(constraint, &known.mines);
            let remaining = constraint.required_sum() - mines_already;

            if remaining == 0 {
                known.safe.extend(unknown);
                changed = true;
            } else if remaining == unknown.len() as i32 {
                known.mines.extend(unknown);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    if let Some(violated) = constraints.iter().find(|c| is_violated(c, &known)) {
        debug!(
            "propagation contradiction after {passes} passes: {:?} needs {}",
            violated.variables(),
            violated.required_sum()
        );
        return Propagation::Contradiction;
    }

    debug!(
        "propagation fixed point after {passes} passes: {} safe, {} mines",
        known.safe.len(),
        known.mines.len()
    );
    Propagation::Consistent(known)
}

fn count_in(constraint: &Constraint, cells: &BTreeSet<Coordinate>) -> i32 {
    constraint.variables().intersection(cells).count() as i32
}

/// True when the known mines overshoot the sum, or too few open cells remain to reach it.
fn is_violated(constraint: &Constraint, known: &Deductions) -> bool {
    let mines = count_in(constraint, &known.mines);
    let open = constraint
        .variables()
        .iter()
        .filter(|at| !known.knows(at))
        .count() as i32;
    mines > constraint.required_sum() || mines + open < constraint.required_sum()
}
