use crate::{BoardView, Coordinate};
use itertools::Itertools;
use std::collections::BTreeSet;

/// "Exactly `required_sum` of these cells are mines."
///
/// A revealed '2' with one flagged neighbour and three unknown neighbours
/// yields a constraint over those three cells with a required sum of 1.
///
/// The sum is not range-checked: a negative sum (too many flags) or one larger
/// than the number of cells is kept as-is and shows up later as an
/// unsatisfiable constraint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    variables: BTreeSet<Coordinate>,
    required_sum: i32,
}

impl Constraint {
    /// Duplicate coordinates are collapsed. `variables` must not be empty.
    pub fn new(variables: impl IntoIterator<Item = Coordinate>, required_sum: i32) -> Self {
        let variables: BTreeSet<Coordinate> = variables.into_iter().collect();
        debug_assert!(!variables.is_empty(), "constraint without variables");
        Constraint {
            variables,
            required_sum,
        }
    }

    pub fn variables(&self) -> &BTreeSet<Coordinate> {
        &self.variables
    }

    pub fn required_sum(&self) -> i32 {
        self.required_sum
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// True when no 0/1 assignment of the variables can reach the sum.
    pub fn is_unsatisfiable(&self) -> bool {
        self.required_sum < 0 || self.required_sum as usize > self.variables.len()
    }

    /// Whether the given mine placement satisfies this constraint.
    /// Cells outside `variables` are ignored.
    pub fn is_satisfied_by(&self, mines: &BTreeSet<Coordinate>) -> bool {
        let count = self.variables.intersection(mines).count();
        i32::try_from(count).is_ok_and(|count| count == self.required_sum)
    }
}

/// Translates the revealed clues of a board into constraints.
///
/// Every revealed, non-zero clue with at least one unknown neighbour yields
/// one constraint over its unknown neighbours, with the flagged neighbours
/// subtracted from the clue.
pub fn build_constraints(view: &impl BoardView) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for at in view.coordinates() {
        let clue = match view.clue(at) {
            Some(0) | None => continue,
            Some(clue) => clue,
        };

        let mut unknowns = Vec::new();
        let mut flagged = 0;
        for neighbor in view.neighbors(at) {
            if view.is_flagged(neighbor) {
                flagged += 1;
            } else if !view.is_revealed(neighbor) {
                unknowns.push(neighbor);
            }
        }

        // A clue with every neighbour settled carries no information.
        if !unknowns.is_empty() {
            constraints.push(Constraint::new(unknowns, i32::from(clue) - flagged));
        }
    }

    constraints
}

/// The distinct cells referenced by any constraint, sorted row-major.
pub fn frontier(constraints: &[Constraint]) -> Vec<Coordinate> {
    constraints
        .iter()
        .flat_map(|constraint| constraint.variables().iter().copied())
        .sorted()
        .dedup()
        .collect()
}
