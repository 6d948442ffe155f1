use crate::{Constraint, Coordinate, Deductions, frontier};
use itertools::Itertools;
use std::collections::BTreeMap;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// The possible outcomes of the SAT check for a single frontier cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // Every model makes this cell a mine.
    ForcedSafe,   // Every model leaves this cell safe.
    Undetermined, // Models exist either way.
}

/// SAT-backed classification of every frontier cell.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub deductions: BTreeMap<Coordinate, DeducedState>,
    /// One concrete model that satisfies every constraint.
    pub sample: BTreeMap<Coordinate, bool>,
}

impl Certificate {
    pub fn forced(&self) -> Deductions {
        let mut forced = Deductions::default();
        for (&at, &state) in &self.deductions {
            match state {
                DeducedState::ForcedMine => {
                    forced.mines.insert(at);
                }
                DeducedState::ForcedSafe => {
                    forced.safe.insert(at);
                }
                DeducedState::Undetermined => {}
            }
        }
        forced
    }
}

/// Classifies the frontier with a SAT solver instead of enumeration.
///
/// Each cell is probed as a mine and as safe under assumptions, so the answer
/// is complete no matter how many solutions exist. Returns `Ok(None)` when the
/// constraints are unsatisfiable.
pub fn certify(constraints: &[Constraint]) -> anyhow::Result<Option<Certificate>> {
    if constraints.iter().any(Constraint::is_unsatisfiable) {
        return Ok(None);
    }

    let mut solver = Solver::new();
    let var_map: BTreeMap<Coordinate, Var> = frontier(constraints)
        .into_iter()
        .map(|at| (at, solver.new_var()))
        .collect();

    let mut formula = CnfFormula::new();
    for constraint in constraints {
        let lits: Vec<Lit> = constraint
            .variables()
            .iter()
            .filter_map(|at| var_map.get(at).map(|&v| Lit::from_var(v, true)))
            .collect();
        // Unsatisfiable sums were rejected above, so this is a valid count.
        encode_exactly_k_to_formula(&mut formula, &lits, constraint.required_sum() as usize);
    }
    solver.add_formula(&formula);

    if !solver.solve()? {
        return Ok(None);
    }

    let model = solver.model().ok_or(anyhow::anyhow!("solver_model_fail"))?;
    let sample = var_map
        .iter()
        .map(|(&at, &var)| (at, model.contains(&Lit::from_var(var, true))))
        .collect();

    let mut deductions = BTreeMap::new();
    for (&at, &var) in &var_map {
        let mine_possible = solvable_with(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = solvable_with(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision at {at}"),
        };
        deductions.insert(at, state);
    }

    Ok(Some(Certificate { deductions, sample }))
}

fn solvable_with(solver: &mut Solver, assumption: Lit) -> anyhow::Result<bool> {
    solver.assume(&[assumption]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes an "exactly k" constraint into the CNF formula.
fn encode_exactly_k_to_formula(formula: &mut CnfFormula, vars: &[Lit], k: usize) {
    encode_at_most_k_to_formula(formula, vars, k);
    encode_at_least_k_to_formula(formula, vars, k);
}

/// Encodes "at most k": every (k+1)-subset has a safe cell.
/// Clue constraints span at most eight cells, so the naive encoding stays small.
fn encode_at_most_k_to_formula(formula: &mut CnfFormula, vars: &[Lit], k: usize) {
    if k >= vars.len() {
        return;
    }
    for combo in vars.iter().copied().combinations(k + 1) {
        let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
        formula.add_clause(&clause);
    }
}

/// Encodes "at least k": every (n-k+1)-subset has a mine.
fn encode_at_least_k_to_formula(formula: &mut CnfFormula, vars: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
        formula.add_clause(&combo);
    }
}
