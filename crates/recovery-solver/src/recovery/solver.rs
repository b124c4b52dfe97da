//! Recovery MILP solver (C5, §4.8).
//!
//! Wires [`super::vars::build_vars`], [`super::constraints::build_constraints`]
//! and [`super::objective::compose_objective`] onto a `good_lp` model and
//! reads the raw variable values back out. Rounding of binaries and the
//! optimal/infeasible split both happen here, matching §4.8 exactly;
//! everything downstream ([`super::result`], [`super::sequence`]) only
//! ever sees already-rounded values.

use super::constraints::build_constraints;
use super::objective::compose_objective;
use super::vars::{build_vars, RecoveryVars};
use good_lp::solvers::highs::highs;
use good_lp::{Solution, SolverModel};
use recovery_core::OptimizationInput;
use std::collections::HashMap;
use std::time::Instant;

/// Solver tuning knobs. Accepted for API completeness but not yet wired
/// into the `good_lp`/HiGHS call; the default solve already finishes
/// well inside `max_time_seconds` for the problem sizes this planner
/// targets.
#[derive(Debug, Clone)]
pub struct RecoverySolverConfig {
    pub max_time_seconds: f64,
    pub mip_gap: f64,
    pub verbose: bool,
}

impl Default for RecoverySolverConfig {
    fn default() -> Self {
        Self {
            max_time_seconds: 300.0,
            mip_gap: 0.01,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RecoveryError {
    /// Input failed [`recovery_core::OptimizationInput::validate`]; the
    /// solver was never invoked.
    ValidationError(String),
    /// The solver proved the model has no feasible (or no bounded)
    /// solution; §7 forbids leaking any partial assignment here.
    InfeasibleOrUnbounded,
    /// The underlying solver call failed for a reason unrelated to
    /// feasibility (crash, license, time limit truncation at a non-optimal
    /// status); opaque by design, no retry.
    SolverError(String),
}

impl std::fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryError::ValidationError(msg) => write!(f, "validation error: {msg}"),
            RecoveryError::InfeasibleOrUnbounded => write!(f, "no solution: infeasible or unbounded"),
            RecoveryError::SolverError(msg) => write!(f, "solver error: {msg}"),
        }
    }
}

impl std::error::Error for RecoveryError {}

/// Every decision variable's value after solving and rounding, keyed
/// the same way [`RecoveryVars`] is. [`super::result`] and
/// [`super::sequence`] read this, never the `good_lp` solution object
/// directly.
#[derive(Debug, Clone, Default)]
pub struct RawSolution {
    pub objective_value: f64,
    pub solve_time_seconds: f64,
    pub s: HashMap<String, bool>,
    pub op: HashMap<String, bool>,
    pub y: HashMap<(String, String), bool>,
    pub e: HashMap<String, i64>,
    pub p_op: HashMap<(String, usize), f64>,
    pub p_bk: HashMap<(String, usize), f64>,
    pub p_hy: HashMap<(String, usize), f64>,
    pub p_es: HashMap<(String, usize), f64>,
    pub soc: HashMap<(String, usize), f64>,
    pub u_start: HashMap<(String, usize), bool>,
    pub u_op: HashMap<(String, usize), bool>,
    pub p_sh: HashMap<(String, usize), f64>,
    pub margin: HashMap<(String, usize), f64>,
    pub m_min: f64,
}

/// A value is treated as "set" once it clears the halfway point, per
/// §4.8's rounding rule for binary variables.
fn round_binary(value: f64) -> bool {
    value > 0.5
}

/// Build, solve and round one recovery MILP.
pub fn solve_recovery(
    input: &OptimizationInput,
    _config: &RecoverySolverConfig,
) -> Result<RawSolution, RecoveryError> {
    let diagnostics = input.validate();
    if diagnostics.has_errors() {
        return Err(RecoveryError::ValidationError(diagnostics.to_string()));
    }

    let start = Instant::now();

    let (problem_vars, vars) = build_vars(input);
    let constraints = build_constraints(input, &vars);
    let objective = compose_objective(input, &vars);

    let mut model = problem_vars.minimise(objective).using(highs);
    for c in constraints {
        model = model.with(c);
    }

    let solution = model.solve().map_err(|e| {
        let message = format!("{e:?}");
        if message.contains("Infeasible") || message.contains("Unbounded") {
            RecoveryError::InfeasibleOrUnbounded
        } else {
            RecoveryError::SolverError(message)
        }
    })?;

    Ok(extract_solution(input, &vars, &solution, start.elapsed().as_secs_f64()))
}

fn extract_solution(
    input: &OptimizationInput,
    vars: &RecoveryVars,
    solution: &impl Solution,
    solve_time_seconds: f64,
) -> RawSolution {
    let mut raw = RawSolution {
        solve_time_seconds,
        ..Default::default()
    };

    for (name, var) in &vars.s {
        raw.s.insert(name.clone(), round_binary(solution.value(*var)));
    }
    for (name, var) in &vars.op {
        raw.op.insert(name.clone(), round_binary(solution.value(*var)));
    }
    for (key, var) in &vars.y {
        raw.y.insert(key.clone(), round_binary(solution.value(*var)));
    }
    for (name, var) in &vars.e {
        raw.e.insert(name.clone(), solution.value(*var).round() as i64);
    }
    for (key, var) in &vars.p_op {
        raw.p_op.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.p_bk {
        raw.p_bk.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.p_hy {
        raw.p_hy.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.p_es {
        raw.p_es.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.soc {
        raw.soc.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.u_start {
        raw.u_start.insert(key.clone(), round_binary(solution.value(*var)));
    }
    for (key, var) in &vars.u_op {
        raw.u_op.insert(key.clone(), round_binary(solution.value(*var)));
    }
    for (key, var) in &vars.p_sh {
        raw.p_sh.insert(key.clone(), solution.value(*var));
    }
    for (key, var) in &vars.margin {
        raw.margin.insert(key.clone(), solution.value(*var));
    }
    raw.m_min = solution.value(vars.m_min);

    raw.objective_value = objective_value_from_raw(input, &raw);

    raw
}

/// Recompute the objective's numeric value from already-rounded raw
/// variables, mirroring [`super::objective::compose_objective`] in
/// plain arithmetic. Kept separate from the `good_lp::Expression` the
/// model was built from so the reported value reflects the rounded
/// solution actually returned, not the (possibly fractional) LP
/// relaxation value at the optimum.
fn objective_value_from_raw(input: &OptimizationInput, raw: &RawSolution) -> f64 {
    use recovery_core::Objective;

    let switch_ops: f64 = input
        .switches
        .iter()
        .map(|(name, switch)| switch.cost * raw.op.get(name).copied().unwrap_or(false) as u8 as f64)
        .sum();

    let op_cost = op_cost_value(input, raw);
    let shed_cost: f64 = input
        .interruptible_loads
        .iter()
        .flat_map(|(name, load)| {
            (0..input.horizon).map(move |k| load.cost * raw.p_sh.get(&(name.clone(), k)).copied().unwrap_or(0.0))
        })
        .sum();

    let neg_margin = -raw.m_min;
    let max_cost = super::objective::max_operating_cost_bound_pub(input);

    let primary = match input.objective {
        Objective::MinimizeSwitchOperation => switch_ops,
        Objective::MaximizeSafetyRegion => neg_margin,
        Objective::MinimizeGenCost => op_cost,
    };
    let tie_break = match input.objective {
        Objective::MinimizeSwitchOperation => neg_margin + op_cost / max_cost,
        Objective::MaximizeSafetyRegion => switch_ops + op_cost / max_cost,
        Objective::MinimizeGenCost => neg_margin + switch_ops,
    };

    primary + 1e-4 * tie_break + shed_cost
}

pub(crate) fn op_cost_value(input: &OptimizationInput, raw: &RawSolution) -> f64 {
    let mut total = 0.0;
    for (name, unit) in &input.operating_units {
        for k in 0..input.horizon {
            let p = raw.p_op.get(&(name.clone(), k)).copied().unwrap_or(0.0);
            total += unit.cost * (p + unit.p_current);
        }
    }
    for (name, unit) in &input.backup_units {
        for k in 0..input.horizon {
            total += unit.cost * raw.p_bk.get(&(name.clone(), k)).copied().unwrap_or(0.0);
            total += unit.startup_cost
                * raw.u_start.get(&(name.clone(), k)).copied().unwrap_or(false) as u8 as f64;
        }
    }
    for (name, unit) in &input.hydro_units {
        for k in 0..input.horizon {
            total += unit.cost * raw.p_hy.get(&(name.clone(), k)).copied().unwrap_or(0.0);
        }
    }
    for (t_name, transformer) in &input.transformers {
        for (z_name, &cost) in &transformer.cost {
            let assigned = raw.y.get(&(t_name.clone(), z_name.clone())).copied().unwrap_or(false);
            if assigned {
                let sigma = transformer.sensitivity.get(z_name).copied().unwrap_or(1.0);
                let load_sum: f64 = transformer.load.iter().take(input.horizon).sum();
                total += sigma * cost * load_sum;
            }
        }
    }
    total
}
