//! Objective composition (C4, §4.7).
//!
//! Every mode shares two terms that are always present: the shedding
//! penalty (load shed is never free, whichever mode is selected) and an
//! `epsilon`-weighted blend of the two non-primary terms, used purely
//! to break ties within the primary objective without letting it
//! dominate the optimal value.

use super::vars::RecoveryVars;
use good_lp::Expression;
use recovery_core::{Objective, OptimizationInput};

const EPSILON: f64 = 1e-4;

/// Build the objective expression for `input.objective`, always in
/// minimize sense (`MAXIMIZE_SAFETY_REGION` is realized as `-m_min`).
pub fn compose_objective(input: &OptimizationInput, vars: &RecoveryVars) -> Expression {
    let switch_ops = switch_ops_cost_expr(input, vars);
    let neg_margin = Expression::from(0.0) - vars.m_min;
    let max_cost = max_operating_cost_bound(input);
    let op_cost = op_cost_expr(input, vars);
    let normalized_op_cost = (1.0 / max_cost) * op_cost.clone();
    let shed_cost = shed_cost_expr(input, vars);

    let (primary, tie_break) = match input.objective {
        Objective::MinimizeSwitchOperation => {
            (switch_ops.clone(), neg_margin + normalized_op_cost)
        }
        Objective::MaximizeSafetyRegion => {
            (neg_margin.clone(), switch_ops + normalized_op_cost)
        }
        Objective::MinimizeGenCost => (op_cost, neg_margin + switch_ops),
    };

    primary + EPSILON * tie_break + shed_cost
}

/// `MIN_SWITCH_OP = Σ cost_s · op[s]`.
fn switch_ops_cost_expr(input: &OptimizationInput, vars: &RecoveryVars) -> Expression {
    let mut expr = Expression::from(0.0);
    for (name, switch) in &input.switches {
        expr += switch.cost * vars.op[name];
    }
    expr
}

/// Generation, startup and transformer-assignment costs, per §4.7.
fn op_cost_expr(input: &OptimizationInput, vars: &RecoveryVars) -> Expression {
    let mut expr = Expression::from(0.0);

    for (name, unit) in &input.operating_units {
        for k in 0..input.horizon {
            let p = vars.p_op[&(name.clone(), k)];
            expr += unit.cost * (p + unit.p_current);
        }
    }
    for (name, unit) in &input.backup_units {
        for k in 0..input.horizon {
            expr += unit.cost * vars.p_bk[&(name.clone(), k)];
            expr += unit.startup_cost * vars.u_start[&(name.clone(), k)];
        }
    }
    for (name, unit) in &input.hydro_units {
        for k in 0..input.horizon {
            expr += unit.cost * vars.p_hy[&(name.clone(), k)];
        }
    }
    for (t_name, transformer) in &input.transformers {
        for z in &vars.zone_names {
            let Some(&cost) = transformer.cost.get(z) else {
                continue;
            };
            let sigma = transformer.sensitivity.get(z).copied().unwrap_or(1.0);
            let y = vars.y[&(t_name.clone(), z.clone())];
            let load_sum: f64 = transformer.load.iter().take(input.horizon).sum();
            expr += sigma * cost * load_sum * y;
        }
    }

    expr
}

/// `Σ cost_i · P_sh[i,k]`, always added at weight 1 regardless of mode.
fn shed_cost_expr(input: &OptimizationInput, vars: &RecoveryVars) -> Expression {
    let mut expr = Expression::from(0.0);
    for (name, load) in &input.interruptible_loads {
        for k in 0..input.horizon {
            expr += load.cost * vars.p_sh[&(name.clone(), k)];
        }
    }
    expr
}

/// A coarse upper bound on `op_cost`, used only to normalize the
/// epsilon tie-breaker onto a comparable scale to `m_min` and the
/// switch-operation count. Derived from each resource's own envelope,
/// not from the solve itself, so it stays a plain constant.
pub(crate) fn max_operating_cost_bound_pub(input: &OptimizationInput) -> f64 {
    max_operating_cost_bound(input)
}

fn max_operating_cost_bound(input: &OptimizationInput) -> f64 {
    let horizon = input.horizon.max(1) as f64;
    let mut bound = 0.0;
    for unit in input.operating_units.values() {
        bound += unit.cost * unit.p_max.max(0.0);
    }
    for unit in input.backup_units.values() {
        bound += unit.cost * unit.p_max.max(0.0) + unit.startup_cost;
    }
    for unit in input.hydro_units.values() {
        bound += unit.cost * unit.p_max.max(0.0);
    }
    (bound * horizon).max(1.0)
}
