//! MILP variable declarations (C3, §4.2).

use good_lp::{variable, ProblemVariables, Variable};
use recovery_core::OptimizationInput;
use std::collections::HashMap;

/// Every decision variable of the dynamic recovery model, keyed the
/// same way the spec names them. Variables are `Copy` handles into the
/// [`ProblemVariables`] they were declared against; this struct is the
/// index that lets constraint- and objective-building code find them
/// again by name instead of re-declaring anything.
pub struct RecoveryVars {
    pub zone_names: Vec<String>,
    pub zone_index: HashMap<String, usize>,
    /// `S[s]` — target closed/open state.
    pub s: HashMap<String, Variable>,
    /// `op[s]` — 1 iff `S[s]` differs from the initial state.
    pub op: HashMap<String, Variable>,
    /// `y[t,z]` — transformer `t` supplied by zone `z`.
    pub y: HashMap<(String, String), Variable>,
    /// `E[n]` — energized-by label of node `n`.
    pub e: HashMap<String, Variable>,
    /// `f[u→v,z]` on switch `s`, forward direction (`s.nodes.0 -> s.nodes.1`).
    pub f_fwd: HashMap<(String, String), Variable>,
    /// `f[v→u,z]` on switch `s`, reverse direction.
    pub f_rev: HashMap<(String, String), Variable>,
    /// Flow from a zone vertex into its zone-line's `conn_node`.
    pub f_zl: HashMap<String, Variable>,
    pub p_op: HashMap<(String, usize), Variable>,
    pub p_bk: HashMap<(String, usize), Variable>,
    pub p_hy: HashMap<(String, usize), Variable>,
    pub p_es: HashMap<(String, usize), Variable>,
    pub soc: HashMap<(String, usize), Variable>,
    pub u_start: HashMap<(String, usize), Variable>,
    pub u_op: HashMap<(String, usize), Variable>,
    pub p_sh: HashMap<(String, usize), Variable>,
    pub margin: HashMap<(String, usize), Variable>,
    pub m_min: Variable,
}

/// Declare every variable of §4.2 against a fresh [`ProblemVariables`].
pub fn build_vars(input: &OptimizationInput) -> (ProblemVariables, RecoveryVars) {
    let mut vars = ProblemVariables::new();

    let zone_names: Vec<String> = input.zones.keys().cloned().collect();
    let zone_index: HashMap<String, usize> = zone_names
        .iter()
        .enumerate()
        .map(|(i, z)| (z.clone(), i))
        .collect();
    let zone_count = zone_names.len() as f64;
    let transformer_count = input.transformers.len() as f64;

    let mut s = HashMap::with_capacity(input.switches.len());
    let mut op = HashMap::with_capacity(input.switches.len());
    for name in input.switches.keys() {
        s.insert(name.clone(), vars.add(variable().binary()));
        op.insert(name.clone(), vars.add(variable().binary()));
    }

    let mut y = HashMap::new();
    for t in input.transformers.keys() {
        for z in &zone_names {
            y.insert((t.clone(), z.clone()), vars.add(variable().binary()));
        }
    }

    let mut e = HashMap::with_capacity(input.substation_nodes.len());
    for node in &input.substation_nodes {
        e.insert(
            node.clone(),
            vars.add(variable().integer().min(0.0).max(zone_count)),
        );
    }

    let mut f_fwd = HashMap::new();
    let mut f_rev = HashMap::new();
    for switch_name in input.switches.keys() {
        for z in &zone_names {
            f_fwd.insert(
                (switch_name.clone(), z.clone()),
                vars.add(variable().min(0.0).max(transformer_count)),
            );
            f_rev.insert(
                (switch_name.clone(), z.clone()),
                vars.add(variable().min(0.0).max(transformer_count)),
            );
        }
    }

    let mut f_zl = HashMap::new();
    for (name, line) in &input.zone_lines {
        if !line.available {
            continue;
        }
        f_zl.insert(name.clone(), vars.add(variable().min(0.0).max(transformer_count)));
    }

    let mut p_op = HashMap::new();
    for (name, unit) in &input.operating_units {
        for k in 0..input.horizon {
            let max = (unit.p_max - unit.p_current).max(0.0);
            p_op.insert((name.clone(), k), vars.add(variable().min(0.0).max(max)));
        }
    }

    let mut p_bk = HashMap::new();
    let mut u_start = HashMap::new();
    let mut u_op = HashMap::new();
    for (name, unit) in &input.backup_units {
        for k in 0..input.horizon {
            p_bk.insert(
                (name.clone(), k),
                vars.add(variable().min(0.0).max(unit.p_max.max(0.0))),
            );
            u_start.insert((name.clone(), k), vars.add(variable().binary()));
            u_op.insert((name.clone(), k), vars.add(variable().binary()));
        }
    }

    let mut p_hy = HashMap::new();
    for (name, unit) in &input.hydro_units {
        for k in 0..input.horizon {
            p_hy.insert(
                (name.clone(), k),
                vars.add(variable().min(0.0).max(unit.p_max.max(0.0))),
            );
        }
    }

    let mut p_es = HashMap::new();
    let mut soc = HashMap::new();
    for (name, unit) in &input.storage_units {
        for k in 0..input.horizon {
            let min = -(unit.p_charge_max + unit.p_current);
            let max = unit.p_discharge_max - unit.p_current;
            p_es.insert((name.clone(), k), vars.add(variable().min(min).max(max)));
            soc.insert(
                (name.clone(), k),
                vars.add(variable().min(unit.soc_min).max(unit.soc_max)),
            );
        }
    }

    let mut p_sh = HashMap::new();
    for (name, load) in &input.interruptible_loads {
        for k in 0..input.horizon {
            p_sh.insert(
                (name.clone(), k),
                vars.add(variable().min(0.0).max(load.shed_max.max(0.0))),
            );
        }
    }

    let mut margin = HashMap::new();
    for z in &zone_names {
        for k in 0..input.horizon {
            margin.insert((z.clone(), k), vars.add(variable().min(0.0)));
        }
    }

    let m_min = vars.add(variable());

    let recovery_vars = RecoveryVars {
        zone_names,
        zone_index,
        s,
        op,
        y,
        e,
        f_fwd,
        f_rev,
        f_zl,
        p_op,
        p_bk,
        p_hy,
        p_es,
        soc,
        u_start,
        u_op,
        p_sh,
        margin,
        m_min,
    };
    (vars, recovery_vars)
}
