//! MILP constraint declarations (C3, §4.3–§4.6).
//!
//! Every function returns a `Vec<Constraint>` instead of taking the
//! solver's model directly, so constraint-building stays solver-backend
//! agnostic; [`super::solver::solve_recovery`] folds them onto the model
//! once it has picked a backend.

use super::vars::RecoveryVars;
use good_lp::{constraint, Constraint, Expression};
use recovery_core::OptimizationInput;
use std::collections::HashSet;

/// Build every constraint family of §4.3–§4.6 for one solve.
pub fn build_constraints(input: &OptimizationInput, vars: &RecoveryVars) -> Vec<Constraint> {
    let mut cs = Vec::new();
    let big_m = input.transformers.len() as f64 + 1.0;
    let t_count = input.transformers.len() as f64;

    energized_by_labels(input, vars, big_m, &mut cs);
    zone_line_boundary_conditions(input, vars, &mut cs);
    flow_suppression_on_open_switches(input, vars, t_count, &mut cs);
    single_feeder_cap(input, vars, &mut cs);
    flow_balance(input, vars, &mut cs);
    transformer_assignment(input, vars, &mut cs);
    reachability_seal(input, vars, &mut cs);
    power_balance_and_margin(input, vars, &mut cs);
    backup_unit_startup(input, vars, &mut cs);
    storage_dynamics(input, vars, &mut cs);
    switch_change_tracking(input, vars, &mut cs);
    availability_lockout(input, vars, &mut cs);
    breaker_isolator_coupling(input, vars, &mut cs);
    no_net_deconstruction(input, vars, &mut cs);

    cs
}

fn energized_by_labels(
    input: &OptimizationInput,
    vars: &RecoveryVars,
    big_m: f64,
    cs: &mut Vec<Constraint>,
) {
    for (name, switch) in &input.switches {
        let e_u = vars.e[&switch.nodes.0];
        let e_v = vars.e[&switch.nodes.1];
        let s_var = vars.s[name];
        cs.push(constraint!(e_u - e_v <= big_m * (1.0 - s_var)));
        cs.push(constraint!(e_v - e_u <= big_m * (1.0 - s_var)));
    }
}

fn zone_line_boundary_conditions(
    input: &OptimizationInput,
    vars: &RecoveryVars,
    cs: &mut Vec<Constraint>,
) {
    for line in input.zone_lines.values() {
        let z_idx = vars.zone_index[&line.zone] as f64;
        let e_c = vars.e[&line.conn_node];
        cs.push(constraint!(e_c == z_idx));
    }
}

fn flow_suppression_on_open_switches(
    input: &OptimizationInput,
    vars: &RecoveryVars,
    t_count: f64,
    cs: &mut Vec<Constraint>,
) {
    for (name, _switch) in &input.switches {
        let s_var = vars.s[name];
        for z in &vars.zone_names {
            let fwd = vars.f_fwd[&(name.clone(), z.clone())];
            let rev = vars.f_rev[&(name.clone(), z.clone())];
            cs.push(constraint!(fwd + rev <= t_count * s_var));
        }
    }
}

fn single_feeder_cap(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    let feeder_nodes: HashSet<&str> = input
        .zone_lines
        .values()
        .map(|line| line.conn_node.as_str())
        .collect();

    for (name, switch) in &input.switches {
        let touches_feeder =
            feeder_nodes.contains(switch.nodes.0.as_str()) || feeder_nodes.contains(switch.nodes.1.as_str());
        if !touches_feeder {
            continue;
        }
        for z in &vars.zone_names {
            let fwd = vars.f_fwd[&(name.clone(), z.clone())];
            let rev = vars.f_rev[&(name.clone(), z.clone())];
            cs.push(constraint!(fwd + rev <= 1.5));
        }
    }
}

/// `out(n,z) - in(n,z) = supply(n,z) - demand(n,z)` at every substation
/// node, plus the zone-vertex balance that ties `f_zl` to `y[t,z]`.
fn flow_balance(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for z in &vars.zone_names {
        for node in &input.substation_nodes {
            let mut out = Expression::from(0.0);
            let mut incoming = Expression::from(0.0);

            for (name, switch) in &input.switches {
                let fwd = vars.f_fwd[&(name.clone(), z.clone())];
                let rev = vars.f_rev[&(name.clone(), z.clone())];
                if &switch.nodes.0 == node {
                    out += fwd;
                    incoming += rev;
                } else if &switch.nodes.1 == node {
                    out += rev;
                    incoming += fwd;
                }
            }

            for (line_name, line) in &input.zone_lines {
                if line.available && &line.conn_node == node && &line.zone == z {
                    incoming += vars.f_zl[line_name];
                }
            }

            let mut demand = Expression::from(0.0);
            for (t_name, transformer) in &input.transformers {
                if &transformer.conn_node == node {
                    demand += vars.y[&(t_name.clone(), z.clone())];
                }
            }

            cs.push(constraint!(out - incoming + demand == 0.0));
        }

        // Zone vertex balance for its own commodity: everything the
        // zone's feeders carry out must equal the transformers it was
        // assigned.
        let mut zone_out = Expression::from(0.0);
        for (line_name, line) in &input.zone_lines {
            if line.available && &line.zone == z {
                zone_out += vars.f_zl[line_name];
            }
        }
        let mut supply = Expression::from(0.0);
        for t_name in input.transformers.keys() {
            supply += vars.y[&(t_name.clone(), z.clone())];
        }
        cs.push(constraint!(zone_out == supply));
    }
}

fn transformer_assignment(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (t_name, transformer) in &input.transformers {
        let has_load = transformer.load.iter().any(|v| *v != 0.0);
        if has_load {
            let mut sum = Expression::from(0.0);
            for z in &vars.zone_names {
                sum += vars.y[&(t_name.clone(), z.clone())];
            }
            cs.push(constraint!(sum == 1.0));
        }
        if let Some(z_star) = &transformer.allocate {
            let y_star = vars.y[&(t_name.clone(), z_star.clone())];
            cs.push(constraint!(y_star == 1.0));
        }
    }
}

fn reachability_seal(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (t_name, transformer) in &input.transformers {
        for z in &vars.zone_names {
            let mut incoming = Expression::from(0.0);
            for (name, switch) in &input.switches {
                let fwd = vars.f_fwd[&(name.clone(), z.clone())];
                let rev = vars.f_rev[&(name.clone(), z.clone())];
                if switch.nodes.0 == transformer.conn_node {
                    incoming += rev;
                } else if switch.nodes.1 == transformer.conn_node {
                    incoming += fwd;
                }
            }
            for (line_name, line) in &input.zone_lines {
                if line.available && line.conn_node == transformer.conn_node && &line.zone == z {
                    incoming += vars.f_zl[line_name];
                }
            }
            let y = vars.y[&(t_name.clone(), z.clone())];
            cs.push(constraint!(incoming >= y));
        }
    }
}

fn power_balance_and_margin(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (z_name, zone) in &input.zones {
        for k in 0..input.horizon {
            let mut supply = Expression::from(0.0);
            for (name, unit) in &input.operating_units {
                if unit.zone != *z_name {
                    continue;
                }
                let p = vars.p_op[&(name.clone(), k)];
                supply += unit.sensitivity * (p + unit.p_current);
            }
            for (name, unit) in &input.backup_units {
                if unit.zone != *z_name {
                    continue;
                }
                let p = vars.p_bk[&(name.clone(), k)];
                supply += unit.sensitivity * p;
            }
            for (name, unit) in &input.hydro_units {
                if unit.zone != *z_name {
                    continue;
                }
                let p = vars.p_hy[&(name.clone(), k)];
                supply += unit.sensitivity * p;
            }
            for (name, unit) in &input.storage_units {
                if unit.zone != *z_name {
                    continue;
                }
                let p = vars.p_es[&(name.clone(), k)];
                supply += unit.sensitivity * (p + unit.p_current);
            }

            let mut demand = Expression::from(zone.fixed_load[k]);
            for (t_name, transformer) in &input.transformers {
                let Some(&sigma) = transformer.sensitivity.get(z_name) else {
                    continue;
                };
                let load_k = transformer.load.get(k).copied().unwrap_or(0.0);
                let y = vars.y[&(t_name.clone(), z_name.clone())];
                demand += load_k * sigma * y;
            }
            for (name, _load) in &input.interruptible_loads {
                if _load.zone != *z_name {
                    continue;
                }
                let p_sh = vars.p_sh[&(name.clone(), k)];
                demand -= p_sh;
            }

            let margin = vars.margin[&(z_name.clone(), k)];
            cs.push(constraint!(demand + margin == supply + zone.capacity));

            if zone.capacity > 0.0 {
                cs.push(constraint!(vars.m_min * zone.capacity <= margin));
            }
        }
    }
}

fn backup_unit_startup(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (name, unit) in &input.backup_units {
        for k in 0..input.horizon {
            let u_start = vars.u_start[&(name.clone(), k)];
            let u_op = vars.u_op[&(name.clone(), k)];
            cs.push(constraint!(u_start + u_op <= 1.0));

            if !unit.available {
                cs.push(constraint!(u_start == 0.0));
                cs.push(constraint!(u_op == 0.0));
                cs.push(constraint!(vars.p_bk[&(name.clone(), k)] == 0.0));
                continue;
            }

            if k == 0 {
                cs.push(constraint!(u_op == 0.0));
                cs.push(constraint!(vars.p_bk[&(name.clone(), k)] == 0.0));
            } else {
                let u_op_prev = vars.u_op[&(name.clone(), k - 1)];
                cs.push(constraint!(u_op >= u_op_prev));

                let u_start_prev = vars.u_start[&(name.clone(), k - 1)];
                let p_bk = vars.p_bk[&(name.clone(), k)];
                cs.push(constraint!(
                    p_bk == unit.p_min * u_start_prev + unit.p_max * u_op_prev
                ));
                cs.push(constraint!(u_start_prev + u_op_prev == u_op));
            }
        }
    }
}

fn storage_dynamics(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (name, unit) in &input.storage_units {
        for k in 0..input.horizon {
            let soc = vars.soc[&(name.clone(), k)];
            if k == 0 {
                cs.push(constraint!(soc == unit.soc_initial));
            } else {
                let soc_prev = vars.soc[&(name.clone(), k - 1)];
                let p_es = vars.p_es[&(name.clone(), k)];
                cs.push(constraint!(soc == soc_prev - p_es));
            }
        }
    }
}

fn switch_change_tracking(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    for (name, switch) in &input.switches {
        let s_var = vars.s[name];
        let op_var = vars.op[name];
        if switch.initial_state == 0 {
            cs.push(constraint!(op_var >= s_var));
        } else {
            cs.push(constraint!(op_var >= 1.0 - s_var));
        }
    }
}

fn availability_lockout(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    let frozen_nodes: HashSet<&str> = input
        .zone_lines
        .values()
        .filter(|line| !line.available)
        .map(|line| line.conn_node.as_str())
        .collect();

    for (name, switch) in &input.switches {
        let locked = !switch.available
            || frozen_nodes.contains(switch.nodes.0.as_str())
            || frozen_nodes.contains(switch.nodes.1.as_str());
        if locked {
            let s_var = vars.s[name];
            cs.push(constraint!(s_var == switch.initial_state as f64));
        }
    }
}

fn breaker_isolator_coupling(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    use recovery_core::SwitchKind;

    for (b_name, breaker) in &input.switches {
        if breaker.switch_type != SwitchKind::Breaker {
            continue;
        }
        let s_b = vars.s[b_name];
        for endpoint in [&breaker.nodes.0, &breaker.nodes.1] {
            let mut iso_sum = Expression::from(0.0);
            for (s_name, switch) in &input.switches {
                if switch.switch_type != SwitchKind::Isolator {
                    continue;
                }
                if &switch.nodes.0 == endpoint || &switch.nodes.1 == endpoint {
                    iso_sum += vars.s[s_name];
                }
            }
            cs.push(constraint!(iso_sum >= s_b));
        }
    }
}

fn no_net_deconstruction(input: &OptimizationInput, vars: &RecoveryVars, cs: &mut Vec<Constraint>) {
    let mut closed_sum = Expression::from(0.0);
    let mut initial_sum = 0.0;
    for (name, switch) in &input.switches {
        closed_sum += vars.s[name];
        initial_sum += switch.initial_state as f64;
    }
    cs.push(constraint!(closed_sum >= initial_sum));
}
