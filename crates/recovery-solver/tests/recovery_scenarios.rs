//! End-to-end scenarios against the canonical two-zone/two-transformer
//! worked example.

use indexmap::IndexMap;
use recovery_core::{
    BackupUnit, InterruptibleLoad, Objective, OperatingUnit, OptimizationInput, Switch, SwitchKind,
    Transformer, TopologyGraph, Zone, ZoneLine,
};
use recovery_solver::{sequence_for, solve_recovery, synthesize_sequence, RecoverySolverConfig};

fn empty_input(horizon: usize) -> OptimizationInput {
    OptimizationInput {
        horizon,
        zones: IndexMap::new(),
        substation_nodes: Vec::new(),
        transformers: IndexMap::new(),
        zone_lines: IndexMap::new(),
        switches: IndexMap::new(),
        operating_units: IndexMap::new(),
        backup_units: IndexMap::new(),
        hydro_units: IndexMap::new(),
        storage_units: IndexMap::new(),
        interruptible_loads: IndexMap::new(),
        objective: Objective::MinimizeSwitchOperation,
    }
}

/// A substation with no switches: each transformer is fed directly by
/// its own zone's feeder, so the only question the solver has to
/// answer is the dispatch/margin balance. No switch can ever be
/// operated here, so `total_operations_count` is trivially zero.
fn no_fault_input() -> OptimizationInput {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone {
            capacity: 1000.0,
            fixed_load: vec![1300.0, 1350.0, 1400.0, 1450.0],
        },
    );
    zones.insert(
        "Zone_B".to_string(),
        Zone {
            capacity: 1200.0,
            fixed_load: vec![900.0, 950.0, 950.0, 950.0],
        },
    );

    let mut transformers = IndexMap::new();
    let mut t1_sensitivity = IndexMap::new();
    t1_sensitivity.insert("Zone_A".to_string(), 1.0);
    t1_sensitivity.insert("Zone_B".to_string(), 1.0);
    let mut t1_cost = IndexMap::new();
    t1_cost.insert("Zone_A".to_string(), 1.0);
    t1_cost.insert("Zone_B".to_string(), 1.0);
    transformers.insert(
        "T1".to_string(),
        Transformer {
            conn_node: "T1_conn".to_string(),
            load: vec![100.0, 100.0, 100.0, 100.0],
            sensitivity: t1_sensitivity,
            cost: t1_cost,
            allocate: Some("Zone_A".to_string()),
        },
    );
    let mut t2_sensitivity = IndexMap::new();
    t2_sensitivity.insert("Zone_A".to_string(), 1.0);
    t2_sensitivity.insert("Zone_B".to_string(), 1.0);
    let mut t2_cost = IndexMap::new();
    t2_cost.insert("Zone_A".to_string(), 1.0);
    t2_cost.insert("Zone_B".to_string(), 1.0);
    transformers.insert(
        "T2".to_string(),
        Transformer {
            conn_node: "T2_conn".to_string(),
            load: vec![110.0, 110.0, 110.0, 110.0],
            sensitivity: t2_sensitivity,
            cost: t2_cost,
            allocate: None,
        },
    );

    let mut zone_lines = IndexMap::new();
    zone_lines.insert(
        "LineA".to_string(),
        ZoneLine {
            zone: "Zone_A".to_string(),
            conn_node: "T1_conn".to_string(),
            available: true,
        },
    );
    zone_lines.insert(
        "LineB".to_string(),
        ZoneLine {
            zone: "Zone_B".to_string(),
            conn_node: "T2_conn".to_string(),
            available: true,
        },
    );

    OptimizationInput {
        horizon: 4,
        zones,
        substation_nodes: vec!["T1_conn".to_string(), "T2_conn".to_string()],
        transformers,
        zone_lines,
        switches: IndexMap::new(),
        operating_units: IndexMap::new(),
        backup_units: IndexMap::new(),
        hydro_units: IndexMap::new(),
        storage_units: IndexMap::new(),
        interruptible_loads: IndexMap::new(),
        objective: Objective::MinimizeSwitchOperation,
    }
}

#[test]
fn no_fault_requires_no_switch_operations() {
    let input = no_fault_input();
    let diagnostics = input.validate();
    assert!(!diagnostics.has_errors());

    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");
    let graph = TopologyGraph::build(&input);
    let operations = sequence_for(&input, &raw, &graph);
    assert!(operations.is_empty());
}

/// Scenario 6: given a target that closes `Breaker_LineB1` and opens
/// `Breaker_LineA2`, the emitted order preps `Switch_LineB1_Main`
/// before `Breaker_LineB1` closes, and opens `Breaker_LineA2` before
/// any of its adjacent isolators.
#[test]
fn sequencing_preps_isolators_around_breaker_operations() {
    let mut switches = IndexMap::new();
    switches.insert(
        "Switch_LineB1_Main".to_string(),
        Switch {
            nodes: ("line_B1_conn".to_string(), "Bus_B".to_string()),
            initial_state: 0,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Isolator,
        },
    );
    switches.insert(
        "Breaker_LineB1".to_string(),
        Switch {
            nodes: ("line_B1_conn".to_string(), "Bus_B".to_string()),
            initial_state: 0,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Breaker,
        },
    );
    switches.insert(
        "Breaker_LineA2".to_string(),
        Switch {
            nodes: ("line_A2_conn".to_string(), "Bus_A".to_string()),
            initial_state: 1,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Breaker,
        },
    );
    switches.insert(
        "Switch_LineA2_Main".to_string(),
        Switch {
            nodes: ("line_A2_conn".to_string(), "Bus_A".to_string()),
            initial_state: 1,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Isolator,
        },
    );
    switches.insert(
        "Tie_AB".to_string(),
        Switch {
            nodes: ("Bus_A".to_string(), "Bus_B".to_string()),
            initial_state: 1,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Breaker,
        },
    );

    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 1000.0, fixed_load: vec![100.0] },
    );
    let input = OptimizationInput {
        horizon: 1,
        zones,
        substation_nodes: vec![
            "line_B1_conn".to_string(),
            "Bus_B".to_string(),
            "line_A2_conn".to_string(),
            "Bus_A".to_string(),
        ],
        transformers: IndexMap::new(),
        zone_lines: IndexMap::new(),
        switches: switches.clone(),
        operating_units: IndexMap::new(),
        backup_units: IndexMap::new(),
        hydro_units: IndexMap::new(),
        storage_units: IndexMap::new(),
        interruptible_loads: IndexMap::new(),
        objective: Objective::MinimizeSwitchOperation,
    };

    let graph = TopologyGraph::build(&input);
    let entries = switches.iter().map(|(name, switch)| {
        let target = match name.as_str() {
            "Breaker_LineB1" | "Switch_LineB1_Main" => 1,
            "Breaker_LineA2" | "Switch_LineA2_Main" => 0,
            _ => switch.initial_state,
        };
        (
            name.as_str(),
            switch.switch_type,
            (switch.nodes.0.as_str(), switch.nodes.1.as_str()),
            switch.initial_state,
            target,
        )
    });
    let operations = synthesize_sequence(&graph, entries);

    let index_of = |needle: &str| operations.iter().position(|op| op.starts_with(needle));
    let b1_isolator_close = index_of("Switch_LineB1_Main【close】").expect("isolator prep close emitted");
    let b1_breaker_close = index_of("Breaker_LineB1【close】").expect("breaker close emitted");
    assert!(b1_isolator_close < b1_breaker_close);

    let a2_breaker_open = index_of("Breaker_LineA2【open】").expect("breaker open emitted");
    let a2_isolator_open = index_of("Switch_LineA2_Main【open】").expect("isolator open emitted");
    assert!(a2_breaker_open < a2_isolator_open);
}

/// Scenario 2: an unavailable breaker is frozen at its initial state,
/// and the isolator that is its sole backing stays closed to satisfy
/// the breaker/isolator coupling even though nothing else forces it.
#[test]
fn unavailable_breaker_is_frozen_at_initial_state() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 1000.0, fixed_load: vec![100.0] },
    );

    let mut sensitivity = IndexMap::new();
    sensitivity.insert("Zone_A".to_string(), 1.0);
    let mut cost = IndexMap::new();
    cost.insert("Zone_A".to_string(), 1.0);
    let mut transformers = IndexMap::new();
    transformers.insert(
        "T1".to_string(),
        Transformer {
            conn_node: "T1_conn".to_string(),
            load: vec![100.0],
            sensitivity,
            cost,
            allocate: Some("Zone_A".to_string()),
        },
    );

    let mut zone_lines = IndexMap::new();
    zone_lines.insert(
        "LineA".to_string(),
        ZoneLine { zone: "Zone_A".to_string(), conn_node: "T1_conn".to_string(), available: true },
    );

    let mut switches = IndexMap::new();
    switches.insert(
        "Breaker_LineA1".to_string(),
        Switch {
            nodes: ("T1_conn".to_string(), "Bus_A".to_string()),
            initial_state: 1,
            cost: 1.0,
            available: false,
            switch_type: SwitchKind::Breaker,
        },
    );
    switches.insert(
        "Switch_LineA1_Main".to_string(),
        Switch {
            nodes: ("T1_conn".to_string(), "Bus_A".to_string()),
            initial_state: 1,
            cost: 1.0,
            available: true,
            switch_type: SwitchKind::Isolator,
        },
    );

    let input = OptimizationInput {
        horizon: 1,
        zones,
        substation_nodes: vec!["T1_conn".to_string(), "Bus_A".to_string()],
        transformers,
        zone_lines,
        switches,
        ..empty_input(1)
    };

    let diagnostics = input.validate();
    assert!(!diagnostics.has_errors(), "{diagnostics}");

    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");
    assert_eq!(raw.s.get("Breaker_LineA1"), Some(&true));
    assert_eq!(raw.s.get("Switch_LineA1_Main"), Some(&true));
}

/// Scenario 3: on the same input, `MAX_SAFETY_REGION` drives `m_min`
/// strictly above what `MIN_SWITCH_OP` settles for, because the former
/// weighs margin at unit cost while the latter only nudges it via the
/// epsilon tie-breaker.
#[test]
fn max_safety_region_yields_a_higher_margin_than_min_switch_op() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 200.0, fixed_load: vec![50.0] },
    );
    let mut operating_units = IndexMap::new();
    operating_units.insert(
        "Op1".to_string(),
        OperatingUnit {
            zone: "Zone_A".to_string(),
            p_min: 0.0,
            p_max: 100.0,
            p_current: 0.0,
            cost: 1.0,
            sensitivity: 1.0,
        },
    );

    let base = OptimizationInput { zones, operating_units, ..empty_input(1) };

    let min_switch_op = OptimizationInput { objective: Objective::MinimizeSwitchOperation, ..base.clone() };
    let max_safety = OptimizationInput { objective: Objective::MaximizeSafetyRegion, ..base };

    let raw_switch_op =
        solve_recovery(&min_switch_op, &RecoverySolverConfig::default()).expect("solve should succeed");
    let raw_safety =
        solve_recovery(&max_safety, &RecoverySolverConfig::default()).expect("solve should succeed");

    assert!(
        raw_safety.m_min > raw_switch_op.m_min + 1e-6,
        "expected safety-region margin {} to exceed switch-op margin {}",
        raw_safety.m_min,
        raw_switch_op.m_min
    );
}

/// Scenario 4: zone capacity is too small to carry the forecast load
/// without shedding; the solver must cut exactly enough interruptible
/// load to bring the margin back to zero.
#[test]
fn insufficient_capacity_forces_shedding() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 100.0, fixed_load: vec![150.0] },
    );
    let mut interruptible_loads = IndexMap::new();
    interruptible_loads.insert(
        "IL_A1".to_string(),
        InterruptibleLoad { zone: "Zone_A".to_string(), shed_max: 80.0, cost: 5.0, sensitivity: 1.0 },
    );

    let input = OptimizationInput { zones, interruptible_loads, ..empty_input(1) };
    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");

    let shed = raw.p_sh.get(&("IL_A1".to_string(), 0)).copied().unwrap_or(0.0);
    assert!(shed > 0.0, "expected nonzero shed, got {shed}");
    assert!((shed - 50.0).abs() < 1e-4, "expected shed of 50.0, got {shed}");
}

/// Scenario 5: a deficit only `Gas_A1` can cover forces it to start in
/// period 0 (contributing nothing that period per the startup delay),
/// ramp to `p_min` in period 1, and reach `p_max` in period 2.
#[test]
fn backup_unit_follows_the_startup_delay_schedule() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 100.0, fixed_load: vec![50.0, 150.0, 140.0] },
    );
    let mut backup_units = IndexMap::new();
    backup_units.insert(
        "Gas_A1".to_string(),
        BackupUnit {
            zone: "Zone_A".to_string(),
            p_min: 50.0,
            p_max: 80.0,
            cost: 10.0,
            startup_cost: 1000.0,
            sensitivity: 1.0,
            available: true,
        },
    );

    let input = OptimizationInput { zones, backup_units, ..empty_input(3) };
    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");

    assert_eq!(raw.u_start.get(&("Gas_A1".to_string(), 0)), Some(&true));
    let p0 = raw.p_bk.get(&("Gas_A1".to_string(), 0)).copied().unwrap_or(f64::NAN);
    let p1 = raw.p_bk.get(&("Gas_A1".to_string(), 1)).copied().unwrap_or(f64::NAN);
    let p2 = raw.p_bk.get(&("Gas_A1".to_string(), 2)).copied().unwrap_or(f64::NAN);
    assert!((p0 - 0.0).abs() < 1e-6, "P_bk[Gas_A1,0] should be 0, got {p0}");
    assert!((p1 - 50.0).abs() < 1e-4, "P_bk[Gas_A1,1] should be p_min=50, got {p1}");
    assert!((p2 - 80.0).abs() < 1e-4, "P_bk[Gas_A1,2] should be p_max=80, got {p2}");
}

/// Round-trip law: re-solving with `switches` set to the previously
/// returned `final_switch_states` yields zero switch operations.
#[test]
fn round_trip_with_final_switch_states_yields_no_operations() {
    fn build(initial_state: u8) -> OptimizationInput {
        let mut zones = IndexMap::new();
        zones.insert(
            "Zone_A".to_string(),
            Zone { capacity: 1000.0, fixed_load: vec![50.0] },
        );
        let mut sensitivity = IndexMap::new();
        sensitivity.insert("Zone_A".to_string(), 1.0);
        let mut cost = IndexMap::new();
        cost.insert("Zone_A".to_string(), 1.0);
        let mut transformers = IndexMap::new();
        transformers.insert(
            "T1".to_string(),
            Transformer {
                conn_node: "T_conn".to_string(),
                load: vec![50.0],
                sensitivity,
                cost,
                allocate: Some("Zone_A".to_string()),
            },
        );
        let mut zone_lines = IndexMap::new();
        zone_lines.insert(
            "LineA".to_string(),
            ZoneLine { zone: "Zone_A".to_string(), conn_node: "Z_conn".to_string(), available: true },
        );
        let mut switches = IndexMap::new();
        switches.insert(
            "Sw1".to_string(),
            Switch {
                nodes: ("Z_conn".to_string(), "T_conn".to_string()),
                initial_state,
                cost: 1.0,
                available: true,
                switch_type: SwitchKind::Breaker,
            },
        );
        switches.insert(
            "Iso1".to_string(),
            Switch {
                nodes: ("Z_conn".to_string(), "T_conn".to_string()),
                initial_state: 1,
                cost: 1.0,
                available: true,
                switch_type: SwitchKind::Isolator,
            },
        );
        OptimizationInput {
            zones,
            substation_nodes: vec!["Z_conn".to_string(), "T_conn".to_string()],
            transformers,
            zone_lines,
            switches,
            ..empty_input(1)
        }
    }

    let first_input = build(0);
    let first_raw = solve_recovery(&first_input, &RecoverySolverConfig::default()).expect("solve should succeed");
    let first_graph = TopologyGraph::build(&first_input);
    let first_ops = sequence_for(&first_input, &first_raw, &first_graph);
    assert_eq!(raw_switch_state(&first_raw, "Sw1"), 1);
    assert_eq!(first_ops.len(), 1);

    let second_input = build(1);
    let second_raw = solve_recovery(&second_input, &RecoverySolverConfig::default()).expect("solve should succeed");
    let second_graph = TopologyGraph::build(&second_input);
    let second_ops = sequence_for(&second_input, &second_raw, &second_graph);
    assert_eq!(raw_switch_state(&second_raw, "Sw1"), 1);
    assert!(second_ops.is_empty(), "round-trip should require no further switch operations");
}

fn raw_switch_state(raw: &recovery_solver::RawSolution, name: &str) -> u8 {
    raw.s.get(name).copied().unwrap_or(false) as u8
}

/// Boundary: `H = 1` solves cleanly with no inter-period constraints.
#[test]
fn horizon_one_solves_without_inter_period_constraints() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 500.0, fixed_load: vec![100.0] },
    );
    let input = OptimizationInput { zones, ..empty_input(1) };
    solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");
}

/// Boundary: empty resource maps are accepted and the balance equation
/// reduces to `fixed_load + transformer_load = capacity + margin`.
#[test]
fn empty_resource_maps_reduce_to_plain_load_balance() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 100.0, fixed_load: vec![30.0] },
    );
    let mut sensitivity = IndexMap::new();
    sensitivity.insert("Zone_A".to_string(), 1.0);
    let mut cost = IndexMap::new();
    cost.insert("Zone_A".to_string(), 1.0);
    let mut transformers = IndexMap::new();
    transformers.insert(
        "T1".to_string(),
        Transformer {
            conn_node: "Z_conn".to_string(),
            load: vec![20.0],
            sensitivity,
            cost,
            allocate: Some("Zone_A".to_string()),
        },
    );
    let mut zone_lines = IndexMap::new();
    zone_lines.insert(
        "LineA".to_string(),
        ZoneLine { zone: "Zone_A".to_string(), conn_node: "Z_conn".to_string(), available: true },
    );

    let input = OptimizationInput {
        zones,
        substation_nodes: vec!["Z_conn".to_string()],
        transformers,
        zone_lines,
        ..empty_input(1)
    };
    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");

    let margin = raw.margin.get(&("Zone_A".to_string(), 0)).copied().unwrap_or(f64::NAN);
    assert!((margin - 50.0).abs() < 1e-4, "expected margin 100-30-20=50, got {margin}");
}

/// Boundary: a transformer with all-zero load over the horizon induces
/// no demand and is not forced to pick a zone, even when it has no
/// feasible connectivity to any zone at all.
#[test]
fn zero_load_transformer_induces_no_demand() {
    let mut zones = IndexMap::new();
    zones.insert(
        "Zone_A".to_string(),
        Zone { capacity: 100.0, fixed_load: vec![50.0] },
    );
    let mut sensitivity = IndexMap::new();
    sensitivity.insert("Zone_A".to_string(), 1.0);
    let mut cost = IndexMap::new();
    cost.insert("Zone_A".to_string(), 1.0);
    let mut transformers = IndexMap::new();
    transformers.insert(
        "T_dead".to_string(),
        Transformer {
            conn_node: "Isolated_conn".to_string(),
            load: vec![0.0],
            sensitivity,
            cost,
            allocate: None,
        },
    );

    let input = OptimizationInput {
        zones,
        substation_nodes: vec!["Isolated_conn".to_string()],
        transformers,
        ..empty_input(1)
    };
    let raw = solve_recovery(&input, &RecoverySolverConfig::default()).expect("solve should succeed");

    let margin = raw.margin.get(&("Zone_A".to_string(), 0)).copied().unwrap_or(f64::NAN);
    assert!((margin - 50.0).abs() < 1e-4, "zero-load transformer must not shift the margin, got {margin}");
}
