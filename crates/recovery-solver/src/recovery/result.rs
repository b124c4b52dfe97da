//! Result assembly (C6, §4.9, §6).
//!
//! Translates a [`super::solver::RawSolution`] plus the input it was
//! solved against, and the ordered operations list C7 derives from it,
//! into the exact output schema §6 names. Nothing here re-derives
//! anything the solver already decided; this module only reshapes and
//! labels.

use super::solver::RawSolution;
use chrono::NaiveTime;
use indexmap::IndexMap;
use recovery_core::OptimizationInput;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SwitchOperationRecord {
    pub switch_name: String,
    pub initial_state: u8,
    pub final_state: u8,
    pub action: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformerAssignmentRecord {
    pub assigned_zone: Option<String>,
    pub load: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneStatusRecord {
    pub final_load: Vec<f64>,
    pub capacity: f64,
    pub status: String,
    pub safety_region_percent: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageDispatch {
    pub power_mw: f64,
    pub soc_mwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchEntry {
    pub time: String,
    pub generation: IndexMap<String, f64>,
    pub storage: IndexMap<String, StorageDispatch>,
    pub shedding: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub operation_cost: f64,
    pub safety_region_percent: f64,
    pub total_operations_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Results {
    pub time_slots: Vec<String>,
    pub switch_operations: Vec<SwitchOperationRecord>,
    pub final_transformer_assignment: IndexMap<String, TransformerAssignmentRecord>,
    pub final_zone_status: IndexMap<String, ZoneStatusRecord>,
    pub final_switch_states: IndexMap<String, u8>,
    pub initial_sw_states: IndexMap<String, u8>,
    pub operations: Vec<String>,
    pub dispatch_plan: Vec<DispatchEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryResult {
    pub status: Option<String>,
    pub objective_value: f64,
    pub summary: ResultSummary,
    pub results: Results,
}

/// Zero-indexed period `k` rendered as an `HH:MM` label, one hour per
/// period starting at midnight.
fn period_label(k: usize) -> String {
    let hour = (k % 24) as u32;
    NaiveTime::from_hms_opt(hour, 0, 0)
        .expect("hour is always in 0..24")
        .format("%H:%M")
        .to_string()
}

/// Final state of `name`: the solver's rounded `S` value if the switch
/// was free to move, otherwise its frozen initial state.
fn final_state(raw: &RawSolution, name: &str, initial_state: u8) -> u8 {
    raw.s
        .get(name)
        .map(|&closed| closed as u8)
        .unwrap_or(initial_state)
}

fn assigned_zone(input: &OptimizationInput, raw: &RawSolution, t_name: &str) -> Option<String> {
    input
        .zones
        .keys()
        .find(|z| raw.y.get(&(t_name.to_string(), (*z).clone())).copied().unwrap_or(false))
        .cloned()
}

pub fn assemble_result(
    input: &OptimizationInput,
    raw: &RawSolution,
    operations: Vec<String>,
) -> RecoveryResult {
    let time_slots: Vec<String> = (0..input.horizon).map(period_label).collect();

    let mut switch_operations = Vec::new();
    let mut final_switch_states = IndexMap::new();
    let mut initial_sw_states = IndexMap::new();
    for (name, switch) in &input.switches {
        let fs = final_state(raw, name, switch.initial_state);
        final_switch_states.insert(name.clone(), fs);
        initial_sw_states.insert(name.clone(), switch.initial_state);
        if fs != switch.initial_state {
            let action = if fs == 1 { "close" } else { "open" }.to_string();
            switch_operations.push(SwitchOperationRecord {
                switch_name: name.clone(),
                initial_state: switch.initial_state,
                final_state: fs,
                action,
                cost: switch.cost,
            });
        }
    }

    let final_transformer_assignment = input
        .transformers
        .iter()
        .map(|(t_name, transformer)| {
            (
                t_name.clone(),
                TransformerAssignmentRecord {
                    assigned_zone: assigned_zone(input, raw, t_name),
                    load: transformer.load.clone(),
                },
            )
        })
        .collect();

    let final_zone_status = input
        .zones
        .iter()
        .map(|(z_name, zone)| {
            let safety_region_percent: Vec<f64> = (0..input.horizon)
                .map(|k| {
                    let margin = raw.margin.get(&(z_name.clone(), k)).copied().unwrap_or(0.0);
                    if zone.capacity > 0.0 {
                        100.0 * margin / zone.capacity
                    } else {
                        0.0
                    }
                })
                .collect();
            let final_load: Vec<f64> = (0..input.horizon)
                .map(|k| {
                    let fixed = zone.fixed_load.get(k).copied().unwrap_or(0.0);
                    let transformer_load: f64 = input
                        .transformers
                        .iter()
                        .filter(|(t_name, _)| {
                            raw.y
                                .get(&((*t_name).clone(), z_name.clone()))
                                .copied()
                                .unwrap_or(false)
                        })
                        .map(|(_, t)| t.load.get(k).copied().unwrap_or(0.0))
                        .sum();
                    fixed + transformer_load
                })
                .collect();
            let status = if safety_region_percent.iter().all(|&p| p >= 0.0) {
                "restored".to_string()
            } else {
                "at-risk".to_string()
            };
            (
                z_name.clone(),
                ZoneStatusRecord {
                    final_load,
                    capacity: zone.capacity,
                    status,
                    safety_region_percent,
                },
            )
        })
        .collect();

    let dispatch_plan = (0..input.horizon)
        .map(|k| {
            let mut generation = IndexMap::new();
            for (name, unit) in &input.operating_units {
                let p = raw.p_op.get(&(name.clone(), k)).copied().unwrap_or(0.0);
                generation.insert(name.clone(), p + unit.p_current);
            }
            for name in input.backup_units.keys() {
                generation.insert(name.clone(), raw.p_bk.get(&(name.clone(), k)).copied().unwrap_or(0.0));
            }
            for name in input.hydro_units.keys() {
                generation.insert(name.clone(), raw.p_hy.get(&(name.clone(), k)).copied().unwrap_or(0.0));
            }
            let storage = input
                .storage_units
                .iter()
                .map(|(name, unit)| {
                    let p = raw.p_es.get(&(name.clone(), k)).copied().unwrap_or(0.0);
                    let soc = raw.soc.get(&(name.clone(), k)).copied().unwrap_or(0.0);
                    (
                        name.clone(),
                        StorageDispatch {
                            power_mw: p + unit.p_current,
                            soc_mwh: soc,
                        },
                    )
                })
                .collect();
            let shedding = input
                .interruptible_loads
                .keys()
                .map(|name| (name.clone(), raw.p_sh.get(&(name.clone(), k)).copied().unwrap_or(0.0)))
                .collect();
            DispatchEntry {
                time: period_label(k),
                generation,
                storage,
                shedding,
            }
        })
        .collect();

    let summary = ResultSummary {
        operation_cost: super::solver::op_cost_value(input, raw),
        safety_region_percent: raw.m_min * 100.0,
        total_operations_count: operations.len(),
    };

    RecoveryResult {
        status: Some("Optimal Solution Found".to_string()),
        objective_value: raw.objective_value,
        summary,
        results: Results {
            time_slots,
            switch_operations,
            final_transformer_assignment,
            final_zone_status,
            final_switch_states,
            initial_sw_states,
            operations,
            dispatch_plan,
        },
    }
}
