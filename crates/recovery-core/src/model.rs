//! Typed, validated description of the grid and planning horizon (C1).
//!
//! These types are the wire format: they derive `Serialize`/`Deserialize`
//! directly against the field names of the external input record, so
//! there is no separate DTO layer between what a caller writes on disk
//! and what the solver consumes. Ordering of the switch/resource maps
//! matters — the switching-order synthesizer iterates breakers "in
//! input declaration order" — so every map here is an [`IndexMap`]
//! rather than a [`std::collections::HashMap`].

use crate::diagnostics::Diagnostics;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A supply area external to the modeled substation, backed by one or
/// more zone-line feeders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Secure supply ceiling of the zone, in MW.
    pub capacity: f64,
    /// Forecast load for each period of the horizon, in MW.
    pub fixed_load: Vec<f64>,
}

/// A transformer drawing load from one of its candidate supply zones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    /// Substation node the transformer is physically connected to.
    pub conn_node: String,
    /// Load forecast for each period of the horizon, in MW.
    pub load: Vec<f64>,
    /// Per-zone sensitivity scalar (`σ_t,z`).
    pub sensitivity: IndexMap<String, f64>,
    /// Per-zone cost scalar used by `MIN_COST`.
    pub cost: IndexMap<String, f64>,
    /// If set, the zone assignment is not optimized but fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocate: Option<String>,
}

/// A feeder edge linking a zone to a substation node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneLine {
    pub zone: String,
    pub conn_node: String,
    pub available: bool,
}

/// Whether a switch can interrupt load current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchKind {
    /// Able to interrupt current under load.
    Breaker,
    /// A visible-gap switch that must be operated de-energized.
    Isolator,
}

/// A switching device joining two substation nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub nodes: (String, String),
    /// `0` (open) or `1` (closed).
    pub initial_state: u8,
    pub cost: f64,
    pub available: bool,
    pub switch_type: SwitchKind,
}

impl Switch {
    pub fn is_closed(&self) -> bool {
        self.initial_state != 0
    }
}

/// A zone-tied generator whose output can be redispatched above its
/// current set point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingUnit {
    pub zone: String,
    pub p_min: f64,
    pub p_max: f64,
    pub p_current: f64,
    pub cost: f64,
    pub sensitivity: f64,
}

/// A zone-tied unit that is offline until started, with a startup delay
/// of one period before it can ramp to `p_max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupUnit {
    pub zone: String,
    pub p_min: f64,
    pub p_max: f64,
    pub cost: f64,
    pub startup_cost: f64,
    pub sensitivity: f64,
    pub available: bool,
}

/// A zone-tied unit with no startup delay but no ramp floor either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydroUnit {
    pub zone: String,
    pub p_max: f64,
    pub cost: f64,
    pub sensitivity: f64,
    pub available: bool,
}

/// A zone-tied battery. `p_current` is signed: positive discharges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUnit {
    pub zone: String,
    pub p_charge_max: f64,
    pub p_discharge_max: f64,
    pub soc_min: f64,
    pub soc_max: f64,
    pub soc_initial: f64,
    pub p_current: f64,
    pub sensitivity: f64,
}

/// A zone-tied load that may be shed, at a cost, up to `shed_max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptibleLoad {
    pub zone: String,
    pub shed_max: f64,
    pub cost: f64,
    pub sensitivity: f64,
}

/// Selects the primary term of the objective (§4.7); the lexicographic
/// tie-breaker and the shedding penalty are added regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    MinimizeSwitchOperation,
    MaximizeSafetyRegion,
    MinimizeGenCost,
}

/// The complete, typed description of one solve: grid topology,
/// horizon, controllable resources, and the requested objective.
///
/// Inputs are immutable for the duration of one solve; nothing here is
/// mutated once [`OptimizationInput::validate`] has been checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub horizon: usize,
    pub zones: IndexMap<String, Zone>,
    pub substation_nodes: Vec<String>,
    pub transformers: IndexMap<String, Transformer>,
    pub zone_lines: IndexMap<String, ZoneLine>,
    pub switches: IndexMap<String, Switch>,
    #[serde(default)]
    pub operating_units: IndexMap<String, OperatingUnit>,
    #[serde(default)]
    pub backup_units: IndexMap<String, BackupUnit>,
    #[serde(default)]
    pub hydro_units: IndexMap<String, HydroUnit>,
    #[serde(default)]
    pub storage_units: IndexMap<String, StorageUnit>,
    #[serde(default)]
    pub interruptible_loads: IndexMap<String, InterruptibleLoad>,
    pub objective: Objective,
}

impl OptimizationInput {
    /// Parse an input record from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, crate::error::CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    fn node_exists(&self, node: &str) -> bool {
        self.substation_nodes.iter().any(|n| n == node)
    }

    fn zone_exists(&self, zone: &str) -> bool {
        self.zones.contains_key(zone)
    }

    /// Check every invariant in the data model and collect every
    /// violation; never stops at the first one (validation is eager and
    /// total — see §7 of the design notes).
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();

        if self.horizon < 1 {
            diag.add_error("validation", "horizon must be >= 1");
        }

        for (name, zone) in &self.zones {
            if zone.fixed_load.len() != self.horizon {
                diag.add_error_with_entity(
                    "validation",
                    &format!(
                        "fixed_load has {} entries, expected horizon {}",
                        zone.fixed_load.len(),
                        self.horizon
                    ),
                    name,
                );
            }
            if zone.capacity < 0.0 {
                diag.add_error_with_entity("validation", "capacity must be >= 0", name);
            }
        }

        for node in &self.substation_nodes {
            if node.trim().is_empty() {
                diag.add_error("validation", "substation_nodes contains an empty name");
            }
        }

        for (name, switch) in &self.switches {
            let (ref n1, ref n2) = switch.nodes;
            if !self.node_exists(n1) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("switch endpoint '{n1}' is not a known substation node"),
                    name,
                );
            }
            if !self.node_exists(n2) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("switch endpoint '{n2}' is not a known substation node"),
                    name,
                );
            }
            if switch.initial_state > 1 {
                diag.add_error_with_entity("validation", "initial_state must be 0 or 1", name);
            }
            if switch.cost < 0.0 {
                diag.add_error_with_entity("validation", "cost must be >= 0", name);
            }
        }

        for (name, line) in &self.zone_lines {
            if !self.node_exists(&line.conn_node) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("conn_node '{}' is not a known substation node", line.conn_node),
                    name,
                );
            }
            if !self.zone_exists(&line.zone) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("zone '{}' is not a known zone", line.zone),
                    name,
                );
            }
        }

        for (name, transformer) in &self.transformers {
            if !self.node_exists(&transformer.conn_node) {
                diag.add_error_with_entity(
                    "reference",
                    &format!(
                        "conn_node '{}' is not a known substation node",
                        transformer.conn_node
                    ),
                    name,
                );
            }
            if transformer.load.len() != self.horizon {
                diag.add_error_with_entity(
                    "validation",
                    &format!(
                        "load has {} entries, expected horizon {}",
                        transformer.load.len(),
                        self.horizon
                    ),
                    name,
                );
            }
            for zone in transformer.sensitivity.keys() {
                if !self.zone_exists(zone) {
                    diag.add_error_with_entity(
                        "reference",
                        &format!("sensitivity references unknown zone '{zone}'"),
                        name,
                    );
                }
            }
            if let Some(zone) = &transformer.allocate {
                if !self.zone_exists(zone) {
                    diag.add_error_with_entity(
                        "reference",
                        &format!("allocate references unknown zone '{zone}'"),
                        name,
                    );
                }
            }
        }

        for (name, unit) in &self.operating_units {
            if !self.zone_exists(&unit.zone) {
                diag.add_error_with_entity("reference", "unknown zone", name);
            }
            if unit.p_min > unit.p_max {
                diag.add_error_with_entity("validation", "p_min > p_max", name);
            }
        }

        for (name, unit) in &self.backup_units {
            if !self.zone_exists(&unit.zone) {
                diag.add_error_with_entity("reference", "unknown zone", name);
            }
            if unit.p_min > unit.p_max {
                diag.add_error_with_entity("validation", "p_min > p_max", name);
            }
        }

        for (name, unit) in &self.hydro_units {
            if !self.zone_exists(&unit.zone) {
                diag.add_error_with_entity("reference", "unknown zone", name);
            }
            if unit.p_max < 0.0 {
                diag.add_error_with_entity("validation", "p_max must be >= 0", name);
            }
        }

        for (name, unit) in &self.storage_units {
            if !self.zone_exists(&unit.zone) {
                diag.add_error_with_entity("reference", "unknown zone", name);
            }
            if !(unit.soc_min <= unit.soc_initial && unit.soc_initial <= unit.soc_max) {
                diag.add_error_with_entity(
                    "validation",
                    "soc_min <= soc_initial <= soc_max violated",
                    name,
                );
            }
        }

        for (name, load) in &self.interruptible_loads {
            if !self.zone_exists(&load.zone) {
                diag.add_error_with_entity("reference", "unknown zone", name);
            }
            if load.shed_max < 0.0 {
                diag.add_error_with_entity("validation", "shed_max must be >= 0", name);
            }
        }

        diag
    }
}
