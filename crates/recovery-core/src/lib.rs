//! Typed input model and topology graph for the post-fault recovery
//! planner.
//!
//! This crate owns C1 (the validated description of the grid and
//! horizon, [`model`]) and C2 (the substation switching graph and its
//! island decomposition, [`topology`]), plus the error and diagnostics
//! infrastructure shared with `recovery-solver`. It has no solver
//! dependency and no knowledge of the MILP; `recovery-solver` is the
//! only consumer of both modules.

pub mod diagnostics;
pub mod error;
pub mod model;
pub mod topology;

pub use error::{CoreError, CoreResult};
pub use model::{
    BackupUnit, HydroUnit, InterruptibleLoad, Objective, OperatingUnit, OptimizationInput,
    StorageUnit, Switch, SwitchKind, Transformer, Zone, ZoneLine,
};
pub use topology::{Islands, SwitchEdge, TopologyGraph};
