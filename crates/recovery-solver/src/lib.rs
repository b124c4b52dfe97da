//! Dynamic recovery optimizer: the MILP that jointly decides switch
//! positions, zone-of-supply assignment and time-indexed dispatch
//! after a fault, plus the switching-order synthesizer that turns the
//! solved target switch positions into a physically legal operation
//! sequence.
//!
//! [`recovery`] owns the whole pipeline from a validated
//! [`recovery_core::OptimizationInput`] to an assembled
//! [`recovery::RecoveryResult`]: variable declaration, constraint
//! building, objective composition, the solver call itself, and result
//! assembly. `recovery-core` supplies the typed input and the
//! switching graph; this crate has no knowledge of how inputs arrive
//! or how results are served.

pub mod recovery;

pub use recovery::{
    assemble_result, sequence_for, solve_recovery, synthesize_sequence, RawSolution,
    RecoveryError, RecoveryResult, RecoverySolverConfig,
};
