//! The dynamic recovery optimizer (C3–C7).
//!
//! ```text
//! vars        (C3 variables, §4.2)
//! constraints (C3 constraints, §4.3–§4.6)
//! objective   (C4, §4.7)
//! solver      (C5, §4.8)
//! result      (C6, §4.9)
//! sequence    (C7, §4.10)
//! ```
//!
//! [`solve_recovery`] drives C3–C5 and returns a [`RawSolution`];
//! [`assemble_result`] and [`sequence_for`] then turn that, plus the
//! input it was solved against, into the result schema of §6. Callers
//! normally only need [`solve_recovery`] followed by the two assembly
//! calls; the individual constraint/objective builders are public so
//! tests can inspect a model before it is solved.

mod constraints;
mod objective;
mod result;
mod sequence;
mod solver;
mod vars;

pub use constraints::build_constraints;
pub use objective::compose_objective;
pub use result::{assemble_result, RecoveryResult};
pub use sequence::{sequence_for, synthesize_sequence};
pub use solver::{solve_recovery, RawSolution, RecoveryError, RecoverySolverConfig};
pub use vars::{build_vars, RecoveryVars};
