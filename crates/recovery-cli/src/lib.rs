//! Command-line surface for the post-fault recovery planner.
//!
//! This crate is a thin collaborator: it reads an
//! [`recovery_core::OptimizationInput`] from JSON, calls
//! `recovery-solver`, and writes the assembled result back out. It
//! carries no modeling logic of its own.

pub mod cli;
pub mod common;
