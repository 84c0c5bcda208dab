//! # vtquery Planner
//!
//! Column type inference for expression columns, built on the engine's
//! `EXPLAIN` and `EXPLAIN QUERY PLAN` output.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of vtquery.**
//!
//! Users should depend on the main `vtquery` crate instead, which decides
//! when a planner is needed. This crate's API may change without notice
//! between minor versions.

#![warn(clippy::all)]

pub mod opcodes;
pub mod planner;
pub mod program;

pub use opcodes::{Effect, OpcodeRule, Operand, OPCODE_RULES};
pub use planner::{QueryPlanner, RegisterTypes};
pub use program::{QueryProgram, SchemaTypes, Step, TableScanOrder};
