//! Core types for Zwiesprache: dialogue graphs, flag values, and flag stores.
//!
//! This crate is plain data. It knows how flags are named and stored and how
//! a dialogue graph is shaped on the wire, but nothing about playing one;
//! that lives in `zw-runner`.

/// Side-effecting actions attached to nodes and choices.
pub mod action;
/// Boolean conditions and comparison operators.
pub mod condition;
/// Error types used throughout the crate.
pub mod error;
/// Dialogue graphs, nodes, and choices.
pub mod graph;
/// Flag scope resolution (`conv:` / `game:` prefixes).
pub mod scope;
/// The flag store trait and its in-memory implementation.
pub mod store;
/// Advisory structural validation of graphs.
pub mod validate;
/// Flag values.
pub mod value;

pub use action::Action;
pub use condition::{Check, Condition, Operator};
pub use error::{ZwError, ZwResult};
pub use graph::{Choice, DialogueGraph, Node};
pub use scope::{FlagRef, FlagScope, resolve};
pub use store::{FlagMap, FlagStore, MemoryFlagStore};
pub use validate::{Severity, ValidationIssue, validate_graph};
pub use value::FlagValue;
