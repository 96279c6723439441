//! Amplifier pipelines built from Intcode machines.
//!
//! # Modules
//!
//! - [`amplifier`]: Linear and ring orchestration of one program over a phase list
//! - [`errors`]: Orchestration error types
//! - [`search`]: Searches over phase permutations and noun/verb patches

pub mod amplifier;
pub mod errors;
pub mod search;

pub use amplifier::{Pipeline, Topology, run_linear, run_ring};
pub use errors::PipelineError;
pub use search::{best_over_permutations, find_noun_verb};
