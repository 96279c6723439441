//! Intcode library.
//!
//! Provides the Intcode virtual machine, amplifier pipelines that chain
//! machines together, and searches over their configurations.

pub mod pipeline;
pub mod utils;
pub mod virtual_machine;
