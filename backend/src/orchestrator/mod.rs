//! Orchestrator - builds and runs a complete simulation
//!
//! See `engine.rs` for the implementation.

pub mod engine;

// Re-export main types for convenience
pub use engine::{Orchestrator, SimulationError, SimulationReport};
