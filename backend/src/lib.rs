//! Flow Simulator Core - Rust Engine
//!
//! Concurrent collision-event generator with a directed-flow analysis
//! running on a single consumer thread.
//!
//! # Architecture
//!
//! - **models**: Domain types (Event, Particle, FourMomentum)
//! - **generator**: Event sampling (populations, momentum conservation, rotation)
//! - **pipeline**: EventPool with N producers and one analyzer
//! - **analysis**: Directed-flow estimates (RP, SP, sub-sampled SP)
//! - **orchestrator**: Builds and runs a complete simulation
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every analyzed event was generated exactly once
//! 2. The analyzer sees exactly the required number of events
//! 3. Finalize runs once, after the last analyzed event
//! 4. All physics draws derive from one seed

// Module declarations
pub mod analysis;
pub mod config;
pub mod generator;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod rng;

// Re-exports for convenience
pub use analysis::{AnalysisError, FlowAnalyzer, FlowResults};
pub use config::{compute_config_hash, ConfigError, SimulationConfig};
pub use generator::{EventGenerator, RunContext};
pub use models::{Event, FourMomentum, Particle};
pub use orchestrator::{Orchestrator, SimulationError, SimulationReport};
pub use pipeline::{EventAnalyzer, EventPool, EventProducer, PipelineError, RunSummary};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn flow_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::run_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::default_config, m)?)?;
    Ok(())
}
