//! Event generation
//!
//! Producers sample collisions from a shared [`RunContext`]:
//!
//! - **context**: validated populations plus the shared reaction-plane stream
//! - **species**: per-population multiplicity, pT, rapidity and azimuth sampling
//! - **sampler**: [`EventGenerator`], one per producer thread
//!
//! Per-particle draws use each generator's own stream; only the
//! reaction-plane angle comes from a single locked generator.

pub mod context;
pub mod sampler;
pub mod species;

pub use context::RunContext;
pub use sampler::EventGenerator;
pub use species::ParticleSpecies;
