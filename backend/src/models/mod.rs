//! Domain models for the flow simulator

pub mod event;
pub mod particle;
pub mod species;

// Re-exports
pub use event::Event;
pub use particle::{FourMomentum, Particle};
