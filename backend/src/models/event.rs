//! Collision event model
//!
//! One simulated collision: the reaction-plane orientation it was rotated by
//! and the particles it produced. Events are created by a producer, moved
//! through the pool and consumed by the analyzer; they are never shared.
//!
//! # Example
//!
//! ```rust
//! use flow_simulator_core_rs::models::{Event, FourMomentum, Particle};
//!
//! let event = Event::new(
//!     0.3,
//!     vec![Particle::new(2212, FourMomentum::new(0.2, 0.1, 0.5, 0.938))],
//! );
//!
//! assert_eq!(event.multiplicity(), 1);
//! println!("Event {} at psi = {}", event.id(), event.reaction_plane());
//! ```

use crate::models::particle::Particle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A simulated collision event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier (UUID v4), assigned at construction
    id: Uuid,

    /// Reaction-plane angle in radians, (-π, π]
    reaction_plane: f64,

    particles: Vec<Particle>,
}

impl Event {
    /// Create a new event with a fresh identifier.
    pub fn new(reaction_plane: f64, particles: Vec<Particle>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reaction_plane,
            particles,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn reaction_plane(&self) -> f64 {
        self.reaction_plane
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles in the event
    pub fn multiplicity(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
