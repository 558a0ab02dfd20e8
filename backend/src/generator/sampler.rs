//! Event generator
//!
//! Builds one collision per call:
//!
//! ```text
//! 1. Draw the reaction-plane angle from the shared context
//! 2. Sample every population with this generator's own stream
//! 3. Recenter: subtract the per-particle mean momentum (px, py, pz)
//! 4. Rotate all transverse momenta by the reaction-plane angle
//! ```

use crate::generator::context::RunContext;
use crate::models::{Event, Particle};
use crate::pipeline::EventProducer;
use crate::rng::RngManager;
use std::sync::Arc;

/// Event sampler owned by one producer thread.
///
/// # Example
///
/// ```rust
/// use flow_simulator_core_rs::config::SimulationConfig;
/// use flow_simulator_core_rs::generator::{EventGenerator, RunContext};
/// use flow_simulator_core_rs::RngManager;
/// use std::sync::Arc;
///
/// let config = SimulationConfig::default();
/// let context = Arc::new(RunContext::new(&config.species, RngManager::new(1)).unwrap());
/// let mut generator = EventGenerator::new(context, RngManager::derive(1, 1));
///
/// let event = generator.generate_event();
/// assert!(event.multiplicity() > 0);
/// ```
#[derive(Debug)]
pub struct EventGenerator {
    context: Arc<RunContext>,
    rng: RngManager,
}

impl EventGenerator {
    pub fn new(context: Arc<RunContext>, rng: RngManager) -> Self {
        Self { context, rng }
    }

    /// Sample one complete event.
    pub fn generate_event(&mut self) -> Event {
        let psi = self.context.sample_orientation();

        let mut particles = Vec::new();
        for species in self.context.species() {
            particles.extend(species.sample(&mut self.rng));
        }

        let particles = rotate_z(conserve_momentum(particles), psi);
        Event::new(psi, particles)
    }
}

impl EventProducer for EventGenerator {
    fn produce(&mut self) -> Event {
        self.generate_event()
    }
}

/// Shift every particle by minus the mean three-momentum so the event sums
/// to zero. Particle count and masses are unchanged.
pub fn conserve_momentum(particles: Vec<Particle>) -> Vec<Particle> {
    if particles.is_empty() {
        return particles;
    }

    let n = particles.len() as f64;
    let (sum_x, sum_y, sum_z) = particles.iter().fold((0.0, 0.0, 0.0), |(x, y, z), p| {
        let m = p.momentum();
        (x + m.px(), y + m.py(), z + m.pz())
    });
    let (dx, dy, dz) = (-sum_x / n, -sum_y / n, -sum_z / n);

    particles
        .into_iter()
        .map(|p| p.map_momentum(|m| m.shifted(dx, dy, dz)))
        .collect()
}

/// Rotate every particle's transverse momentum about the beam axis.
pub fn rotate_z(particles: Vec<Particle>, angle: f64) -> Vec<Particle> {
    particles
        .into_iter()
        .map(|p| p.map_momentum(|m| m.rotated_z(angle)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FourMomentum;
    use std::f64::consts::PI;

    fn total_momentum(particles: &[Particle]) -> (f64, f64, f64) {
        particles.iter().fold((0.0, 0.0, 0.0), |(x, y, z), p| {
            let m = p.momentum();
            (x + m.px(), y + m.py(), z + m.pz())
        })
    }

    #[test]
    fn test_conserve_momentum_zeroes_sum() {
        let particles = vec![
            Particle::new(2212, FourMomentum::new(1.0, 0.5, 2.0, 0.938)),
            Particle::new(2112, FourMomentum::new(0.2, -0.1, 0.4, 0.940)),
            Particle::new(2212, FourMomentum::new(-0.3, 0.9, -1.0, 0.938)),
        ];

        let balanced = conserve_momentum(particles);
        let (x, y, z) = total_momentum(&balanced);

        assert_eq!(balanced.len(), 3);
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12 && z.abs() < 1e-12);
        assert_eq!(balanced[1].pdg(), 2112);
        assert_eq!(balanced[1].momentum().mass(), 0.940);
    }

    #[test]
    fn test_conserve_momentum_empty_event() {
        assert!(conserve_momentum(Vec::new()).is_empty());
    }

    #[test]
    fn test_rotate_z_by_pi() {
        let particles = vec![Particle::new(2212, FourMomentum::new(1.0, 0.0, 0.3, 0.938))];
        let rotated = rotate_z(particles, PI);

        let m = rotated[0].momentum();
        assert!((m.px() + 1.0).abs() < 1e-12);
        assert!(m.py().abs() < 1e-12);
        assert_eq!(m.pz(), 0.3);
    }
}
