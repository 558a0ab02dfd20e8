//! Run-wide sampling context
//!
//! Holds what every producer reads during a run: the validated particle
//! populations and the single shared reaction-plane generator. Producers
//! receive an `Arc<RunContext>` when they are built; there is no global.

use crate::config::{ConfigError, SpeciesConfig};
use crate::generator::species::ParticleSpecies;
use crate::models::species::name_of;
use crate::models::Particle;
use crate::rng::{RngManager, SharedRng};
use std::f64::consts::PI;
use tracing::debug;

/// Shared, read-mostly parameters of one run.
///
/// # Example
///
/// ```rust
/// use flow_simulator_core_rs::config::SimulationConfig;
/// use flow_simulator_core_rs::generator::RunContext;
/// use flow_simulator_core_rs::RngManager;
///
/// let config = SimulationConfig::default();
/// let context = RunContext::new(&config.species, RngManager::new(1)).unwrap();
///
/// let psi = context.sample_orientation();
/// assert!(psi > -std::f64::consts::PI && psi <= std::f64::consts::PI);
/// ```
#[derive(Debug)]
pub struct RunContext {
    species: Vec<ParticleSpecies>,

    /// Reaction-plane stream shared by all producers
    orientation: SharedRng,
}

impl RunContext {
    /// Build the context from population configs and the orientation stream.
    pub fn new(species: &[SpeciesConfig], orientation_rng: RngManager) -> Result<Self, ConfigError> {
        if species.is_empty() {
            return Err(ConfigError::NoSpecies);
        }
        let species = species
            .iter()
            .map(ParticleSpecies::new)
            .collect::<Result<Vec<_>, _>>()?;
        for population in &species {
            debug!(
                species = name_of(population.pdg()),
                pdg = population.pdg(),
                mass = population.mass(),
                "Population configured"
            );
        }

        Ok(Self {
            species,
            orientation: SharedRng::new(orientation_rng),
        })
    }

    /// Draw a reaction-plane angle uniformly in (-π, π].
    ///
    /// Safe to call from any number of producers at once.
    pub fn sample_orientation(&self) -> f64 {
        PI - 2.0 * PI * self.orientation.next_f64()
    }

    pub fn species(&self) -> &[ParticleSpecies] {
        &self.species
    }

    /// Draw particles of population `index` with the caller's generator.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn sample_particles(&self, index: usize, rng: &mut RngManager) -> Option<Vec<Particle>> {
        self.species.get(index).map(|species| species.sample(rng))
    }
}
