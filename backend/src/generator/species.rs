//! Per-population particle sampling
//!
//! Each configured population becomes one [`ParticleSpecies`] holding its
//! ready-built distributions. Sampling never touches shared state: the
//! caller passes in its own generator.

use crate::config::{ConfigError, FlowProfile, SpeciesConfig, MAX_FLOW_COEFFICIENT};
use crate::models::species::mass_of;
use crate::models::{FourMomentum, Particle};
use crate::rng::RngManager;
use rand_distr::{Distribution, Normal, Poisson};
use std::f64::consts::PI;

/// Sampler for one particle population.
#[derive(Debug, Clone)]
pub struct ParticleSpecies {
    pdg: i32,
    mass: f64,
    multiplicity: Poisson<f64>,
    pt_component: Normal<f64>,
    rapidity: Normal<f64>,
    flow: FlowProfile,
}

impl ParticleSpecies {
    /// Build the sampler for a population.
    ///
    /// # Errors
    ///
    /// `ConfigError::UnknownSpecies` for PDG codes without a known mass,
    /// `ConfigError::InvalidSpecies` for parameters the distributions reject.
    pub fn new(config: &SpeciesConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mass = mass_of(config.pdg).ok_or(ConfigError::UnknownSpecies(config.pdg))?;
        let invalid = |e: &dyn std::fmt::Display| ConfigError::InvalidSpecies {
            pdg: config.pdg,
            reason: e.to_string(),
        };

        Ok(Self {
            pdg: config.pdg,
            mass,
            multiplicity: Poisson::new(config.multiplicity_mean).map_err(|e| invalid(&e))?,
            pt_component: Normal::new(config.pt.mean, config.pt.sigma).map_err(|e| invalid(&e))?,
            rapidity: Normal::new(config.rapidity.mean, config.rapidity.sigma)
                .map_err(|e| invalid(&e))?,
            flow: config.flow,
        })
    }

    pub fn pdg(&self) -> i32 {
        self.pdg
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Draw one event's worth of particles of this population.
    pub fn sample(&self, rng: &mut RngManager) -> Vec<Particle> {
        let count = self.multiplicity.sample(rng) as usize;
        (0..count).map(|_| self.sample_particle(rng)).collect()
    }

    fn sample_particle(&self, rng: &mut RngManager) -> Particle {
        let y = self.rapidity.sample(rng);
        let px = self.pt_component.sample(rng);
        let py = self.pt_component.sample(rng);
        let pt = px.hypot(py);
        let phi = sample_phi(self.flow.v1(pt, y), rng);

        Particle::new(self.pdg, FourMomentum::from_pt_y_phi(pt, y, phi, self.mass))
    }
}

/// Azimuth in (-π, π] drawn from dN/dφ ∝ 1 + 2·v1·cos φ.
///
/// Accept-reject against the flat envelope 1 + 2|v1|. Where |v1| > 0.5 the
/// density would go negative; it is clamped to zero there. |v1| is capped
/// at `MAX_FLOW_COEFFICIENT`, where the shape has already converged to
/// max(0, cos φ), and a NaN v1 samples isotropically.
pub fn sample_phi(v1: f64, rng: &mut RngManager) -> f64 {
    let v1 = if v1.is_nan() {
        0.0
    } else {
        v1.clamp(-MAX_FLOW_COEFFICIENT, MAX_FLOW_COEFFICIENT)
    };
    let envelope = 1.0 + 2.0 * v1.abs();
    loop {
        let phi = PI - 2.0 * PI * rng.next_f64();
        let density = (1.0 + 2.0 * v1 * phi.cos()).max(0.0);
        if rng.next_f64() * envelope < density {
            return phi;
        }
    }
}
