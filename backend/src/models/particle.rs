//! Particle model
//!
//! A particle is a species code (PDG numbering) plus a four-momentum stored
//! as (px, py, pz, m). Derived kinematics (pT, azimuth, rapidity) are
//! computed on demand.
//!
//! CRITICAL: Particles are immutable. Transformations return new values.

use serde::{Deserialize, Serialize};

/// Four-momentum in (px, py, pz, mass) representation, GeV units.
///
/// # Example
/// ```
/// use flow_simulator_core_rs::FourMomentum;
///
/// let p = FourMomentum::new(3.0, 4.0, 0.0, 0.938);
/// assert!((p.pt() - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    px: f64,
    py: f64,
    pz: f64,
    mass: f64,
}

impl FourMomentum {
    pub fn new(px: f64, py: f64, pz: f64, mass: f64) -> Self {
        Self { px, py, pz, mass }
    }

    /// Build from transverse momentum, rapidity, azimuth and mass.
    pub fn from_pt_y_phi(pt: f64, rapidity: f64, phi: f64, mass: f64) -> Self {
        let mt = (pt * pt + mass * mass).sqrt();
        Self {
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            pz: mt * rapidity.sinh(),
            mass,
        }
    }

    pub fn px(&self) -> f64 {
        self.px
    }

    pub fn py(&self) -> f64 {
        self.py
    }

    pub fn pz(&self) -> f64 {
        self.pz
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Transverse momentum √(px² + py²)
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Total momentum magnitude
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Azimuthal angle in (-π, π]
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    pub fn energy(&self) -> f64 {
        (self.p().powi(2) + self.mass * self.mass).sqrt()
    }

    /// Longitudinal rapidity ½·ln((E + pz)/(E − pz))
    pub fn rapidity(&self) -> f64 {
        let e = self.energy();
        0.5 * ((e + self.pz) / (e - self.pz)).ln()
    }

    /// Translate the three-momentum, keeping the mass.
    pub fn shifted(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            px: self.px + dx,
            py: self.py + dy,
            pz: self.pz + dz,
            mass: self.mass,
        }
    }

    /// Rotate the transverse components about the beam (z) axis.
    pub fn rotated_z(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            px: self.px * cos - self.py * sin,
            py: self.px * sin + self.py * cos,
            pz: self.pz,
            mass: self.mass,
        }
    }
}

/// A sampled particle
///
/// # Example
/// ```
/// use flow_simulator_core_rs::{FourMomentum, Particle};
///
/// let proton = Particle::new(2212, FourMomentum::new(0.1, 0.0, 0.2, 0.938));
/// assert_eq!(proton.pdg(), 2212);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// PDG species code
    pdg: i32,

    momentum: FourMomentum,
}

impl Particle {
    pub fn new(pdg: i32, momentum: FourMomentum) -> Self {
        Self { pdg, momentum }
    }

    pub fn pdg(&self) -> i32 {
        self.pdg
    }

    pub fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }

    /// Same species, momentum replaced by `f(momentum)`.
    pub fn map_momentum(self, f: impl FnOnce(&FourMomentum) -> FourMomentum) -> Self {
        Self {
            pdg: self.pdg,
            momentum: f(&self.momentum),
        }
    }
}
