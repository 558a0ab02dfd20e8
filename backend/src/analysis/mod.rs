//! Directed-flow analysis
//!
//! The analyzer consumes events one at a time on the pipeline's analyzer
//! thread and derives v1 versus rapidity three ways:
//!
//! - **RP**: relative to the true reaction plane, <cos φ · cos Ψ_RP> × 2
//! - **SP**: scalar product with the reference Q-vector, divided by its
//!   resolution <Qx · cos Ψ_RP>
//! - **half**: as SP with a randomly sub-sampled reference Q-vector
//!
//! Differences between RP and the scalar-product estimates measure the
//! non-flow contribution of momentum conservation.
//!
//! # Example
//!
//! ```rust
//! use flow_simulator_core_rs::analysis::FlowAnalyzer;
//! use flow_simulator_core_rs::config::AnalysisConfig;
//! use flow_simulator_core_rs::models::Event;
//! use flow_simulator_core_rs::pipeline::EventAnalyzer;
//! use flow_simulator_core_rs::RngManager;
//!
//! let mut analyzer = FlowAnalyzer::new(AnalysisConfig::default(), RngManager::new(7)).unwrap();
//! analyzer.analyze(&Event::new(0.0, Vec::new()));
//! analyzer.finalize().unwrap();
//!
//! assert_eq!(analyzer.results().unwrap().events_analyzed, 1);
//! ```

pub mod histogram;
pub mod results;
pub mod vectors;

pub use results::FlowResults;

use crate::config::{AnalysisConfig, ConfigError};
use crate::models::{Event, Particle};
use crate::pipeline::EventAnalyzer;
use crate::rng::RngManager;
use histogram::{Binning, Histogram1D, Profile1D};
use results::ProfileSummary;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use vectors::{MeanAccumulator, QVector, UnitVector};

/// Errors raised by the flow analyzer
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analyzer already finalized")]
    AlreadyFinalized,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to access results file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Directed-flow analyzer
pub struct FlowAnalyzer {
    config: AnalysisConfig,

    /// Stream for the reference sub-sampling
    rng: RngManager,

    run_id: Uuid,
    config_hash: Option<String>,

    v1_rp: Profile1D,
    v1_sp: Profile1D,
    v1_half: Profile1D,
    rapidity: Histogram1D,
    pt: Histogram1D,

    resolution_sp: MeanAccumulator,
    resolution_half: MeanAccumulator,

    events_analyzed: usize,
    finalized: bool,
    results: Option<FlowResults>,
}

impl FlowAnalyzer {
    /// Create an analyzer with the given cuts and sub-sampling stream.
    pub fn new(config: AnalysisConfig, rng: RngManager) -> Result<Self, AnalysisError> {
        config.validate()?;
        let rapidity_binning =
            Binning::new(config.rapidity_bins, config.rapidity_min, config.rapidity_max);

        Ok(Self {
            rng,
            run_id: Uuid::new_v4(),
            config_hash: None,
            v1_rp: Profile1D::new("v1_psi_rp", rapidity_binning),
            v1_sp: Profile1D::new("v1_psi_sp", rapidity_binning),
            v1_half: Profile1D::new("v1_half", rapidity_binning),
            rapidity: Histogram1D::new("h1_y", Binning::new(200, -2.0, 2.0)),
            pt: Histogram1D::new("h1_pT", Binning::new(300, 0.0, 3.0)),
            resolution_sp: MeanAccumulator::default(),
            resolution_half: MeanAccumulator::default(),
            events_analyzed: 0,
            finalized: false,
            results: None,
            config,
        })
    }

    /// Tag the results with the run identity.
    pub fn with_provenance(mut self, run_id: Uuid, config_hash: impl Into<String>) -> Self {
        self.run_id = run_id;
        self.config_hash = Some(config_hash.into());
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn events_analyzed(&self) -> usize {
        self.events_analyzed
    }

    /// Results, available once `finalize` has succeeded
    pub fn results(&self) -> Option<&FlowResults> {
        self.results.as_ref()
    }

    pub fn into_results(self) -> Option<FlowResults> {
        self.results
    }

    fn is_probe(&self, particle: &Particle) -> bool {
        particle.pdg() == self.config.probe_pdg
            && particle.momentum().pt() > self.config.probe_min_pt
    }

    fn is_reference(&self, particle: &Particle) -> bool {
        particle.pdg() == self.config.reference_pdg
            && particle.momentum().rapidity() >= self.config.reference_min_rapidity
    }
}

/// A resolution usable as a divisor
fn usable(resolution: Option<f64>) -> Option<f64> {
    resolution.filter(|r| r.is_finite() && *r != 0.0)
}

impl EventAnalyzer for FlowAnalyzer {
    type Error = AnalysisError;

    fn analyze(&mut self, event: &Event) {
        let psi = UnitVector::new(event.reaction_plane());
        let mut full = QVector::default();
        let mut half = QVector::default();

        for particle in event.particles() {
            let momentum = particle.momentum();
            let y = momentum.rapidity();
            self.rapidity.fill(y);
            self.pt.fill(momentum.pt());

            let u = UnitVector::new(momentum.phi());
            if self.is_probe(particle) {
                self.v1_rp.fill(y, u.x(1) * psi.x(1));
            }
            if !self.is_reference(particle) {
                continue;
            }
            full.fill(&u);
            if self.rng.next_f64() < self.config.subsample_fraction {
                half.fill(&u);
            }
        }

        self.resolution_sp.fill(full.x(1) * psi.x(1));
        self.resolution_half.fill(half.x(1) * psi.x(1));

        for particle in event.particles() {
            if !self.is_probe(particle) {
                continue;
            }
            let momentum = particle.momentum();
            let y = momentum.rapidity();
            let u = UnitVector::new(momentum.phi());
            self.v1_sp.fill(y, u.x(1) * full.x(1));
            self.v1_half.fill(y, u.x(1) * half.x(1));
        }

        self.events_analyzed += 1;
    }

    fn finalize(&mut self) -> Result<(), AnalysisError> {
        // Rescaling below is not idempotent
        if self.finalized {
            return Err(AnalysisError::AlreadyFinalized);
        }
        self.finalized = true;

        // Only the x projection enters the RP estimate: <cos φ cos Ψ> = v1 / 2
        self.v1_rp.scale(2.0);

        let resolution_sp = self.resolution_sp.mean();
        let resolution_half = self.resolution_half.mean();
        match usable(resolution_sp) {
            Some(r) => self.v1_sp.scale(1.0 / r),
            None => warn!(?resolution_sp, "Full Q-vector resolution unusable, v1{{SP}} left uncorrected"),
        }
        match usable(resolution_half) {
            Some(r) => self.v1_half.scale(1.0 / r),
            None => warn!(?resolution_half, "Sub-sample resolution unusable, v1{{half}} left uncorrected"),
        }
        let resolution_ratio = resolution_sp.zip(usable(resolution_half)).map(|(a, b)| a / b);

        let v1_rp = self.v1_rp.summary();
        let v1_sp = self.v1_sp.summary();
        let v1_half = self.v1_half.summary();
        let results = FlowResults {
            run_id: self.run_id,
            config_hash: self.config_hash.clone(),
            events_analyzed: self.events_analyzed,
            resolution_sp,
            resolution_half,
            resolution_ratio,
            nonflow_sp: ProfileSummary::difference("nf_full", &v1_rp, &v1_sp),
            nonflow_half: ProfileSummary::difference("nf_half", &v1_rp, &v1_half),
            v1_rp,
            v1_sp,
            v1_half,
            rapidity: self.rapidity.summary(),
            pt: self.pt.summary(),
        };

        info!(
            events = self.events_analyzed,
            ?resolution_sp,
            ?resolution_half,
            ?resolution_ratio,
            "Flow analysis finalized"
        );

        if let Some(path) = &self.config.output_path {
            results.write_json(path)?;
            info!(path = %path.display(), "Results written");
        }

        self.results = Some(results);
        Ok(())
    }
}
