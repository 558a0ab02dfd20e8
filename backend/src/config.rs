//! Run configuration
//!
//! Everything a run needs is fixed before the pipeline starts: quota,
//! producer count, seed, the particle populations to sample and the
//! analysis cuts. Configurations are plain serde structs, so a run can be
//! described in JSON and hashed for provenance.
//!
//! # Example
//!
//! ```rust
//! use flow_simulator_core_rs::config::SimulationConfig;
//!
//! let config = SimulationConfig::default()
//!     .with_target_events(1_000)
//!     .with_producer_count(4);
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::models::species::mass_of;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted Poisson mean for a population's multiplicity
pub const MAX_MULTIPLICITY_MEAN: f64 = 1.0e6;

/// Largest accepted |v1| or |amplitude| in a flow profile
pub const MAX_FLOW_COEFFICIENT: f64 = 1.0e6;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("producer_count must be at least 1")]
    NoProducers,

    #[error("At least one species must be configured")]
    NoSpecies,

    #[error("Unknown PDG code {0}")]
    UnknownSpecies(i32),

    #[error("Species {pdg}: {reason}")]
    InvalidSpecies { pdg: i32, reason: String },

    #[error("Invalid analysis config: {0}")]
    InvalidAnalysis(String),

    #[error("Invalid pool config: {0}")]
    InvalidPool(String),
}

/// Mean and standard deviation of a normal distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub sigma: f64,
}

impl NormalParams {
    pub fn new(mean: f64, sigma: f64) -> Self {
        Self { mean, sigma }
    }
}

/// Directed-flow dependence v1(pT, y) of a population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowProfile {
    /// Isotropic emission
    None,

    /// Same v1 for every particle
    Constant { v1: f64 },

    /// v1 = amplitude · y · pT
    LinearPtRapidity { amplitude: f64 },
}

impl FlowProfile {
    /// Evaluate v1 at the given transverse momentum and rapidity.
    pub fn v1(&self, pt: f64, rapidity: f64) -> f64 {
        match self {
            FlowProfile::None => 0.0,
            FlowProfile::Constant { v1 } => *v1,
            FlowProfile::LinearPtRapidity { amplitude } => amplitude * rapidity * pt,
        }
    }
}

/// One sampled particle population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// PDG species code
    pub pdg: i32,

    /// Poisson mean of the per-event multiplicity
    pub multiplicity_mean: f64,

    /// Distribution of each transverse momentum component (px, py)
    pub pt: NormalParams,

    /// Rapidity distribution
    pub rapidity: NormalParams,

    pub flow: FlowProfile,
}

impl SpeciesConfig {
    /// Check parameters against what the samplers accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if mass_of(self.pdg).is_none() {
            return Err(ConfigError::UnknownSpecies(self.pdg));
        }
        let invalid = |reason: &str| ConfigError::InvalidSpecies {
            pdg: self.pdg,
            reason: reason.to_string(),
        };
        if !(self.multiplicity_mean > 0.0 && self.multiplicity_mean <= MAX_MULTIPLICITY_MEAN) {
            return Err(invalid(&format!(
                "multiplicity_mean must be in (0, {}]",
                MAX_MULTIPLICITY_MEAN
            )));
        }
        for (label, params) in [("pt", &self.pt), ("rapidity", &self.rapidity)] {
            if !params.mean.is_finite() || !params.sigma.is_finite() || params.sigma < 0.0 {
                return Err(invalid(&format!(
                    "{} distribution needs finite mean and non-negative sigma",
                    label
                )));
            }
        }
        let coefficient = match self.flow {
            FlowProfile::None => 0.0,
            FlowProfile::Constant { v1 } => v1,
            FlowProfile::LinearPtRapidity { amplitude } => amplitude,
        };
        if !(coefficient.abs() <= MAX_FLOW_COEFFICIENT) {
            return Err(invalid(&format!(
                "flow coefficient must be finite with magnitude at most {}",
                MAX_FLOW_COEFFICIENT
            )));
        }
        Ok(())
    }
}

/// Cuts and binning used by the flow analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Species whose v1 is measured
    pub probe_pdg: i32,

    /// Minimum pT (exclusive) for probe particles
    pub probe_min_pt: f64,

    /// Species building the reference Q-vector
    pub reference_pdg: i32,

    /// Minimum rapidity (inclusive) for reference particles
    pub reference_min_rapidity: f64,

    /// Fraction of reference particles kept in the sub-sampled Q-vector
    pub subsample_fraction: f64,

    pub rapidity_bins: usize,
    pub rapidity_min: f64,
    pub rapidity_max: f64,

    /// Where to write results as JSON; nothing is written when unset
    pub output_path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            probe_pdg: 2212,
            probe_min_pt: 0.5,
            reference_pdg: 2112,
            reference_min_rapidity: 0.9,
            subsample_fraction: 0.025,
            rapidity_bins: 20,
            rapidity_min: -1.0,
            rapidity_max: 1.0,
            output_path: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.subsample_fraction > 0.0 && self.subsample_fraction <= 1.0) {
            return Err(ConfigError::InvalidAnalysis(format!(
                "subsample_fraction {} outside (0, 1]",
                self.subsample_fraction
            )));
        }
        if self.rapidity_bins == 0 {
            return Err(ConfigError::InvalidAnalysis(
                "rapidity_bins must be positive".to_string(),
            ));
        }
        if !(self.rapidity_min < self.rapidity_max) {
            return Err(ConfigError::InvalidAnalysis(format!(
                "rapidity range [{}, {}) is empty",
                self.rapidity_min, self.rapidity_max
            )));
        }
        Ok(())
    }
}

/// How the consumer waits while the queue is momentarily empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PollStrategy {
    /// Hot spin with a CPU relax hint
    Spin,

    /// Yield the time slice between polls
    #[default]
    Yield,

    /// Sleep between polls
    Sleep { micros: u64 },
}

/// Event pool tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub poll: PollStrategy,

    /// Log progress every this many analyzed events (0 disables)
    pub progress_interval: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            poll: PollStrategy::default(),
            progress_interval: 10_000,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of events to analyze
    pub target_events: usize,

    /// Number of parallel event producers
    pub producer_count: usize,

    /// Master seed; producer and analyzer streams are derived from it
    pub rng_seed: u64,

    pub species: Vec<SpeciesConfig>,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub pool: PoolConfig,
}

impl Default for SimulationConfig {
    /// Protons and neutrons, each as a central fireball plus forward and
    /// backward spectator populations, all with v1 = 0.5·y·pT.
    fn default() -> Self {
        let flow = FlowProfile::LinearPtRapidity { amplitude: 0.5 };
        let population = |pdg: i32, mean: f64, pt_sigma: f64, y: NormalParams| SpeciesConfig {
            pdg,
            multiplicity_mean: mean,
            pt: NormalParams::new(0.0, pt_sigma),
            rapidity: y,
            flow,
        };

        Self {
            target_events: 1_000_000,
            producer_count: 4,
            rng_seed: 12345,
            species: vec![
                population(2212, 50.0, 0.5, NormalParams::new(0.0, 0.5)),
                population(2212, 25.0, 0.1, NormalParams::new(1.0, 0.1)),
                population(2212, 25.0, 0.1, NormalParams::new(-1.0, 0.1)),
                population(2112, 100.0, 0.5, NormalParams::new(0.0, 0.5)),
                population(2112, 50.0, 0.1, NormalParams::new(1.0, 0.1)),
                population(2112, 50.0, 0.1, NormalParams::new(-1.0, 0.1)),
            ],
            analysis: AnalysisConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_target_events(mut self, target_events: usize) -> Self {
        self.target_events = target_events;
        self
    }

    pub fn with_producer_count(mut self, producer_count: usize) -> Self {
        self.producer_count = producer_count;
        self
    }

    pub fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.analysis.output_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producer_count == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.species.is_empty() {
            return Err(ConfigError::NoSpecies);
        }
        for species in &self.species {
            species.validate()?;
        }
        self.analysis.validate()?;
        if let PollStrategy::Sleep { micros: 0 } = self.pool.poll {
            return Err(ConfigError::InvalidPool(
                "sleep poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compute a deterministic SHA256 hash of a configuration
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, ConfigError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical_value = canonicalize(serde_json::to_value(config)?);
    let json = serde_json::to_string(&canonical_value)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
