//! Orchestrator Engine
//!
//! Wires one run together:
//!
//! ```text
//! 1. Validate config and hash it for provenance
//! 2. Build the shared RunContext (populations + reaction-plane stream)
//! 3. Build one EventGenerator per producer, each on its own stream
//! 4. Build the FlowAnalyzer on its own stream
//! 5. Run the EventPool to the quota and collect the results
//! ```
//!
//! Every stream is derived from the single `rng_seed`, so a config fully
//! determines which draws each producer makes. Which producer's events
//! reach the analyzer first is up to the scheduler.
//!
//! # Example
//!
//! ```rust
//! use flow_simulator_core_rs::config::SimulationConfig;
//! use flow_simulator_core_rs::orchestrator::Orchestrator;
//!
//! let config = SimulationConfig::default()
//!     .with_target_events(20)
//!     .with_producer_count(2);
//!
//! let report = Orchestrator::new(config).unwrap().run().unwrap();
//! assert_eq!(report.summary.analyzed, 20);
//! assert_eq!(report.results.events_analyzed, 20);
//! ```

use crate::analysis::{AnalysisError, FlowAnalyzer, FlowResults};
use crate::config::{compute_config_hash, ConfigError, SimulationConfig};
use crate::generator::{EventGenerator, RunContext};
use crate::pipeline::{EventPool, PipelineError, RunSummary};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Stream numbers handed to `RngManager::derive`
const ANALYZER_STREAM: u64 = 0;
const ORIENTATION_STREAM: u64 = 1;
const FIRST_PRODUCER_STREAM: u64 = 2;

/// Errors that can end a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Analyzer finished without producing results")]
    MissingResults,
}

/// Everything a completed run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub summary: RunSummary,
    pub results: FlowResults,
}

/// Simulation driver
pub struct Orchestrator {
    config: SimulationConfig,
    run_id: Uuid,
    config_hash: String,
    pool: EventPool,
    generators: Vec<EventGenerator>,
    analyzer: FlowAnalyzer,
}

impl Orchestrator {
    /// Create an orchestrator from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - ready to run
    /// * `Err(SimulationError)` - configuration validation failed
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = compute_config_hash(&config)?;
        let run_id = Uuid::new_v4();
        let seed = config.rng_seed;

        let context = Arc::new(RunContext::new(
            &config.species,
            RngManager::derive(seed, ORIENTATION_STREAM),
        )?);
        let generators = (0..config.producer_count as u64)
            .map(|i| {
                EventGenerator::new(
                    Arc::clone(&context),
                    RngManager::derive(seed, FIRST_PRODUCER_STREAM + i),
                )
            })
            .collect();
        let analyzer = FlowAnalyzer::new(
            config.analysis.clone(),
            RngManager::derive(seed, ANALYZER_STREAM),
        )?
        .with_provenance(run_id, config_hash.clone());
        let pool = EventPool::with_config(config.target_events, config.pool);

        info!(
            %run_id,
            config_hash = %config_hash,
            target_events = config.target_events,
            producers = config.producer_count,
            species = config.species.len(),
            seed,
            "Simulation configured"
        );

        Ok(Self {
            config,
            run_id,
            config_hash,
            pool,
            generators,
            analyzer,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn pool(&self) -> &EventPool {
        &self.pool
    }

    /// Run the pipeline to the configured quota.
    pub fn run(self) -> Result<SimulationReport, SimulationError> {
        let Orchestrator {
            pool,
            generators,
            mut analyzer,
            ..
        } = self;

        let summary = pool.run(generators, &mut analyzer)?;
        let results = analyzer
            .into_results()
            .ok_or(SimulationError::MissingResults)?;

        Ok(SimulationReport { summary, results })
    }
}
