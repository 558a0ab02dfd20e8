//! Python bindings
//!
//! Configuration and results cross the boundary as JSON strings, so the
//! Python side needs nothing beyond `json`.
//!
//! ```python
//! import json
//! from flow_simulator_core_rs import default_config, run_simulation
//!
//! config = json.loads(default_config())
//! config["target_events"] = 10_000
//! report = json.loads(run_simulation(json.dumps(config)))
//! print(report["results"]["resolution_sp"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::config::SimulationConfig;
use crate::orchestrator::{Orchestrator, SimulationError};

fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::Config(e) => PyValueError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Run a simulation and return the report as JSON
///
/// The GIL is released while the pipeline runs.
#[pyfunction]
pub fn run_simulation(py: Python<'_>, config_json: &str) -> PyResult<String> {
    let config = SimulationConfig::from_json_str(config_json)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let report = py
        .allow_threads(|| Orchestrator::new(config).and_then(Orchestrator::run))
        .map_err(to_py_err)?;

    serde_json::to_string(&report).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// Default configuration as JSON
#[pyfunction]
pub fn default_config() -> PyResult<String> {
    serde_json::to_string_pretty(&SimulationConfig::default())
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))
}
