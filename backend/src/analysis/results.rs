//! Persisted analysis results
//!
//! `FlowResults` is the final product of a run. It is written as JSON so
//! it can be inspected or plotted without this crate.

use crate::analysis::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// One bin of a histogram or profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSummary {
    pub center: f64,

    /// Bin content (count or mean); `None` for an empty profile bin
    pub value: Option<f64>,

    pub error: Option<f64>,
    pub entries: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub name: String,
    pub bins: Vec<BinSummary>,
}

impl ProfileSummary {
    /// Bin-by-bin difference `minuend - subtrahend`, errors added in
    /// quadrature.
    ///
    /// # Panics
    /// Panics if the two profiles have different bin counts
    pub fn difference(name: impl Into<String>, minuend: &Self, subtrahend: &Self) -> Self {
        assert_eq!(
            minuend.bins.len(),
            subtrahend.bins.len(),
            "profiles must share binning"
        );
        let bins = minuend
            .bins
            .iter()
            .zip(&subtrahend.bins)
            .map(|(a, b)| BinSummary {
                center: a.center,
                value: a.value.zip(b.value).map(|(a, b)| a - b),
                error: a.error.zip(b.error).map(|(a, b)| a.hypot(b)),
                entries: a.entries.min(b.entries),
            })
            .collect();
        Self {
            name: name.into(),
            bins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub name: String,
    pub bins: Vec<BinSummary>,
    pub underflow: u64,
    pub overflow: u64,
    pub entries: u64,
}

/// Directed-flow results of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResults {
    pub run_id: Uuid,

    /// SHA-256 of the run configuration, when known
    pub config_hash: Option<String>,

    pub events_analyzed: usize,

    /// <Qx·cos Ψ_RP> of the full reference Q-vector
    pub resolution_sp: Option<f64>,

    /// <Qx·cos Ψ_RP> of the sub-sampled reference Q-vector
    pub resolution_half: Option<f64>,

    pub resolution_ratio: Option<f64>,

    /// v1 vs rapidity relative to the true reaction plane
    pub v1_rp: ProfileSummary,

    /// v1 vs rapidity from the scalar product with the full Q-vector
    pub v1_sp: ProfileSummary,

    /// v1 vs rapidity from the scalar product with the sub-sampled Q-vector
    pub v1_half: ProfileSummary,

    /// v1{RP} - v1{SP}
    pub nonflow_sp: ProfileSummary,

    /// v1{RP} - v1{half}
    pub nonflow_half: ProfileSummary,

    pub rapidity: HistogramSummary,
    pub pt: HistogramSummary,
}

impl FlowResults {
    /// Write as pretty JSON, replacing any existing file.
    pub fn write_json(&self, path: &Path) -> Result<(), AnalysisError> {
        let io_error = |source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_error)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(value: Option<f64>, error: Option<f64>) -> BinSummary {
        BinSummary {
            center: 0.0,
            value,
            error,
            entries: 4,
        }
    }

    #[test]
    fn test_difference_skips_empty_bins() {
        let a = ProfileSummary {
            name: "a".to_string(),
            bins: vec![bin(Some(0.5), Some(0.3)), bin(Some(0.1), Some(0.1))],
        };
        let b = ProfileSummary {
            name: "b".to_string(),
            bins: vec![bin(Some(0.2), Some(0.4)), bin(None, None)],
        };

        let diff = ProfileSummary::difference("a-b", &a, &b);
        assert_eq!(diff.name, "a-b");
        assert!((diff.bins[0].value.unwrap() - 0.3).abs() < 1e-12);
        assert!((diff.bins[0].error.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(diff.bins[1].value, None);
    }
}
