//! Fixed-binning histograms and profiles
//!
//! `Histogram1D` counts entries per bin. `Profile1D` keeps, per bin of x,
//! the mean of y and the error on that mean. Both export a serializable
//! summary for the results file.

use crate::analysis::results::{BinSummary, HistogramSummary, ProfileSummary};
use serde::{Deserialize, Serialize};

/// Uniform binning of [min, max)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    bins: usize,
    min: f64,
    max: f64,
}

impl Binning {
    /// # Panics
    /// Panics if `bins` is zero or the range is empty
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        assert!(bins > 0, "bins must be positive");
        assert!(min < max, "min must be less than max");
        Self { bins, min, max }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Bin index of `x`, `None` outside [min, max) or for NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.min && x < self.max) {
            return None;
        }
        let index = ((x - self.min) / self.width()) as usize;
        // Guard against rounding at the upper edge
        Some(index.min(self.bins - 1))
    }

    pub fn center(&self, index: usize) -> f64 {
        self.min + (index as f64 + 0.5) * self.width()
    }
}

/// Counting histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    name: String,
    binning: Binning,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
}

impl Histogram1D {
    pub fn new(name: impl Into<String>, binning: Binning) -> Self {
        Self {
            name: name.into(),
            binning,
            counts: vec![0; binning.bins()],
            underflow: 0,
            overflow: 0,
        }
    }

    pub fn fill(&mut self, x: f64) {
        match self.binning.find_bin(x) {
            Some(index) => self.counts[index] += 1,
            None if x < self.binning.min => self.underflow += 1,
            None => self.overflow += 1,
        }
    }

    pub fn count(&self, index: usize) -> u64 {
        self.counts[index]
    }

    /// Entries including under- and overflow
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.underflow + self.overflow
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            name: self.name.clone(),
            bins: self
                .counts
                .iter()
                .enumerate()
                .map(|(index, &count)| BinSummary {
                    center: self.binning.center(index),
                    value: Some(count as f64),
                    error: Some((count as f64).sqrt()),
                    entries: count,
                })
                .collect(),
            underflow: self.underflow,
            overflow: self.overflow,
            entries: self.entries(),
        }
    }
}

/// Mean of y in bins of x
///
/// # Example
/// ```
/// use flow_simulator_core_rs::analysis::histogram::{Binning, Profile1D};
///
/// let mut profile = Profile1D::new("v1", Binning::new(2, -1.0, 1.0));
/// profile.fill(0.5, 0.1);
/// profile.fill(0.5, 0.3);
/// profile.scale(2.0);
///
/// assert!((profile.mean(1).unwrap() - 0.4).abs() < 1e-12);
/// assert_eq!(profile.mean(0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Profile1D {
    name: String,
    binning: Binning,
    entries: Vec<u64>,
    sum_y: Vec<f64>,
    sum_y2: Vec<f64>,
    /// Multiplicative factor applied to every bin mean
    factor: f64,
}

impl Profile1D {
    pub fn new(name: impl Into<String>, binning: Binning) -> Self {
        let bins = binning.bins();
        Self {
            name: name.into(),
            binning,
            entries: vec![0; bins],
            sum_y: vec![0.0; bins],
            sum_y2: vec![0.0; bins],
            factor: 1.0,
        }
    }

    /// Entries outside the binning are ignored.
    pub fn fill(&mut self, x: f64, y: f64) {
        if let Some(index) = self.binning.find_bin(x) {
            self.entries[index] += 1;
            self.sum_y[index] += y;
            self.sum_y2[index] += y * y;
        }
    }

    /// Scale every bin mean (and its error) by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.factor *= factor;
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    pub fn bin_entries(&self, index: usize) -> u64 {
        self.entries[index]
    }

    pub fn mean(&self, index: usize) -> Option<f64> {
        let n = self.entries[index];
        (n > 0).then(|| self.factor * self.sum_y[index] / n as f64)
    }

    /// Standard error of the bin mean
    pub fn error(&self, index: usize) -> Option<f64> {
        let n = self.entries[index];
        if n == 0 {
            return None;
        }
        let n = n as f64;
        let mean = self.sum_y[index] / n;
        let variance = (self.sum_y2[index] / n - mean * mean).max(0.0);
        Some(self.factor.abs() * (variance / n).sqrt())
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            name: self.name.clone(),
            bins: (0..self.binning.bins())
                .map(|index| BinSummary {
                    center: self.binning.center(index),
                    value: self.mean(index),
                    error: self.error(index),
                    entries: self.entries[index],
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_bin_edges() {
        let binning = Binning::new(4, -1.0, 1.0);
        assert_eq!(binning.find_bin(-1.0), Some(0));
        assert_eq!(binning.find_bin(0.99), Some(3));
        assert_eq!(binning.find_bin(1.0), None);
        assert_eq!(binning.find_bin(f64::NAN), None);
        assert!((binning.center(0) + 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_under_and_overflow() {
        let mut hist = Histogram1D::new("h", Binning::new(2, 0.0, 2.0));
        hist.fill(-0.5);
        hist.fill(0.5);
        hist.fill(1.5);
        hist.fill(2.5);

        let summary = hist.summary();
        assert_eq!(summary.underflow, 1);
        assert_eq!(summary.overflow, 1);
        assert_eq!(summary.entries, 4);
        assert_eq!(hist.count(0), 1);
    }

    #[test]
    fn test_profile_error_on_mean() {
        let mut profile = Profile1D::new("p", Binning::new(1, 0.0, 1.0));
        profile.fill(0.5, 1.0);
        profile.fill(0.5, 3.0);

        // variance 1, n 2 -> error sqrt(1/2)
        assert_eq!(profile.mean(0), Some(2.0));
        assert!((profile.error(0).unwrap() - 0.5f64.sqrt()).abs() < 1e-12);

        profile.scale(-2.0);
        assert_eq!(profile.mean(0), Some(-4.0));
        assert!((profile.error(0).unwrap() - 2.0 * 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_profile_ignores_out_of_range() {
        let mut profile = Profile1D::new("p", Binning::new(2, -1.0, 1.0));
        profile.fill(5.0, 1.0);
        assert_eq!(profile.bin_entries(0) + profile.bin_entries(1), 0);
    }
}
