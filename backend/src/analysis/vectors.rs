//! Flow vectors and running means

/// Unit vector of a single azimuthal angle, evaluated per harmonic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitVector {
    phi: f64,
}

impl UnitVector {
    pub fn new(phi: f64) -> Self {
        Self { phi }
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// cos(n·φ)
    pub fn x(&self, harmonic: usize) -> f64 {
        (harmonic as f64 * self.phi).cos()
    }

    /// sin(n·φ)
    pub fn y(&self, harmonic: usize) -> f64 {
        (harmonic as f64 * self.phi).sin()
    }
}

/// Normalized sum of unit vectors for harmonics 1 and 2.
///
/// # Example
/// ```
/// use flow_simulator_core_rs::analysis::vectors::{QVector, UnitVector};
///
/// let mut q = QVector::default();
/// q.fill(&UnitVector::new(0.0));
/// q.fill(&UnitVector::new(std::f64::consts::PI));
/// assert!(q.x(1).abs() < 1e-12);
/// assert!((q.x(2) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QVector {
    sum_x: [f64; 2],
    sum_y: [f64; 2],
    entries: usize,
}

impl QVector {
    pub const MAX_HARMONIC: usize = 2;

    pub fn fill(&mut self, u: &UnitVector) {
        for n in 1..=Self::MAX_HARMONIC {
            self.sum_x[n - 1] += u.x(n);
            self.sum_y[n - 1] += u.y(n);
        }
        self.entries += 1;
    }

    /// Mean cos(n·φ); zero for an empty vector.
    ///
    /// # Panics
    /// Panics if `harmonic` is not 1 or 2
    pub fn x(&self, harmonic: usize) -> f64 {
        self.normalized(self.sum_x[Self::index(harmonic)])
    }

    /// Mean sin(n·φ); zero for an empty vector.
    ///
    /// # Panics
    /// Panics if `harmonic` is not 1 or 2
    pub fn y(&self, harmonic: usize) -> f64 {
        self.normalized(self.sum_y[Self::index(harmonic)])
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    fn index(harmonic: usize) -> usize {
        assert!(
            (1..=Self::MAX_HARMONIC).contains(&harmonic),
            "harmonic must be 1 or 2"
        );
        harmonic - 1
    }

    fn normalized(&self, sum: f64) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            sum / self.entries as f64
        }
    }
}

/// Running arithmetic mean
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    entries: u64,
}

impl MeanAccumulator {
    pub fn fill(&mut self, value: f64) {
        self.sum += value;
        self.entries += 1;
    }

    /// `None` until the first value is filled.
    pub fn mean(&self) -> Option<f64> {
        (self.entries > 0).then(|| self.sum / self.entries as f64)
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_unit_vector_harmonics() {
        let u = UnitVector::new(FRAC_PI_2);
        assert!(u.x(1).abs() < 1e-12);
        assert!((u.y(1) - 1.0).abs() < 1e-12);
        assert!((u.x(2) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_q_vector_is_zero() {
        let q = QVector::default();
        assert_eq!(q.x(1), 0.0);
        assert_eq!(q.y(2), 0.0);
        assert_eq!(q.entries(), 0);
    }

    #[test]
    #[should_panic(expected = "harmonic must be 1 or 2")]
    fn test_q_vector_rejects_third_harmonic() {
        QVector::default().x(3);
    }

    #[test]
    fn test_mean_accumulator() {
        let mut mean = MeanAccumulator::default();
        assert_eq!(mean.mean(), None);

        mean.fill(1.0);
        mean.fill(3.0);
        assert_eq!(mean.mean(), Some(2.0));
        assert_eq!(mean.entries(), 2);
    }
}
