//! PDG species table
//!
//! Rest masses (GeV) for the particle codes the generator knows how to
//! sample. Values follow the PDG review.

/// Rest mass for a PDG code, `None` for codes outside the table.
///
/// # Example
/// ```
/// use flow_simulator_core_rs::models::species::mass_of;
///
/// assert!(mass_of(2212).is_some());
/// assert!(mass_of(999_999).is_none());
/// ```
pub fn mass_of(pdg: i32) -> Option<f64> {
    let mass = match pdg {
        2212 | -2212 => 0.938_272_088,
        2112 | -2112 => 0.939_565_421,
        211 | -211 => 0.139_570_39,
        111 => 0.134_976_8,
        321 | -321 => 0.493_677,
        311 | -311 => 0.497_611,
        3122 | -3122 => 1.115_683,
        1000010020 => 1.875_612_9,
        _ => return None,
    };
    Some(mass)
}

/// Short display name, used in log output.
pub fn name_of(pdg: i32) -> &'static str {
    match pdg {
        2212 => "p",
        -2212 => "pbar",
        2112 => "n",
        -2112 => "nbar",
        211 => "pi+",
        -211 => "pi-",
        111 => "pi0",
        321 => "K+",
        -321 => "K-",
        311 => "K0",
        -311 => "K0bar",
        3122 => "Lambda",
        -3122 => "Lambdabar",
        1000010020 => "d",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleon_masses() {
        assert!((mass_of(2212).unwrap() - 0.938).abs() < 1e-3);
        assert!((mass_of(2112).unwrap() - 0.940).abs() < 1e-3);
    }

    #[test]
    fn test_antiparticles_share_mass() {
        assert_eq!(mass_of(211), mass_of(-211));
        assert_eq!(mass_of(2212), mass_of(-2212));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(mass_of(42), None);
        assert_eq!(name_of(42), "unknown");
    }
}
