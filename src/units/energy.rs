//! Photon energies and their units.

use std::fmt;
use std::ops::Div;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ergs per TeV (exact, from the 2019 SI definition of the electronvolt).
pub const ERG_PER_TEV: f64 = 1.602176634;

/// Energy units used in gamma-ray spectral work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "keV")]
    Kev,
    #[serde(rename = "GeV")]
    Gev,
    #[serde(rename = "TeV")]
    Tev,
    #[serde(rename = "erg")]
    Erg,
}

impl EnergyUnit {
    /// Conversion factor: how many TeV one unit of `self` is.
    pub fn in_tev(self) -> f64 {
        match self {
            EnergyUnit::Kev => 1e-9,
            EnergyUnit::Gev => 1e-3,
            EnergyUnit::Tev => 1.0,
            EnergyUnit::Erg => 1.0 / ERG_PER_TEV,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnergyUnit::Kev => "keV",
            EnergyUnit::Gev => "GeV",
            EnergyUnit::Tev => "TeV",
            EnergyUnit::Erg => "erg",
        }
    }

    /// Parse a unit label as it appears in serialized mappings.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "keV" => Ok(EnergyUnit::Kev),
            "GeV" => Ok(EnergyUnit::Gev),
            "TeV" => Ok(EnergyUnit::Tev),
            "erg" => Ok(EnergyUnit::Erg),
            other => Err(Error::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A photon energy: value plus unit tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub value: f64,
    pub unit: EnergyUnit,
}

impl Energy {
    pub fn new(value: f64, unit: EnergyUnit) -> Self {
        Self { value, unit }
    }

    pub fn tev(value: f64) -> Self {
        Self::new(value, EnergyUnit::Tev)
    }

    pub fn kev(value: f64) -> Self {
        Self::new(value, EnergyUnit::Kev)
    }

    /// Convert to another energy unit.
    pub fn to(self, unit: EnergyUnit) -> Self {
        Self::new(self.to_value(unit), unit)
    }

    /// Numeric value in the given unit.
    pub fn to_value(self, unit: EnergyUnit) -> f64 {
        self.value * self.unit.in_tev() / unit.in_tev()
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Dimensionless ratio of two energies (units reconciled first).
impl Div for Energy {
    type Output = f64;

    fn div(self, rhs: Energy) -> f64 {
        self.to_value(rhs.unit) / rhs.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tev_kev_round_trip() {
        let e = Energy::tev(2.5);
        assert_relative_eq!(e.to_value(EnergyUnit::Kev), 2.5e9);
        assert_relative_eq!(e.to(EnergyUnit::Kev).to_value(EnergyUnit::Tev), 2.5);
    }

    #[test]
    fn erg_conversion() {
        let e = Energy::tev(1.0);
        assert_relative_eq!(e.to_value(EnergyUnit::Erg), ERG_PER_TEV);
    }

    #[test]
    fn ratio_is_dimensionless_and_unit_reconciled() {
        let a = Energy::tev(1.0);
        let b = Energy::new(500.0, EnergyUnit::Gev);
        assert_relative_eq!(a / b, 2.0);
    }

    #[test]
    fn parse_known_and_unknown_labels() {
        assert_eq!(EnergyUnit::parse("TeV").unwrap(), EnergyUnit::Tev);
        assert_eq!(EnergyUnit::parse(" keV ").unwrap(), EnergyUnit::Kev);
        assert!(matches!(
            EnergyUnit::parse("parsec"),
            Err(Error::UnknownUnit(_))
        ));
    }
}
