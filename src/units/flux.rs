//! Differential and integral flux quantities.

use std::fmt;
use std::ops::Div;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::units::energy::{Energy, EnergyUnit};

/// Unit of differential photon flux: `cm^-2 s^-1 E^-1`.
///
/// Only the per-energy part varies; area and time are always `cm^2` and `s`,
/// which is what every published Crab parameterization uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFluxUnit {
    pub per_energy: EnergyUnit,
}

impl DiffFluxUnit {
    pub fn per_tev() -> Self {
        Self {
            per_energy: EnergyUnit::Tev,
        }
    }

    pub fn per_kev() -> Self {
        Self {
            per_energy: EnergyUnit::Kev,
        }
    }

    pub fn label(self) -> String {
        format!("cm-2 s-1 {}-1", self.per_energy)
    }

    /// Parse both the compact spelling (`cm-2 s-1 TeV-1`) and the
    /// fraction spelling some files use (`1 / (cm2 s TeV)`).
    pub fn parse(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        for unit in [
            EnergyUnit::Kev,
            EnergyUnit::Gev,
            EnergyUnit::Tev,
            EnergyUnit::Erg,
        ] {
            let compact = format!("cm-2 s-1 {}-1", unit);
            let fraction = format!("1 / (cm2 s {})", unit);
            if s == compact || s == fraction {
                return Ok(Self { per_energy: unit });
            }
        }
        Err(Error::UnknownUnit(s.to_string()))
    }
}

impl fmt::Display for DiffFluxUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Differential photon flux: value plus unit tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffFlux {
    pub value: f64,
    pub unit: DiffFluxUnit,
}

impl DiffFlux {
    pub fn new(value: f64, unit: DiffFluxUnit) -> Self {
        Self { value, unit }
    }

    pub fn per_cm2_s_tev(value: f64) -> Self {
        Self::new(value, DiffFluxUnit::per_tev())
    }

    pub fn to(self, unit: DiffFluxUnit) -> Self {
        Self::new(self.to_value(unit), unit)
    }

    /// Numeric value in the given unit.
    ///
    /// The energy sits in the denominator, so the factor is inverted relative
    /// to a plain energy conversion.
    pub fn to_value(self, unit: DiffFluxUnit) -> f64 {
        self.value * unit.per_energy.in_tev() / self.unit.per_energy.in_tev()
    }
}

impl fmt::Display for DiffFlux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Dimensionless ratio of two differential fluxes (units reconciled first).
impl Div for DiffFlux {
    type Output = f64;

    fn div(self, rhs: DiffFlux) -> f64 {
        self.to_value(rhs.unit) / rhs.value
    }
}

/// Integral energy flux in `erg cm^-2 s^-1` (the unit the Meyer polynomial
/// parameterization is published in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyFlux {
    pub value: f64,
}

impl EnergyFlux {
    pub fn erg_per_cm2_s(value: f64) -> Self {
        Self { value }
    }

    /// Divide by `energy^2` to recover a differential flux.
    ///
    /// `E^2 dN/dE` in erg cm^-2 s^-1 is the standard spectral-energy-
    /// distribution axis; this undoes it.
    pub fn per_energy_squared(self, energy: Energy) -> DiffFlux {
        let e_tev = energy.to_value(EnergyUnit::Tev);
        let value_tev = self.value * EnergyUnit::Erg.in_tev();
        DiffFlux::per_cm2_s_tev(value_tev / (e_tev * e_tev))
    }
}
