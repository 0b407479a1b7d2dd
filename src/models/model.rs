//! Parametric spectral models: energy → differential flux.
//!
//! All evaluation is pure and deterministic. Energies are converted to the
//! model's internal unit (the reference energy's unit, TeV for the Meyer
//! polynomial) before the functional form is applied, and the output carries
//! its flux unit explicitly.

use serde::{Deserialize, Serialize};

use crate::units::{DiffFlux, Energy, EnergyFlux, EnergyUnit};

/// One named model parameter, for serialization and display.
///
/// `unit` is `None` for dimensionless parameters (indices, curvature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Parameter {
    fn dimensionless(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            unit: None,
        }
    }

    fn with_unit(name: &str, value: f64, unit: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value,
            unit: Some(unit.to_string()),
        }
    }
}

/// `amplitude * (energy/reference)^(-index)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub amplitude: DiffFlux,
    pub index: f64,
    pub reference: Energy,
}

impl PowerLaw {
    pub fn evaluate(&self, energy: Energy) -> DiffFlux {
        let ratio = energy / self.reference;
        DiffFlux::new(self.amplitude.value * ratio.powf(-self.index), self.amplitude.unit)
    }
}

/// `amplitude * (energy/reference)^(-index) * exp(-energy * lambda)`
///
/// `lambda` is the inverse cutoff energy, stored per TeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpCutoffPowerLaw {
    pub amplitude: DiffFlux,
    pub index: f64,
    /// Inverse cutoff energy in TeV^-1.
    pub lambda: f64,
    pub reference: Energy,
}

impl ExpCutoffPowerLaw {
    pub fn evaluate(&self, energy: Energy) -> DiffFlux {
        let ratio = energy / self.reference;
        let e_tev = energy.to_value(EnergyUnit::Tev);
        let value = self.amplitude.value * ratio.powf(-self.index) * (-e_tev * self.lambda).exp();
        DiffFlux::new(value, self.amplitude.unit)
    }
}

/// `amplitude * (energy/reference)^(-(alpha + beta * ln(energy/reference)))`
///
/// Note the natural log: publications quoting a log10 curvature must divide
/// their beta by `ln(10)` before it is used here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParabola {
    pub amplitude: DiffFlux,
    pub alpha: f64,
    pub beta: f64,
    pub reference: Energy,
}

impl LogParabola {
    pub fn evaluate(&self, energy: Energy) -> DiffFlux {
        let ratio = energy / self.reference;
        let exponent = -(self.alpha + self.beta * ratio.ln());
        DiffFlux::new(self.amplitude.value * ratio.powf(exponent), self.amplitude.unit)
    }
}

/// Meyer et al. 2010 Crab parameterization (2010A&A...523A...2M, appendix D).
///
/// A fixed 5th-degree polynomial in `log10(E/TeV)` gives
/// `log10(E^2 dN/dE / (erg cm^-2 s^-1))`; dividing by `E^2` recovers the
/// differential flux. The coefficients are published constants, not fit
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeyerCrabModel;

impl MeyerCrabModel {
    /// Polynomial coefficients, highest degree first.
    pub const COEFFICIENTS: [f64; 6] =
        [-0.00449161, 0.0, 0.0473174, -0.179475, -0.53616, -10.2708];

    pub fn evaluate(&self, energy: Energy) -> DiffFlux {
        let x = energy.to_value(EnergyUnit::Tev).log10();
        let log_flux = Self::COEFFICIENTS.iter().fold(0.0, |acc, &c| acc * x + c);
        EnergyFlux::erg_per_cm2_s(10f64.powf(log_flux)).per_energy_squared(energy)
    }
}

/// The closed set of spectral model kinds this crate knows.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralModel {
    PowerLaw(PowerLaw),
    ExpCutoffPowerLaw(ExpCutoffPowerLaw),
    LogParabola(LogParabola),
    MeyerCrab(MeyerCrabModel),
}

impl SpectralModel {
    /// Differential flux at one energy.
    pub fn evaluate(&self, energy: Energy) -> DiffFlux {
        match self {
            SpectralModel::PowerLaw(m) => m.evaluate(energy),
            SpectralModel::ExpCutoffPowerLaw(m) => m.evaluate(energy),
            SpectralModel::LogParabola(m) => m.evaluate(energy),
            SpectralModel::MeyerCrab(m) => m.evaluate(energy),
        }
    }

    /// Differential flux at each energy of a sequence.
    pub fn evaluate_many(&self, energies: &[Energy]) -> Vec<DiffFlux> {
        energies.iter().map(|&e| self.evaluate(e)).collect()
    }

    /// Serialization tag / display name for the model kind.
    pub fn name(&self) -> &'static str {
        match self {
            SpectralModel::PowerLaw(_) => "PowerLaw",
            SpectralModel::ExpCutoffPowerLaw(_) => "ExponentialCutoffPowerLaw",
            SpectralModel::LogParabola(_) => "LogParabola",
            SpectralModel::MeyerCrab(_) => "MeyerCrabModel",
        }
    }

    /// Named parameters in a stable order.
    ///
    /// The Meyer model has none: its coefficients are constants.
    pub fn parameters(&self) -> Vec<Parameter> {
        match self {
            SpectralModel::PowerLaw(m) => vec![
                Parameter::with_unit("amplitude", m.amplitude.value, m.amplitude.unit),
                Parameter::dimensionless("index", m.index),
                Parameter::with_unit("reference", m.reference.value, m.reference.unit),
            ],
            SpectralModel::ExpCutoffPowerLaw(m) => vec![
                Parameter::with_unit("amplitude", m.amplitude.value, m.amplitude.unit),
                Parameter::dimensionless("index", m.index),
                Parameter::with_unit("lambda", m.lambda, "TeV-1"),
                Parameter::with_unit("reference", m.reference.value, m.reference.unit),
            ],
            SpectralModel::LogParabola(m) => vec![
                Parameter::with_unit("amplitude", m.amplitude.value, m.amplitude.unit),
                Parameter::dimensionless("alpha", m.alpha),
                Parameter::dimensionless("beta", m.beta),
                Parameter::with_unit("reference", m.reference.value, m.reference.unit),
            ],
            SpectralModel::MeyerCrab(_) => Vec::new(),
        }
    }
}
