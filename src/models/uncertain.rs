//! Spectral models whose parameters carry correlated uncertainties.
//!
//! These mirror the deterministic models but evaluate in a fixed unit set:
//! energies in keV, fluxes in `cm^-2 s^-1 keV^-1`. The fit covariance is only
//! meaningful in the units the fit ran in, and first-order propagation needs
//! one consistent unit convention throughout, so the conversion happens once
//! when the uncertain model is built (see
//! `SpectrumFitResult::model_with_uncertainties`).

use crate::math::UFloat;

/// A spectral model with uncertain parameters, fixed to keV units.
#[derive(Debug, Clone, PartialEq)]
pub enum UncertainSpectralModel {
    PowerLaw {
        /// `cm^-2 s^-1 keV^-1`
        amplitude: UFloat,
        index: UFloat,
        /// keV
        reference: UFloat,
    },
    ExpCutoffPowerLaw {
        amplitude: UFloat,
        index: UFloat,
        /// keV^-1
        lambda: UFloat,
        reference: UFloat,
    },
    LogParabola {
        amplitude: UFloat,
        alpha: UFloat,
        beta: UFloat,
        reference: UFloat,
    },
}

impl UncertainSpectralModel {
    /// Differential flux in `cm^-2 s^-1 keV^-1` at an energy in keV, with
    /// propagated parameter uncertainty.
    pub fn evaluate_kev(&self, energy_kev: f64) -> UFloat {
        let e = UFloat::exact(energy_kev);
        match self {
            UncertainSpectralModel::PowerLaw {
                amplitude,
                index,
                reference,
            } => {
                let ratio = &e / reference;
                amplitude * &ratio.pow(&-index)
            }
            UncertainSpectralModel::ExpCutoffPowerLaw {
                amplitude,
                index,
                lambda,
                reference,
            } => {
                let ratio = &e / reference;
                let power = ratio.pow(&-index);
                let cutoff = (-&(&e * lambda)).exp();
                &(amplitude * &power) * &cutoff
            }
            UncertainSpectralModel::LogParabola {
                amplitude,
                alpha,
                beta,
                reference,
            } => {
                let ratio = &e / reference;
                let exponent = -&(alpha + &(beta * &ratio.ln()));
                amplitude * &ratio.pow(&exponent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_parameters_evaluate_like_a_plain_power_law() {
        let m = UncertainSpectralModel::PowerLaw {
            amplitude: UFloat::exact(1.0e-20),
            index: UFloat::exact(2.0),
            reference: UFloat::exact(1.0e9),
        };
        let f = m.evaluate_kev(2.0e9);
        assert_relative_eq!(f.nominal(), 1.0e-20 / 4.0, max_relative = 1e-12);
        assert_eq!(f.std_dev(), 0.0);
    }

    #[test]
    fn amplitude_uncertainty_passes_straight_through_at_reference() {
        let m = UncertainSpectralModel::PowerLaw {
            amplitude: UFloat::independent(1.0e-20, 2.0e-21, 0),
            index: UFloat::exact(2.5),
            reference: UFloat::exact(1.0e9),
        };
        let f = m.evaluate_kev(1.0e9);
        assert_relative_eq!(f.nominal(), 1.0e-20);
        assert_relative_eq!(f.std_dev(), 2.0e-21, max_relative = 1e-12);
    }

    #[test]
    fn index_uncertainty_grows_with_lever_arm() {
        let m = UncertainSpectralModel::PowerLaw {
            amplitude: UFloat::exact(1.0e-20),
            index: UFloat::independent(2.0, 0.1, 0),
            reference: UFloat::exact(1.0e9),
        };
        let near = m.evaluate_kev(1.1e9);
        let far = m.evaluate_kev(1.0e10);
        let rel_near = near.std_dev() / near.nominal();
        let rel_far = far.std_dev() / far.nominal();
        assert!(rel_far > rel_near);
        // sigma_rel = |ln(E/ref)| * sigma_index for a pure power law.
        assert_relative_eq!(rel_far, 10f64.ln() * 0.1, max_relative = 1e-12);
    }
}
