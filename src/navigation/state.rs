use nalgebra::{OMatrix, OVector, base::dimension::U8};

use crate::{cfg::KalmanConfig, estimation::Estimation};

/// Full navigation filter state: the estimate and its 8x8 error
/// covariance, in wire order. Replaced wholesale by each epoch update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    /// Current [Estimation]
    pub estimation: Estimation,
    /// Error covariance. Symmetric positive semidefinite in steady state.
    pub covariance: OMatrix<f64, U8, U8>,
}

impl KalmanState {
    /// Builds the initial state from a seed estimate: the covariance is
    /// the diagonal of squared configured 1 sigma uncertainties.
    pub fn initial(seed: Estimation, cfg: &KalmanConfig) -> Self {
        let mut state = Self {
            estimation: seed,
            covariance: OMatrix::<f64, U8, U8>::zeros(),
        };
        state.reset_from(seed, cfg);
        state
    }

    /// Fill-in-place variant of [Self::initial].
    pub fn reset_from(&mut self, seed: Estimation, cfg: &KalmanConfig) {
        let position_var = cfg.initial_position_sd().powi(2);
        let velocity_var = cfg.initial_velocity_sd().powi(2);
        let clock_offset_var = cfg.initial_clock_offset_sd().powi(2);
        let clock_drift_var = cfg.initial_clock_drift_sd().powi(2);

        let diagonal = OVector::<f64, U8>::from([
            position_var,
            position_var,
            position_var,
            velocity_var,
            velocity_var,
            velocity_var,
            clock_offset_var,
            clock_drift_var,
        ]);

        self.estimation = seed;
        self.covariance = OMatrix::<f64, U8, U8>::from_diagonal(&diagonal);
    }
}

#[cfg(test)]
mod test {
    use super::KalmanState;
    use crate::{cfg::KalmanConfig, estimation::Estimation};

    #[test]
    fn initial_covariance_is_squared_uncertainty_diagonal() {
        let mut cfg = KalmanConfig::default();
        cfg.set_initial_position_sd(10.0).unwrap();
        cfg.set_initial_velocity_sd(0.1).unwrap();
        cfg.set_initial_clock_offset_sd(5.0).unwrap();
        cfg.set_initial_clock_drift_sd(0.5).unwrap();

        let state = KalmanState::initial(Estimation::default(), &cfg);

        let expected = [100.0, 100.0, 100.0, 0.01, 0.01, 0.01, 25.0, 0.25];
        for i in 0..8 {
            for j in 0..8 {
                if i == j {
                    assert_eq!(state.covariance[(i, j)], expected[i]);
                } else {
                    assert_eq!(state.covariance[(i, j)], 0.0);
                }
            }
        }
    }

    #[test]
    fn fill_variant_matches_allocating_variant() {
        let cfg = KalmanConfig::default();
        let seed = Estimation {
            x: 1.0,
            clock_offset: 2.0,
            ..Default::default()
        };
        let allocated = KalmanState::initial(seed, &cfg);
        let mut filled = KalmanState::initial(Estimation::default(), &cfg);
        filled.reset_from(seed, &cfg);
        assert_eq!(filled, allocated);
    }
}
