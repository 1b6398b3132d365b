#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{cfg::checked_nonnegative, error::Error};

/// Filter tuning: initial state uncertainties, process noise densities and
/// measurement noise levels. All values are validated on every mutation;
/// none may be negative.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KalmanConfig {
    /// Initial position uncertainty, 1 sigma per axis [m]
    initial_position_sd: f64,
    /// Initial velocity uncertainty, 1 sigma per axis [m/s]
    initial_velocity_sd: f64,
    /// Initial clock offset uncertainty, 1 sigma [m]
    initial_clock_offset_sd: f64,
    /// Initial clock drift uncertainty, 1 sigma [m/s]
    initial_clock_drift_sd: f64,
    /// Acceleration PSD [m^2/s^3]
    accel_psd: f64,
    /// Receiver clock frequency PSD [m^2/s^3]
    clock_frequency_psd: f64,
    /// Receiver clock phase PSD [m^2/s]
    clock_phase_psd: f64,
    /// Pseudorange measurement noise, 1 sigma [m]
    pseudorange_sd: f64,
    /// Pseudorange rate measurement noise, 1 sigma [m/s]
    range_rate_sd: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            initial_position_sd: 10.0,
            initial_velocity_sd: 0.1,
            initial_clock_offset_sd: 10.0,
            initial_clock_drift_sd: 0.1,
            accel_psd: 1.0,
            clock_frequency_psd: 1.0,
            clock_phase_psd: 1.0,
            pseudorange_sd: 2.5,
            range_rate_sd: 0.05,
        }
    }
}

impl KalmanConfig {
    pub fn initial_position_sd(&self) -> f64 {
        self.initial_position_sd
    }

    pub fn initial_velocity_sd(&self) -> f64 {
        self.initial_velocity_sd
    }

    pub fn initial_clock_offset_sd(&self) -> f64 {
        self.initial_clock_offset_sd
    }

    pub fn initial_clock_drift_sd(&self) -> f64 {
        self.initial_clock_drift_sd
    }

    pub fn accel_psd(&self) -> f64 {
        self.accel_psd
    }

    pub fn clock_frequency_psd(&self) -> f64 {
        self.clock_frequency_psd
    }

    pub fn clock_phase_psd(&self) -> f64 {
        self.clock_phase_psd
    }

    pub fn pseudorange_sd(&self) -> f64 {
        self.pseudorange_sd
    }

    pub fn range_rate_sd(&self) -> f64 {
        self.range_rate_sd
    }

    pub fn set_initial_position_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.initial_position_sd = checked_nonnegative(sd, "negative initial position SD")?;
        Ok(())
    }

    pub fn set_initial_velocity_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.initial_velocity_sd = checked_nonnegative(sd, "negative initial velocity SD")?;
        Ok(())
    }

    pub fn set_initial_clock_offset_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.initial_clock_offset_sd = checked_nonnegative(sd, "negative initial clock offset SD")?;
        Ok(())
    }

    pub fn set_initial_clock_drift_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.initial_clock_drift_sd = checked_nonnegative(sd, "negative initial clock drift SD")?;
        Ok(())
    }

    pub fn set_accel_psd(&mut self, psd: f64) -> Result<(), Error> {
        self.accel_psd = checked_nonnegative(psd, "negative acceleration PSD")?;
        Ok(())
    }

    pub fn set_clock_frequency_psd(&mut self, psd: f64) -> Result<(), Error> {
        self.clock_frequency_psd = checked_nonnegative(psd, "negative clock frequency PSD")?;
        Ok(())
    }

    pub fn set_clock_phase_psd(&mut self, psd: f64) -> Result<(), Error> {
        self.clock_phase_psd = checked_nonnegative(psd, "negative clock phase PSD")?;
        Ok(())
    }

    pub fn set_pseudorange_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.pseudorange_sd = checked_nonnegative(sd, "negative pseudorange SD")?;
        Ok(())
    }

    pub fn set_range_rate_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.range_rate_sd = checked_nonnegative(sd, "negative range rate SD")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::KalmanConfig;
    use crate::error::Error;

    #[test]
    fn setters_reject_negative_values() {
        let mut cfg = KalmanConfig::default();
        assert!(matches!(
            cfg.set_accel_psd(-1.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            cfg.set_pseudorange_sd(f64::NAN),
            Err(Error::InvalidConfig(_))
        ));
        // rejected values leave the previous setting intact
        assert_eq!(cfg, KalmanConfig::default());
    }
}
