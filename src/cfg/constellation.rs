use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{cfg::checked_nonnegative, error::Error};

/// Scenario parametrization for the synthetic constellation and
/// measurement generators: orbital geometry, error budget and receiver
/// clock behavior. Validated on every mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstellationConfig {
    /// Interval between generated epochs [s]
    epoch_interval: f64,
    /// Initial estimated user ECEF position [m]
    initial_position: Vector3<f64>,
    /// Number of satellites in the constellation. At least 4 are required
    /// to resolve the 4 position/clock unknowns.
    num_satellites: usize,
    /// Orbital radius [m]
    orbital_radius: f64,
    /// Orbital plane inclination [deg]
    inclination_deg: f64,
    /// Longitude offset of the constellation [deg]
    longitude_offset_deg: f64,
    /// Timing offset of the constellation [s]
    timing_offset: f64,
    /// Minimal elevation for a satellite to be visible [deg]
    mask_angle_deg: f64,
    /// Signal in space error SD [m]
    sis_sd: f64,
    /// Zenith ionosphere error SD [m]
    zenith_iono_sd: f64,
    /// Zenith troposphere error SD [m]
    zenith_tropo_sd: f64,
    /// Code tracking error SD [m]
    code_sd: f64,
    /// Range rate tracking error SD [m/s]
    range_rate_sd: f64,
    /// Initial receiver clock offset [m]
    initial_clock_offset: f64,
    /// Initial receiver clock drift [m/s]
    initial_clock_drift: f64,
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            epoch_interval: 0.5,
            initial_position: Vector3::zeros(),
            num_satellites: 30,
            orbital_radius: 26_559_800.0,
            inclination_deg: 55.0,
            longitude_offset_deg: 0.0,
            timing_offset: 0.0,
            mask_angle_deg: 10.0,
            sis_sd: 1.0,
            zenith_iono_sd: 2.0,
            zenith_tropo_sd: 0.2,
            code_sd: 1.0,
            range_rate_sd: 0.02,
            initial_clock_offset: 10_000.0,
            initial_clock_drift: 100.0,
        }
    }
}

impl ConstellationConfig {
    pub fn epoch_interval(&self) -> f64 {
        self.epoch_interval
    }

    pub fn initial_position(&self) -> Vector3<f64> {
        self.initial_position
    }

    pub fn num_satellites(&self) -> usize {
        self.num_satellites
    }

    pub fn orbital_radius(&self) -> f64 {
        self.orbital_radius
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination_deg
    }

    pub fn longitude_offset_deg(&self) -> f64 {
        self.longitude_offset_deg
    }

    pub fn timing_offset(&self) -> f64 {
        self.timing_offset
    }

    pub fn mask_angle_deg(&self) -> f64 {
        self.mask_angle_deg
    }

    pub fn sis_sd(&self) -> f64 {
        self.sis_sd
    }

    pub fn zenith_iono_sd(&self) -> f64 {
        self.zenith_iono_sd
    }

    pub fn zenith_tropo_sd(&self) -> f64 {
        self.zenith_tropo_sd
    }

    pub fn code_sd(&self) -> f64 {
        self.code_sd
    }

    pub fn range_rate_sd(&self) -> f64 {
        self.range_rate_sd
    }

    pub fn initial_clock_offset(&self) -> f64 {
        self.initial_clock_offset
    }

    pub fn initial_clock_drift(&self) -> f64 {
        self.initial_clock_drift
    }

    pub fn set_epoch_interval(&mut self, interval: f64) -> Result<(), Error> {
        self.epoch_interval = checked_nonnegative(interval, "negative epoch interval")?;
        Ok(())
    }

    pub fn set_initial_position(&mut self, position: Vector3<f64>) -> Result<(), Error> {
        if !position.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidConfig("non finite initial position"));
        }
        self.initial_position = position;
        Ok(())
    }

    pub fn set_num_satellites(&mut self, num: usize) -> Result<(), Error> {
        if num < 4 {
            return Err(Error::InvalidConfig("fewer than 4 satellites"));
        }
        self.num_satellites = num;
        Ok(())
    }

    pub fn set_orbital_radius(&mut self, radius: f64) -> Result<(), Error> {
        self.orbital_radius = checked_nonnegative(radius, "negative orbital radius")?;
        Ok(())
    }

    pub fn set_inclination_deg(&mut self, inclination: f64) -> Result<(), Error> {
        if !inclination.is_finite() {
            return Err(Error::InvalidConfig("non finite inclination"));
        }
        self.inclination_deg = inclination;
        Ok(())
    }

    pub fn set_longitude_offset_deg(&mut self, offset: f64) -> Result<(), Error> {
        if !offset.is_finite() {
            return Err(Error::InvalidConfig("non finite longitude offset"));
        }
        self.longitude_offset_deg = offset;
        Ok(())
    }

    pub fn set_timing_offset(&mut self, offset: f64) -> Result<(), Error> {
        if !offset.is_finite() {
            return Err(Error::InvalidConfig("non finite timing offset"));
        }
        self.timing_offset = offset;
        Ok(())
    }

    pub fn set_mask_angle_deg(&mut self, mask: f64) -> Result<(), Error> {
        if !(0.0..=90.0).contains(&mask) {
            return Err(Error::InvalidConfig("mask angle outside [0°, 90°]"));
        }
        self.mask_angle_deg = mask;
        Ok(())
    }

    pub fn set_sis_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.sis_sd = checked_nonnegative(sd, "negative SIS error SD")?;
        Ok(())
    }

    pub fn set_zenith_iono_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.zenith_iono_sd = checked_nonnegative(sd, "negative zenith iono SD")?;
        Ok(())
    }

    pub fn set_zenith_tropo_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.zenith_tropo_sd = checked_nonnegative(sd, "negative zenith tropo SD")?;
        Ok(())
    }

    pub fn set_code_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.code_sd = checked_nonnegative(sd, "negative code tracking SD")?;
        Ok(())
    }

    pub fn set_range_rate_sd(&mut self, sd: f64) -> Result<(), Error> {
        self.range_rate_sd = checked_nonnegative(sd, "negative range rate tracking SD")?;
        Ok(())
    }

    pub fn set_initial_clock_offset(&mut self, offset: f64) -> Result<(), Error> {
        if !offset.is_finite() {
            return Err(Error::InvalidConfig("non finite clock offset"));
        }
        self.initial_clock_offset = offset;
        Ok(())
    }

    pub fn set_initial_clock_drift(&mut self, drift: f64) -> Result<(), Error> {
        if !drift.is_finite() {
            return Err(Error::InvalidConfig("non finite clock drift"));
        }
        self.initial_clock_drift = drift;
        Ok(())
    }
}
