//! Signal path geometry: Sagnac correction, line of sight, elevation
use nalgebra::{Matrix3, Vector3};

use crate::{constants::Constants, error::Error, frames, kinematics::PositionVelocity};

/// Earth rotation during signal transit, as a small-angle frame rotation
/// applied to the satellite position at transmission time.
pub(crate) fn sagnac_matrix(range_m: f64) -> Matrix3<f64> {
    let we_tau =
        Constants::EARTH_ROTATION_RATE_RAD_S * range_m / Constants::SPEED_OF_LIGHT_M_S;
    Matrix3::new(
        1.0_f64, we_tau, 0.0_f64, -we_tau, 1.0_f64, 0.0_f64, 0.0_f64, 0.0_f64, 1.0_f64,
    )
}

/// Sagnac corrected user to satellite line of sight.
pub(crate) struct LineOfSight {
    /// Corrected range vector [m]
    pub delta_r: Vector3<f64>,
    /// Corrected scalar range [m]
    pub range: f64,
    /// Frame rotation applied during signal transit
    pub sagnac: Matrix3<f64>,
}

impl LineOfSight {
    /// The Sagnac matrix is built from the provisional (uncorrected)
    /// range, then applied to refine the range vector.
    pub fn new(sat_position: &Vector3<f64>, user_position: &Vector3<f64>) -> Self {
        let provisional = (sat_position - user_position).norm();
        let sagnac = sagnac_matrix(provisional);
        let delta_r = sagnac * sat_position - user_position;
        let range = delta_r.norm();
        Self {
            delta_r,
            range,
            sagnac,
        }
    }

    /// Unit line of sight vector.
    pub fn unit(&self) -> Vector3<f64> {
        self.delta_r / self.range
    }
}

/// Sagnac corrected range rate observed along `los`.
pub(crate) fn range_rate(
    los: &LineOfSight,
    sat: &PositionVelocity,
    user: &PositionVelocity,
) -> f64 {
    let omega_e = Vector3::new(0.0, 0.0, Constants::EARTH_ROTATION_RATE_RAD_S).cross_matrix();
    let sat_term = los.sagnac * (sat.velocity + omega_e * sat.position);
    let user_term = user.velocity + omega_e * user.position;
    los.unit().dot(&(sat_term - user_term))
}

/// Elevation [rad] of the satellite above the user's local horizon,
/// computed in the NED frame at the user position.
pub(crate) fn elevation_rad(
    sat_position: &Vector3<f64>,
    user_position: &Vector3<f64>,
) -> Result<f64, Error> {
    let (lat, lon, _) = frames::ecef_to_geodetic(user_position)?;
    let cen = frames::ecef_to_ned_rotation(lat, lon);
    let los = sat_position - user_position;
    let unit = los / los.norm();
    // rounding may push the projection marginally past ±1
    let down = cen.row(2).transpose().dot(&unit).clamp(-1.0, 1.0);
    Ok((-down).asin())
}
