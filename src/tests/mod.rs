//! End to end scenarios
mod estimator;

use std::f64::consts::TAU;

use nalgebra::Vector3;

use crate::{
    frames,
    geometry::{self, LineOfSight},
    kinematics::PositionVelocity,
    measurement::Measurement,
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Static satellites on a ring of regular azimuths at the given elevation
/// and slant range, as seen from the user position. A well conditioned
/// geometry for any count >= 4.
pub(crate) fn azimuth_ring(
    user_position: &Vector3<f64>,
    count: usize,
    elevation_deg: f64,
    slant_range_m: f64,
) -> Vec<PositionVelocity> {
    let (lat, lon, _) = frames::ecef_to_geodetic(user_position).unwrap();
    let ned_to_ecef = frames::ecef_to_ned_rotation(lat, lon).transpose();

    let elevation = elevation_deg.to_radians();
    (0..count)
        .map(|k| {
            let azimuth = TAU * k as f64 / count as f64;
            let ned = Vector3::new(
                elevation.cos() * azimuth.cos(),
                elevation.cos() * azimuth.sin(),
                -elevation.sin(),
            );
            PositionVelocity::from_position(user_position + ned_to_ecef * ned * slant_range_m)
        })
        .collect()
}

/// Exact observables at the given user state: Sagnac corrected ranges and
/// range rates plus the stated clock states, no noise.
pub(crate) fn noiseless_measurements(
    user: &PositionVelocity,
    clock_offset: f64,
    clock_drift: f64,
    satellites: &[PositionVelocity],
) -> Vec<Measurement> {
    satellites
        .iter()
        .map(|sat| {
            let los = LineOfSight::new(&sat.position, &user.position);
            Measurement::new(
                los.range + clock_offset,
                geometry::range_rate(&los, sat, user) + clock_drift,
                *sat,
            )
        })
        .collect()
}
