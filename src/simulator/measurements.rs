//! Synthetic observable generation
use itertools::izip;
use log::debug;

use crate::{
    cfg::ConstellationConfig,
    error::Error,
    geometry::{self, LineOfSight},
    kinematics::PositionVelocity,
    measurement::Measurement,
    simulator::GaussianSource,
};

/// Synthesizes the observables of the visible subset of the constellation
/// at simulation time `t_seconds`, in satellite order.
///
/// Satellites below the mask angle are omitted and consume no draw; each
/// visible satellite consumes one code Gaussian then one range rate
/// Gaussian. Pseudoranges carry the Sagnac corrected geometric range, the
/// proposed bias, the receiver clock offset accrued at `t_seconds` and
/// code tracking noise; pseudorange rates carry the corrected range rate,
/// the receiver clock drift and rate tracking noise.
///
/// `biases` must hold one entry per satellite, as produced by
/// [crate::simulator::bias::generate_biases].
pub fn generate_measurements<R: GaussianSource + ?Sized>(
    t_seconds: f64,
    satellites: &[PositionVelocity],
    user: &PositionVelocity,
    biases: &[f64],
    cfg: &ConstellationConfig,
    rng: &mut R,
) -> Result<Vec<Measurement>, Error> {
    debug_assert_eq!(satellites.len(), biases.len());

    let mask_rad = cfg.mask_angle_deg().to_radians();
    let clock_offset = cfg.initial_clock_offset() + cfg.initial_clock_drift() * t_seconds;
    let clock_drift = cfg.initial_clock_drift();

    let mut visible = Vec::with_capacity(satellites.len());

    for (index, sat, bias) in izip!(0.., satellites, biases) {
        let elevation = geometry::elevation_rad(&sat.position, &user.position)?;
        if elevation < mask_rad {
            debug!(
                "satellite #{} below mask ({:.1}°), omitted",
                index,
                elevation.to_degrees()
            );
            continue;
        }

        let los = LineOfSight::new(&sat.position, &user.position);
        let range_rate = geometry::range_rate(&los, sat, user);

        let pseudorange =
            los.range + bias + clock_offset + cfg.code_sd() * rng.next_gaussian();
        let pseudorange_rate =
            range_rate + clock_drift + cfg.range_rate_sd() * rng.next_gaussian();

        visible.push(Measurement::new(pseudorange, pseudorange_rate, *sat));
    }
    Ok(visible)
}
