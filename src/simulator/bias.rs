//! Per satellite pseudorange bias generation
use nalgebra::Vector3;

use crate::{cfg::ConstellationConfig, error::Error, geometry, simulator::GaussianSource};

/// Draws the slowly varying pseudorange bias of one satellite: signal in
/// space error plus ionosphere and troposphere contributions, the zenith
/// SDs inflated by the obliquity factor at the satellite elevation.
///
/// Consumes exactly three Gaussian draws per call.
pub fn generate_bias<R: GaussianSource + ?Sized>(
    sat_position: &Vector3<f64>,
    user_position: &Vector3<f64>,
    cfg: &ConstellationConfig,
    rng: &mut R,
) -> Result<f64, Error> {
    let elevation = geometry::elevation_rad(sat_position, user_position)?
        .max(cfg.mask_angle_deg().to_radians());

    let cos_el_sq = elevation.cos().powi(2);
    let iono_sd = cfg.zenith_iono_sd() / (1.0 - 0.899 * cos_el_sq).sqrt();
    let tropo_sd = cfg.zenith_tropo_sd() / (1.0 - 0.998 * cos_el_sq).sqrt();

    Ok(cfg.sis_sd() * rng.next_gaussian()
        + iono_sd * rng.next_gaussian()
        + tropo_sd * rng.next_gaussian())
}

/// Batch form of [generate_bias]: one bias per satellite position, in the
/// same order.
pub fn generate_biases<R: GaussianSource + ?Sized>(
    sat_positions: &[Vector3<f64>],
    user_position: &Vector3<f64>,
    cfg: &ConstellationConfig,
    rng: &mut R,
) -> Result<Vec<f64>, Error> {
    let mut biases = Vec::with_capacity(sat_positions.len());
    generate_biases_into(sat_positions, user_position, cfg, rng, &mut biases)?;
    Ok(biases)
}

/// Fill variant of [generate_biases], for callers recycling an
/// allocation across epochs. The output is cleared first.
pub fn generate_biases_into<R: GaussianSource + ?Sized>(
    sat_positions: &[Vector3<f64>],
    user_position: &Vector3<f64>,
    cfg: &ConstellationConfig,
    rng: &mut R,
    output: &mut Vec<f64>,
) -> Result<(), Error> {
    output.clear();
    for sat_position in sat_positions {
        output.push(generate_bias(sat_position, user_position, cfg, rng)?);
    }
    Ok(())
}
