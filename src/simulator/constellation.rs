//! Deterministic circular orbit constellation
use std::f64::consts::TAU;

use nalgebra::{Rotation3, Vector3};

use crate::{cfg::ConstellationConfig, constants::Constants, kinematics::PositionVelocity};

/// Satellite ECEF states at simulation time `t_seconds`.
///
/// Satellite j of n flies a circular orbit at the configured radius and
/// inclination, at mean anomaly `ω(t + timing_offset) + 2πj/n` in a plane
/// rotated by `longitude_offset + 2πj/n`, which spreads the constellation
/// over distinct planes so any 4 visible satellites span 3D space.
pub fn satellite_states(t_seconds: f64, cfg: &ConstellationConfig) -> Vec<PositionVelocity> {
    let n = cfg.num_satellites();
    let radius = cfg.orbital_radius();
    let inclination = cfg.inclination_deg().to_radians();
    let omega_orbit = (Constants::EARTH_GRAVITATION / radius.powi(3)).sqrt();

    let mut states = Vec::with_capacity(n);

    for j in 0..n {
        let spread = TAU * j as f64 / n as f64;
        let anomaly = omega_orbit * (t_seconds + cfg.timing_offset()) + spread;
        let plane = cfg.longitude_offset_deg().to_radians() + spread;

        let (sin_a, cos_a) = (anomaly.sin(), anomaly.cos());
        let in_plane_position = Vector3::new(radius * cos_a, radius * sin_a, 0.0);
        let in_plane_velocity = Vector3::new(
            -radius * omega_orbit * sin_a,
            radius * omega_orbit * cos_a,
            0.0,
        );

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), plane)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), inclination);

        states.push(PositionVelocity::new(
            rotation * in_plane_position,
            rotation * in_plane_velocity,
        ));
    }
    states
}

#[cfg(test)]
mod test {
    use super::satellite_states;
    use crate::{cfg::ConstellationConfig, constants::Constants};

    #[test]
    fn states_sit_on_the_configured_orbit() {
        let cfg = ConstellationConfig::default();
        let radius = cfg.orbital_radius();
        let speed = (Constants::EARTH_GRAVITATION / radius).sqrt();

        let states = satellite_states(120.0, &cfg);
        assert_eq!(states.len(), cfg.num_satellites());

        for state in states {
            assert!((state.position.norm() - radius).abs() < 1E-3);
            assert!((state.velocity.norm() - speed).abs() < 1E-6);
            // circular orbit: velocity orthogonal to the radius vector
            assert!(state.position.dot(&state.velocity).abs() < 1E-2 * radius);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let cfg = ConstellationConfig::default();
        assert_eq!(satellite_states(42.0, &cfg), satellite_states(42.0, &cfg));
    }
}
