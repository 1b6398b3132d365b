//! Geodetic and local frame conversions
use map_3d::{Ellipsoid, ecef2geodetic, geodetic2ecef};
use nalgebra::{Matrix3, Vector3};

use crate::error::Error;

/// Geodetic latitude [rad], longitude [rad] and height above the
/// ellipsoid [m] of an ECEF point.
pub fn ecef_to_geodetic(ecef: &Vector3<f64>) -> Result<(f64, f64, f64), Error> {
    let (lat, lon, height) = ecef2geodetic(ecef[0], ecef[1], ecef[2], Ellipsoid::WGS84);
    if lat.is_finite() && lon.is_finite() && height.is_finite() {
        Ok((lat, lon, height))
    } else {
        Err(Error::Conversion)
    }
}

/// ECEF point from geodetic latitude [rad], longitude [rad] and height
/// above the ellipsoid [m].
pub fn geodetic_to_ecef(lat_rad: f64, lon_rad: f64, height: f64) -> Vector3<f64> {
    let (x, y, z) = geodetic2ecef(lat_rad, lon_rad, height, Ellipsoid::WGS84);
    Vector3::new(x, y, z)
}

/// ECEF to NED rotation at the given geodetic coordinates.
pub fn ecef_to_ned_rotation(lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = (lat_rad.sin(), lat_rad.cos());
    let (sin_lon, cos_lon) = (lon_rad.sin(), lon_rad.cos());
    Matrix3::new(
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        -sin_lon,
        cos_lon,
        0.0_f64,
        -cos_lat * cos_lon,
        -cos_lat * sin_lon,
        -sin_lat,
    )
}
