//! Dilution of precision
use nalgebra::{Matrix3, Matrix4};

use crate::frames;

/// Solution quality figures derived from the satellite geometry at the
/// resolved position.
#[derive(Debug, Clone, Copy, Default)]
pub struct DilutionOfPrecision {
    /// Geometric DOP
    pub gdop: f64,
    /// Position DOP
    pub pdop: f64,
    /// Temporal DOP
    pub tdop: f64,
    /// Horizontal DOP
    pub hdop: f64,
    /// Vertical DOP
    pub vdop: f64,
}

impl DilutionOfPrecision {
    /// Position block of the cofactor matrix, rotated into the local NED
    /// frame so the horizontal and vertical contributions separate.
    fn q_ned(q: &Matrix4<f64>, lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
        let cen = frames::ecef_to_ned_rotation(lat_rad, lon_rad);

        let q_3 = Matrix3::new(
            q[(0, 0)],
            q[(0, 1)],
            q[(0, 2)],
            q[(1, 0)],
            q[(1, 1)],
            q[(1, 2)],
            q[(2, 0)],
            q[(2, 1)],
            q[(2, 2)],
        );

        cen * q_3 * cen.transpose()
    }

    /// Builds the figures from the cofactor matrix `(H^T H)^-1` of a
    /// position + clock geometry.
    pub(crate) fn new(q: Matrix4<f64>, lat_rad: f64, lon_rad: f64) -> Self {
        let q_ned = Self::q_ned(&q, lat_rad, lon_rad);

        Self {
            gdop: q.trace().sqrt(),
            pdop: (q[(0, 0)] + q[(1, 1)] + q[(2, 2)]).sqrt(),
            tdop: q[(3, 3)].sqrt(),
            hdop: (q_ned[(0, 0)] + q_ned[(1, 1)]).sqrt(),
            vdop: q_ned[(2, 2)].sqrt(),
        }
    }
}
