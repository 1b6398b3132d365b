use nalgebra::{OVector, Vector3, base::dimension::U8};

use crate::kinematics::PositionVelocity;

/// Recursive estimate of the user state: ECEF position and velocity,
/// receiver clock offset and clock drift.
///
/// The vector order is fixed and shared with the transition and
/// measurement matrices: `[x, y, z, vx, vy, vz, clock_offset, clock_drift]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimation {
    /// ECEF x [m]
    pub x: f64,
    /// ECEF y [m]
    pub y: f64,
    /// ECEF z [m]
    pub z: f64,
    /// ECEF x velocity [m/s]
    pub vx: f64,
    /// ECEF y velocity [m/s]
    pub vy: f64,
    /// ECEF z velocity [m/s]
    pub vz: f64,
    /// Receiver clock offset, expressed as range [m]
    pub clock_offset: f64,
    /// Receiver clock drift, expressed as range rate [m/s]
    pub clock_drift: f64,
}

impl Estimation {
    /// Builds an [Estimation] from a kinematic state and clock states.
    pub fn from_position_velocity(
        pv: PositionVelocity,
        clock_offset: f64,
        clock_drift: f64,
    ) -> Self {
        Self {
            x: pv.position[0],
            y: pv.position[1],
            z: pv.position[2],
            vx: pv.velocity[0],
            vy: pv.velocity[1],
            vz: pv.velocity[2],
            clock_offset,
            clock_drift,
        }
    }

    /// Estimated ECEF position [m].
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Estimated ECEF velocity [m/s].
    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.vx, self.vy, self.vz)
    }

    /// Estimated kinematic state.
    pub fn position_velocity(&self) -> PositionVelocity {
        PositionVelocity::new(self.position(), self.velocity())
    }

    /// State vector in wire order.
    pub fn to_vector(&self) -> OVector<f64, U8> {
        OVector::<f64, U8>::from([
            self.x,
            self.y,
            self.z,
            self.vx,
            self.vy,
            self.vz,
            self.clock_offset,
            self.clock_drift,
        ])
    }

    /// Rebuilds an [Estimation] from a state vector in wire order.
    pub fn from_vector(v: &OVector<f64, U8>) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
            vx: v[3],
            vy: v[4],
            vz: v[5],
            clock_offset: v[6],
            clock_drift: v[7],
        }
    }

    /// Overwrites self from a state vector in wire order.
    pub fn copy_from_vector(&mut self, v: &OVector<f64, U8>) {
        *self = Self::from_vector(v);
    }
}
