use nalgebra::Vector3;

/// ECEF position and velocity aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionVelocity {
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity: Vector3<f64>,
}

impl PositionVelocity {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Static point: zero velocity.
    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
        }
    }
}
