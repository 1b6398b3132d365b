#![doc = include_str!("../README.md")]

// private modules
mod cfg;
mod dop;
mod error;
mod estimation;
mod frames;
mod geometry;
mod kinematics;
mod lsq;
mod measurement;
mod navigation;
mod simulator;

pub(crate) mod constants;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{ConstellationConfig, KalmanConfig};
    pub use crate::constants::Constants;
    pub use crate::dop::DilutionOfPrecision;
    pub use crate::error::Error;
    pub use crate::estimation::Estimation;
    pub use crate::frames::{ecef_to_geodetic, ecef_to_ned_rotation, geodetic_to_ecef};
    pub use crate::kinematics::PositionVelocity;
    pub use crate::lsq::LeastSquaresSolver;
    pub use crate::measurement::Measurement;
    pub use crate::navigation::estimator::{EstimatorListener, Hook, KalmanEstimator};
    pub use crate::navigation::kalman::{
        epoch_update, epoch_update_duration, time_update, time_update_duration,
    };
    pub use crate::navigation::state::KalmanState;
    pub use crate::simulator::GaussianSource;
    pub use crate::simulator::bias::{generate_bias, generate_biases, generate_biases_into};
    pub use crate::simulator::constellation::satellite_states;
    pub use crate::simulator::measurements::generate_measurements;
    // re-export
    pub use hifitime::{Duration, Epoch};
    pub use nalgebra::{Vector3, Vector4};
}
