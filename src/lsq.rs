//! Least squares bootstrap solver
use log::debug;

use nalgebra::{Const, DVector, Dyn, OMatrix, Vector3, Vector4, base::dimension::U4};

use crate::{
    dop::DilutionOfPrecision,
    error::Error,
    frames,
    geometry::{self, LineOfSight},
    kinematics::PositionVelocity,
    measurement::Measurement,
};

/// Minimal number of measurements to resolve 4 unknowns.
pub(crate) const MIN_MEASUREMENTS: usize = 4;

/// Residual and Jacobian of a nonlinear measurement block, evaluated at a
/// 4 element linearization point.
trait ResidualModel {
    fn evaluate(&self, x: &Vector4<f64>) -> (OMatrix<f64, Dyn, U4>, DVector<f64>);
}

/// Pseudorange residual/Jacobian block. The linearization point is
/// `[x, y, z, clock_offset]`; predicted ranges are Sagnac corrected.
pub struct PseudorangeEquations<'a> {
    measurements: &'a [Measurement],
}

impl<'a> PseudorangeEquations<'a> {
    pub fn new(measurements: &'a [Measurement]) -> Result<Self, Error> {
        if measurements.len() < MIN_MEASUREMENTS {
            return Err(Error::InsufficientMeasurements);
        }
        Ok(Self { measurements })
    }
}

impl ResidualModel for PseudorangeEquations<'_> {
    fn evaluate(&self, x: &Vector4<f64>) -> (OMatrix<f64, Dyn, U4>, DVector<f64>) {
        let m = self.measurements.len();
        let user_position = Vector3::new(x[0], x[1], x[2]);

        let mut h = OMatrix::<f64, Dyn, U4>::zeros_generic(Dyn(m), Const::<4>);
        let mut y = DVector::<f64>::zeros(m);

        for (j, meas) in self.measurements.iter().enumerate() {
            let los = LineOfSight::new(&meas.sat.position, &user_position);
            let unit = los.unit();

            h[(j, 0)] = -unit[0];
            h[(j, 1)] = -unit[1];
            h[(j, 2)] = -unit[2];
            h[(j, 3)] = 1.0_f64;

            y[j] = meas.pseudorange - (los.range + x[3]);
        }
        (h, y)
    }
}

/// Pseudorange rate residual/Jacobian block, linearized around
/// `[vx, vy, vz, clock_drift]` at an already resolved user position.
pub struct PseudorangeRateEquations<'a> {
    measurements: &'a [Measurement],
    user_position: Vector3<f64>,
}

impl<'a> PseudorangeRateEquations<'a> {
    pub fn new(
        measurements: &'a [Measurement],
        user_position: Vector3<f64>,
    ) -> Result<Self, Error> {
        if measurements.len() < MIN_MEASUREMENTS {
            return Err(Error::InsufficientMeasurements);
        }
        Ok(Self {
            measurements,
            user_position,
        })
    }
}

impl ResidualModel for PseudorangeRateEquations<'_> {
    fn evaluate(&self, x: &Vector4<f64>) -> (OMatrix<f64, Dyn, U4>, DVector<f64>) {
        let m = self.measurements.len();
        let user = PositionVelocity::new(self.user_position, Vector3::new(x[0], x[1], x[2]));

        let mut h = OMatrix::<f64, Dyn, U4>::zeros_generic(Dyn(m), Const::<4>);
        let mut y = DVector::<f64>::zeros(m);

        for (j, meas) in self.measurements.iter().enumerate() {
            let los = LineOfSight::new(&meas.sat.position, &user.position);
            let unit = los.unit();
            let predicted = geometry::range_rate(&los, &meas.sat, &user) + x[3];

            h[(j, 0)] = -unit[0];
            h[(j, 1)] = -unit[1];
            h[(j, 2)] = -unit[2];
            h[(j, 3)] = 1.0_f64;

            y[j] = meas.pseudorange_rate - predicted;
        }
        (h, y)
    }
}

/// Gauss-Newton solver refining a position + clock offset (and velocity +
/// clock drift) estimate from raw observables. Used to seed the Kalman
/// filter on its first epoch and as an independent single epoch reference.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresSolver {
    /// Iteration budget before [Error::Convergence]
    pub max_iterations: usize,
    /// Per step update norm below which iteration stops
    pub convergence_threshold: f64,
}

impl Default for LeastSquaresSolver {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            convergence_threshold: 1E-6,
        }
    }
}

impl LeastSquaresSolver {
    pub fn new() -> Self {
        Default::default()
    }

    /// Refines `[x, y, z, clock_offset]` from pseudoranges, starting from
    /// the given linearization point. The origin is an acceptable prior
    /// for any terrestrial user.
    pub fn resolve_position(
        &self,
        measurements: &[Measurement],
        apriori: &Vector4<f64>,
    ) -> Result<Vector4<f64>, Error> {
        let equations = PseudorangeEquations::new(measurements)?;
        self.iterate(&equations, apriori)
    }

    /// Geometry figures of merit at the resolved position.
    pub fn dilution_of_precision(
        &self,
        measurements: &[Measurement],
        user_position: &Vector3<f64>,
    ) -> Result<DilutionOfPrecision, Error> {
        let equations = PseudorangeEquations::new(measurements)?;
        let point = Vector4::new(user_position[0], user_position[1], user_position[2], 0.0);

        let (h, _) = equations.evaluate(&point);
        let q = (h.transpose() * h)
            .try_inverse()
            .ok_or(Error::SingularGeometry)?;

        let (lat, lon, _) = frames::ecef_to_geodetic(user_position)?;
        Ok(DilutionOfPrecision::new(q, lat, lon))
    }

    /// Refines `[vx, vy, vz, clock_drift]` from pseudorange rates at an
    /// already resolved user position.
    pub fn resolve_velocity(
        &self,
        measurements: &[Measurement],
        user_position: &Vector3<f64>,
        apriori: &Vector4<f64>,
    ) -> Result<Vector4<f64>, Error> {
        let equations = PseudorangeRateEquations::new(measurements, *user_position)?;
        self.iterate(&equations, apriori)
    }

    fn iterate(
        &self,
        model: &impl ResidualModel,
        apriori: &Vector4<f64>,
    ) -> Result<Vector4<f64>, Error> {
        let mut x = *apriori;
        for iteration in 0..self.max_iterations {
            let (h, y) = model.evaluate(&x);
            let h_prime = h.transpose();

            let normal = (&h_prime * &h)
                .try_inverse()
                .ok_or(Error::SingularGeometry)?;

            let delta = normal * (h_prime * y);
            x += delta;

            if !x.iter().all(|v| v.is_finite()) {
                return Err(Error::Numerical);
            }

            if delta.norm() <= self.convergence_threshold {
                debug!("lsq converged in {} iterations", iteration + 1);
                return Ok(x);
            }
        }
        Err(Error::Convergence)
    }
}
