//! Stateless Kalman epoch update
use hifitime::Duration;

use nalgebra::{
    Const, DMatrix, DVector, Dyn, OMatrix, OVector, Vector3,
    base::dimension::U8,
};

use crate::{
    cfg::KalmanConfig,
    error::Error,
    estimation::Estimation,
    geometry::{self, LineOfSight},
    kinematics::PositionVelocity,
    measurement::Measurement,
    navigation::state::KalmanState,
};

/// State transition over the propagation interval: identity plus first
/// order coupling of position to velocity and clock offset to drift.
fn transition_matrix(dt: f64) -> OMatrix<f64, U8, U8> {
    let mut phi = OMatrix::<f64, U8, U8>::identity();
    phi[(0, 3)] = dt;
    phi[(1, 4)] = dt;
    phi[(2, 5)] = dt;
    phi[(6, 7)] = dt;
    phi
}

/// Process noise accumulated over the interval: continuous-discrete white
/// noise acceleration for the kinematic block, phase + frequency noise
/// for the clock block.
fn process_noise(dt: f64, cfg: &KalmanConfig) -> OMatrix<f64, U8, U8> {
    let accel = cfg.accel_psd();
    let clock_freq = cfg.clock_frequency_psd();
    let clock_phase = cfg.clock_phase_psd();

    let mut q = OMatrix::<f64, U8, U8>::zeros();

    let q_pos = accel * dt.powi(3) / 3.0;
    let q_cross = accel * dt.powi(2) / 2.0;
    let q_vel = accel * dt;
    for i in 0..3 {
        q[(i, i)] = q_pos;
        q[(i, i + 3)] = q_cross;
        q[(i + 3, i)] = q_cross;
        q[(i + 3, i + 3)] = q_vel;
    }

    q[(6, 6)] = clock_freq * dt.powi(3) / 3.0 + clock_phase * dt;
    q[(6, 7)] = clock_freq * dt.powi(2) / 2.0;
    q[(7, 6)] = clock_freq * dt.powi(2) / 2.0;
    q[(7, 7)] = clock_freq * dt;

    q
}

/// Per epoch measurement model linearized at the propagated state:
/// measurement matrix, noise covariance and innovation vector.
pub(crate) struct MeasurementModel {
    /// 2m x 8 measurement matrix
    pub h: OMatrix<f64, Dyn, U8>,
    /// 2m x 2m block diagonal noise covariance
    pub r: DMatrix<f64>,
    /// 2m innovation: measured minus predicted observables
    pub innovation: DVector<f64>,
}

impl MeasurementModel {
    pub fn new(
        measurements: &[Measurement],
        propagated: &OVector<f64, U8>,
        cfg: &KalmanConfig,
    ) -> Self {
        let m = measurements.len();
        let user = PositionVelocity::new(
            Vector3::new(propagated[0], propagated[1], propagated[2]),
            Vector3::new(propagated[3], propagated[4], propagated[5]),
        );

        let mut h = OMatrix::<f64, Dyn, U8>::zeros_generic(Dyn(2 * m), Const::<8>);
        let mut innovation = DVector::<f64>::zeros(2 * m);

        for (j, meas) in measurements.iter().enumerate() {
            let los = LineOfSight::new(&meas.sat.position, &user.position);
            let unit = los.unit();

            let predicted_range = los.range + propagated[6];
            let predicted_rate = geometry::range_rate(&los, &meas.sat, &user) + propagated[7];

            for k in 0..3 {
                h[(j, k)] = -unit[k];
                h[(m + j, 3 + k)] = -unit[k];
            }
            h[(j, 6)] = 1.0_f64;
            h[(m + j, 7)] = 1.0_f64;

            innovation[j] = meas.pseudorange - predicted_range;
            innovation[m + j] = meas.pseudorange_rate - predicted_rate;
        }

        let mut r = DMatrix::<f64>::zeros(2 * m, 2 * m);
        let pseudorange_var = cfg.pseudorange_sd().powi(2);
        let range_rate_var = cfg.range_rate_sd().powi(2);
        for j in 0..m {
            r[(j, j)] = pseudorange_var;
            r[(m + j, m + j)] = range_rate_var;
        }

        Self { h, r, innovation }
    }
}

/// Pure predict: propagates the state and accumulates process noise,
/// without any measurement. Equivalent to [epoch_update] with an empty
/// measurement set.
pub fn time_update(
    prior: &KalmanState,
    dt_seconds: f64,
    cfg: &KalmanConfig,
) -> Result<KalmanState, Error> {
    let phi = transition_matrix(dt_seconds);
    let q = process_noise(dt_seconds, cfg);

    let x = phi * prior.estimation.to_vector();
    let p = phi * prior.covariance * phi.transpose() + q;

    finish(x, p)
}

/// [Duration] form of [time_update]; strictly equivalent.
pub fn time_update_duration(
    prior: &KalmanState,
    dt: Duration,
    cfg: &KalmanConfig,
) -> Result<KalmanState, Error> {
    time_update(prior, dt.to_seconds(), cfg)
}

/// One full epoch: state and covariance propagation over `dt_seconds`,
/// then a measurement update from the proposed observables. Stateless:
/// the posterior is returned and the prior left untouched.
pub fn epoch_update(
    prior: &KalmanState,
    measurements: &[Measurement],
    dt_seconds: f64,
    cfg: &KalmanConfig,
) -> Result<KalmanState, Error> {
    if measurements.is_empty() {
        return time_update(prior, dt_seconds, cfg);
    }

    let phi = transition_matrix(dt_seconds);
    let q = process_noise(dt_seconds, cfg);

    let x_minus = phi * prior.estimation.to_vector();
    let p_minus = phi * prior.covariance * phi.transpose() + q;

    let model = MeasurementModel::new(measurements, &x_minus, cfg);

    let s = &model.h * p_minus * model.h.transpose() + &model.r;
    let s_inverse = s.try_inverse().ok_or(Error::SingularGain)?;

    let gain = p_minus * model.h.transpose() * s_inverse;

    let x = x_minus + &gain * &model.innovation;
    let p = (OMatrix::<f64, U8, U8>::identity() - &gain * &model.h) * p_minus;

    finish(x, p)
}

/// [Duration] form of [epoch_update]; strictly equivalent.
pub fn epoch_update_duration(
    prior: &KalmanState,
    measurements: &[Measurement],
    dt: Duration,
    cfg: &KalmanConfig,
) -> Result<KalmanState, Error> {
    epoch_update(prior, measurements, dt.to_seconds(), cfg)
}

fn finish(x: OVector<f64, U8>, p: OMatrix<f64, U8, U8>) -> Result<KalmanState, Error> {
    if x.iter().any(|v| !v.is_finite()) || p.iter().any(|v| !v.is_finite()) {
        return Err(Error::Numerical);
    }
    Ok(KalmanState {
        estimation: Estimation::from_vector(&x),
        covariance: p,
    })
}
