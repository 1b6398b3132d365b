//! Filtered driver scenarios
use std::{cell::RefCell, rc::Rc};

use hifitime::{Duration, Epoch};
use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    cfg::{ConstellationConfig, KalmanConfig},
    error::Error,
    kinematics::PositionVelocity,
    measurement::Measurement,
    navigation::estimator::{EstimatorListener, Hook, KalmanEstimator},
    simulator::measurements::generate_measurements,
    tests::{azimuth_ring, init_logger, noiseless_measurements},
};
use nalgebra::Vector3;

fn scenario_config() -> ConstellationConfig {
    let mut cfg = ConstellationConfig::default();
    cfg.set_code_sd(0.05).unwrap();
    cfg.set_range_rate_sd(0.005).unwrap();
    cfg.set_initial_clock_offset(0.5).unwrap();
    cfg.set_initial_clock_drift(1.0E-4).unwrap();
    cfg.set_mask_angle_deg(5.0).unwrap();
    cfg
}

fn truth_user() -> PositionVelocity {
    PositionVelocity::from_position(Vector3::new(3_912_960.8, 3_912_960.8, 3_170_373.7))
}

fn epoch_measurements(
    t_seconds: f64,
    user: &PositionVelocity,
    scenario: &ConstellationConfig,
    rng: &mut SmallRng,
) -> Vec<Measurement> {
    let satellites = azimuth_ring(&user.position, 7, 40.0, 2.0E7);
    let biases = vec![0.0; satellites.len()];
    generate_measurements(t_seconds, &satellites, user, &biases, scenario, rng).unwrap()
}

fn record(events: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Option<Hook> {
    let events = events.clone();
    Some(Box::new(move |_: &KalmanEstimator| {
        events.borrow_mut().push(name);
    }))
}

/// Records every hook invocation in order.
fn recording_listener(events: Rc<RefCell<Vec<&'static str>>>) -> EstimatorListener {
    EstimatorListener {
        on_update_start: record(&events, "update_start"),
        on_update_end: record(&events, "update_end"),
        on_propagate_start: record(&events, "propagate_start"),
        on_propagate_end: record(&events, "propagate_end"),
        on_reset: record(&events, "reset"),
    }
}

#[test]
fn not_ready_without_configuration_or_minimum_set() {
    let user = truth_user();
    let satellites = azimuth_ring(&user.position, 7, 40.0, 2.0E7);
    let measurements = noiseless_measurements(&user, 0.5, 1.0E-4, &satellites);
    let t0 = Epoch::from_gpst_seconds(1_000.0);

    let unconfigured = KalmanEstimator::new();
    assert_eq!(
        unconfigured.update_measurements(&measurements, t0),
        Err(Error::NotReady),
    );

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    assert!(!estimator.is_update_measurements_ready(&measurements[..3]));
    assert_eq!(
        estimator.update_measurements(&measurements[..3], t0),
        Err(Error::NotReady),
    );

    // propagation requires a bootstrapped state
    assert_eq!(estimator.propagate(t0), Err(Error::NotReady));
}

#[test]
fn bootstrap_converges_to_truth() {
    init_logger();

    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(3);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);

    assert!(estimator.is_update_measurements_ready(&measurements));
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    let estimation = estimator.estimation().unwrap();
    assert!((estimation.position() - user.position).norm() < 0.5);
    assert!(estimation.velocity().norm() < 0.05);
    assert!((estimation.clock_offset - 0.5).abs() < 0.5);

    assert_eq!(estimator.last_state_timestamp(), Some(t0));
    assert_eq!(estimator.measurements().len(), measurements.len());
}

#[test]
fn tracking_survives_subsequent_epochs() {
    init_logger();

    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(7);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let t0 = Epoch::from_gpst_seconds(1_000.0);

    for epoch in 0..5 {
        let t_sim = epoch as f64;
        let measurements = epoch_measurements(t_sim, &user, &scenario, &mut rng);
        let t = t0 + Duration::from_seconds(t_sim);
        assert!(estimator.update_measurements(&measurements, t).unwrap());
    }

    let estimation = estimator.estimation().unwrap();
    assert!((estimation.position() - user.position).norm() < 0.5);
    assert!(estimation.velocity().norm() < 0.05);
}

#[test]
fn stale_timestamps_are_ignored_without_side_effects() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(11);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    let events = Rc::new(RefCell::new(Vec::new()));
    estimator
        .set_listener(Some(recording_listener(events.clone())))
        .unwrap();

    let before = estimator.state().unwrap();
    let retry = epoch_measurements(0.0, &user, &scenario, &mut rng);

    // same timestamp: no-op, no hook
    assert!(!estimator.update_measurements(&retry, t0).unwrap());
    assert_eq!(estimator.state().unwrap(), before);
    assert_eq!(estimator.measurements().len(), measurements.len());
    assert!(events.borrow().is_empty());

    // and so is an earlier one
    let earlier = t0 - Duration::from_seconds(1.0);
    assert!(!estimator.update_measurements(&retry, earlier).unwrap());
    assert!(!estimator.propagate(earlier).unwrap());
    assert!(events.borrow().is_empty());
}

#[test]
fn hooks_fire_in_documented_order() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(13);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let events = Rc::new(RefCell::new(Vec::new()));
    estimator
        .set_listener(Some(recording_listener(events.clone())))
        .unwrap();
    estimator
        .set_epoch_interval(Duration::from_seconds(0.5))
        .unwrap();

    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());
    assert_eq!(*events.borrow(), vec!["update_start", "update_end"]);

    // next epoch is 2 s away: catching up takes sub-steps first
    events.borrow_mut().clear();
    let measurements = epoch_measurements(2.0, &user, &scenario, &mut rng);
    let t1 = t0 + Duration::from_seconds(2.0);
    assert!(estimator.update_measurements(&measurements, t1).unwrap());
    assert_eq!(
        *events.borrow(),
        vec![
            "propagate_start",
            "propagate_end",
            "update_start",
            "update_end"
        ]
    );

    events.borrow_mut().clear();
    assert!(estimator.propagate(t1 + Duration::from_seconds(1.0)).unwrap());
    assert_eq!(*events.borrow(), vec!["propagate_start", "propagate_end"]);
}

#[test]
fn mutators_are_locked_inside_hooks() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(17);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let observed = Rc::new(RefCell::new(Vec::new()));

    let listener = EstimatorListener {
        on_update_end: Some(Box::new({
            let observed = observed.clone();
            move |estimator: &KalmanEstimator| {
                assert!(estimator.is_running());
                // accessors remain available
                assert!(estimator.estimation().is_some());
                let t = estimator.last_state_timestamp().unwrap();

                let mut observed = observed.borrow_mut();
                observed.push(estimator.reset().unwrap_err());
                observed.push(estimator.propagate(t).unwrap_err());
                observed.push(
                    estimator
                        .set_epoch_interval(Duration::from_seconds(1.0))
                        .unwrap_err(),
                );
                observed.push(estimator.set_config(KalmanConfig::default()).unwrap_err());
                observed.push(estimator.set_listener(None).unwrap_err());
            }
        })),
        ..Default::default()
    };
    estimator.set_listener(Some(listener)).unwrap();

    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    assert_eq!(*observed.borrow(), vec![Error::Locked; 5]);
    // the lock is released once the mutator returns
    assert!(!estimator.is_running());
    assert!(estimator.reset().is_ok());
}

#[test]
fn reset_forces_a_new_bootstrap() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(19);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let events = Rc::new(RefCell::new(Vec::new()));
    estimator
        .set_listener(Some(recording_listener(events.clone())))
        .unwrap();

    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    estimator.reset().unwrap();
    assert!(estimator.state().is_none());
    assert!(estimator.estimation().is_none());
    assert!(estimator.last_state_timestamp().is_none());
    assert!(estimator.measurements().is_empty());
    assert!(events.borrow().contains(&"reset"));

    // a timestamp older than the pre-reset epoch is accepted again
    let earlier = t0 - Duration::from_seconds(100.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, earlier).unwrap());
    assert!(estimator.state().is_some());
}

#[test]
fn sub_stepped_catch_up_matches_a_single_step() {
    let scenario = scenario_config();
    let user = truth_user();

    // the white noise models compose exactly over sub-intervals, so the
    // two drivers must agree up to rounding
    let mut rng = SmallRng::seed_from_u64(31);
    let first = epoch_measurements(0.0, &user, &scenario, &mut rng);
    let second = epoch_measurements(2.0, &user, &scenario, &mut rng);

    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let t1 = t0 + Duration::from_seconds(2.0);

    let stepped = KalmanEstimator::with_config(KalmanConfig::default());
    stepped
        .set_epoch_interval(Duration::from_seconds(0.5))
        .unwrap();
    assert!(stepped.update_measurements(&first, t0).unwrap());
    assert!(stepped.update_measurements(&second, t1).unwrap());

    let direct = KalmanEstimator::with_config(KalmanConfig::default());
    assert!(direct.update_measurements(&first, t0).unwrap());
    assert!(direct.update_measurements(&second, t1).unwrap());

    let stepped = stepped.state().unwrap();
    let direct = direct.state().unwrap();
    let x_delta = stepped.estimation.to_vector() - direct.estimation.to_vector();
    assert!(x_delta.norm() < 1E-6);
    assert!((stepped.covariance - direct.covariance).norm() < 1E-6 * direct.covariance.norm());
}

#[test]
fn propagation_grows_the_covariance() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(23);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    let updated = estimator.state().unwrap();

    let t1 = t0 + Duration::from_seconds(1_000.0);
    assert!(estimator.propagate(t1).unwrap());
    assert_eq!(estimator.last_state_timestamp(), Some(t1));

    let propagated = estimator.state().unwrap();
    assert!(propagated.covariance.norm() >= updated.covariance.norm());
}

#[test]
fn failed_updates_leave_the_state_intact() {
    let scenario = scenario_config();
    let user = truth_user();
    let mut rng = SmallRng::seed_from_u64(29);

    let estimator = KalmanEstimator::with_config(KalmanConfig::default());
    let t0 = Epoch::from_gpst_seconds(1_000.0);
    let measurements = epoch_measurements(0.0, &user, &scenario, &mut rng);
    assert!(estimator.update_measurements(&measurements, t0).unwrap());

    let before = estimator.state().unwrap();

    let mut corrupted = epoch_measurements(1.0, &user, &scenario, &mut rng);
    corrupted[0].pseudorange = f64::INFINITY;
    let t1 = t0 + Duration::from_seconds(1.0);
    assert!(estimator.update_measurements(&corrupted, t1).is_err());

    assert_eq!(estimator.state().unwrap(), before);
    assert_eq!(estimator.last_state_timestamp(), Some(t0));
    assert_eq!(estimator.measurements().len(), measurements.len());
}
