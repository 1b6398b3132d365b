//! Filtered estimator driver
use std::cell::{Cell, RefCell};

use hifitime::{Duration, Epoch};
use log::{debug, info};
use nalgebra::Vector4;

use crate::{
    cfg::KalmanConfig,
    error::Error,
    estimation::Estimation,
    lsq::{self, LeastSquaresSolver},
    measurement::Measurement,
    navigation::{kalman, state::KalmanState},
};

/// Hook invoked synchronously inside the estimator lock. It receives the
/// estimator and may call its accessors; mutators fail with
/// [Error::Locked] until the ongoing operation returns.
pub type Hook = Box<dyn Fn(&KalmanEstimator)>;

/// Lifecycle observer: a record of optional hooks. Absent hooks are
/// simply skipped.
#[derive(Default)]
pub struct EstimatorListener {
    pub on_update_start: Option<Hook>,
    pub on_update_end: Option<Hook>,
    pub on_propagate_start: Option<Hook>,
    pub on_propagate_end: Option<Hook>,
    pub on_reset: Option<Hook>,
}

enum Event {
    UpdateStart,
    UpdateEnd,
    PropagateStart,
    PropagateEnd,
    Reset,
}

/// Releases the run flag when the operation returns, on success and on
/// error alike.
struct RunGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Stateful driver around the epoch update: owns the latest
/// [KalmanState], the measurements backing the last update and the last
/// update timestamp.
///
/// The first accepted measurement set seeds the filter through the least
/// squares bootstrap; subsequent sets run one Kalman epoch each. All
/// mutating operations complete synchronously and are serialized through
/// an internal run flag: a mutator entered while another one is executing
/// (typically from inside a listener hook) fails with [Error::Locked] and
/// leaves the ongoing operation undisturbed.
pub struct KalmanEstimator {
    /// Filter tuning, absent until provided
    cfg: RefCell<Option<KalmanConfig>>,
    /// Maximal propagation sub-step during measurement updates
    epoch_interval: Cell<Duration>,
    /// Lifecycle observer
    listener: RefCell<Option<EstimatorListener>>,
    /// Bootstrap solver
    solver: LeastSquaresSolver,
    /// Latest state, absent until the first accepted update
    state: RefCell<Option<KalmanState>>,
    /// Measurements backing the last update
    measurements: RefCell<Vec<Measurement>>,
    /// Timestamp of the latest state
    last_t: Cell<Option<Epoch>>,
    /// Run flag: set while a mutating operation is executing
    running: Cell<bool>,
}

impl Default for KalmanEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanEstimator {
    /// Builds an estimator with no configuration: updates fail with
    /// [Error::NotReady] until [Self::set_config] is called.
    pub fn new() -> Self {
        Self {
            cfg: RefCell::new(None),
            epoch_interval: Cell::new(Duration::ZERO),
            listener: RefCell::new(None),
            solver: LeastSquaresSolver::new(),
            state: RefCell::new(None),
            measurements: RefCell::new(Vec::new()),
            last_t: Cell::new(None),
            running: Cell::new(false),
        }
    }

    /// Builds a configured estimator.
    pub fn with_config(cfg: KalmanConfig) -> Self {
        let estimator = Self::new();
        estimator.cfg.replace(Some(cfg));
        estimator
    }

    /// True while a mutating operation is executing (only observable from
    /// inside a listener hook).
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// True if the measurement set is large enough to attempt an update.
    pub fn is_update_measurements_ready(&self, measurements: &[Measurement]) -> bool {
        measurements.len() >= lsq::MIN_MEASUREMENTS
    }

    pub fn config(&self) -> Option<KalmanConfig> {
        self.cfg.borrow().clone()
    }

    pub fn set_config(&self, cfg: KalmanConfig) -> Result<(), Error> {
        let _run = self.lock()?;
        self.cfg.replace(Some(cfg));
        Ok(())
    }

    pub fn epoch_interval(&self) -> Duration {
        self.epoch_interval.get()
    }

    /// Maximal single propagation step applied while catching up to a new
    /// measurement timestamp. Zero (the default) disables sub-stepping.
    pub fn set_epoch_interval(&self, interval: Duration) -> Result<(), Error> {
        let _run = self.lock()?;
        if interval < Duration::ZERO {
            return Err(Error::InvalidConfig("negative epoch interval"));
        }
        self.epoch_interval.set(interval);
        Ok(())
    }

    pub fn set_listener(&self, listener: Option<EstimatorListener>) -> Result<(), Error> {
        let _run = self.lock()?;
        self.listener.replace(listener);
        Ok(())
    }

    /// Latest estimation, absent until the first accepted update.
    pub fn estimation(&self) -> Option<Estimation> {
        (*self.state.borrow()).map(|state| state.estimation)
    }

    /// Latest full state, absent until the first accepted update.
    pub fn state(&self) -> Option<KalmanState> {
        *self.state.borrow()
    }

    /// Timestamp of the latest state.
    pub fn last_state_timestamp(&self) -> Option<Epoch> {
        self.last_t.get()
    }

    /// Measurements backing the last update.
    pub fn measurements(&self) -> Vec<Measurement> {
        self.measurements.borrow().clone()
    }

    /// Proposes a measurement set sampled at `t`.
    ///
    /// The first accepted set bootstraps the filter: pseudoranges resolve
    /// position + clock offset, pseudorange rates resolve velocity +
    /// clock drift, and the configured uncertainties build the initial
    /// covariance. Later sets propagate the state to `t` (in sub-steps of
    /// the epoch interval when one is set) and apply one epoch update.
    ///
    /// Returns false (with no side effect and no hook) when `t` does not
    /// advance past the latest state timestamp. On error the prior state,
    /// measurements and timestamp remain intact.
    pub fn update_measurements(
        &self,
        measurements: &[Measurement],
        t: Epoch,
    ) -> Result<bool, Error> {
        let _run = self.lock()?;

        if !self.is_update_measurements_ready(measurements) {
            return Err(Error::NotReady);
        }
        let cfg = self.cfg.borrow().clone().ok_or(Error::NotReady)?;

        let prior = *self.state.borrow();
        let Some(prior) = prior else {
            self.notify(Event::UpdateStart);
            let seed = self.bootstrap(measurements)?;
            self.state.replace(Some(KalmanState::initial(seed, &cfg)));
            self.measurements.replace(measurements.to_vec());
            self.last_t.set(Some(t));
            info!(
                "{} - initialized at ({:.1}, {:.1}, {:.1})",
                t, seed.x, seed.y, seed.z
            );
            self.notify(Event::UpdateEnd);
            return Ok(true);
        };

        let last_t = self.last_t.get().unwrap_or(t);
        if t <= last_t {
            debug!("{} - stale measurement set, ignored", t);
            return Ok(false);
        }

        let interval = self.epoch_interval.get();
        let mut dt = t - last_t;
        let mut state = prior;

        if interval > Duration::ZERO && dt > interval {
            self.notify(Event::PropagateStart);
            while dt > interval {
                state = kalman::time_update(&state, interval.to_seconds(), &cfg)?;
                dt -= interval;
            }
            self.notify(Event::PropagateEnd);
        }

        self.notify(Event::UpdateStart);
        let state = kalman::epoch_update(&state, measurements, dt.to_seconds(), &cfg)?;
        self.state.replace(Some(state));
        self.measurements.replace(measurements.to_vec());
        self.last_t.set(Some(t));
        self.notify(Event::UpdateEnd);
        Ok(true)
    }

    /// Advances the state to `t` with a pure predict (no measurement).
    /// Returns false when `t` does not advance past the latest state
    /// timestamp.
    pub fn propagate(&self, t: Epoch) -> Result<bool, Error> {
        let _run = self.lock()?;

        let cfg = self.cfg.borrow().clone().ok_or(Error::NotReady)?;
        let prior = (*self.state.borrow()).ok_or(Error::NotReady)?;
        let last_t = self.last_t.get().ok_or(Error::NotReady)?;

        if t <= last_t {
            debug!("{} - stale propagation request, ignored", t);
            return Ok(false);
        }

        self.notify(Event::PropagateStart);
        let state = kalman::time_update(&prior, (t - last_t).to_seconds(), &cfg)?;
        self.state.replace(Some(state));
        self.last_t.set(Some(t));
        self.notify(Event::PropagateEnd);
        Ok(true)
    }

    /// Clears the state, measurements and timestamp. The next accepted
    /// measurement set bootstraps the filter again.
    pub fn reset(&self) -> Result<(), Error> {
        let _run = self.lock()?;
        self.state.replace(None);
        self.measurements.replace(Vec::new());
        self.last_t.set(None);
        debug!("estimator reset");
        self.notify(Event::Reset);
        Ok(())
    }

    fn lock(&self) -> Result<RunGuard<'_>, Error> {
        if self.running.get() {
            return Err(Error::Locked);
        }
        self.running.set(true);
        Ok(RunGuard {
            flag: &self.running,
        })
    }

    fn bootstrap(&self, measurements: &[Measurement]) -> Result<Estimation, Error> {
        let position = self
            .solver
            .resolve_position(measurements, &Vector4::zeros())?;
        let velocity = self.solver.resolve_velocity(
            measurements,
            &position.fixed_rows::<3>(0).into_owned(),
            &Vector4::zeros(),
        )?;
        Ok(Estimation {
            x: position[0],
            y: position[1],
            z: position[2],
            vx: velocity[0],
            vy: velocity[1],
            vz: velocity[2],
            clock_offset: position[3],
            clock_drift: velocity[3],
        })
    }

    fn notify(&self, event: Event) {
        let listener = self.listener.borrow();
        if let Some(listener) = listener.as_ref() {
            let hook = match event {
                Event::UpdateStart => &listener.on_update_start,
                Event::UpdateEnd => &listener.on_update_end,
                Event::PropagateStart => &listener.on_propagate_start,
                Event::PropagateEnd => &listener.on_propagate_end,
                Event::Reset => &listener.on_reset,
            };
            if let Some(hook) = hook {
                hook(self);
            }
        }
    }
}
