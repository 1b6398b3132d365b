use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The driver is missing its configuration, or was proposed fewer
    /// measurements than the navigation minimum.
    #[error("estimator not ready: missing configuration or not enough measurements")]
    NotReady,
    /// A mutating operation was entered while another one is still
    /// executing, typically from inside a listener hook. The ongoing
    /// operation is not disturbed.
    #[error("estimator locked by an ongoing operation")]
    Locked,
    /// The least squares solver requires at least 4 measurements,
    /// whatever the geometry.
    #[error("at least 4 measurements are required")]
    InsufficientMeasurements,
    /// Satellite geometry does not span 3D space (colinear satellites):
    /// the normal equations cannot be inverted.
    #[error("singular geometry: failed to invert normal equations")]
    SingularGeometry,
    /// Bad covariance or measurement noise setup may cause the innovation
    /// covariance inversion to wind up here.
    #[error("singular innovation covariance")]
    SingularGain,
    /// Invalid observables or a diverged prior produced a non-finite
    /// state or covariance entry. Fatal to the current epoch; the caller
    /// decides whether to reset.
    #[error("non-finite value in state or covariance")]
    Numerical,
    /// The Gauss-Newton iteration did not converge within its budget.
    #[error("least squares did not converge within the iteration budget")]
    Convergence,
    /// Raised by configuration constructors and every setter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Geodetic frame conversion failure, propagated unchanged.
    #[error("frame conversion failure")]
    Conversion,
}
