//! Physical constants
pub struct Constants;

impl Constants {
    /// Speed of light in vacuum [m/s]
    pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

    /// WGS-84 Earth rotation rate [rad/s]
    pub const EARTH_ROTATION_RATE_RAD_S: f64 = 7.292_115_146_7E-5;

    /// WGS-84 Earth equatorial radius [m]
    pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

    /// Earth gravitational constant [m^3/s^2]
    pub const EARTH_GRAVITATION: f64 = 3.986_004_418E14;
}
