//! Physical and astrodynamic constants.

/// Earth gravitational parameter (km³/s²)
pub const MU_EARTH: f64 = 398600.4418;

/// Earth mean radius used for spherical geodetic altitude (km)
pub const R_MEAN: f64 = 6371.0;

/// Earth rotation rate (rad/s)
pub const OMEGA_EARTH: f64 = 7.2921150e-5;

/// Seconds per solar day
pub const SOLAR_DAY: f64 = 86400.0;

/// Julian date of the J2000.0 reference (2000-01-01 12:00)
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian date of the Unix epoch (1970-01-01 00:00 UTC)
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Days per Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

/// Two pi
pub const TAU: f64 = std::f64::consts::TAU;

/// Degrees to radians
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;
