//! # orbit-engine
//!
//! Two-body orbit propagation for ground-track and 3-D orbit displays.
//!
//! Provides validated classical element sets, TLE parsing, a batched
//! Kepler solver, Keplerian propagation to inertial states, Earth-fixed
//! and spherical geodetic conversions, Greenwich Mean Sidereal Time, and
//! a single-entry ephemeris cache for redraw loops.
//!
//! No perturbations are modeled: this is pure Keplerian motion around a
//! spherical Earth.
//!
//! ```
//! use orbit_engine::{earth_fixed_to_geodetic, inertial_to_earth_fixed, parse_tle, propagate};
//!
//! let elems = parse_tle(
//!     "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996",
//!     "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621",
//! )
//! .unwrap();
//!
//! let times: Vec<f64> = (0..90).map(|k| k as f64 * 60.0).collect();
//! let states = propagate(&elems, &times, false);
//! let positions: Vec<[f64; 3]> = states.iter().map(|s| s.r).collect();
//! let ecef = inertial_to_earth_fixed(&positions, &times, 0.0).unwrap();
//! let track = earth_fixed_to_geodetic(&ecef);
//! assert!(track.iter().all(|g| g.lat_deg.abs() < 52.0));
//! ```

pub mod constants;
pub mod elements;
pub mod ephemeris;
pub mod error;
pub mod frames;
pub mod kepler;
pub mod propagator;
pub mod sidereal;
pub mod tle;

#[cfg(feature = "python")]
mod pybridge;

pub use elements::{ElementSet, ValidationError};
pub use ephemeris::{Ephemeris, EphemerisCache, SamplingConfig, SamplingMode};
pub use error::Error;
pub use frames::{earth_fixed_to_geodetic, inertial_to_earth_fixed, FrameError, GeodeticSample};
pub use kepler::{solve_kepler, KeplerError, KeplerSolver};
pub use propagator::{propagate, Propagator, StateSample};
pub use sidereal::gmst;
pub use tle::{parse_tle, ParseError, Tle};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn orbit_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pybridge::register(m)?;
    Ok(())
}
