//! Python bindings via PyO3.
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::elements::ElementSet;
use crate::ephemeris::{EphemerisCache, SamplingConfig, SamplingMode};
use crate::frames;
use crate::kepler;
use crate::propagator;
use crate::sidereal;
use crate::tle;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ElementSet
#[pyclass(name = "ElementSet")]
#[derive(Clone)]
pub struct PyElementSet {
    pub(crate) inner: ElementSet,
}

#[pymethods]
impl PyElementSet {
    #[new]
    #[pyo3(signature = (a_km, e, i_deg, raan_deg, argp_deg, m0_deg, epoch_s=0.0))]
    fn new(
        a_km: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        argp_deg: f64,
        m0_deg: f64,
        epoch_s: f64,
    ) -> PyResult<Self> {
        ElementSet::new(a_km, e, i_deg, raan_deg, argp_deg, m0_deg, epoch_s)
            .map(|inner| PyElementSet { inner })
            .map_err(value_error)
    }

    fn period(&self) -> f64 { self.inner.period() }
    fn mean_motion(&self) -> f64 { self.inner.mean_motion() }

    #[getter] fn a_km(&self) -> f64 { self.inner.a_km() }
    #[getter] fn e(&self) -> f64 { self.inner.e() }
    #[getter] fn i_deg(&self) -> f64 { self.inner.i_deg() }
    #[getter] fn raan_deg(&self) -> f64 { self.inner.raan_deg() }
    #[getter] fn argp_deg(&self) -> f64 { self.inner.argp_deg() }
    #[getter] fn m0_deg(&self) -> f64 { self.inner.m0_deg() }
    #[getter] fn epoch_s(&self) -> f64 { self.inner.epoch_s() }

    fn __repr__(&self) -> String {
        format!("{}", self.inner)
    }
}

// EphemerisCache
#[pyclass(name = "EphemerisCache", unsendable)]
pub struct PyEphemerisCache {
    inner: EphemerisCache,
}

#[pymethods]
impl PyEphemerisCache {
    #[new]
    fn new() -> Self {
        PyEphemerisCache { inner: EphemerisCache::default() }
    }

    /// Sampled track as (times, eci, ecef).
    ///
    /// mode: "static", "animation" or "live" (live needs center_unix_s).
    #[pyo3(signature = (elements, mode="animation", revolutions=None, samples_per_orbit=2000, center_unix_s=None))]
    fn sample(
        &mut self,
        elements: &PyElementSet,
        mode: &str,
        revolutions: Option<f64>,
        samples_per_orbit: usize,
        center_unix_s: Option<f64>,
    ) -> PyResult<(Vec<f64>, Vec<[f64; 3]>, Vec<[f64; 3]>)> {
        let mode = match (mode, center_unix_s) {
            ("static", _) => SamplingMode::Static,
            ("animation", _) => SamplingMode::Animation,
            ("live", Some(center_unix_s)) => SamplingMode::Live { center_unix_s },
            ("live", None) => return Err(value_error("live sampling needs center_unix_s")),
            (other, _) => return Err(value_error(format!("unknown sampling mode '{other}'"))),
        };
        let config = SamplingConfig {
            samples_per_orbit,
            revolutions,
            mode,
            ..Default::default()
        };
        let eph = self.inner.get_or_compute(&elements.inner, &config).map_err(value_error)?;
        Ok((
            eph.times.clone(),
            eph.inertial.iter().map(|s| s.r).collect(),
            eph.earth_fixed.clone(),
        ))
    }

    fn invalidate(&mut self) {
        self.inner.invalidate();
    }
}

// Free functions
#[pyfunction]
fn parse_tle(line1: &str, line2: &str) -> PyResult<PyElementSet> {
    tle::parse_tle(line1, line2)
        .map(|inner| PyElementSet { inner })
        .map_err(value_error)
}

#[pyfunction]
#[pyo3(signature = (mean_anomaly_rad, eccentricity, tolerance=1e-10, max_iterations=100))]
fn solve_kepler(
    mean_anomaly_rad: Vec<f64>,
    eccentricity: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Vec<f64> {
    kepler::solve_kepler(&mean_anomaly_rad, eccentricity, tolerance, max_iterations)
}

/// Returns (positions, velocities); velocities is None unless requested.
#[pyfunction]
#[pyo3(signature = (elements, time_offsets_s, with_velocity=false))]
fn propagate(
    elements: &PyElementSet,
    time_offsets_s: Vec<f64>,
    with_velocity: bool,
) -> (Vec<[f64; 3]>, Option<Vec<[f64; 3]>>) {
    let states = propagator::propagate(&elements.inner, &time_offsets_s, with_velocity);
    let positions = states.iter().map(|s| s.r).collect();
    let velocities = with_velocity.then(|| states.iter().filter_map(|s| s.v).collect());
    (positions, velocities)
}

#[pyfunction]
#[pyo3(signature = (positions, time_offsets_s, reference_angle_rad=0.0))]
fn inertial_to_earth_fixed(
    positions: Vec<[f64; 3]>,
    time_offsets_s: Vec<f64>,
    reference_angle_rad: f64,
) -> PyResult<Vec<[f64; 3]>> {
    frames::inertial_to_earth_fixed(&positions, &time_offsets_s, reference_angle_rad)
        .map_err(value_error)
}

/// Returns (lat_deg, lon_deg, alt_km) lists.
#[pyfunction]
fn earth_fixed_to_geodetic(positions: Vec<[f64; 3]>) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let samples = frames::earth_fixed_to_geodetic(&positions);
    (
        samples.iter().map(|g| g.lat_deg).collect(),
        samples.iter().map(|g| g.lon_deg).collect(),
        samples.iter().map(|g| g.alt_km).collect(),
    )
}

#[pyfunction]
fn gmst(unix_time_s: f64) -> f64 {
    sidereal::gmst(unix_time_s)
}

// Module registration
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyElementSet>()?;
    m.add_class::<PyEphemerisCache>()?;
    m.add_function(wrap_pyfunction!(parse_tle, m)?)?;
    m.add_function(wrap_pyfunction!(solve_kepler, m)?)?;
    m.add_function(wrap_pyfunction!(propagate, m)?)?;
    m.add_function(wrap_pyfunction!(inertial_to_earth_fixed, m)?)?;
    m.add_function(wrap_pyfunction!(earth_fixed_to_geodetic, m)?)?;
    m.add_function(wrap_pyfunction!(gmst, m)?)?;
    Ok(())
}
