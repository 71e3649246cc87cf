//! Single-entry ephemeris cache.
//!
//! A display loop asks for the same sampled orbit on every redraw tick.
//! [`EphemerisCache`] keeps the last computed series and hands it back while
//! the element set and sampling stay the same. Any change to the key
//! recomputes and replaces the entry.
//!
//! # Example
//! ```
//! use orbit_engine::elements::ElementSet;
//! use orbit_engine::ephemeris::{EphemerisCache, SamplingConfig, SamplingMode};
//!
//! let elems = ElementSet::new(6795.0, 0.0003, 51.6, 4.7, 229.5, 130.5, 0.0).unwrap();
//! let config = SamplingConfig {
//!     samples_per_orbit: 200,
//!     revolutions: Some(1.0),
//!     mode: SamplingMode::Static,
//!     ..Default::default()
//! };
//!
//! let mut cache = EphemerisCache::default();
//! let track = cache.get_or_compute(&elems, &config).unwrap().geodetic();
//! assert_eq!(track.len(), 300);
//! ```
use log::debug;
use serde::{Deserialize, Serialize};

use crate::elements::ElementSet;
use crate::error::Error;
use crate::frames::{
    earth_fixed_to_geodetic, inertial_to_earth_fixed, split_at_antimeridian, GeodeticSample,
};
use crate::propagator::{Propagator, StateSample};
use crate::sidereal::gmst;

/// Fewest samples drawn for a static plot.
pub const MIN_STATIC_SAMPLES: usize = 300;

/// Revolutions sampled when none are requested.
pub const DEFAULT_REVOLUTIONS: f64 = 2.0;

/// How the sampled time window is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SamplingMode {
    /// Whole track from the epoch. An explicit revolution count draws at
    /// least [`MIN_STATIC_SAMPLES`] points.
    Static,
    /// Track from the epoch at a fixed number of points per orbit.
    #[default]
    Animation,
    /// One period centered on a Unix time, with the Earth oriented by
    /// GMST at the element set's epoch.
    Live { center_unix_s: f64 },
}

/// Sampling request from the display side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Points per orbital period.
    pub samples_per_orbit: usize,
    /// Revolutions to cover. Ignored by [`SamplingMode::Live`].
    pub revolutions: Option<f64>,
    pub mode: SamplingMode,
    /// Earth rotation angle at the epoch (rad). Ignored by
    /// [`SamplingMode::Live`], which uses GMST.
    pub reference_angle_rad: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            samples_per_orbit: 2000,
            revolutions: None,
            mode: SamplingMode::Animation,
            reference_angle_rad: 0.0,
        }
    }
}

impl SamplingConfig {
    /// Resolve the concrete sample window for one element set.
    pub fn resolve(&self, elements: &ElementSet) -> EphemerisKey {
        let period = elements.period();
        let revs = self.revolutions.unwrap_or(DEFAULT_REVOLUTIONS);
        let per_orbit = self.samples_per_orbit as f64;

        let (count, start_s, span_s, reference_angle_rad) = match self.mode {
            SamplingMode::Static => (
                match self.revolutions {
                    Some(revs) => MIN_STATIC_SAMPLES.max((per_orbit * revs) as usize),
                    None => (per_orbit * revs) as usize,
                },
                0.0,
                period * revs,
                self.reference_angle_rad,
            ),
            SamplingMode::Animation => (
                (per_orbit * revs) as usize,
                0.0,
                period * revs,
                self.reference_angle_rad,
            ),
            SamplingMode::Live { center_unix_s } => (
                self.samples_per_orbit,
                center_unix_s - elements.epoch_s() - period / 2.0,
                period,
                gmst(elements.epoch_s()),
            ),
        };

        EphemerisKey {
            elements: *elements,
            count,
            start_s,
            span_s,
            mode: self.mode,
            reference_angle_rad,
        }
    }
}

/// Identity of a cached ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EphemerisKey {
    pub elements: ElementSet,
    pub count: usize,
    /// First offset from the epoch (s)
    pub start_s: f64,
    /// Window length (s)
    pub span_s: f64,
    pub mode: SamplingMode,
    pub reference_angle_rad: f64,
}

impl EphemerisKey {
    /// Evenly spaced offsets over the window, both ends included.
    pub fn time_offsets(&self) -> Vec<f64> {
        match self.count {
            0 => Vec::new(),
            1 => vec![self.start_s],
            n => {
                let step = self.span_s / (n - 1) as f64;
                (0..n).map(|k| self.start_s + step * k as f64).collect()
            }
        }
    }
}

/// Propagated series for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    /// Offsets from the epoch (s)
    pub times: Vec<f64>,
    /// Inertial states, one per offset
    pub inertial: Vec<StateSample>,
    /// Earth-fixed positions (km), one per offset
    pub earth_fixed: Vec<[f64; 3]>,
    /// Orbital period (s)
    pub period_s: f64,
    /// Earth rotation angle at the epoch (rad)
    pub reference_angle_rad: f64,
}

impl Ephemeris {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spherical ground track.
    pub fn geodetic(&self) -> Vec<GeodeticSample> {
        earth_fixed_to_geodetic(&self.earth_fixed)
    }

    /// Ground track cut at the antimeridian, ready for a 2-D map.
    pub fn ground_track_segments(&self) -> Vec<Vec<GeodeticSample>> {
        split_at_antimeridian(&self.geodetic())
    }
}

/// Holds the most recent ephemeris; newest replaces oldest.
#[derive(Debug, Default)]
pub struct EphemerisCache {
    propagator: Propagator,
    slot: Option<(EphemerisKey, Ephemeris)>,
    hits: u64,
    misses: u64,
}

impl EphemerisCache {
    pub fn new(propagator: Propagator) -> Self {
        EphemerisCache {
            propagator,
            ..Default::default()
        }
    }

    /// Cached series for `(elements, config)`, computing it on a miss.
    ///
    /// A failed computation leaves the cache empty.
    pub fn get_or_compute(
        &mut self,
        elements: &ElementSet,
        config: &SamplingConfig,
    ) -> Result<&Ephemeris, Error> {
        let key = config.resolve(elements);

        let entry = match self.slot.take() {
            Some((cached, ephemeris)) if cached == key => {
                self.hits += 1;
                debug!("ephemeris cache hit ({} samples)", ephemeris.len());
                (cached, ephemeris)
            }
            _ => {
                self.misses += 1;
                debug!(
                    "ephemeris cache miss: {} samples over {:.1} s for {}",
                    key.count, key.span_s, elements
                );
                let ephemeris = self.compute(&key)?;
                (key, ephemeris)
            }
        };

        Ok(&self.slot.insert(entry).1)
    }

    /// The live entry, if any.
    pub fn current(&self) -> Option<&Ephemeris> {
        self.slot.as_ref().map(|(_, ephemeris)| ephemeris)
    }

    /// Drop the live entry.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn compute(&self, key: &EphemerisKey) -> Result<Ephemeris, Error> {
        let times = key.time_offsets();
        let inertial = self.propagator.run(&key.elements, &times)?;
        let positions: Vec<[f64; 3]> = inertial.iter().map(|s| s.r).collect();
        let earth_fixed = inertial_to_earth_fixed(&positions, &times, key.reference_angle_rad)?;

        Ok(Ephemeris {
            times,
            inertial,
            earth_fixed,
            period_s: key.elements.period(),
            reference_angle_rad: key.reference_angle_rad,
        })
    }
}
