//! Two-body (Keplerian) orbit propagation.
//!
//! Turns an [`ElementSet`] and a series of time offsets into inertial
//! position and, optionally, velocity samples. The perifocal-to-inertial
//! rotation is computed once per call and shared read-only by every sample,
//! which lets the per-sample work run on rayon's pool.
use log::trace;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::elements::{normalize_angle_pm, rotate, ElementSet, Matrix3};
use crate::kepler::{eccentric_to_true_anomaly, KeplerError, KeplerSolver};

// ── State sample ──

/// Inertial state at one time offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    /// Offset from the element set's epoch (s)
    pub t_s: f64,
    /// Position (km): [x, y, z]
    pub r: [f64; 3],
    /// Velocity (km/s): [vx, vy, vz], when requested
    pub v: Option<[f64; 3]>,
}

impl StateSample {
    /// Position magnitude (km).
    pub fn r_mag(&self) -> f64 {
        (self.r[0].powi(2) + self.r[1].powi(2) + self.r[2].powi(2)).sqrt()
    }

    /// Velocity magnitude (km/s).
    pub fn v_mag(&self) -> Option<f64> {
        self.v
            .map(|v| (v[0].powi(2) + v[1].powi(2) + v[2].powi(2)).sqrt())
    }

    /// Altitude above the mean Earth radius (km).
    pub fn altitude(&self) -> f64 {
        self.r_mag() - R_MEAN
    }

    /// Specific orbital energy (km²/s²).
    pub fn energy(&self) -> Option<f64> {
        self.v_mag()
            .map(|v| v.powi(2) / 2.0 - MU_EARTH / self.r_mag())
    }
}

// ── Propagator ──

/// Configurable two-body propagator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Propagator {
    /// Kepler solver settings.
    pub solver: KeplerSolver,
    /// Also compute inertial velocity.
    pub with_velocity: bool,
}

impl Propagator {
    pub fn new(solver: KeplerSolver) -> Self {
        Propagator {
            solver,
            with_velocity: false,
        }
    }

    pub fn with_velocity(mut self, with_velocity: bool) -> Self {
        self.with_velocity = with_velocity;
        self
    }

    /// Propagate `elements` to each offset in `time_offsets_s`.
    ///
    /// Output order matches input order. Fails only when the solver is
    /// strict and a sample does not converge.
    pub fn run(
        &self,
        elements: &ElementSet,
        time_offsets_s: &[f64],
    ) -> Result<Vec<StateSample>, KeplerError> {
        let anomalies = self.mean_anomalies(elements, time_offsets_s);
        let eccentric = self.solver.solve_batch(&anomalies, elements.e())?;
        Ok(self.states(elements, time_offsets_s, &eccentric))
    }

    /// [`run`](Self::run) that keeps the best estimate of any sample the
    /// solver could not converge.
    fn run_lenient(&self, elements: &ElementSet, time_offsets_s: &[f64]) -> Vec<StateSample> {
        let anomalies = self.mean_anomalies(elements, time_offsets_s);
        let eccentric = self.solver.solve_batch_lenient(&anomalies, elements.e());
        self.states(elements, time_offsets_s, &eccentric)
    }

    fn mean_anomalies(&self, elements: &ElementSet, time_offsets_s: &[f64]) -> Vec<f64> {
        trace!(
            "propagate: {} samples for {} (velocity={})",
            time_offsets_s.len(),
            elements,
            self.with_velocity
        );

        let n = elements.mean_motion();
        let m0 = elements.m0_deg() * DEG2RAD;
        time_offsets_s
            .iter()
            .map(|&t| normalize_angle_pm(m0 + n * t))
            .collect()
    }

    fn states(
        &self,
        elements: &ElementSet,
        time_offsets_s: &[f64],
        eccentric: &[f64],
    ) -> Vec<StateSample> {
        let rot = elements.perifocal_to_inertial();
        time_offsets_s
            .par_iter()
            .zip(eccentric.par_iter())
            .map(|(&t_s, &ea)| state_from_eccentric(elements, &rot, ea, t_s, self.with_velocity))
            .collect()
    }
}

/// Propagate with the default solver.
///
/// Non-convergent Kepler samples keep their best estimate, so this never
/// fails.
pub fn propagate(
    elements: &ElementSet,
    time_offsets_s: &[f64],
    with_velocity: bool,
) -> Vec<StateSample> {
    Propagator::default()
        .with_velocity(with_velocity)
        .run_lenient(elements, time_offsets_s)
}

/// Propagate several element sets over the same offsets in parallel.
pub fn propagate_many(
    sets: &[ElementSet],
    time_offsets_s: &[f64],
    with_velocity: bool,
) -> Vec<Vec<StateSample>> {
    sets.par_iter()
        .map(|elements| propagate(elements, time_offsets_s, with_velocity))
        .collect()
}

/// Inertial position and velocity at an explicit mean anomaly (deg).
///
/// Ignores the set's own `m0_deg`; the sample carries `t_s = 0`.
pub fn state_at_mean_anomaly(elements: &ElementSet, m_deg: f64) -> StateSample {
    let m = normalize_angle_pm(m_deg * DEG2RAD);
    let ea = KeplerSolver::default().solve_lenient(m, elements.e());
    state_from_eccentric(elements, &elements.perifocal_to_inertial(), ea, 0.0, true)
}

fn state_from_eccentric(
    elements: &ElementSet,
    rot: &Matrix3,
    ea: f64,
    t_s: f64,
    with_velocity: bool,
) -> StateSample {
    let a = elements.a_km();
    let e = elements.e();

    let nu = eccentric_to_true_anomaly(ea, e);
    let (sin_nu, cos_nu) = nu.sin_cos();
    let radius = a * (1.0 - e * ea.cos());

    // Perifocal frame
    let r_pqw = [radius * cos_nu, radius * sin_nu, 0.0];
    let r = rotate(rot, &r_pqw);

    let v = with_velocity.then(|| {
        let mu_h = MU_EARTH / elements.angular_momentum();
        let v_pqw = [-mu_h * sin_nu, mu_h * (e + cos_nu), 0.0];
        rotate(rot, &v_pqw)
    });

    StateSample { t_s, r, v }
}
