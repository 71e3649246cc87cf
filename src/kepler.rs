//! Kepler's equation solver.
//!
//! Solves `M = E - e sin(E)` for the eccentric anomaly with Newton-Raphson.
//! Batches are solved sample by sample: every sample iterates on its own,
//! so no result depends on its neighbours.

use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::normalize_angle_pm;

/// Kepler solver errors.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum KeplerError {
    #[error("Kepler iteration did not converge for M={mean_anomaly} rad, e={eccentricity} after {iterations} iterations")]
    NoConvergence {
        mean_anomaly: f64,
        eccentricity: f64,
        iterations: usize,
    },

    #[error("got {anomalies} mean anomalies but {eccentricities} eccentricities")]
    LengthMismatch {
        anomalies: usize,
        eccentricities: usize,
    },
}

/// Newton-Raphson configuration for Kepler's equation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeplerSolver {
    /// Stop once the Newton step drops below this (rad).
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Report non-convergence as an error instead of returning the
    /// last iterate.
    pub strict: bool,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        KeplerSolver {
            tolerance: 1e-10,
            max_iterations: 100,
            strict: false,
        }
    }
}

/// Outcome of one Newton run.
#[derive(Debug, Clone, Copy)]
struct Iterate {
    ea: f64,
    converged: bool,
    iterations: usize,
}

impl KeplerSolver {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        KeplerSolver {
            tolerance,
            max_iterations,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Eccentric anomaly (rad) for one mean anomaly (rad).
    pub fn solve(&self, m: f64, e: f64) -> Result<f64, KeplerError> {
        let it = self.iterate(m, e);
        if !it.converged {
            if self.strict {
                return Err(KeplerError::NoConvergence {
                    mean_anomaly: m,
                    eccentricity: e,
                    iterations: it.iterations,
                });
            }
            warn!(
                "kepler: no convergence for M={m:.6} rad, e={e} after {} iterations",
                it.iterations
            );
        }
        Ok(it.ea)
    }

    /// Like [`solve`](Self::solve), but always returns the last iterate.
    pub fn solve_lenient(&self, m: f64, e: f64) -> f64 {
        let it = self.iterate(m, e);
        self.warn_stalled(std::slice::from_ref(&it));
        it.ea
    }

    /// Solve a batch sharing one eccentricity.
    pub fn solve_batch(&self, m: &[f64], e: f64) -> Result<Vec<f64>, KeplerError> {
        let iterates: Vec<Iterate> = m.par_iter().map(|&mi| self.iterate(mi, e)).collect();
        self.collect(m, &iterates, |_| e)
    }

    /// Solve a batch sharing one eccentricity, keeping the last iterate of
    /// any sample that does not converge even when the solver is strict.
    pub fn solve_batch_lenient(&self, m: &[f64], e: f64) -> Vec<f64> {
        let iterates: Vec<Iterate> = m.par_iter().map(|&mi| self.iterate(mi, e)).collect();
        self.warn_stalled(&iterates);
        iterates.iter().map(|it| it.ea).collect()
    }

    /// Solve a batch with one eccentricity per sample.
    pub fn solve_batch_each(&self, m: &[f64], e: &[f64]) -> Result<Vec<f64>, KeplerError> {
        if m.len() != e.len() {
            return Err(KeplerError::LengthMismatch {
                anomalies: m.len(),
                eccentricities: e.len(),
            });
        }
        let iterates: Vec<Iterate> = m
            .par_iter()
            .zip(e.par_iter())
            .map(|(&mi, &ei)| self.iterate(mi, ei))
            .collect();
        self.collect(m, &iterates, |idx| e[idx])
    }

    fn collect(
        &self,
        m: &[f64],
        iterates: &[Iterate],
        ecc: impl Fn(usize) -> f64,
    ) -> Result<Vec<f64>, KeplerError> {
        if self.strict {
            if let Some(first) = iterates.iter().position(|it| !it.converged) {
                return Err(KeplerError::NoConvergence {
                    mean_anomaly: m[first],
                    eccentricity: ecc(first),
                    iterations: iterates[first].iterations,
                });
            }
        }
        self.warn_stalled(iterates);
        Ok(iterates.iter().map(|it| it.ea).collect())
    }

    fn warn_stalled(&self, iterates: &[Iterate]) {
        let stalled = iterates.iter().filter(|it| !it.converged).count();
        if stalled > 0 {
            warn!(
                "kepler: {} of {} samples did not converge within {} iterations",
                stalled,
                iterates.len(),
                self.max_iterations
            );
        }
    }

    fn iterate(&self, m: f64, e: f64) -> Iterate {
        let m = normalize_angle_pm(m);

        // Starting from ±π keeps Newton monotone for highly eccentric orbits
        let mut ea = if e.abs() > 0.8 {
            std::f64::consts::PI.copysign(m)
        } else {
            m
        };

        for k in 0..self.max_iterations {
            let f = ea - e * ea.sin() - m;
            let fp = 1.0 - e * ea.cos();
            let delta = f / fp;
            ea -= delta;
            if delta.abs() < self.tolerance {
                return Iterate {
                    ea,
                    converged: true,
                    iterations: k + 1,
                };
            }
        }

        Iterate {
            ea,
            converged: false,
            iterations: self.max_iterations,
        }
    }
}

/// Batched Kepler solve with an explicit tolerance and iteration cap.
///
/// Non-convergent samples keep their best estimate.
pub fn solve_kepler(
    mean_anomalies_rad: &[f64],
    eccentricity: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Vec<f64> {
    KeplerSolver::new(tolerance, max_iterations)
        .solve_batch_lenient(mean_anomalies_rad, eccentricity)
}

/// True anomaly (rad) from eccentric anomaly.
pub fn eccentric_to_true_anomaly(ea: f64, e: f64) -> f64 {
    ((1.0 - e.powi(2)).sqrt() * ea.sin()).atan2(ea.cos() - e)
}
