//! Classical orbital element sets.
//!
//! An [`ElementSet`] is the unit of input to the rest of the crate: six
//! classical elements plus the epoch at which the mean anomaly holds.
//! It is validated once at construction and is immutable afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Rejections raised while constructing an [`ElementSet`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("semi-major axis must be positive, got {0} km")]
    NonPositiveSemiMajorAxis(f64),

    #[error("eccentricity must lie in [0, 1), got {0}")]
    EccentricityOutOfRange(f64),

    #[error("element '{0}' is not finite")]
    NonFinite(&'static str),
}

/// 3×3 rotation matrix, row-major.
pub type Matrix3 = [[f64; 3]; 3];

/// Classical Keplerian elements anchored at an epoch.
///
/// Angles are kept in degrees exactly as supplied and normalized where
/// they are used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElementSet")]
pub struct ElementSet {
    a_km: f64,
    e: f64,
    i_deg: f64,
    raan_deg: f64,
    argp_deg: f64,
    m0_deg: f64,
    epoch_s: f64,
}

/// Unvalidated mirror of [`ElementSet`] used for deserialization.
#[derive(Deserialize)]
struct RawElementSet {
    a_km: f64,
    e: f64,
    i_deg: f64,
    raan_deg: f64,
    argp_deg: f64,
    m0_deg: f64,
    #[serde(default)]
    epoch_s: f64,
}

impl TryFrom<RawElementSet> for ElementSet {
    type Error = ValidationError;

    fn try_from(raw: RawElementSet) -> Result<Self, Self::Error> {
        ElementSet::new(
            raw.a_km,
            raw.e,
            raw.i_deg,
            raw.raan_deg,
            raw.argp_deg,
            raw.m0_deg,
            raw.epoch_s,
        )
    }
}

impl ElementSet {
    /// Build an element set, rejecting `a_km <= 0`, `e` outside `[0, 1)`
    /// and non-finite inputs.
    ///
    /// `epoch_s` is seconds since the Unix epoch (UTC).
    pub fn new(
        a_km: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        argp_deg: f64,
        m0_deg: f64,
        epoch_s: f64,
    ) -> Result<Self, ValidationError> {
        for (name, value) in [
            ("a_km", a_km),
            ("e", e),
            ("i_deg", i_deg),
            ("raan_deg", raan_deg),
            ("argp_deg", argp_deg),
            ("m0_deg", m0_deg),
            ("epoch_s", epoch_s),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite(name));
            }
        }
        if a_km <= 0.0 {
            return Err(ValidationError::NonPositiveSemiMajorAxis(a_km));
        }
        if !(0.0..1.0).contains(&e) {
            return Err(ValidationError::EccentricityOutOfRange(e));
        }

        Ok(Self {
            a_km,
            e,
            i_deg,
            raan_deg,
            argp_deg,
            m0_deg,
            epoch_s,
        })
    }

    /// Semi-major axis (km).
    pub fn a_km(&self) -> f64 {
        self.a_km
    }

    /// Eccentricity.
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Inclination (deg).
    pub fn i_deg(&self) -> f64 {
        self.i_deg
    }

    /// Right ascension of the ascending node (deg).
    pub fn raan_deg(&self) -> f64 {
        self.raan_deg
    }

    /// Argument of perigee (deg).
    pub fn argp_deg(&self) -> f64 {
        self.argp_deg
    }

    /// Mean anomaly at epoch (deg).
    pub fn m0_deg(&self) -> f64 {
        self.m0_deg
    }

    /// Epoch (Unix seconds).
    pub fn epoch_s(&self) -> f64 {
        self.epoch_s
    }

    /// Same orbit with a different mean anomaly at epoch.
    pub fn with_mean_anomaly(&self, m0_deg: f64) -> Result<Self, ValidationError> {
        Self::new(
            self.a_km,
            self.e,
            self.i_deg,
            self.raan_deg,
            self.argp_deg,
            m0_deg,
            self.epoch_s,
        )
    }

    /// Mean motion (rad/s).
    pub fn mean_motion(&self) -> f64 {
        (MU_EARTH / self.a_km.powi(3)).sqrt()
    }

    /// Orbital period (seconds).
    pub fn period(&self) -> f64 {
        TAU / self.mean_motion()
    }

    /// Specific angular momentum (km²/s).
    pub fn angular_momentum(&self) -> f64 {
        (MU_EARTH * self.a_km * (1.0 - self.e.powi(2))).sqrt()
    }

    /// Perifocal (PQW) to inertial rotation, `Rz(RAAN) · Rx(i) · Rz(argp)`.
    ///
    /// Independent of time and anomaly, so callers compute it once per set.
    pub fn perifocal_to_inertial(&self) -> Matrix3 {
        let (sin_raan, cos_raan) = (self.raan_deg * DEG2RAD).sin_cos();
        let (sin_i, cos_i) = (self.i_deg * DEG2RAD).sin_cos();
        let (sin_aop, cos_aop) = (self.argp_deg * DEG2RAD).sin_cos();

        [
            [
                cos_raan * cos_aop - sin_raan * sin_aop * cos_i,
                -cos_raan * sin_aop - sin_raan * cos_aop * cos_i,
                sin_raan * sin_i,
            ],
            [
                sin_raan * cos_aop + cos_raan * sin_aop * cos_i,
                -sin_raan * sin_aop + cos_raan * cos_aop * cos_i,
                -cos_raan * sin_i,
            ],
            [sin_aop * sin_i, cos_aop * sin_i, cos_i],
        ]
    }
}

impl std::fmt::Display for ElementSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ElementSet(a={:.3} km, e={:.6}, i={:.4}°, RAAN={:.4}°, AoP={:.4}°, M0={:.4}°, epoch={:.3} s)",
            self.a_km, self.e, self.i_deg, self.raan_deg, self.argp_deg, self.m0_deg, self.epoch_s,
        )
    }
}

/// Apply a rotation matrix to a vector.
pub fn rotate(m: &Matrix3, v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for j in 0..3 {
        for k in 0..3 {
            out[j] += m[j][k] * v[k];
        }
    }
    out
}

/// Normalize angle to [0, 2π).
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

/// Normalize angle to [-π, π).
pub fn normalize_angle_pm(angle: f64) -> f64 {
    let a = normalize_angle(angle);
    if a >= std::f64::consts::PI { a - TAU } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn leo() -> ElementSet {
        ElementSet::new(R_MEAN + 420.0, 0.0005, 51.6, 30.0, 45.0, 120.0, 0.0).unwrap()
    }

    #[test]
    fn test_rejects_bad_semi_major_axis() {
        assert_eq!(
            ElementSet::new(0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0),
            Err(ValidationError::NonPositiveSemiMajorAxis(0.0))
        );
        assert!(ElementSet::new(-7000.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_rejects_bad_eccentricity() {
        assert_eq!(
            ElementSet::new(7000.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            Err(ValidationError::EccentricityOutOfRange(1.0))
        );
        assert!(ElementSet::new(7000.0, -0.01, 0.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(ElementSet::new(7000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(
            ElementSet::new(f64::NAN, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0),
            Err(ValidationError::NonFinite("a_km"))
        );
        assert_eq!(
            ElementSet::new(7000.0, 0.1, 0.0, f64::INFINITY, 0.0, 0.0, 0.0),
            Err(ValidationError::NonFinite("raan_deg"))
        );
    }

    #[test]
    fn test_angles_accept_any_real_value() {
        let elems = ElementSet::new(7000.0, 0.1, -10.0, 725.0, -400.0, 1e4, 0.0).unwrap();
        assert_eq!(elems.raan_deg(), 725.0);
    }

    #[test]
    fn test_period_of_geo() {
        let geo = ElementSet::new(42164.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        // Within a few seconds of one sidereal day
        assert_relative_eq!(geo.period(), 86164.09, epsilon = 5.0);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let rot = leo().perifocal_to_inertial();
        for r in 0..3 {
            for c in 0..3 {
                let dot: f64 = (0..3).map(|k| rot[r][k] * rot[c][k]).sum();
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_equatorial_rotation_is_identity() {
        let elems = ElementSet::new(7000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        let v = rotate(&elems.perifocal_to_inertial(), &[1.0, 2.0, 3.0]);
        assert_relative_eq!(v[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(v[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(v[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_angle_pm_range() {
        assert_relative_eq!(
            normalize_angle_pm(1.5 * std::f64::consts::PI),
            -0.5 * std::f64::consts::PI,
            epsilon = 1e-12
        );
        assert_relative_eq!(normalize_angle_pm(-0.5), -0.5, epsilon = 1e-15);
        assert_relative_eq!(normalize_angle(-0.5), TAU - 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ElementSet = serde_json::from_str(
            r#"{"a_km":7000.0,"e":0.01,"i_deg":98.0,"raan_deg":0.0,"argp_deg":0.0,"m0_deg":10.0}"#,
        )
        .unwrap();
        assert_eq!(ok.epoch_s(), 0.0);

        let bad = serde_json::from_str::<ElementSet>(
            r#"{"a_km":7000.0,"e":1.5,"i_deg":98.0,"raan_deg":0.0,"argp_deg":0.0,"m0_deg":10.0}"#,
        );
        assert!(bad.is_err());
    }
}
