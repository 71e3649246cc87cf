//! Inertial, Earth-fixed and geodetic frame conversions.
//!
//! The Earth-fixed frame is the inertial frame rotated about +z by
//! `θ(t) = θ₀ + ω⊕·t`. Geodetic coordinates use a sphere of radius
//! [`R_MEAN`]; there is no ellipsoid flattening.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Frame conversion errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("{positions} positions but {times} time offsets")]
    LengthMismatch { positions: usize, times: usize },
}

/// Spherical latitude, longitude and altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticSample {
    /// Latitude (deg), [-90, 90]
    pub lat_deg: f64,
    /// Longitude (deg), (-180, 180]
    pub lon_deg: f64,
    /// Altitude above the mean Earth radius (km)
    pub alt_km: f64,
}

/// Earth rotation angle (rad) at `t_s` seconds past the reference instant.
pub fn earth_rotation_angle(t_s: f64, reference_angle_rad: f64) -> f64 {
    reference_angle_rad + OMEGA_EARTH * t_s
}

/// Rotate one inertial vector into the Earth-fixed frame by `theta` (rad).
pub fn rotate_to_earth_fixed(r: &[f64; 3], theta: f64) -> [f64; 3] {
    let (s, c) = theta.sin_cos();
    [c * r[0] + s * r[1], -s * r[0] + c * r[1], r[2]]
}

/// Rotate inertial positions into the Earth-fixed frame, one angle per sample.
///
/// A single time offset applies to every position. Otherwise the lengths
/// must match.
pub fn inertial_to_earth_fixed(
    positions: &[[f64; 3]],
    time_offsets_s: &[f64],
    reference_angle_rad: f64,
) -> Result<Vec<[f64; 3]>, FrameError> {
    match time_offsets_s {
        [t] => {
            let theta = earth_rotation_angle(*t, reference_angle_rad);
            Ok(positions
                .par_iter()
                .map(|r| rotate_to_earth_fixed(r, theta))
                .collect())
        }
        _ if time_offsets_s.len() == positions.len() => Ok(positions
            .par_iter()
            .zip(time_offsets_s.par_iter())
            .map(|(r, &t)| rotate_to_earth_fixed(r, earth_rotation_angle(t, reference_angle_rad)))
            .collect()),
        _ => Err(FrameError::LengthMismatch {
            positions: positions.len(),
            times: time_offsets_s.len(),
        }),
    }
}

/// Spherical geodetic coordinates of one Earth-fixed position (km).
pub fn to_geodetic(r: &[f64; 3]) -> GeodeticSample {
    let [x, y, z] = *r;
    let rxy = x.hypot(y);
    GeodeticSample {
        lat_deg: z.atan2(rxy) * RAD2DEG,
        lon_deg: normalize_longitude_deg(y.atan2(x) * RAD2DEG),
        alt_km: (rxy.powi(2) + z.powi(2)).sqrt() - R_MEAN,
    }
}

/// Spherical geodetic coordinates for a batch of Earth-fixed positions.
pub fn earth_fixed_to_geodetic(positions: &[[f64; 3]]) -> Vec<GeodeticSample> {
    positions.par_iter().map(to_geodetic).collect()
}

/// Wrap a longitude (deg) into (-180, 180], the range geodetic samples use.
pub fn normalize_longitude_deg(lon_deg: f64) -> f64 {
    if lon_deg > -180.0 && lon_deg <= 180.0 {
        lon_deg
    } else {
        180.0 - (180.0 - lon_deg).rem_euclid(360.0)
    }
}

/// Cut a ground track wherever consecutive longitudes jump by more than
/// 180°, so a plotted track never draws a line across the map.
pub fn split_at_antimeridian(track: &[GeodeticSample]) -> Vec<Vec<GeodeticSample>> {
    let mut segments = Vec::new();
    let mut current: Vec<GeodeticSample> = Vec::new();

    for sample in track {
        if let Some(prev) = current.last() {
            if (sample.lon_deg - prev.lon_deg).abs() > 180.0 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(*sample);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_at_reference() {
        let r = [[7000.0, -1200.0, 300.0], [1.0, 2.0, 3.0]];
        let out = inertial_to_earth_fixed(&r, &[0.0, 0.0], 0.0).unwrap();
        assert_eq!(out, r.to_vec());
    }

    #[test]
    fn test_quarter_turn() {
        // Earth-fixed axes lag inertial ones: +y inertial maps to +x after +90°
        let out = inertial_to_earth_fixed(&[[0.0, 1.0, 0.5]], &[0.0], std::f64::consts::FRAC_PI_2)
            .unwrap();
        assert_relative_eq!(out[0][0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out[0][1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out[0][2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_each_sample_uses_its_own_angle() {
        let quarter_day = std::f64::consts::FRAC_PI_2 / OMEGA_EARTH;
        let r = [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let out = inertial_to_earth_fixed(&r, &[0.0, quarter_day], 0.0).unwrap();
        assert_relative_eq!(out[0][0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out[1][1], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_time_broadcasts() {
        let r = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let out = inertial_to_earth_fixed(&r, &[100.0], 0.3).unwrap();
        assert_eq!(out.len(), 3);
        let theta = 0.3 + OMEGA_EARTH * 100.0;
        assert_relative_eq!(out[0][0], theta.cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let r = [[1.0, 0.0, 0.0]; 3];
        assert_eq!(
            inertial_to_earth_fixed(&r, &[0.0, 1.0], 0.0),
            Err(FrameError::LengthMismatch { positions: 3, times: 2 })
        );
    }

    #[test]
    fn test_geodetic_axes() {
        let out = earth_fixed_to_geodetic(&[
            [R_MEAN + 100.0, 0.0, 0.0],
            [0.0, R_MEAN, 0.0],
            [0.0, 0.0, R_MEAN + 5.0],
            [-7000.0, 0.0, 0.0],
        ]);
        assert_relative_eq!(out[0].lat_deg, 0.0);
        assert_relative_eq!(out[0].lon_deg, 0.0);
        assert_relative_eq!(out[0].alt_km, 100.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].lon_deg, 90.0, epsilon = 1e-12);
        assert_relative_eq!(out[2].lat_deg, 90.0, epsilon = 1e-12);
        assert_relative_eq!(out[2].alt_km, 5.0, epsilon = 1e-9);
        assert_relative_eq!(out[3].lon_deg, 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_geodetic_mid_latitude() {
        let g = to_geodetic(&[4000.0, 4000.0, 4000.0 * std::f64::consts::SQRT_2]);
        assert_relative_eq!(g.lat_deg, 45.0, epsilon = 1e-9);
        assert_relative_eq!(g.lon_deg, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_relative_eq!(normalize_longitude_deg(190.0), -170.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_longitude_deg(-190.0), 170.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_longitude_deg(45.0), 45.0, epsilon = 1e-12);
        assert_eq!(normalize_longitude_deg(180.0), 180.0);
        assert_eq!(normalize_longitude_deg(-180.0), 180.0);
        assert_relative_eq!(normalize_longitude_deg(540.0), 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_antimeridian_longitude_is_positive() {
        // atan2(-0.0, x < 0) is -π
        let g = to_geodetic(&[-7000.0, -0.0, 0.0]);
        assert_eq!(g.lon_deg, normalize_longitude_deg(g.lon_deg));
        assert_relative_eq!(g.lon_deg, 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_split_at_antimeridian() {
        let pt = |lon_deg| GeodeticSample { lat_deg: 0.0, lon_deg, alt_km: 400.0 };
        let track = [pt(170.0), pt(178.0), pt(-176.0), pt(-170.0), pt(-160.0)];
        let segments = split_at_antimeridian(&track);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 3);
        assert!(split_at_antimeridian(&[]).is_empty());
    }
}
