//! Two-Line Element (TLE) set parser.
//!
//! Reads the fixed columns a two-body propagator needs: the epoch from
//! line 1 and the six orbital fields from line 2. Checksums, line numbers
//! and catalog numbers are not validated; only a line that is too short
//! for its columns or a required field that is not numeric is an error.
//!
//! # TLE Format Reference
//! ```text
//! Line 0 (optional): Satellite Name (up to 24 chars)
//! Line 1: 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! Line 2: 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```
//!
//! # Example
//! ```
//! use orbit_engine::tle::Tle;
//!
//! let line1 = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
//! let line2 = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";
//!
//! let tle = Tle::parse(line1, line2).unwrap();
//! assert_eq!(tle.epoch_year, 2025);
//! assert_eq!(tle.catalog_number, Some(25544));
//! ```

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::elements::{ElementSet, ValidationError};
use crate::error::Error;
use crate::sidereal::unix_seconds_at_year_start;

/// Line 1 must reach the end of the epoch field.
const LINE1_MIN_LEN: usize = 32;
/// Line 2 must reach the end of the mean motion field.
const LINE2_MIN_LEN: usize = 63;

/// Two-digit years below this belong to the 2000s (NORAD convention).
const CENTURY_PIVOT: i64 = 57;

/// TLE parsing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line} is {len} characters long, at least {required} are required")]
    LineTooShort { line: u8, len: usize, required: usize },

    #[error("failed to parse field '{field}' from '{value}'")]
    Field { field: &'static str, value: String },

    #[error("no TLEs found in input")]
    Empty,
}

/// Fields decoded from a Two-Line Element set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tle {
    /// Satellite name (from line 0, if present).
    pub name: Option<String>,
    /// NORAD catalog number, when the column is numeric.
    pub catalog_number: Option<u32>,
    /// Epoch year (full 4-digit year).
    pub epoch_year: i64,
    /// Epoch day of year (fractional, 1-based).
    pub epoch_day: f64,
    /// Inclination (degrees).
    pub inclination_deg: f64,
    /// Right ascension of ascending node (degrees).
    pub raan_deg: f64,
    /// Eccentricity (dimensionless).
    pub eccentricity: f64,
    /// Argument of perigee (degrees).
    pub arg_perigee_deg: f64,
    /// Mean anomaly (degrees).
    pub mean_anomaly_deg: f64,
    /// Mean motion (revolutions per day).
    pub mean_motion_rev_day: f64,
}

impl Tle {
    /// Parse a TLE from two lines (without satellite name).
    pub fn parse(line1: &str, line2: &str) -> Result<Self, ParseError> {
        Self::parse_with_name(None, line1, line2)
    }

    /// Parse a TLE from three lines (with satellite name on line 0).
    pub fn parse_3line(line0: &str, line1: &str, line2: &str) -> Result<Self, ParseError> {
        let name = line0.trim().to_string();
        Self::parse_with_name(Some(name), line1, line2)
    }

    fn parse_with_name(name: Option<String>, line1: &str, line2: &str) -> Result<Self, ParseError> {
        let l1 = check_line(1, line1, LINE1_MIN_LEN)?;
        let l2 = check_line(2, line2, LINE2_MIN_LEN)?;

        // ── Line 1 ──
        let catalog_number = columns(l1, 2..7).and_then(|s| s.trim().parse::<u32>().ok());

        let yy = parse_field::<i64>(l1, 18..20, "epoch_year")?;
        let epoch_year = if yy < CENTURY_PIVOT { 2000 + yy } else { 1900 + yy };
        let epoch_day = parse_field::<f64>(l1, 20..32, "epoch_day")?;

        // ── Line 2 ──
        let inclination_deg = parse_field::<f64>(l2, 8..16, "inclination")?;
        let raan_deg = parse_field::<f64>(l2, 17..25, "raan")?;

        // Eccentricity has implied leading decimal point
        let ecc_digits = columns(l2, 26..33).unwrap_or_default().trim();
        let eccentricity = format!("0.{ecc_digits}")
            .parse::<f64>()
            .map_err(|_| ParseError::Field {
                field: "eccentricity",
                value: ecc_digits.to_string(),
            })?;

        let arg_perigee_deg = parse_field::<f64>(l2, 34..42, "arg_perigee")?;
        let mean_anomaly_deg = parse_field::<f64>(l2, 43..51, "mean_anomaly")?;
        let mean_motion_rev_day = parse_field::<f64>(l2, 52..63, "mean_motion")?;

        let tle = Tle {
            name,
            catalog_number,
            epoch_year,
            epoch_day,
            inclination_deg,
            raan_deg,
            eccentricity,
            arg_perigee_deg,
            mean_anomaly_deg,
            mean_motion_rev_day,
        };
        debug!("parsed {tle}");
        Ok(tle)
    }

    /// Parse a string containing multiple TLEs (2-line or 3-line format).
    ///
    /// Handles mixed formats: lines starting with '1' begin a 2-line TLE,
    /// other non-empty lines are treated as satellite names (line 0).
    pub fn parse_batch(input: &str) -> Result<Vec<Self>, ParseError> {
        let lines: Vec<&str> = input
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();

        let mut tles = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].starts_with('1') && i + 1 < lines.len() && lines[i + 1].starts_with('2') {
                tles.push(Tle::parse(lines[i], lines[i + 1])?);
                i += 2;
            } else if i + 2 < lines.len()
                && lines[i + 1].starts_with('1')
                && lines[i + 2].starts_with('2')
            {
                tles.push(Tle::parse_3line(lines[i], lines[i + 1], lines[i + 2])?);
                i += 3;
            } else {
                // Skip unrecognized lines
                i += 1;
            }
        }

        if tles.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(tles)
    }

    /// Semi-major axis derived from mean motion (km).
    ///
    /// a = μ^(1/3) / n^(2/3), with n in rad/s.
    pub fn semi_major_axis(&self) -> f64 {
        let n_rad_s = self.mean_motion_rev_day * TAU / SOLAR_DAY;
        MU_EARTH.powf(1.0 / 3.0) / n_rad_s.powf(2.0 / 3.0)
    }

    /// Orbital period (seconds).
    pub fn period(&self) -> f64 {
        SOLAR_DAY / self.mean_motion_rev_day
    }

    /// TLE epoch as Unix seconds (UTC).
    pub fn epoch_unix_seconds(&self) -> f64 {
        unix_seconds_at_year_start(self.epoch_year) + (self.epoch_day - 1.0) * SOLAR_DAY
    }

    /// Element set anchored at the TLE epoch.
    pub fn to_elements(&self) -> Result<ElementSet, ValidationError> {
        ElementSet::new(
            self.semi_major_axis(),
            self.eccentricity,
            self.inclination_deg,
            self.raan_deg,
            self.arg_perigee_deg,
            self.mean_anomaly_deg,
            self.epoch_unix_seconds(),
        )
    }
}

impl std::fmt::Display for Tle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) epoch {}/{:.8}: {:.4}° inc, {:.7} ecc, {:.8} rev/day",
            self.name.as_deref().unwrap_or("UNKNOWN"),
            self.catalog_number
                .map_or_else(|| "no catalog number".to_string(), |n| format!("#{n}")),
            self.epoch_year,
            self.epoch_day,
            self.inclination_deg,
            self.eccentricity,
            self.mean_motion_rev_day,
        )
    }
}

/// Decode a TLE straight into an [`ElementSet`].
pub fn parse_tle(line1: &str, line2: &str) -> Result<ElementSet, Error> {
    Ok(Tle::parse(line1, line2)?.to_elements()?)
}

fn check_line(line: u8, text: &str, required: usize) -> Result<&str, ParseError> {
    let text = text.trim_end_matches(['\r', '\n']);
    let len = text.chars().count();
    if len < required {
        return Err(ParseError::LineTooShort {
            line,
            len,
            required,
        });
    }
    Ok(text)
}

/// Columns `cols` of `line`, counted in characters.
fn columns(line: &str, cols: Range<usize>) -> Option<&str> {
    let mut offsets = line
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(line.len()));
    let start = offsets.nth(cols.start)?;
    let end = match cols.len() {
        0 => start,
        width => offsets.nth(width - 1)?,
    };
    line.get(start..end)
}

/// Parse a fixed-column field.
fn parse_field<T: std::str::FromStr>(
    line: &str,
    cols: Range<usize>,
    field: &'static str,
) -> Result<T, ParseError> {
    let raw = columns(line, cols).unwrap_or_default().trim();
    raw.parse::<T>().map_err(|_| ParseError::Field {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ISS_LINE1: &str = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
    const ISS_LINE2: &str = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";

    #[test]
    fn test_parse_iss() {
        let tle = Tle::parse(ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(tle.catalog_number, Some(25544));
        assert_eq!(tle.epoch_year, 2025);
        assert_relative_eq!(tle.epoch_day, 229.18034946, epsilon = 1e-9);
        assert_relative_eq!(tle.inclination_deg, 51.6356, epsilon = 1e-9);
        assert_relative_eq!(tle.raan_deg, 4.755, epsilon = 1e-9);
        assert_relative_eq!(tle.eccentricity, 0.0003499, epsilon = 1e-12);
        assert_relative_eq!(tle.arg_perigee_deg, 229.5075, epsilon = 1e-9);
        assert_relative_eq!(tle.mean_anomaly_deg, 130.5609, epsilon = 1e-9);
        assert_relative_eq!(tle.mean_motion_rev_day, 15.49975761, epsilon = 1e-9);
    }

    #[test]
    fn test_truncated_line1_still_parses() {
        let elems = parse_tle("1 25544U 98067A   25229.18034946 ...", ISS_LINE2).unwrap();
        assert_relative_eq!(elems.i_deg(), 51.6356, epsilon = 1e-9);
        assert_relative_eq!(elems.raan_deg(), 4.755, epsilon = 1e-9);
        assert_relative_eq!(elems.e(), 0.0003499, epsilon = 1e-12);
        assert_relative_eq!(elems.argp_deg(), 229.5075, epsilon = 1e-9);
        assert_relative_eq!(elems.m0_deg(), 130.5609, epsilon = 1e-9);
        // ~15.5 rev/day
        assert_relative_eq!(elems.a_km(), 6794.93, epsilon = 0.1);
    }

    #[test]
    fn test_epoch_unix_seconds() {
        let tle = Tle::parse(ISS_LINE1, ISS_LINE2).unwrap();
        // 2025-01-01T00:00:00Z + 228.18034946 days
        assert_relative_eq!(tle.epoch_unix_seconds(), 1_755_404_382.193344, epsilon = 1e-3);
    }

    #[test]
    fn test_century_pivot() {
        let l1 = "1 00005U 58002B   58001.00000000";
        let tle = Tle::parse(l1, ISS_LINE2).unwrap();
        assert_eq!(tle.epoch_year, 1958);

        let l1 = "1 00005U 58002B   56001.00000000";
        assert_eq!(Tle::parse(l1, ISS_LINE2).unwrap().epoch_year, 2056);

        let l1 = "1 00005U 58002B   70001.00000000";
        assert_eq!(Tle::parse(l1, ISS_LINE2).unwrap().epoch_unix_seconds(), 0.0);
    }

    #[test]
    fn test_short_lines() {
        assert_eq!(
            Tle::parse("1 25544U", ISS_LINE2),
            Err(ParseError::LineTooShort { line: 1, len: 8, required: 32 })
        );
        assert!(matches!(
            Tle::parse(ISS_LINE1, &ISS_LINE2[..60]),
            Err(ParseError::LineTooShort { line: 2, len: 60, .. })
        ));
    }

    #[test]
    fn test_non_numeric_field() {
        let bad = ISS_LINE2.replace(" 51.6356", " 51.6a56");
        let err = Tle::parse(ISS_LINE1, &bad).unwrap_err();
        assert_eq!(
            err,
            ParseError::Field {
                field: "inclination",
                value: "51.6a56".to_string()
            }
        );

        let bad_ecc = ISS_LINE2.replace("0003499", "00x3499");
        assert!(matches!(
            Tle::parse(ISS_LINE1, &bad_ecc),
            Err(ParseError::Field { field: "eccentricity", .. })
        ));
    }

    #[test]
    fn test_non_ascii_outside_read_columns() {
        let l1 = ISS_LINE1.replacen('U', "Ü", 1);
        let l2 = format!("{ISS_LINE2} ✓");
        let tle = Tle::parse(&l1, &l2).unwrap();
        assert_eq!(tle.epoch_year, 2025);
        assert_relative_eq!(tle.epoch_day, 229.18034946, epsilon = 1e-9);
        assert_relative_eq!(tle.inclination_deg, 51.6356, epsilon = 1e-9);
        assert_relative_eq!(tle.mean_motion_rev_day, 15.49975761, epsilon = 1e-9);

        let elems = parse_tle(&l1, ISS_LINE2).unwrap();
        assert_relative_eq!(elems.i_deg(), 51.6356, epsilon = 1e-9);
    }

    #[test]
    fn test_non_ascii_inside_field() {
        let bad = ISS_LINE2.replacen("51.6356", "51·6356", 1);
        assert_eq!(
            Tle::parse(ISS_LINE1, &bad),
            Err(ParseError::Field {
                field: "inclination",
                value: "51·6356".to_string()
            })
        );
    }

    #[test]
    fn test_line_length_counts_characters() {
        // 13 characters, 35 bytes
        let l1 = "1 ✓✓✓✓✓✓✓✓✓✓✓";
        assert_eq!(
            Tle::parse(l1, ISS_LINE2),
            Err(ParseError::LineTooShort { line: 1, len: 13, required: 32 })
        );
    }

    #[test]
    fn test_checksum_and_catalog_not_validated() {
        // Wrong checksum digit, letters in the catalog column
        let l1 = ISS_LINE1.replace("  9996", "  9990").replacen("25544", "ABCDE", 1);
        let tle = Tle::parse(&l1, ISS_LINE2).unwrap();
        assert_eq!(tle.catalog_number, None);
    }

    #[test]
    fn test_implausible_values_pass_parser() {
        let l2 = "2 25544 251.6356 999.9999 0003499 229.5075 130.5609 15.49975761524621";
        let tle = Tle::parse(ISS_LINE1, l2).unwrap();
        assert_relative_eq!(tle.inclination_deg, 251.6356, epsilon = 1e-9);
        assert_relative_eq!(tle.raan_deg, 999.9999, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_mean_motion_fails_validation() {
        let l2 = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609  0.00000000524621";
        assert!(Tle::parse(ISS_LINE1, l2).is_ok());
        assert!(matches!(
            parse_tle(ISS_LINE1, l2),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_parse_3line() {
        let tle = Tle::parse_3line("ISS (ZARYA)  ", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(tle.name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(tle.catalog_number, Some(25544));
    }

    #[test]
    fn test_parse_batch() {
        let input = format!(
            "ISS (ZARYA)\n{}\n{}\n\nHUBBLE\n1 20580U 90037B   24001.50000000  .00000764  00000-0  34340-4 0  9998\n2 20580  28.4700 100.2000 0002500 300.0000  60.0000 15.09000000400000\n{}\n{}\n",
            ISS_LINE1, ISS_LINE2, ISS_LINE1, ISS_LINE2
        );
        let tles = Tle::parse_batch(&input).unwrap();
        assert_eq!(tles.len(), 3);
        assert_eq!(tles[0].name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(tles[1].name.as_deref(), Some("HUBBLE"));
        assert_eq!(tles[1].epoch_year, 2024);
        assert_eq!(tles[2].name, None);
    }

    #[test]
    fn test_parse_batch_empty() {
        assert_eq!(Tle::parse_batch("\n  \nnothing here\n"), Err(ParseError::Empty));
    }
}
