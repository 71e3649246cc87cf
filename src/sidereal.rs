//! Greenwich Mean Sidereal Time.
//!
//! Anchors the Earth-fixed frame to the real Earth orientation at a given
//! instant. UT1 is taken equal to UTC, which is plenty for ground tracks.

use crate::constants::*;
use crate::elements::normalize_angle;

/// A UTC calendar date and time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

/// Julian date of a Gregorian calendar date and time (UTC).
///
/// Meeus, Astronomical Algorithms, ch. 7. January and February count as
/// months 13 and 14 of the previous year.
pub fn julian_date(year: i64, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (year - 1, month as i64 + 12)
    } else {
        (year, month as i64)
    };

    let a = y.div_euclid(100);
    let b = 2 - a + a.div_euclid(4);

    let jd0 = (365.25 * (y + 4716) as f64).floor()
        + (30.6001 * (m + 1) as f64).floor()
        + day as f64
        + b as f64
        - 1524.5;

    let day_fraction = (hour as f64 + (minute as f64 + second / 60.0) / 60.0) / 24.0;
    jd0 + day_fraction
}

/// Break Unix seconds into a UTC calendar date and time of day.
pub fn unix_to_calendar(unix_time_s: f64) -> CalendarTime {
    let days = (unix_time_s / SOLAR_DAY).floor();
    let secs_of_day = unix_time_s - days * SOLAR_DAY;
    let (year, month, day) = civil_from_days(days as i64);

    let hour = (secs_of_day / 3600.0).floor();
    let minute = ((secs_of_day - hour * 3600.0) / 60.0).floor();
    let second = secs_of_day - hour * 3600.0 - minute * 60.0;

    CalendarTime {
        year,
        month,
        day,
        hour: hour as u32,
        minute: minute as u32,
        second,
    }
}

/// Unix seconds at 00:00 UTC on January 1 of `year`.
pub fn unix_seconds_at_year_start(year: i64) -> f64 {
    (julian_date(year, 1, 1, 0, 0, 0.0) - UNIX_EPOCH_JD) * SOLAR_DAY
}

/// Greenwich Mean Sidereal Time (rad, [0, 2π)) at a Unix timestamp.
///
/// IAU-1982 polynomial evaluated in seconds of time, reduced to degrees
/// modulo 360, then converted to radians.
pub fn gmst(unix_time_s: f64) -> f64 {
    let cal = unix_to_calendar(unix_time_s);
    let jd = julian_date(cal.year, cal.month, cal.day, cal.hour, cal.minute, cal.second);
    let t = (jd - J2000_JD) / DAYS_PER_JULIAN_CENTURY;

    let gmst_sec = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * t
        + 0.093104 * t.powi(2)
        - 6.2e-6 * t.powi(3);

    let gmst_deg = (gmst_sec / 240.0).rem_euclid(360.0);
    normalize_angle(gmst_deg * DEG2RAD)
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
