//! Low-order analytic solar position.
//!
//! Arc-minute accuracy on declination, which is plenty for drawing a
//! terminator but not for timekeeping. Everything else in the crate only sees
//! [`solve`], so a better ephemeris can replace the internals.

use crate::clock::Instant;

/// 2000-01-01T12:00:00Z in Unix milliseconds
const J2000_MS: f64 = 946_728_000_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Mean obliquity of the ecliptic
const OBLIQUITY_DEG: f64 = 23.439;

/// Where the sun sits over the Earth at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarState {
    pub declination_rad: f64,
    pub sub_solar_lat_deg: f64,
    pub sub_solar_lon_deg: f64,
    pub equation_of_time_min: f64,
}

/// Continuous day count from the J2000.0 epoch
pub fn days_since_j2000(instant: Instant) -> f64 {
    (instant.millis - J2000_MS) / MS_PER_DAY
}

/// Wrap a longitude into [-180, 180)
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Declination from the mean longitude and a two-term equation of center
fn declination(n: f64) -> f64 {
    let mean_lon = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_lon = (mean_lon
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    (OBLIQUITY_DEG.to_radians().sin() * ecliptic_lon.sin()).asin()
}

/// Equation of time in minutes, three harmonics of the day-of-year angle
fn equation_of_time(day_of_year: u32) -> f64 {
    let b = (360.0 / 365.0 * (day_of_year as f64 - 81.0)).to_radians();
    9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()
}

/// Solar state at `instant`. The instant must be finite.
pub fn solve(instant: Instant) -> SolarState {
    debug_assert!(instant.millis.is_finite(), "instant must be finite");

    let declination_rad = declination(days_since_j2000(instant));
    let equation_of_time_min = equation_of_time(instant.day_of_year());
    let utc_hours = instant.utc_hours();
    let sub_solar_lon_deg =
        wrap_longitude(-((utc_hours - 12.0) * 15.0 + equation_of_time_min * 0.25));

    SolarState {
        declination_rad,
        sub_solar_lat_deg: declination_rad.to_degrees(),
        sub_solar_lon_deg,
        equation_of_time_min,
    }
}

impl SolarState {
    /// "23.44°N" style label for the sub-solar latitude
    pub fn lat_label(&self) -> String {
        hemisphere_label(self.sub_solar_lat_deg, 'N', 'S')
    }

    /// "45.10°W" style label for the sub-solar longitude
    pub fn lon_label(&self) -> String {
        hemisphere_label(self.sub_solar_lon_deg, 'E', 'W')
    }
}

fn hemisphere_label(value: f64, positive: char, negative: char) -> String {
    format!(
        "{:.2}°{}",
        value.abs(),
        if value >= 0.0 { positive } else { negative }
    )
}
