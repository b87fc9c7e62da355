//! City markers: the built-in database, per-frame render cache and
//! local-time text for the hover tooltip.

use crate::clock::Instant;
use crate::projection::{CanvasPoint, GeoPoint};
use chrono::{DateTime, Offset};
use chrono_tz::Tz;
use tracing::warn;

/// One row of the built-in database
pub struct CityRecord {
    pub name: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub tz: &'static str,
}

const fn record(name: &'static str, country: &'static str, lat: f64, lon: f64, tz: &'static str) -> CityRecord {
    CityRecord { name, country, lat, lon, tz }
}

pub const CITY_DATABASE: &[CityRecord] = &[
    record("Mexico City", "Mexico", 19.43, -99.13, "America/Mexico_City"),
    record("New York", "United States", 40.71, -74.01, "America/New_York"),
    record("Los Angeles", "United States", 34.05, -118.24, "America/Los_Angeles"),
    record("Chicago", "United States", 41.88, -87.63, "America/Chicago"),
    record("Bogota", "Colombia", 4.71, -74.07, "America/Bogota"),
    record("Lima", "Peru", -12.05, -77.04, "America/Lima"),
    record("Buenos Aires", "Argentina", -34.60, -58.38, "America/Argentina/Buenos_Aires"),
    record("Sao Paulo", "Brazil", -23.55, -46.63, "America/Sao_Paulo"),
    record("Santiago", "Chile", -33.45, -70.67, "America/Santiago"),
    record("London", "United Kingdom", 51.51, -0.13, "Europe/London"),
    record("Paris", "France", 48.86, 2.35, "Europe/Paris"),
    record("Madrid", "Spain", 40.42, -3.70, "Europe/Madrid"),
    record("Berlin", "Germany", 52.52, 13.40, "Europe/Berlin"),
    record("Rome", "Italy", 41.90, 12.50, "Europe/Rome"),
    record("Moscow", "Russia", 55.76, 37.62, "Europe/Moscow"),
    record("Istanbul", "Turkey", 41.01, 28.98, "Europe/Istanbul"),
    record("Dubai", "United Arab Emirates", 25.20, 55.27, "Asia/Dubai"),
    record("Mumbai", "India", 19.08, 72.88, "Asia/Kolkata"),
    record("Bangkok", "Thailand", 13.76, 100.50, "Asia/Bangkok"),
    record("Shanghai", "China", 31.23, 121.47, "Asia/Shanghai"),
    record("Hong Kong", "China", 22.32, 114.17, "Asia/Hong_Kong"),
    record("Tokyo", "Japan", 35.68, 139.69, "Asia/Tokyo"),
    record("Seoul", "South Korea", 37.57, 126.98, "Asia/Seoul"),
    record("Sydney", "Australia", -33.87, 151.21, "Australia/Sydney"),
    record("Auckland", "New Zealand", -36.85, 174.76, "Pacific/Auckland"),
    record("Cairo", "Egypt", 30.04, 31.24, "Africa/Cairo"),
    record("Lagos", "Nigeria", 6.52, 3.38, "Africa/Lagos"),
    record("Nairobi", "Kenya", -1.29, 36.82, "Africa/Nairobi"),
    record("Johannesburg", "South Africa", -26.20, 28.05, "Africa/Johannesburg"),
    record("Toronto", "Canada", 43.65, -79.38, "America/Toronto"),
    record("Vancouver", "Canada", 49.28, -123.12, "America/Vancouver"),
    record("Honolulu", "United States", 21.31, -157.86, "Pacific/Honolulu"),
    record("Anchorage", "United States", 61.22, -149.90, "America/Anchorage"),
];

/// Per-frame state written by the renderer and read by hit testing.
/// Carries nothing across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCache {
    pub screen_point: CanvasPoint,
    pub is_daytime: bool,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone)]
pub struct City {
    pub name: String,
    pub country: String,
    pub location: GeoPoint,
    pub timezone_id: String,
    tz: Option<Tz>,
    pub cache: Option<RenderCache>,
}

impl City {
    pub fn new(name: &str, country: &str, location: GeoPoint, timezone_id: &str) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
            location,
            timezone_id: timezone_id.to_string(),
            tz: timezone_id.parse::<Tz>().ok(),
            cache: None,
        }
    }

    fn from_record(r: &CityRecord) -> Self {
        Self::new(r.name, r.country, GeoPoint::new(r.lat, r.lon), r.tz)
    }

    /// Local wall-clock time at `instant`. Unknown zones fall back to UTC.
    pub fn local_time(&self, instant: Instant) -> Option<LocalTime> {
        let utc = instant.to_datetime()?;
        Some(match self.tz {
            Some(tz) => LocalTime::from_zoned(utc.with_timezone(&tz)),
            None => LocalTime::from_zoned(utc),
        })
    }
}

/// Formatted local time of a city
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTime {
    pub time: String,
    pub date: String,
    pub offset: String,
}

impl LocalTime {
    fn from_zoned<Z: chrono::TimeZone>(dt: DateTime<Z>) -> Self
    where
        Z::Offset: std::fmt::Display,
    {
        let offset_secs = dt.offset().fix().local_minus_utc();
        Self {
            time: dt.format("%H:%M:%S").to_string(),
            date: dt.format("%A, %-d %b %Y").to_string(),
            offset: utc_offset_label(offset_secs),
        }
    }
}

/// "UTC", "UTC+9", "UTC-3:30", "UTC+5:45"
pub fn utc_offset_label(offset_secs: i32) -> String {
    if offset_secs == 0 {
        return "UTC".to_string();
    }
    let sign = if offset_secs > 0 { '+' } else { '-' };
    let abs = offset_secs.unsigned_abs();
    let hours = abs / 3600;
    let minutes = (abs % 3600) / 60;
    if minutes == 0 {
        format!("UTC{sign}{hours}")
    } else {
        format!("UTC{sign}{hours}:{minutes:02}")
    }
}

/// Cities to display, in display order.
///
/// With no selection every database entry is used. A selection lists IANA
/// zones; each picks the first database city in that zone, duplicates and
/// unknown zones are skipped.
pub fn load_cities(selection: Option<&[String]>) -> Vec<City> {
    let Some(zones) = selection else {
        return CITY_DATABASE.iter().map(City::from_record).collect();
    };

    let mut cities: Vec<City> = Vec::with_capacity(zones.len());
    for zone in zones {
        if cities.iter().any(|c| &c.timezone_id == zone) {
            continue;
        }
        match CITY_DATABASE.iter().find(|r| r.tz == zone.as_str()) {
            Some(r) => cities.push(City::from_record(r)),
            None => warn!(zone = %zone, "no city for timezone, skipping"),
        }
    }
    cities
}

/// Lines shown in the hover tooltip
pub fn tooltip_lines(city: &City, instant: Instant) -> Vec<String> {
    let mut lines = vec![format!("{}, {}", city.name, city.country)];
    if let Some(local) = city.local_time(instant) {
        lines.push(format!("{}  {}", local.time, local.offset));
        lines.push(local.date);
    }
    if let Some(cache) = city.cache {
        let label = if cache.is_daytime { "Day" } else { "Night" };
        lines.push(format!("{label}  sun {:+.1}°", cache.elevation_deg));
    }
    lines
}

/// Drop every render cache (viewport changed, nothing drawn yet)
pub fn clear_caches(cities: &mut [City]) {
    for city in cities {
        city.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn instant(y: i32, m: u32, d: u32, h: u32) -> Instant {
        Instant::from_datetime(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    #[test]
    fn database_zones_parse() {
        for r in CITY_DATABASE {
            assert!(r.tz.parse::<Tz>().is_ok(), "bad zone {}", r.tz);
            assert!((-90.0..=90.0).contains(&r.lat) && (-180.0..180.0).contains(&r.lon));
        }
    }

    #[test]
    fn selection_preserves_order_and_skips_unknown() {
        let zones: Vec<String> = ["Asia/Tokyo", "Mars/Olympus", "Europe/London", "Asia/Tokyo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cities = load_cities(Some(&zones));
        let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Tokyo", "London"]);
        assert_eq!(load_cities(None).len(), CITY_DATABASE.len());
    }

    #[test]
    fn local_time_uses_zone_rules() {
        let tokyo = City::new("Tokyo", "Japan", GeoPoint::new(35.68, 139.69), "Asia/Tokyo");
        let local = tokyo.local_time(instant(2024, 1, 15, 3)).unwrap();
        assert_eq!(local.time, "12:00:00");
        assert_eq!(local.offset, "UTC+9");
        assert_eq!(local.date, "Monday, 15 Jan 2024");

        // New York observes DST in July
        let ny = City::new("New York", "United States", GeoPoint::new(40.71, -74.01), "America/New_York");
        let local = ny.local_time(instant(2024, 7, 1, 16)).unwrap();
        assert_eq!(local.time, "12:00:00");
        assert_eq!(local.offset, "UTC-4");
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let city = City::new("Nowhere", "-", GeoPoint::new(0.0, 0.0), "Not/AZone");
        let local = city.local_time(instant(2024, 1, 1, 8)).unwrap();
        assert_eq!(local.time, "08:00:00");
        assert_eq!(local.offset, "UTC");
    }

    #[test]
    fn offset_labels() {
        assert_eq!(utc_offset_label(0), "UTC");
        assert_eq!(utc_offset_label(19_800), "UTC+5:30");
        assert_eq!(utc_offset_label(-12_600), "UTC-3:30");
        assert_eq!(utc_offset_label(20_700), "UTC+5:45");
        let mumbai = City::new("Mumbai", "India", GeoPoint::new(19.08, 72.88), "Asia/Kolkata");
        let local = mumbai.local_time(instant(2024, 1, 1, 0)).unwrap();
        assert_eq!(local.offset, "UTC+5:30");
    }

    #[test]
    fn tooltip_includes_cached_state() {
        let mut city = City::new("Lagos", "Nigeria", GeoPoint::new(6.52, 3.38), "Africa/Lagos");
        let t = instant(2024, 3, 20, 12);
        assert_eq!(tooltip_lines(&city, t).len(), 3);
        city.cache = Some(RenderCache {
            screen_point: CanvasPoint::new(1.0, 2.0),
            is_daytime: true,
            elevation_deg: 80.3,
        });
        let lines = tooltip_lines(&city, t);
        assert_eq!(lines[0], "Lagos, Nigeria");
        assert_eq!(lines[1], "13:00:00  UTC+1");
        assert_eq!(lines[3], "Day  sun +80.3°");
        clear_caches(std::slice::from_mut(&mut city));
        assert!(city.cache.is_none());
    }
}
