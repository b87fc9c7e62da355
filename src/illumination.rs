//! Solar elevation and day/twilight/night shading

use crate::config::ShadeConfig;
use crate::projection::GeoPoint;
use crate::solar::SolarState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Day,
    Twilight,
    Night,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Day => "Day",
            Phase::Twilight => "Twilight",
            Phase::Night => "Night",
        }
    }
}

/// Sun elevation above the horizon at `point`, in degrees
pub fn elevation(point: GeoPoint, solar: &SolarState) -> f64 {
    let lat = point.lat_deg.to_radians();
    let dec = solar.declination_rad;
    let hour_angle = (point.lon_deg - solar.sub_solar_lon_deg).to_radians();
    let sin_elev = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    sin_elev.clamp(-1.0, 1.0).asin().to_degrees().clamp(-90.0, 90.0)
}

/// Shading rules derived from a [`ShadeConfig`]
#[derive(Debug, Clone, Copy)]
pub struct Shading {
    config: ShadeConfig,
}

impl Shading {
    pub fn new(config: ShadeConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, elevation_deg: f64) -> Phase {
        if elevation_deg >= 0.0 {
            Phase::Day
        } else if elevation_deg > -self.config.twilight_deg {
            Phase::Twilight
        } else {
            Phase::Night
        }
    }

    /// Night overlay opacity: 0 in daylight, a linear ramp through twilight,
    /// then flat at the maximum.
    pub fn night_opacity(&self, elevation_deg: f64) -> f64 {
        if elevation_deg >= 0.0 {
            0.0
        } else if elevation_deg <= -self.config.twilight_deg {
            self.config.max_opacity
        } else {
            self.config.max_opacity * (-elevation_deg / self.config.twilight_deg)
        }
    }

    /// Terminator haze strength in [0, 1], peaking at the horizon
    pub fn glow_intensity(&self, elevation_deg: f64) -> f64 {
        let band = self.config.glow_band_deg;
        if band <= 0.0 {
            return 0.0;
        }
        (1.0 - elevation_deg.abs() / band).max(0.0)
    }
}

impl Default for Shading {
    fn default() -> Self {
        Self::new(ShadeConfig::default())
    }
}
