use crate::clock::Instant;

/// Presentation constants for the night overlay and terminator glow.
/// None of these are physical constraints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadeConfig {
    pub max_opacity: f64,   // night overlay opacity once fully dark
    pub twilight_deg: f64,  // depth of the twilight ramp below the horizon
    pub glow_band_deg: f64, // half-width of the terminator haze
}

impl Default for ShadeConfig {
    fn default() -> Self {
        Self {
            max_opacity: 0.65,
            twilight_deg: 6.0,
            glow_band_deg: 3.0,
        }
    }
}

/// NASA Visible Earth blue marble, 2048×1024 equirectangular
pub const DEFAULT_MAP_URL: &str =
    "https://eoimages.gsfc.nasa.gov/images/imagerecords/57000/57752/land_shallow_topo_2048.jpg";
/// Wikimedia Commons mirror of a land/ocean/ice equirectangular map
pub const FALLBACK_MAP_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/c/cd/Land_ocean_ice_2048.jpg";

/// Where to get the base map image from
#[derive(Clone, Debug, PartialEq)]
pub struct MapSources {
    pub primary: Option<String>,
    pub fallback: Option<String>,
}

impl MapSources {
    /// No image sources: loading goes straight to the placeholder
    pub fn none() -> Self {
        Self { primary: None, fallback: None }
    }
}

impl Default for MapSources {
    fn default() -> Self {
        Self {
            primary: Some(DEFAULT_MAP_URL.to_string()),
            fallback: Some(FALLBACK_MAP_URL.to_string()),
        }
    }
}

/// Configuration for the day/night map view
#[derive(Clone, Debug)]
pub struct MapConfig {
    pub time_step: f32,
    pub start: Option<Instant>,
    pub speed: f64,
    pub stride: u32,
    pub hit_radius: f64,
    pub show_grid: bool,
    pub shade: ShadeConfig,
    pub sources: MapSources,
    pub timezones: Option<Vec<String>>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 30.0,
            start: None,
            speed: 1.0,
            stride: 2,
            hit_radius: 3.0,
            show_grid: true,
            shade: ShadeConfig::default(),
            sources: MapSources::default(),
            timezones: None,
        }
    }
}

/// Configuration for printing a single frame to stdout
#[derive(Clone, Debug)]
pub struct PrintConfig {
    pub map: MapConfig,
    pub width: u16,
    pub height: u16,
}
