use crate::config::{MapConfig, ShadeConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `~/.config/sunmap/config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub shade: ShadeSettings,
    #[serde(default)]
    pub cities: CitySettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapSettings {
    pub image: Option<String>,    // path, file:// or http(s) URL
    pub fallback: Option<String>,
    pub stride: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShadeSettings {
    pub max_opacity: Option<f64>,
    pub twilight_deg: Option<f64>,
    pub glow_band_deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CitySettings {
    pub timezones: Option<Vec<String>>, // IANA zones, in display order
    pub hit_radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    pub filter: Option<String>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ignoring invalid {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl Settings {
    /// Settings from the user's config file. A missing file is not an
    /// error; an unreadable or malformed one is returned so the caller can
    /// report it once logging is up, then fall back to defaults.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sunmap")
            .join("config.toml")
    }

    /// Overlay file settings onto `config`. Out-of-range values are ignored.
    pub fn apply(&self, config: &mut MapConfig) {
        if let Some(image) = &self.map.image {
            config.sources.primary = Some(image.clone());
        }
        if let Some(fallback) = &self.map.fallback {
            config.sources.fallback = Some(fallback.clone());
        }
        if let Some(stride) = self.map.stride.filter(|s| (1..=16).contains(s)) {
            config.stride = stride;
        }
        config.shade = self.shade.merged(config.shade);
        if let Some(zones) = &self.cities.timezones {
            config.timezones = Some(zones.clone());
        }
        if let Some(radius) = self.cities.hit_radius.filter(|r| r.is_finite() && *r > 0.0) {
            config.hit_radius = radius;
        }
    }
}

impl ShadeSettings {
    fn merged(&self, base: ShadeConfig) -> ShadeConfig {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        ShadeConfig {
            max_opacity: self
                .max_opacity
                .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
                .unwrap_or(base.max_opacity),
            twilight_deg: self.twilight_deg.filter(positive).unwrap_or(base.twilight_deg),
            glow_band_deg: self.glow_band_deg.filter(positive).unwrap_or(base.glow_band_deg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let settings = Settings::from_toml_str("").unwrap();
        let mut config = MapConfig::default();
        settings.apply(&mut config);
        assert_eq!(config.stride, MapConfig::default().stride);
        assert_eq!(config.shade, ShadeConfig::default());
        assert!(config.timezones.is_none());
    }

    #[test]
    fn sections_merge_into_config() {
        let settings = Settings::from_toml_str(
            r#"
            [map]
            image = "/tmp/earth.png"
            stride = 4

            [shade]
            max_opacity = 0.8
            twilight_deg = 12.0

            [cities]
            timezones = ["Asia/Tokyo", "Europe/Paris"]
            hit_radius = 5.0

            [log]
            file = "/tmp/sunmap.log"
            filter = "sunmap=debug"
            "#,
        )
        .unwrap();

        let mut config = MapConfig::default();
        settings.apply(&mut config);
        assert_eq!(config.sources.primary.as_deref(), Some("/tmp/earth.png"));
        assert_eq!(config.sources.fallback.as_deref(), Some(crate::config::FALLBACK_MAP_URL));
        assert_eq!(config.stride, 4);
        assert_eq!(config.shade.max_opacity, 0.8);
        assert_eq!(config.shade.twilight_deg, 12.0);
        assert_eq!(config.shade.glow_band_deg, 3.0);
        assert_eq!(config.timezones.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.hit_radius, 5.0);
        assert_eq!(settings.log.filter.as_deref(), Some("sunmap=debug"));
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        let settings = Settings::from_toml_str(
            "[map]\nstride = 0\n[shade]\nmax_opacity = 1.5\nglow_band_deg = -1.0\n",
        )
        .unwrap();
        let mut config = MapConfig::default();
        settings.apply(&mut config);
        assert_eq!(config.stride, 2);
        assert_eq!(config.shade, ShadeConfig::default());
    }

    #[test]
    fn load_reports_malformed_file() {
        let dir = std::env::temp_dir().join(format!("sunmap-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("absent.toml");
        assert!(Settings::load_from(&missing).is_ok());

        let bad = dir.join("config.toml");
        fs::write(&bad, "[shade\nmax_opacity = 0.5").unwrap();
        let err = Settings::load_from(&bad).unwrap_err();
        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Settings::from_toml_str("[map\nstride = 2").is_err());
        assert!(Settings::from_toml_str("[map]\nstride = \"wide\"").is_err());
    }
}
