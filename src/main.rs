mod app;
mod basemap;
mod cities;
mod clock;
mod colors;
mod config;
mod help;
mod illumination;
mod logging;
mod projection;
mod raster;
mod render;
mod settings;
mod solar;
mod terminal;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use clock::Instant;
use config::{MapConfig, PrintConfig};
use illumination::Shading;
use logging::LogTarget;
use settings::{Settings, SettingsError};
use std::io;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "sunmap")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "sunmap: live day/night terminator on a world map in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive world map with the moving day/night terminator
    Map {
        /// Start at this instant (RFC 3339, e.g. 2024-06-21T12:00:00Z) instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<Instant>,

        /// Simulation speed multiplier (negative runs backwards)
        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        speed: f64,

        /// Base map image: path, file:// or http(s) URL
        #[arg(short, long)]
        map: Option<String>,

        /// Night overlay block size in pixels (1 = finest)
        #[arg(long)]
        stride: Option<u32>,

        /// Animation speed (seconds per frame)
        #[arg(short, long, default_value = "0.033")]
        time: f32,

        /// Write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print a single frame to stdout (no interactive display)
    Print {
        /// Render this instant (RFC 3339) instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<Instant>,

        /// Base map image: path, file:// or http(s) URL
        #[arg(short, long)]
        map: Option<String>,

        /// Night overlay block size in pixels
        #[arg(long)]
        stride: Option<u32>,

        /// Output width in columns (default: terminal width)
        #[arg(short = 'W', long)]
        width: Option<u16>,

        /// Output height in rows (default: terminal height)
        #[arg(short = 'H', long)]
        height: Option<u16>,
    },

    /// Print the sun position and each city's local time and phase
    Solar {
        /// Report for this instant (RFC 3339) instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<Instant>,
    },
}

fn parse_instant(s: &str) -> Result<Instant, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| Instant::from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| format!("expected RFC 3339 time like 2024-06-21T12:00:00Z: {e}"))
}

fn map_config(settings: &Settings, at: Option<Instant>, map: Option<String>, stride: Option<u32>) -> MapConfig {
    let mut config = MapConfig::default();
    settings.apply(&mut config);
    config.start = at;
    if map.is_some() {
        config.sources.primary = map;
    }
    if let Some(stride) = stride {
        config.stride = stride.clamp(1, 16);
    }
    config
}

/// Settings problems surface once logging is up. With logging off they go
/// to stderr before the view takes over the screen.
fn report_settings_error(err: Option<SettingsError>, logging: bool) {
    let Some(err) = err else { return };
    if logging {
        warn!(error = %err, "using default settings");
    } else {
        eprintln!("sunmap: {err}; using default settings");
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let (settings, settings_err) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };
    let log_filter = settings.log.filter.as_deref();

    match cli.command {
        Commands::Map {
            at,
            speed,
            map,
            stride,
            time,
            log_file,
        } => {
            let target = LogTarget::interactive(log_file.or(settings.log.file.clone()));
            let logging = !matches!(target, LogTarget::Off);
            logging::init(target, log_filter)?;
            report_settings_error(settings_err, logging);
            let mut config = map_config(&settings, at, map, stride);
            if speed.is_finite() {
                config.speed = speed;
            }
            config.time_step = time.max(0.001);
            app::run(config)?;
        }
        Commands::Print {
            at,
            map,
            stride,
            width,
            height,
        } => {
            logging::init(LogTarget::Stderr, log_filter)?;
            report_settings_error(settings_err, true);
            let (term_w, term_h) = crossterm::terminal::size().unwrap_or((80, 24));
            let config = PrintConfig {
                map: map_config(&settings, at, map, stride),
                width: width.unwrap_or(term_w).max(2),
                height: height.unwrap_or(term_h).max(2),
            };
            app::run_print(config)?;
        }
        Commands::Solar { at } => {
            logging::init(LogTarget::Stderr, log_filter)?;
            report_settings_error(settings_err, true);
            let config = map_config(&settings, at, None, None);
            let instant = config.start.unwrap_or_else(Instant::now);
            let cities = cities::load_cities(config.timezones.as_deref());
            print!("{}", app::solar_report(instant, &cities, &Shading::new(config.shade)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let t = parse_instant("2024-03-20T14:00:00+02:00").unwrap();
        assert_eq!(t.millis, 1_710_936_000_000.0);
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn cli_flags_override_settings() {
        let settings = Settings::from_toml_str("[map]\nimage = \"a.png\"\nstride = 4\n").unwrap();
        let config = map_config(&settings, None, Some("b.png".to_string()), Some(99));
        assert_eq!(config.sources.primary.as_deref(), Some("b.png"));
        assert_eq!(config.stride, 16);

        let config = map_config(&settings, None, None, None);
        assert_eq!(config.sources.primary.as_deref(), Some("a.png"));
        assert_eq!(config.stride, 4);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
