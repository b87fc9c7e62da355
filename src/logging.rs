use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go
pub enum LogTarget {
    /// Headless commands
    Stderr,
    /// Interactive view, which owns the screen
    File(PathBuf),
    Off,
}

impl LogTarget {
    /// Interactive mode logs only when a file is configured
    pub fn interactive(file: Option<PathBuf>) -> Self {
        file.map_or(LogTarget::Off, LogTarget::File)
    }
}

/// `RUST_LOG` wins, then the configured filter, then `info`
fn filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(target: LogTarget, configured_filter: Option<&str>) -> io::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(configured_filter));
    // try_init fails only if a subscriber is already set (tests)
    match target {
        LogTarget::Off => {}
        LogTarget::Stderr => {
            let _ = builder.with_writer(io::stderr).try_init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
    }
    Ok(())
}
