//! Base map image: asynchronous loading with a two-tier fallback.
//!
//! Loading runs on a worker thread and reports back once through a channel;
//! the render loop polls it and skips frames until the map arrives. The
//! chain is primary source, then fallback source, then a procedurally drawn
//! placeholder, so a map always shows up eventually.

use crate::colors::{palette, Rgb};
use crate::config::MapSources;
use image::{imageops::FilterType, DynamicImage, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Read;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Downloads larger than this are rejected (16MB)
const MAX_MAP_BYTES: u64 = 16 * 1024 * 1024;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PLACEHOLDER_WIDTH: u32 = 720;
const PLACEHOLDER_HEIGHT: u32 = 360;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching {url}: {reason}")]
    Http { url: String, reason: String },
    #[error("{url} exceeds the map download limit")]
    TooLarge { url: String },
    #[error("decoding map image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("invalid file URL {0}")]
    BadFileUrl(String),
}

/// Which tier of the fallback chain produced the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOrigin {
    Primary,
    Fallback,
    Placeholder,
}

/// A decoded equirectangular map plus a copy scaled to the current viewport
pub struct Basemap {
    image: RgbImage,
    origin: MapOrigin,
    scaled: Option<RgbImage>,
}

impl Basemap {
    pub fn new(image: RgbImage, origin: MapOrigin) -> Self {
        Self { image, origin, scaled: None }
    }

    pub fn origin(&self) -> MapOrigin {
        self.origin
    }

    /// The map resized to `width`×`height`, recomputed only when the size changes
    pub fn scaled(&mut self, width: u32, height: u32) -> &RgbImage {
        let width = width.max(1);
        let height = height.max(1);
        let stale = self
            .scaled
            .as_ref()
            .map_or(true, |s| s.width() != width || s.height() != height);
        if stale {
            let resized = image::imageops::resize(&self.image, width, height, FilterType::Triangle);
            self.scaled = Some(resized);
        }
        self.scaled.get_or_insert_with(|| RgbImage::new(width, height))
    }
}

/// Read a map from a local path, a `file://` URL or an http(s) URL
pub fn load_source(source: &str) -> Result<DynamicImage, MapError> {
    if let Some(rest) = source.strip_prefix("file://") {
        let path = urlencoding::decode(rest).map_err(|_| MapError::BadFileUrl(source.to_string()))?;
        return load_path(Path::new(path.as_ref()));
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return load_url(source);
    }
    load_path(Path::new(source))
}

fn load_path(path: &Path) -> Result<DynamicImage, MapError> {
    let bytes = std::fs::read(path).map_err(|source| MapError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image::load_from_memory(&bytes)?)
}

fn load_url(url: &str) -> Result<DynamicImage, MapError> {
    let response = ureq::get(url)
        .timeout(HTTP_TIMEOUT)
        .call()
        .map_err(|e| MapError::Http { url: url.to_string(), reason: e.to_string() })?;

    if let Some(len) = response
        .header("Content-Length")
        .and_then(|s| s.parse::<u64>().ok())
    {
        if len > MAX_MAP_BYTES {
            return Err(MapError::TooLarge { url: url.to_string() });
        }
    }

    let bytes = read_capped(response.into_reader(), MAX_MAP_BYTES)
        .map_err(|e| MapError::Http { url: url.to_string(), reason: e.to_string() })?
        .ok_or_else(|| MapError::TooLarge { url: url.to_string() })?;

    Ok(image::load_from_memory(&bytes)?)
}

/// Read at most `limit` bytes; `None` when the body is longer
fn read_capped(reader: impl Read, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes)?;
    Ok((bytes.len() as u64 <= limit).then_some(bytes))
}

/// Walk the fallback chain. Never fails.
pub fn load_with_fallback(sources: &MapSources) -> Basemap {
    let tiers = [
        (sources.primary.as_deref(), MapOrigin::Primary),
        (sources.fallback.as_deref(), MapOrigin::Fallback),
    ];
    for (source, origin) in tiers {
        let Some(source) = source else { continue };
        match load_source(source) {
            Ok(img) => {
                info!(source, ?origin, width = img.width(), height = img.height(), "base map loaded");
                return Basemap::new(img.to_rgb8(), origin);
            }
            Err(err) => warn!(source, ?origin, error = %err, "base map load failed"),
        }
    }
    info!("using generated placeholder map");
    Basemap::new(placeholder(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT), MapOrigin::Placeholder)
}

/// One-shot background load observed by the render loop
pub struct BasemapLoader {
    receiver: Option<Receiver<Basemap>>,
    basemap: Option<Basemap>,
}

impl BasemapLoader {
    pub fn spawn(sources: MapSources) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(load_with_fallback(&sources));
        });
        Self { receiver: Some(rx), basemap: None }
    }

    /// The map once loading has finished (non-blocking)
    pub fn poll(&mut self) -> Option<&mut Basemap> {
        if self.basemap.is_none() {
            match self.receiver.as_ref().map(|rx| rx.try_recv()) {
                Some(Ok(map)) => {
                    self.basemap = Some(map);
                    self.receiver = None;
                }
                Some(Err(TryRecvError::Disconnected)) => {
                    warn!("base map loader exited without a map");
                    self.basemap = Some(Basemap::new(
                        placeholder(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT),
                        MapOrigin::Placeholder,
                    ));
                    self.receiver = None;
                }
                Some(Err(TryRecvError::Empty)) | None => {}
            }
        }
        self.basemap.as_mut()
    }
}

// Coarse coastlines as (lon, lat) rings
const LANDMASSES: &[&[(f64, f64)]] = &[
    // North America
    &[
        (-168.0, 66.0), (-156.0, 71.0), (-128.0, 70.0), (-95.0, 72.0), (-82.0, 69.0),
        (-64.0, 60.0), (-56.0, 52.0), (-66.0, 45.0), (-76.0, 38.0), (-81.0, 31.0),
        (-80.0, 25.0), (-84.0, 30.0), (-97.0, 28.0), (-96.0, 19.0), (-87.0, 21.0),
        (-83.0, 9.0), (-77.0, 8.0), (-92.0, 15.0), (-105.0, 20.0), (-112.0, 30.0),
        (-117.0, 33.0), (-124.0, 40.0), (-124.0, 48.0), (-133.0, 56.0), (-150.0, 61.0),
        (-164.0, 55.0), (-157.0, 59.0), (-166.0, 62.0),
    ],
    // South America
    &[
        (-77.0, 8.0), (-62.0, 10.0), (-51.0, 4.0), (-35.0, -7.0), (-41.0, -22.0),
        (-48.0, -26.0), (-58.0, -35.0), (-65.0, -41.0), (-68.0, -52.0), (-74.0, -51.0),
        (-73.0, -41.0), (-71.0, -18.0), (-81.0, -5.0), (-78.0, 2.0),
    ],
    // Europe
    &[
        (-9.0, 43.0), (-9.0, 37.0), (-6.0, 36.0), (0.0, 39.0), (3.0, 43.0), (9.0, 44.0),
        (12.0, 42.0), (16.0, 38.0), (18.0, 40.0), (13.0, 45.0), (20.0, 40.0), (26.0, 40.0),
        (29.0, 41.0), (28.0, 46.0), (37.0, 47.0), (40.0, 47.0), (60.0, 55.0), (60.0, 68.0),
        (40.0, 67.0), (33.0, 69.0), (25.0, 71.0), (15.0, 69.0), (5.0, 62.0), (6.0, 58.0),
        (11.0, 59.0), (13.0, 55.0), (8.0, 54.0), (5.0, 53.0), (-2.0, 48.0), (-4.0, 48.0),
        (-1.0, 44.0),
    ],
    // Africa
    &[
        (-17.0, 15.0), (-17.0, 21.0), (-10.0, 30.0), (-6.0, 36.0), (10.0, 37.0), (11.0, 33.0),
        (20.0, 31.0), (32.0, 31.0), (35.0, 28.0), (43.0, 12.0), (51.0, 11.0), (40.0, -3.0),
        (40.0, -15.0), (35.0, -24.0), (28.0, -33.0), (19.0, -35.0), (12.0, -17.0),
        (13.0, -11.0), (9.0, 4.0), (4.0, 6.0), (-8.0, 4.0),
    ],
    // Asia
    &[
        (26.0, 40.0), (36.0, 36.0), (35.0, 32.0), (43.0, 12.0), (52.0, 17.0), (57.0, 25.0),
        (67.0, 24.0), (73.0, 21.0), (77.0, 8.0), (80.0, 16.0), (92.0, 22.0), (98.0, 16.0),
        (100.0, 13.0), (104.0, 1.0), (105.0, 9.0), (109.0, 12.0), (106.0, 20.0), (110.0, 21.0),
        (122.0, 30.0), (121.0, 37.0), (118.0, 39.0), (122.0, 41.0), (129.0, 35.0),
        (130.0, 42.0), (141.0, 52.0), (135.0, 55.0), (156.0, 59.0), (163.0, 63.0),
        (179.0, 65.0), (179.0, 69.0), (160.0, 70.0), (131.0, 71.0), (107.0, 77.0),
        (75.0, 73.0), (70.0, 67.0), (60.0, 68.0), (60.0, 55.0), (40.0, 47.0), (29.0, 41.0),
    ],
    // Australia
    &[
        (114.0, -22.0), (122.0, -18.0), (130.0, -11.0), (137.0, -12.0), (136.0, -15.0),
        (141.0, -17.0), (142.0, -11.0), (146.0, -19.0), (153.0, -26.0), (150.0, -37.0),
        (141.0, -38.0), (138.0, -35.0), (131.0, -31.0), (115.0, -34.0),
    ],
    // Greenland
    &[
        (-73.0, 78.0), (-60.0, 82.0), (-27.0, 83.0), (-12.0, 81.0), (-20.0, 74.0),
        (-22.0, 70.0), (-40.0, 65.0), (-43.0, 60.0), (-52.0, 64.0), (-54.0, 67.0),
        (-55.0, 70.0), (-58.0, 75.0),
    ],
    // Japan
    &[
        (130.0, 31.0), (131.0, 34.0), (136.0, 34.0), (140.0, 36.0), (141.0, 38.0),
        (141.0, 41.0), (140.0, 41.0), (139.0, 38.0), (135.0, 35.0), (130.0, 33.0),
    ],
    // Great Britain
    &[
        (-5.0, 50.0), (1.0, 51.0), (0.0, 53.0), (-2.0, 56.0), (-3.0, 58.0), (-6.0, 57.0),
        (-5.0, 55.0), (-3.0, 54.0),
    ],
];

/// Even-odd ray cast against an implicitly closed ring
fn point_in_ring(lon: f64, lat: f64, ring: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn is_land(lon: f64, lat: f64) -> bool {
    lat < -70.0 || LANDMASSES.iter().any(|ring| point_in_ring(lon, lat, ring))
}

/// Procedural equirectangular map used when no image could be loaded
pub fn placeholder(width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    RgbImage::from_fn(width, height, |x, y| {
        let lon = (x as f64 + 0.5) / width as f64 * 360.0 - 180.0;
        let lat = 90.0 - (y as f64 + 0.5) / height as f64 * 180.0;
        let speckle: f64 = rng.gen_range(-0.08..0.08);
        let polar = ((lat.abs() - 60.0) / 30.0).clamp(0.0, 1.0);

        let base = if is_land(lon, lat) {
            palette::LAND_LOW.blend(palette::LAND_HIGH, 0.35 + speckle * 3.0)
        } else {
            palette::OCEAN_SHALLOW.blend(palette::OCEAN_DEEP, 0.5 + lat.abs() / 180.0 + speckle)
        };
        let Rgb { r, g, b } = if lat.abs() > 78.0 {
            base.blend(palette::ICE, 0.5 + polar * 0.5)
        } else {
            base.blend(palette::ICE, polar * polar * 0.4)
        };
        image::Rgb([r, g, b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn land_and_sea_samples() {
        assert!(is_land(20.0, 0.0)); // central Africa
        assert!(is_land(-100.0, 45.0)); // North American plains
        assert!(is_land(134.0, -25.0)); // central Australia
        assert!(is_land(0.0, -80.0)); // Antarctica
        assert!(!is_land(-30.0, 0.0)); // mid Atlantic
        assert!(!is_land(-150.0, -20.0)); // south Pacific
    }

    #[test]
    fn placeholder_is_deterministic() {
        let a = placeholder(72, 36);
        let b = placeholder(72, 36);
        assert_eq!(a.dimensions(), (72, 36));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_sources_fall_through_to_placeholder() {
        let sources = MapSources {
            primary: Some("/definitely/not/here.png".to_string()),
            fallback: Some("file:///also/not%20here.jpg".to_string()),
        };
        let map = load_with_fallback(&sources);
        assert_eq!(map.origin(), MapOrigin::Placeholder);
    }

    #[test]
    fn local_file_loads_as_primary() {
        let path = std::env::temp_dir().join(format!("sunmap-test-{}.png", std::process::id()));
        placeholder(40, 20).save(&path).unwrap();
        let sources = MapSources {
            primary: Some(path.display().to_string()),
            fallback: None,
        };
        let mut map = load_with_fallback(&sources);
        let _ = std::fs::remove_file(&path);
        assert_eq!(map.origin(), MapOrigin::Primary);
        assert_eq!(map.scaled(20, 10).dimensions(), (20, 10));
    }

    #[test]
    fn bad_file_reports_io_error() {
        let err = load_source("/nope/map.png").unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
        assert!(err.to_string().contains("/nope/map.png"));
    }

    /// Answer one HTTP request with `response` on a loopback port
    fn serve_once(response: Vec<u8>) -> String {
        use std::io::Write;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        });
        format!("http://{addr}/map.png")
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(placeholder(16, 8))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn ok_response(body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    #[test]
    fn http_map_loads_as_primary() {
        let url = serve_once(ok_response(&png_bytes()));
        let sources = MapSources { primary: Some(url), fallback: None };
        let map = load_with_fallback(&sources);
        assert_eq!(map.origin(), MapOrigin::Primary);
    }

    #[test]
    fn oversized_content_length_is_rejected() {
        let header = b"HTTP/1.1 200 OK\r\nContent-Length: 99999999\r\nConnection: close\r\n\r\n".to_vec();
        let url = serve_once(header);
        let err = load_source(&url).unwrap_err();
        assert!(matches!(err, MapError::TooLarge { .. }), "{err}");
    }

    #[test]
    fn body_past_cap_is_rejected() {
        let body = [7u8; 11];
        assert_eq!(read_capped(&body[..], 11).unwrap().map(|b| b.len()), Some(11));
        assert!(read_capped(&body[..], 10).unwrap().is_none());
    }

    #[test]
    fn http_error_falls_through_to_fallback() {
        let missing = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        );
        assert!(matches!(load_source(&missing), Err(MapError::Http { .. })));

        let primary = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        );
        let fallback = serve_once(ok_response(&png_bytes()));
        let map = load_with_fallback(&MapSources { primary: Some(primary), fallback: Some(fallback) });
        assert_eq!(map.origin(), MapOrigin::Fallback);
    }

    #[test]
    fn loader_delivers_once_loaded() {
        let mut loader = BasemapLoader::spawn(MapSources::none());
        let mut map = None;
        for _ in 0..500 {
            if let Some(m) = loader.poll() {
                map = Some(m.origin());
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(map, Some(MapOrigin::Placeholder));
    }
}
