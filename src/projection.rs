//! Equirectangular mapping between geographic and raster coordinates

use crate::solar::wrap_longitude;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: CanvasPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Rectangle the 2:1 map is drawn into, in raster pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl MapViewport {
    /// Largest centered 2:1 rectangle inside a `width`×`height` raster.
    /// Both sides are whole pixels.
    pub fn fit(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let draw_width = (w.min(h * 2.0) / 2.0).floor() * 2.0;
        let draw_height = draw_width / 2.0;
        Self {
            offset_x: ((w - draw_width) / 2.0).floor(),
            offset_y: ((h - draw_height) / 2.0).floor(),
            draw_width,
            draw_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.draw_width < 1.0 || self.draw_height < 1.0
    }

    pub fn contains(&self, p: CanvasPoint) -> bool {
        p.x >= self.offset_x
            && p.x < self.offset_x + self.draw_width
            && p.y >= self.offset_y
            && p.y < self.offset_y + self.draw_height
    }

    /// Pixels per degree of longitude (equal to pixels per degree of latitude)
    pub fn pixels_per_degree(&self) -> f64 {
        self.draw_width / 360.0
    }
}

pub fn to_canvas(p: GeoPoint, vp: &MapViewport) -> CanvasPoint {
    let lon = wrap_longitude(p.lon_deg);
    CanvasPoint {
        x: vp.offset_x + (lon + 180.0) / 360.0 * vp.draw_width,
        y: vp.offset_y + (90.0 - p.lat_deg) / 180.0 * vp.draw_height,
    }
}

pub fn to_geo(p: CanvasPoint, vp: &MapViewport) -> GeoPoint {
    let lon = (p.x - vp.offset_x) / vp.draw_width * 360.0 - 180.0;
    let lat = 90.0 - (p.y - vp.offset_y) / vp.draw_height * 180.0;
    GeoPoint {
        lat_deg: lat,
        // points past the right edge wrap onto the left
        lon_deg: if (-180.0..180.0).contains(&lon) {
            lon
        } else {
            wrap_longitude(lon)
        },
    }
}
