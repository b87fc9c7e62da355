//! Per-frame composition of the day/night map.
//!
//! Order matters: base map, night overlay, terminator glow, grid, sun,
//! city markers. Each layer blends onto what is already in the raster.

use crate::basemap::Basemap;
use crate::cities::{City, RenderCache};
use crate::clock::{Instant, SimClock};
use crate::colors::{palette, Rgb};
use crate::config::ShadeConfig;
use crate::illumination::{elevation, Phase, Shading};
use crate::projection::{to_canvas, to_geo, CanvasPoint, GeoPoint, MapViewport};
use crate::raster::Raster;
use crate::solar::{solve, SolarState};
use std::f64::consts::TAU;

const GRID_SPACING_DEG: i32 = 30;
const GRID_ALPHA: f64 = 0.18;
const EQUATOR_ALPHA: f64 = 0.45;
const GLOW_STRENGTH: f64 = 0.35;
const SUN_RAYS: usize = 8;
const SUN_RAY_SPEED: f64 = 0.6; // radians per wall-clock second
const MARKER_PULSE_HZ: f64 = 0.8;

/// Everything a frame reads or writes, passed in explicitly
pub struct FrameContext<'a> {
    pub clock: &'a mut SimClock,
    pub cities: &'a mut [City],
    pub basemap: Option<&'a mut Basemap>,
    /// Real time of this frame. Drives the clock delta and the cosmetic
    /// animations, never the solar geometry.
    pub wall_ms: f64,
}

/// What a drawn frame showed
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub instant: Instant,
    pub solar: SolarState,
    pub viewport: MapViewport,
}

pub struct Renderer {
    shading: Shading,
    stride: u32,
    show_grid: bool,
    // elevation per sweep block, reused across frames
    samples: Vec<f64>,
}

impl Renderer {
    pub fn new(shade: ShadeConfig, stride: u32) -> Self {
        Self {
            shading: Shading::new(shade),
            stride: stride.max(1),
            show_grid: true,
            samples: Vec::new(),
        }
    }

    pub fn set_grid(&mut self, visible: bool) {
        self.show_grid = visible;
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    /// Draw one frame. Returns `None`, touching nothing but the clock's frame
    /// timestamp, while the base map is still loading.
    pub fn render_frame(&mut self, ctx: FrameContext<'_>, raster: &mut Raster) -> Option<FrameReport> {
        let FrameContext { clock, cities, basemap, wall_ms } = ctx;
        let Some(basemap) = basemap else {
            clock.mark_frame(wall_ms);
            return None;
        };

        let instant = clock.tick(wall_ms);
        let solar = solve(instant);
        let viewport = MapViewport::fit(raster.width(), raster.height());
        let report = FrameReport { instant, solar, viewport };

        raster.fill(palette::BACKGROUND);
        if viewport.is_empty() {
            return Some(report);
        }

        draw_basemap(basemap, &viewport, raster);
        self.sample_elevations(&solar, &viewport);
        self.shade_night(&viewport, raster);
        self.terminator_glow(&viewport, raster);
        if self.show_grid {
            draw_grid(&viewport, raster);
        }
        draw_sun(&solar, &viewport, raster, wall_ms);
        self.draw_cities(cities, &solar, &viewport, raster, wall_ms);

        Some(report)
    }

    fn block_grid(&self, vp: &MapViewport) -> (usize, usize) {
        let s = self.stride as f64;
        (
            (vp.draw_width / s).ceil() as usize,
            (vp.draw_height / s).ceil() as usize,
        )
    }

    /// Block origin and clipped size in raster pixels
    fn block_rect(&self, vp: &MapViewport, col: usize, row: usize) -> (i64, i64, i64, i64) {
        let s = self.stride as i64;
        let x0 = vp.offset_x as i64 + col as i64 * s;
        let y0 = vp.offset_y as i64 + row as i64 * s;
        let right = (vp.offset_x + vp.draw_width) as i64;
        let bottom = (vp.offset_y + vp.draw_height) as i64;
        (x0, y0, s.min(right - x0), s.min(bottom - y0))
    }

    fn sample_elevations(&mut self, solar: &SolarState, vp: &MapViewport) {
        let (cols, rows) = self.block_grid(vp);
        self.samples.clear();
        self.samples.reserve(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let (x, y, w, h) = self.block_rect(vp, col, row);
                let center = CanvasPoint::new(x as f64 + w as f64 / 2.0, y as f64 + h as f64 / 2.0);
                self.samples.push(elevation(to_geo(center, vp), solar));
            }
        }
    }

    fn shade_night(&self, vp: &MapViewport, raster: &mut Raster) {
        let (cols, _) = self.block_grid(vp);
        for (i, &elev) in self.samples.iter().enumerate() {
            let opacity = self.shading.night_opacity(elev);
            let (x, y, w, h) = self.block_rect(vp, i % cols, i / cols);
            raster.blend_rect(x, y, w, h, palette::NIGHT, opacity);
        }
    }

    fn terminator_glow(&self, vp: &MapViewport, raster: &mut Raster) {
        let (cols, _) = self.block_grid(vp);
        for (i, &elev) in self.samples.iter().enumerate() {
            let glow = self.shading.glow_intensity(elev);
            let (x, y, w, h) = self.block_rect(vp, i % cols, i / cols);
            raster.add_rect(x, y, w, h, palette::TERMINATOR_GLOW, glow * GLOW_STRENGTH);
        }
    }

    fn draw_cities(
        &self,
        cities: &mut [City],
        solar: &SolarState,
        vp: &MapViewport,
        raster: &mut Raster,
        wall_ms: f64,
    ) {
        let t = wall_ms / 1000.0;
        for (i, city) in cities.iter_mut().enumerate() {
            let point = to_canvas(city.location, vp);
            let elevation_deg = elevation(city.location, solar);
            let is_daytime = self.shading.classify(elevation_deg) == Phase::Day;
            let color = if is_daytime { palette::CITY_DAY } else { palette::CITY_NIGHT };

            let pulse = 0.5 + 0.5 * (t * TAU * MARKER_PULSE_HZ + i as f64 * 0.7).sin();
            // dark ring over bright ground
            let under = raster.get(point.x as i64, point.y as i64).unwrap_or_default();
            let ring = if under.luminance() > 150.0 { palette::BACKGROUND } else { palette::CITY_RING };
            raster.disc(point.x, point.y, 1.2 + pulse * 1.3, ring, 0.15 + 0.2 * pulse);
            raster.disc(point.x, point.y, 0.8, color, 1.0);
            raster.set(point.x.floor() as i64, point.y.floor() as i64, color);

            city.cache = Some(RenderCache { screen_point: point, is_daytime, elevation_deg });
        }
    }
}

fn draw_basemap(basemap: &mut Basemap, vp: &MapViewport, raster: &mut Raster) {
    let (w, h) = (vp.draw_width as u32, vp.draw_height as u32);
    let scaled = basemap.scaled(w, h);
    let (ox, oy) = (vp.offset_x as i64, vp.offset_y as i64);
    for (x, y, px) in scaled.enumerate_pixels() {
        raster.set(ox + x as i64, oy + y as i64, Rgb::from(*px));
    }
}

fn draw_grid(vp: &MapViewport, raster: &mut Raster) {
    let top = vp.offset_y as i64;
    let bottom = (vp.offset_y + vp.draw_height) as i64 - 1;
    let left = vp.offset_x as i64;
    let right = (vp.offset_x + vp.draw_width) as i64 - 1;

    for lon in (-180 + GRID_SPACING_DEG..180).step_by(GRID_SPACING_DEG as usize) {
        let x = to_canvas(GeoPoint::new(0.0, lon as f64), vp).x.floor() as i64;
        raster.line(x, top, x, bottom, palette::GRID, GRID_ALPHA);
    }
    for lat in (-90 + GRID_SPACING_DEG..90).step_by(GRID_SPACING_DEG as usize) {
        let y = to_canvas(GeoPoint::new(lat as f64, 0.0), vp).y.floor() as i64;
        if lat == 0 {
            raster.line(left, y, right, y, palette::EQUATOR, EQUATOR_ALPHA);
        } else {
            raster.line(left, y, right, y, palette::GRID, GRID_ALPHA);
        }
    }
}

/// Sub-solar glow with slowly rotating rays. Ray phase follows the wall
/// clock so the animation keeps its pace at any simulation speed.
fn draw_sun(solar: &SolarState, vp: &MapViewport, raster: &mut Raster, wall_ms: f64) {
    let center = to_canvas(GeoPoint::new(solar.sub_solar_lat_deg, solar.sub_solar_lon_deg), vp);
    let ppd = vp.pixels_per_degree();
    let halo = (ppd * 14.0).max(4.0);
    let core = (ppd * 2.5).max(1.0);

    raster.radial_glow(center.x, center.y, halo, palette::SUN_HALO, 0.9);

    let t = wall_ms / 1000.0;
    let phase = t * SUN_RAY_SPEED;
    for i in 0..SUN_RAYS {
        let angle = phase + i as f64 * TAU / SUN_RAYS as f64;
        let reach = halo * (0.75 + 0.25 * (t * 2.0 + i as f64).sin());
        let (dx, dy) = (angle.cos(), angle.sin());
        raster.line(
            (center.x + dx * core * 1.6).round() as i64,
            (center.y + dy * core * 1.6).round() as i64,
            (center.x + dx * reach).round() as i64,
            (center.y + dy * reach).round() as i64,
            palette::SUN_HALO,
            0.45,
        );
    }

    raster.disc(center.x, center.y, core, palette::SUN_CORE, 1.0);
}
