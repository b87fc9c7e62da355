//! Interactive map view: input, frame loop, status line and tooltip.

use crate::basemap::{load_with_fallback, BasemapLoader, MapOrigin};
use crate::cities::{clear_caches, load_cities, tooltip_lines, City};
use crate::clock::{speed_label, wall_clock_ms, FrameTimer, Instant, SimClock, SPEED_PRESETS};
use crate::colors::{palette, text};
use crate::config::{MapConfig, PrintConfig};
use crate::help::{render_help_overlay, render_tooltip, HELP_TEXT};
use crate::hit_test;
use crate::illumination::{elevation, Shading};
use crate::raster::Raster;
use crate::render::{FrameContext, FrameReport, Renderer};
use crate::solar::solve;
use crate::terminal::{MouseCaptureGuard, Terminal};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};
use crossterm::terminal::size;
use std::io;
use tracing::{debug, info};

/// What a key press asks of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// View state the keys act on
pub struct Controls {
    pub clock: SimClock,
    pub renderer: Renderer,
    pub show_help: bool,
}

impl Controls {
    pub fn new(config: &MapConfig) -> Self {
        let mut clock = match config.start {
            Some(start) => SimClock::starting_at(start),
            None => SimClock::new(),
        };
        clock.set_speed(config.speed);
        let mut renderer = Renderer::new(config.shade, config.stride);
        renderer.set_grid(config.show_grid);
        Self { clock, renderer, show_help: false }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Char(c @ '1'..='5') => {
                let preset = SPEED_PRESETS[(c as u8 - b'1') as usize];
                self.clock.set_speed(preset);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => self.clock.reverse(),
            KeyCode::Char('0') => self.clock.set_speed(0.0),
            KeyCode::Char('r') => self.clock.reset(),
            KeyCode::Char('g') => self.renderer.toggle_grid(),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        KeyAction::Continue
    }
}

/// "2024-03-20 12:00:00 UTC | 3600x | δ -0.12° | sun 0.12°S 1.85°E"
pub fn status_line(report: &FrameReport, speed: f64) -> String {
    let when = report
        .instant
        .to_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "out of range".to_string());
    format!(
        "{} UTC | {} | δ {:+.2}° | sun {} {}",
        when,
        speed_label(speed),
        report.solar.declination_rad.to_degrees(),
        report.solar.lat_label(),
        report.solar.lon_label(),
    )
}

fn map_rows(height: u16) -> u16 {
    height.saturating_sub(1)
}

fn draw_status(term: &mut Terminal, report: &FrameReport, speed: f64, origin: Option<MapOrigin>) {
    let (width, height) = term.size();
    let y = height as i32 - 1;
    let bg = text::OVERLAY_BG;
    term.set_str_bg(0, y, &" ".repeat(width as usize), None, bg, false);

    let line = status_line(report, speed);
    term.set_str_bg(1, y, &line, Some(text::STATUS), bg, false);

    let hint = match origin {
        Some(MapOrigin::Placeholder) => "placeholder map | ? help",
        _ => "? help",
    };
    let x = width as i32 - hint.chars().count() as i32 - 1;
    if x > line.chars().count() as i32 + 2 {
        term.set_str_bg(x, y, hint, Some(text::STATUS_ACCENT), bg, false);
    }
}

fn draw_loading(term: &mut Terminal) {
    let (width, height) = term.size();
    let msg = "loading base map...";
    let x = (width as i32 - msg.chars().count() as i32) / 2;
    term.set_str(x.max(0), height as i32 / 2, msg, Some(text::STATUS), false);
}

fn draw_tooltip(term: &mut Terminal, cities: &[City], pointer: (u16, u16), report: &FrameReport, radius: f64) {
    let (column, row) = pointer;
    if row >= map_rows(term.size().1) {
        return;
    }
    let point = hit_test::cell_to_canvas(column, row);
    if !report.viewport.contains(point) {
        return;
    }
    if let Some(city) = hit_test::find(cities, point, radius) {
        let lines = tooltip_lines(city, report.instant);
        let accent = city.cache.map(|c| if c.is_daytime { text::DAY } else { text::NIGHT });
        render_tooltip(term, column, row, &lines, accent);
    }
}

pub fn run(config: MapConfig) -> io::Result<()> {
    let mut term = Terminal::new(true)?;
    let _mouse = MouseCaptureGuard::enable()?;

    let mut controls = Controls::new(&config);
    let mut cities = load_cities(config.timezones.as_deref());
    let mut loader = BasemapLoader::spawn(config.sources.clone());
    let (mut width, mut height) = term.size();
    let mut raster = Raster::for_cells(width, map_rows(height), palette::BACKGROUND);
    let mut pointer: Option<(u16, u16)> = None;
    let timer = FrameTimer::start();

    info!(cities = cities.len(), speed = config.speed, "map view started");

    loop {
        let (w, h) = size()?;
        if w != width || h != height {
            width = w;
            height = h;
            term.resize(w, h);
            term.clear_screen()?;
            raster = Raster::for_cells(w, map_rows(h), palette::BACKGROUND);
            clear_caches(&mut cities);
            debug!(width = w, height = h, "resized");
        }

        while let Some(event) = term.poll_event()? {
            match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if controls.handle_key(key.code) == KeyAction::Quit {
                        info!("map view closed");
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        pointer = Some((mouse.column, mouse.row));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        term.clear();
        let basemap = loader.poll();
        let origin = basemap.as_ref().map(|b| b.origin());
        let ctx = FrameContext {
            clock: &mut controls.clock,
            cities: &mut cities,
            basemap,
            wall_ms: timer.now_ms(),
        };

        match controls.renderer.render_frame(ctx, &mut raster) {
            Some(report) => {
                raster.blit_halfblock(&mut term, 0, 0);
                draw_status(&mut term, &report, controls.clock.speed(), origin);
                if let Some(p) = pointer {
                    draw_tooltip(&mut term, &cities, p, &report, config.hit_radius);
                }
            }
            None => draw_loading(&mut term),
        }

        if controls.show_help {
            render_help_overlay(&mut term, width, height, HELP_TEXT);
        }

        term.present()?;
        term.sleep(config.time_step);
    }
}

/// Render a single frame and print it with ANSI colors
pub fn run_print(config: PrintConfig) -> io::Result<()> {
    let PrintConfig { map, width, height } = config;
    let mut controls = Controls::new(&map);
    let mut cities = load_cities(map.timezones.as_deref());
    let mut basemap = load_with_fallback(&map.sources);
    let origin = basemap.origin();

    let mut term = Terminal::offscreen(width, height);
    let mut raster = Raster::for_cells(width, map_rows(height), palette::BACKGROUND);
    let ctx = FrameContext {
        clock: &mut controls.clock,
        cities: &mut cities,
        basemap: Some(&mut basemap),
        wall_ms: wall_clock_ms(),
    };
    if let Some(report) = controls.renderer.render_frame(ctx, &mut raster) {
        raster.blit_halfblock(&mut term, 0, 0);
        draw_status(&mut term, &report, controls.clock.speed(), Some(origin));
    }
    term.print_to_stdout()
}

/// Plain-text sun position and per-city table at `instant`
pub fn solar_report(instant: Instant, cities: &[City], shading: &Shading) -> String {
    let solar = solve(instant);
    let when = instant
        .to_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "out of range".to_string());

    let mut out = String::new();
    out.push_str(&format!("{when} UTC\n"));
    out.push_str(&format!("declination     {:+.2}°\n", solar.declination_rad.to_degrees()));
    out.push_str(&format!("sub-solar point {} {}\n", solar.lat_label(), solar.lon_label()));
    out.push_str(&format!("equation of time {:+.1} min\n\n", solar.equation_of_time_min));
    out.push_str(&format!("{:<14} {:<10} {:<9} {:<9} {:>7}\n", "city", "local", "offset", "phase", "sun"));

    for city in cities {
        let elev = elevation(city.location, &solar);
        let (time, offset) = city
            .local_time(instant)
            .map(|l| (l.time, l.offset))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<14} {:<10} {:<9} {:<9} {:>+6.1}°\n",
            city.name,
            time,
            offset,
            shading.classify(elev).label(),
            elev
        ));
    }
    out
}
