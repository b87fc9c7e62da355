//! RGB frame buffer and its half-block presentation on the terminal.
//!
//! One terminal cell shows two vertically stacked raster pixels: the top
//! pixel as the `▀` foreground and the bottom one as the cell background.

use crate::colors::Rgb;
use crate::terminal::Terminal;

#[derive(Clone, Debug)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: u32, height: u32, fill: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; (width as usize) * (height as usize)],
        }
    }

    /// Raster covering a `cols`×`rows` cell area
    pub fn for_cells(cols: u16, rows: u16, fill: Rgb) -> Self {
        Self::new(cols as u32, rows as u32 * 2, fill)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].blend(color, alpha);
        }
    }

    pub fn add(&mut self, x: i64, y: i64, color: Rgb, amount: f64) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].add(color, amount);
        }
    }

    /// Blend a clipped axis-aligned block
    pub fn blend_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgb, alpha: f64) {
        if alpha <= 0.0 {
            return;
        }
        for py in y.max(0)..(y + h).min(self.height as i64) {
            for px in x.max(0)..(x + w).min(self.width as i64) {
                self.blend(px, py, color, alpha);
            }
        }
    }

    pub fn add_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgb, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        for py in y.max(0)..(y + h).min(self.height as i64) {
            for px in x.max(0)..(x + w).min(self.width as i64) {
                self.add(px, py, color, amount);
            }
        }
    }

    /// Bresenham line, blended at `alpha`
    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb, alpha: f64) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.blend(x, y, color, alpha);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Additive radial gradient: full `amount` at the center fading to zero
    /// at `radius`.
    pub fn radial_glow(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, amount: f64) {
        if radius <= 0.0 {
            return;
        }
        let r = radius.ceil() as i64;
        let (ix, iy) = (cx.floor() as i64, cy.floor() as i64);
        for py in iy - r..=iy + r {
            for px in ix - r..=ix + r {
                let d = (px as f64 + 0.5 - cx).hypot(py as f64 + 0.5 - cy);
                if d < radius {
                    let falloff = 1.0 - d / radius;
                    self.add(px, py, color, amount * falloff * falloff);
                }
            }
        }
    }

    /// Filled disc blended at `alpha`
    pub fn disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, alpha: f64) {
        let r = radius.ceil() as i64;
        let (ix, iy) = (cx.floor() as i64, cy.floor() as i64);
        for py in iy - r..=iy + r {
            for px in ix - r..=ix + r {
                let d = (px as f64 + 0.5 - cx).hypot(py as f64 + 0.5 - cy);
                if d <= radius {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Draw the raster onto the terminal starting at cell (`x0`, `y0`)
    pub fn blit_halfblock(&self, term: &mut Terminal, x0: i32, y0: i32) {
        for cy in 0..self.height.div_ceil(2) as i64 {
            for cx in 0..self.width as i64 {
                let Some(top) = self.get(cx, cy * 2) else { continue };
                let bottom = self.get(cx, cy * 2 + 1).unwrap_or(top);
                term.set_with_bg(
                    x0 + cx as i32,
                    y0 + cy as i32,
                    '▀',
                    Some(top.to_color()),
                    Some(bottom.to_color()),
                    false,
                );
            }
        }
    }
}
