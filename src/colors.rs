use crossterm::style::Color;

/// Linear 8-bit RGB color used by the raster
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Source-over blend of `src` onto `self` with `alpha` in [0, 1]
    pub fn blend(self, src: Rgb, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |d: u8, s: u8| (d as f64 + (s as f64 - d as f64) * a).round() as u8;
        Rgb::new(mix(self.r, src.r), mix(self.g, src.g), mix(self.b, src.b))
    }

    /// Additive blend, saturating at white
    pub fn add(self, src: Rgb, amount: f64) -> Rgb {
        let k = amount.max(0.0);
        let sum = |d: u8, s: u8| (d as f64 + s as f64 * k).min(255.0).round() as u8;
        Rgb::new(sum(self.r, src.r), sum(self.g, src.g), sum(self.b, src.b))
    }

    pub fn luminance(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    pub fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(px: image::Rgb<u8>) -> Self {
        Rgb::new(px.0[0], px.0[1], px.0[2])
    }
}

/// Map palette
pub mod palette {
    use super::Rgb;

    pub const BACKGROUND: Rgb = Rgb::new(4, 6, 14);
    pub const NIGHT: Rgb = Rgb::new(2, 4, 22);
    pub const TERMINATOR_GLOW: Rgb = Rgb::new(120, 70, 30);
    pub const GRID: Rgb = Rgb::new(150, 170, 200);
    pub const EQUATOR: Rgb = Rgb::new(240, 200, 90);
    pub const SUN_CORE: Rgb = Rgb::new(255, 244, 200);
    pub const SUN_HALO: Rgb = Rgb::new(255, 190, 60);
    pub const CITY_DAY: Rgb = Rgb::new(255, 214, 64);
    pub const CITY_NIGHT: Rgb = Rgb::new(110, 170, 255);
    pub const CITY_RING: Rgb = Rgb::new(255, 255, 255);

    // Placeholder map
    pub const OCEAN_DEEP: Rgb = Rgb::new(12, 34, 78);
    pub const OCEAN_SHALLOW: Rgb = Rgb::new(26, 70, 122);
    pub const LAND_LOW: Rgb = Rgb::new(46, 110, 52);
    pub const LAND_HIGH: Rgb = Rgb::new(140, 128, 80);
    pub const ICE: Rgb = Rgb::new(222, 232, 240);
}

/// Terminal colors for text overlays
pub mod text {
    use crossterm::style::Color;

    pub const STATUS: Color = Color::Grey;
    pub const STATUS_ACCENT: Color = Color::Yellow;
    pub const TOOLTIP_BORDER: Color = Color::White;
    pub const TOOLTIP_TEXT: Color = Color::Grey;
    pub const DAY: Color = Color::Yellow;
    pub const NIGHT: Color = Color::Cyan;
    pub const OVERLAY_BG: Color = Color::Rgb { r: 16, g: 18, b: 28 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        let dst = Rgb::new(200, 100, 0);
        let src = Rgb::new(0, 0, 100);
        assert_eq!(dst.blend(src, 0.0), dst);
        assert_eq!(dst.blend(src, 1.0), src);
        assert_eq!(dst.blend(src, 0.5), Rgb::new(100, 50, 50));
        assert_eq!(dst.blend(src, 7.0), src);
    }

    #[test]
    fn additive_saturates() {
        let dst = Rgb::new(200, 10, 0);
        assert_eq!(dst.add(Rgb::new(100, 20, 4), 1.0), Rgb::new(255, 30, 4));
        assert_eq!(dst.add(Rgb::new(100, 20, 4), 0.0), dst);
    }

    #[test]
    fn luminance_of_white_and_black() {
        assert!((Rgb::new(255, 255, 255).luminance() - 255.0).abs() < 1e-9);
        assert_eq!(Rgb::default().luminance(), 0.0);
    }
}
