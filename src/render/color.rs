/// An opaque 24 bit color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Linear interpolation between two colors, `t` in [0, 1].
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// A premultiplied RGBA value with channels in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Build a premultiplied value out of a straight color and an alpha.
    pub fn from_color(color: Color, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        Self {
            r: color.r as f32 / 255.0 * a,
            g: color.g as f32 / 255.0 * a,
            b: color.b as f32 / 255.0 * a,
            a,
        }
    }

    pub fn opaque(color: Color) -> Self {
        Self::from_color(color, 1.0)
    }

    /// Scale every channel, used for global alpha and masks.
    pub fn scale(self, factor: f32) -> Self {
        let f = factor.max(0.0);
        Self { r: self.r * f, g: self.g * f, b: self.b * f, a: (self.a * f).min(1.0) }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self { r: mix(self.r, other.r), g: mix(self.g, other.g), b: mix(self.b, other.b), a: mix(self.a, other.a) }
    }

    /// Additive ("lighter") composition.
    pub fn lighter(self, src: Rgba) -> Self {
        Self {
            r: (self.r + src.r).min(1.0),
            g: (self.g + src.g).min(1.0),
            b: (self.b + src.b).min(1.0),
            a: (self.a + src.a).min(1.0),
        }
    }

    /// Porter-Duff source-over with `src` on top of `self`.
    pub fn source_over(self, src: Rgba) -> Self {
        let keep = 1.0 - src.a;
        Self {
            r: src.r + self.r * keep,
            g: src.g + self.g * keep,
            b: src.b + self.b * keep,
            a: src.a + self.a * keep,
        }
    }

    /// Flatten over an opaque background.
    pub fn over(self, background: Color) -> Color {
        let flat = Rgba::opaque(background).source_over(self);
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::new(to_u8(flat.r), to_u8(flat.g), to_u8(flat.b))
    }
}

/// Convert HSL to RGB color
/// H: hue (0-360), S: saturation (0-100), L: lightness (0-100)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let s = s / 100.0;
    let l = l / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::new(((r + m) * 255.0) as u8, ((g + m) * 255.0) as u8, ((b + m) * 255.0) as u8)
}
