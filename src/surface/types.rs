use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

/// Straight-alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in 0.0-1.0
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a: a.clamp(0.0, 1.0) }
    }

    /// Parse a CSS color string: `#rgb`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(r, g, b)`, `rgba(r, g, b, a)` or a basic color name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse_functional(args);
        }

        Self::named(&lower)
    }

    /// Parse a CSS color, falling back to white for anything unreadable
    pub fn parse_or_white(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::WHITE)
    }

    /// Multiply the color channels by `factor`, keeping alpha
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self { r: scale(self.r), g: scale(self.g), b: scale(self.b), a: self.a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)? as f32 / 255.0)),
            _ => None,
        }
    }

    fn parse_functional(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }

        let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
        let alpha = match parts.get(3) {
            Some(a) => a.parse::<f32>().ok()?,
            None => 1.0,
        };

        Some(Self::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha))
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::rgb(255, 0, 0),
            "lime" => Self::rgb(0, 255, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "cyan" | "aqua" => Self::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Self::rgb(255, 0, 255),
            "orange" => Self::rgb(255, 165, 0),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }
}

/// Canvas-style compositing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    SourceOver,
    Lighter,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Xor,
    Copy,
    DestinationOver,
    SourceAtop,
    DestinationOut,
}

impl BlendMode {
    pub(crate) fn to_skia(self) -> tiny_skia::BlendMode {
        use tiny_skia::BlendMode as Skia;
        match self {
            Self::SourceOver => Skia::SourceOver,
            Self::Lighter => Skia::Plus,
            Self::Multiply => Skia::Multiply,
            Self::Screen => Skia::Screen,
            Self::Overlay => Skia::Overlay,
            Self::Darken => Skia::Darken,
            Self::Lighten => Skia::Lighten,
            Self::ColorDodge => Skia::ColorDodge,
            Self::ColorBurn => Skia::ColorBurn,
            Self::HardLight => Skia::HardLight,
            Self::SoftLight => Skia::SoftLight,
            Self::Difference => Skia::Difference,
            Self::Exclusion => Skia::Exclusion,
            Self::Hue => Skia::Hue,
            Self::Saturation => Skia::Saturation,
            Self::Color => Skia::Color,
            Self::Luminosity => Skia::Luminosity,
            Self::Xor => Skia::Xor,
            Self::Copy => Skia::Source,
            Self::DestinationOver => Skia::DestinationOver,
            Self::SourceAtop => Skia::SourceAtop,
            Self::DestinationOut => Skia::DestinationOut,
        }
    }
}

/// Row-major 3x3 matrix applied to RGB channels
///
/// The constructors follow the CSS filter-effects definitions so that
/// `hue-rotate`, `saturate` and `brightness` match what a browser produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [f32; 9]);

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self([
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ])
    }

    /// `amount` of 1.0 leaves colors unchanged, 0.0 is grayscale
    pub fn saturate(amount: f32) -> Self {
        let s = amount.max(0.0);
        Self([
            0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s,
            0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s,
            0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s,
        ])
    }

    pub fn brightness(amount: f32) -> Self {
        let b = amount.max(0.0);
        Self([b, 0.0, 0.0, 0.0, b, 0.0, 0.0, 0.0, b])
    }

    /// Matrix applying `self` first and `next` afterwards
    pub fn then(self, next: ColorMatrix) -> Self {
        let a = next.0;
        let b = self.0;
        let mut out = [0.0f32; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = (0..3).map(|k| a[row * 3 + k] * b[k * 3 + col]).sum();
            }
        }
        Self(out)
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0] * rgb[0] + m[1] * rgb[1] + m[2] * rgb[2],
            m[3] * rgb[0] + m[4] * rgb[1] + m[5] * rgb[2],
            m[6] * rgb[0] + m[7] * rgb[1] + m[8] * rgb[2],
        ]
    }
}

/// Post-processing applied to everything already drawn on a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Color(ColorMatrix),
    /// Gaussian blur with the given standard deviation in pixels
    Blur(f32),
}

/// Copy of a surface's pixels that can be drawn back onto it
#[derive(Clone)]
pub struct Snapshot {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixmap: Option<Pixmap>,
}

impl Snapshot {
    /// Snapshot that only carries dimensions, for surfaces without pixels
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, pixmap: None }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_pixels", &self.pixmap.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(Rgba::parse("#ffff00"), Some(Rgba::rgb(255, 255, 0)));
        assert_eq!(Rgba::parse("#0f0"), Some(Rgba::rgb(0, 255, 0)));
        let translucent = Rgba::parse("#ff000080").unwrap();
        assert_eq!((translucent.r, translucent.g, translucent.b), (255, 0, 0));
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(Rgba::parse("#12345"), None);
    }

    #[test]
    fn test_parse_functional_colors() {
        assert_eq!(Rgba::parse("rgb(10, 20, 30)"), Some(Rgba::rgb(10, 20, 30)));
        let c = Rgba::parse("rgba(50, 50, 50, 0.5)").unwrap();
        assert_eq!(c.r, 50);
        assert_eq!(c.a, 0.5);
        assert_eq!(Rgba::parse("rgba(1, 2)"), None);
    }

    #[test]
    fn test_unparseable_color_degrades_to_white() {
        assert_eq!(Rgba::parse_or_white("not-a-color"), Rgba::WHITE);
        assert_eq!(Rgba::parse_or_white("Yellow"), Rgba::rgb(255, 255, 0));
    }

    #[test]
    fn test_blend_mode_names() {
        let mode: BlendMode = serde_json::from_str("\"color-dodge\"").unwrap();
        assert_eq!(mode, BlendMode::ColorDodge);
        assert_eq!(serde_json::to_string(&BlendMode::SourceOver).unwrap(), "\"source-over\"");
    }

    #[test]
    fn test_color_matrix_identities() {
        let rgb = [0.2, 0.5, 0.9];
        for m in [ColorMatrix::hue_rotate(0.0), ColorMatrix::saturate(1.0), ColorMatrix::brightness(1.0)] {
            let out = m.apply(rgb);
            for (a, b) in out.iter().zip(rgb.iter()) {
                assert!((a - b).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_color_matrix_composition_order() {
        let combined = ColorMatrix::saturate(0.0).then(ColorMatrix::brightness(0.5));
        let out = combined.apply([1.0, 0.0, 0.0]);
        // Grayscale of pure red is 0.213, then halved
        assert!((out[0] - 0.1065).abs() < 1e-4);
        assert!((out[0] - out[1]).abs() < 1e-4);
    }
}
