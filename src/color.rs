use std::fmt;
use std::str::FromStr;

use crate::error::{GlowgridError, GlowgridResult};

/// One LED's color, three 8-bit channels. The canonical text form is
/// lowercase `#rrggbb`; black means "off".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `true` for black, the "off" state of an LED.
    pub fn is_off(self) -> bool {
        self == Self::BLACK
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = GlowgridError;

    /// Parses `#rrggbb`, plus the `#rgb` shorthand.
    fn from_str(s: &str) -> GlowgridResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| GlowgridError::validation(format!("color '{s}' must start with '#'")))?;
        if !hex.is_ascii() {
            return Err(GlowgridError::validation(format!(
                "color '{s}' is not valid hex"
            )));
        }

        let channel = |pair: &str| {
            u8::from_str_radix(pair, 16)
                .map_err(|_| GlowgridError::validation(format!("color '{s}' is not valid hex")))
        };

        match hex.len() {
            6 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let expand = |nibble: &str| channel(nibble).map(|v| v * 17);
                Ok(Self {
                    r: expand(&hex[0..1])?,
                    g: expand(&hex[1..2])?,
                    b: expand(&hex[2..3])?,
                })
            }
            _ => Err(GlowgridError::validation(format!(
                "color '{s}' must be #rrggbb or #rgb"
            ))),
        }
    }
}

impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// HSV to RGB with hue in degrees and saturation/value in percent.
///
/// Hue is normalized into `[0, 360)` first, so generator formulas may hand
/// in shifted or wrapped hues without producing out-of-range channels.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h = h.rem_euclid(360.0);
    let s = (s / 100.0).clamp(0.0, 1.0);
    let v = (v / 100.0).clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}
