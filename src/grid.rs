use crate::color::Rgb;
use crate::error::{GlowgridError, GlowgridResult};

/// Compiled-in matrix geometry. The device is wired as a 10x21 serpentine
/// panel; files and remote payloads for other shapes are rejected rather
/// than resized.
pub const ROWS: usize = 10;
pub const COLS: usize = 21;
pub const LED_COUNT: usize = ROWS * COLS;

/// Logical (row, col) to physical LED index.
///
/// Even rows run left to right, odd rows are wired in reverse. Every
/// by-coordinate read or write goes through this mapping; raw indices are
/// reserved for whole-frame serialization.
pub fn serpentine_index(row: usize, col: usize) -> usize {
    debug_assert!(row < ROWS && col < COLS);
    if row % 2 == 0 {
        row * COLS + col
    } else {
        row * COLS + (COLS - 1 - col)
    }
}

/// Inverse of [`serpentine_index`].
pub fn serpentine_coords(index: usize) -> (usize, usize) {
    debug_assert!(index < LED_COUNT);
    let row = index / COLS;
    let offset = index % COLS;
    if row % 2 == 0 {
        (row, offset)
    } else {
        (row, COLS - 1 - offset)
    }
}

/// One still image over the full grid: exactly [`LED_COUNT`] colors held in
/// physical (wire) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<Rgb>,
}

impl Frame {
    /// All-off frame.
    pub fn blank() -> Self {
        Self::filled(Rgb::BLACK)
    }

    pub fn filled(fill: Rgb) -> Self {
        Self {
            pixels: vec![fill; LED_COUNT],
        }
    }

    /// Build from pixels already in physical order. The only constructor
    /// that can fail; it guards the serialization boundary.
    pub fn from_pixels(pixels: Vec<Rgb>) -> GlowgridResult<Self> {
        if pixels.len() != LED_COUNT {
            return Err(GlowgridError::validation(format!(
                "frame has {} pixels, expected {LED_COUNT}",
                pixels.len()
            )));
        }
        Ok(Self { pixels })
    }

    /// Color at a logical coordinate. Callers clip to the grid before
    /// calling; coordinates are trusted to be in bounds.
    pub fn get(&self, row: usize, col: usize) -> Rgb {
        self.pixels[serpentine_index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, color: Rgb) {
        self.pixels[serpentine_index(row, col)] = color;
    }

    /// Physical-order view, for serialization and wire encoding only.
    pub fn as_slice(&self) -> &[Rgb] {
        &self.pixels
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl serde::Serialize for Frame {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.pixels.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Frame {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pixels = Vec::<Rgb>::deserialize(deserializer)?;
        Frame::from_pixels(pixels).map_err(serde::de::Error::custom)
    }
}
