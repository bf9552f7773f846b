//! Pixel data model and the downsampling pipeline.
//!
//! Converting a decoded image into an averaged grid happens in two steps:
//!
//! 1. **Extraction** - flat RGBA bytes into a [`PixelGrid`] of [`Color`] rows
//! 2. **Block averaging** - quarter-window RMS sampling into an [`AveragedGrid`]
//!
//! The averaged grid is what the renderer paints; see [`crate::render`].

mod average;
mod extract;

pub use average::{
    average_blocks, output_dimensions, rms_average, sample_window, AveragedGrid,
    DegenerateSampleError,
};
pub use extract::{extract, MalformedBufferError};

use std::fmt;

/// Number of bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_channels(c: [u8; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Rectangular grid of pixel colors, row-major, top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelGrid {
    rows: Vec<Vec<Color>>,
    width: usize,
}

impl PixelGrid {
    /// Build a grid from rows. Every row must have the same length.
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self { rows, width })
    }

    /// Extract a grid and check it against the declared height.
    pub fn from_rgba(bytes: &[u8], width: u32, height: u32) -> Result<Self, MalformedBufferError> {
        let grid = extract(bytes, width)?;
        if grid.height() != height as usize {
            return Err(MalformedBufferError::DimensionMismatch {
                width,
                height,
                len: bytes.len(),
            });
        }
        Ok(grid)
    }

    /// A grid where every pixel has the same color.
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            rows: vec![vec![color; width]; height],
            width: if height == 0 { 0 } else { width },
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Pixel at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn rows(&self) -> &[Vec<Color>] {
        &self.rows
    }

    /// Flatten back into RGBA bytes (inverse of [`extract`]).
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.width * self.height() * BYTES_PER_PIXEL);
        for row in &self.rows {
            for color in row {
                bytes.extend_from_slice(&color.channels());
            }
        }
        bytes
    }
}

/// Edge length of the square sampling block, in source pixels. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockSize(u32);

impl BlockSize {
    pub const DEFAULT: BlockSize = BlockSize(4);

    pub fn new(size: u32) -> Result<Self, InvalidBlockSize> {
        if size == 0 {
            Err(InvalidBlockSize)
        } else {
            Ok(Self(size))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for BlockSize {
    type Error = InvalidBlockSize;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

/// Block size of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("block size must be at least 1")]
pub struct InvalidBlockSize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_rejects_zero() {
        assert_eq!(BlockSize::new(0), Err(InvalidBlockSize));
        assert_eq!(BlockSize::new(1).unwrap().get(), 1);
        assert_eq!(BlockSize::default().get(), 4);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let c = Color::WHITE;
        assert!(PixelGrid::from_rows(vec![vec![c, c], vec![c]]).is_none());
        let grid = PixelGrid::from_rows(vec![vec![c, c], vec![c, c]]).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn test_from_rgba_checks_height() {
        let bytes = vec![0u8; 2 * 3 * 4];
        assert!(PixelGrid::from_rgba(&bytes, 2, 3).is_ok());
        assert!(matches!(
            PixelGrid::from_rgba(&bytes, 2, 2),
            Err(MalformedBufferError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_color_display_uses_rgba_function() {
        assert_eq!(Color::rgba(1, 2, 3, 255).to_string(), "rgba(1,2,3,255)");
    }
}
