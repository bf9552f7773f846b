//! Rendering of averaged grids onto a drawing surface.
//!
//! Each averaged cell becomes one shape:
//!
//! - **Circle** - a disc centred in its block, radius `size/2 - padding`
//! - **Square** - a rect at the block's top-left plus padding, side `size - padding`
//!
//! With jitter enabled every cell's size grows by a fresh random amount drawn
//! from `ceil(s/4)..=2s`, which gives the scattered-dots look.

mod raster;
mod recording;
mod surface;

pub use raster::{RasterSurface, SurfaceError};
pub use recording::{DrawOp, RecordingSurface};
pub use surface::Surface;

use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::pixels::{AveragedGrid, BlockSize, Color};

/// Drawing strategy for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Circle,
    Square,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Circle => f.write_str("circle"),
            Shape::Square => f.write_str("square"),
        }
    }
}

/// Named render style a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Circles, jitter as configured
    #[default]
    Circle,
    /// Squares, jitter as configured
    Square,
    /// Circles with jitter always on
    Scatter,
}

/// Style identifier that matches no known style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown style '{0}'. Available styles: circle, square, scatter")]
pub struct UnrecognizedStyleError(pub String);

/// Outcome of resolving a style identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSelection {
    pub shape: Shape,
    /// `Some` when the style dictates the jitter flag.
    pub jitter: Option<bool>,
}

impl Style {
    /// Parse a style identifier. Accepts names and the numeric ids `1`-`3`.
    pub fn from_id(id: &str) -> Result<Self, UnrecognizedStyleError> {
        match id.trim().to_lowercase().as_str() {
            "circle" | "circles" | "1" => Ok(Self::Circle),
            "square" | "squares" | "2" => Ok(Self::Square),
            "scatter" | "3" => Ok(Self::Scatter),
            _ => Err(UnrecognizedStyleError(id.to_string())),
        }
    }

    /// Resolve an identifier, falling back to plain circles without jitter.
    pub fn resolve(id: &str) -> StyleSelection {
        match Self::from_id(id) {
            Ok(style) => style.selection(),
            Err(e) => {
                log::warn!("{}; falling back to circles", e);
                StyleSelection {
                    shape: Shape::Circle,
                    jitter: Some(false),
                }
            }
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Style::Circle | Style::Scatter => Shape::Circle,
            Style::Square => Shape::Square,
        }
    }

    pub fn selection(self) -> StyleSelection {
        StyleSelection {
            shape: self.shape(),
            jitter: match self {
                Style::Scatter => Some(true),
                Style::Circle | Style::Square => None,
            },
        }
    }
}

impl FromStr for Style {
    type Err = UnrecognizedStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

/// Parameters for one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParameters {
    pub block_size: BlockSize,
    pub padding: u32,
    pub shape: Shape,
    pub jitter: bool,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl RenderParameters {
    /// Defaults for a canvas: block size 4, no padding, jittered circles.
    pub fn for_canvas(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            block_size: BlockSize::DEFAULT,
            padding: 0,
            shape: Shape::Circle,
            jitter: true,
            canvas_width,
            canvas_height,
        }
    }
}

/// Circular region where the original image shows through (x-ray).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealRegion {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub cells_drawn: usize,
    /// Cells with no averaged color.
    pub degenerate_skipped: usize,
    /// Cells whose padding left no positive size.
    pub clipped_skipped: usize,
}

/// Range the per-cell jitter is drawn from: `ceil(s/4)..=2s`.
pub fn jitter_range(block: BlockSize) -> RangeInclusive<u32> {
    let s = block.get();
    s.div_ceil(4)..=s.saturating_mul(2)
}

/// Effective size of a cell, adding random jitter when enabled.
pub fn effective_size<R: Rng + ?Sized>(block: BlockSize, jitter: bool, rng: &mut R) -> u32 {
    let s = block.get();
    if jitter {
        s.saturating_add(rng.random_range(jitter_range(block)))
    } else {
        s
    }
}

/// Paint an averaged grid onto a surface.
///
/// The surface is cleared (circles) or filled white (squares) before any cell
/// is drawn. Cells are drawn in row-major order.
///
/// # Arguments
/// * `surface` - Target surface
/// * `grid` - Averaged colors, one per cell
/// * `params` - Block size, padding, shape, jitter and canvas size
/// * `rng` - Source of jitter; untouched when jitter is off
pub fn render<S, R>(
    surface: &mut S,
    grid: &AveragedGrid,
    params: &RenderParameters,
    rng: &mut R,
) -> RenderStats
where
    S: Surface + ?Sized,
    R: Rng + ?Sized,
{
    match params.shape {
        Shape::Circle => surface.clear(),
        Shape::Square => {
            surface.set_fill_color(Color::WHITE);
            surface.fill_rect(
                0.0,
                0.0,
                params.canvas_width as f64,
                params.canvas_height as f64,
            );
        }
    }

    let s = params.block_size.get() as f64;
    let padding = params.padding as f64;
    let mut stats = RenderStats::default();

    for (row, col, color) in grid.iter() {
        let size = effective_size(params.block_size, params.jitter, rng) as f64;
        let Some(color) = color else {
            stats.degenerate_skipped += 1;
            continue;
        };

        let x = col as f64 * s;
        let y = row as f64 * s;
        let drawn = match params.shape {
            Shape::Circle => {
                let radius = size / 2.0 - padding;
                if radius > 0.0 {
                    surface.set_fill_color(color);
                    surface.fill_circle(x + s / 2.0 + padding, y + s / 2.0 + padding, radius);
                    true
                } else {
                    false
                }
            }
            Shape::Square => {
                let side = size - padding;
                if side > 0.0 {
                    surface.set_fill_color(color);
                    surface.fill_rect(x + padding, y + padding, side, side);
                    true
                } else {
                    false
                }
            }
        };

        if drawn {
            stats.cells_drawn += 1;
        } else {
            stats.clipped_skipped += 1;
        }
    }

    log::debug!(
        "Rendered {} {} cells ({} degenerate, {} clipped)",
        stats.cells_drawn,
        params.shape,
        stats.degenerate_skipped,
        stats.clipped_skipped
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_style_from_id() {
        assert_eq!(Style::from_id("circle"), Ok(Style::Circle));
        assert_eq!(Style::from_id("2"), Ok(Style::Square));
        assert_eq!(Style::from_id(" Scatter "), Ok(Style::Scatter));
        assert!(Style::from_id("hexagon").is_err());
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_plain_circles() {
        let selection = Style::resolve("hexagon");
        assert_eq!(selection.shape, Shape::Circle);
        assert_eq!(selection.jitter, Some(false));
    }

    #[test]
    fn test_scatter_forces_jitter() {
        assert_eq!(Style::Scatter.selection().jitter, Some(true));
        assert_eq!(Style::Square.selection().jitter, None);
    }

    #[test]
    fn test_jitter_range() {
        let block = BlockSize::new(4).unwrap();
        assert_eq!(jitter_range(block), 1..=8);
        let block = BlockSize::new(5).unwrap();
        assert_eq!(jitter_range(block), 2..=10);
    }

    #[test]
    fn test_effective_size_without_jitter() {
        let mut rng = StdRng::seed_from_u64(1);
        let block = BlockSize::new(6).unwrap();
        assert_eq!(effective_size(block, false, &mut rng), 6);
    }

    #[test]
    fn test_effective_size_with_jitter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let block = BlockSize::new(8).unwrap();
        for _ in 0..500 {
            let size = effective_size(block, true, &mut rng);
            assert!((8 + 2..=8 + 16).contains(&size), "size {} out of range", size);
        }
    }
}
