//! Surface that records draw calls instead of rasterising them.

use super::Surface;
use crate::pixels::Color;

/// A single recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    Clear,
    SetFillColor(Color),
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    FillCircle { cx: f64, cy: f64, radius: f64 },
}

/// Records every call in order. Useful for inspecting what a render pass
/// would paint without allocating a raster.
///
/// Ops accumulate across render passes until [`reset`](Self::reset) is
/// called, so this surface is meant for tests and one-shot inspection, not
/// long-running interactive sessions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    /// Recorded rect and circle fills, skipping color and clear calls.
    pub fn shapes(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { .. } | DrawOp::FillCircle { .. }))
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ops.push(DrawOp::SetFillColor(color));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.ops.push(DrawOp::FillCircle { cx, cy, radius });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{average_blocks, BlockSize, PixelGrid};
    use crate::render::{render, RenderParameters};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ops_accumulate_until_reset() {
        let grid = average_blocks(&PixelGrid::filled(4, 4, Color::WHITE), BlockSize::DEFAULT);
        let params = RenderParameters::for_canvas(4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let mut surface = RecordingSurface::new(4, 4);

        render(&mut surface, &grid, &params, &mut rng);
        let one_pass = surface.ops().len();
        assert!(one_pass > 0);

        render(&mut surface, &grid, &params, &mut rng);
        assert_eq!(surface.ops().len(), 2 * one_pass);

        surface.reset();
        assert!(surface.ops().is_empty());
        assert_eq!((surface.width(), surface.height()), (4, 4));
    }
}
