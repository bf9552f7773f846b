//! Drawing surface abstraction.

use crate::pixels::Color;

/// A 2D surface the renderer paints onto.
///
/// Coordinates are in canvas pixels with the origin at the top-left. Fill
/// colors carry all four channels on a 0-255 scale; a surface that expects a
/// fractional alpha converts on its side.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resize the canvas. Contents after a resize are unspecified until the
    /// next clear or fill.
    fn resize(&mut self, width: u32, height: u32);

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    /// Color used by subsequent fill calls.
    fn set_fill_color(&mut self, color: Color);

    /// Fill an axis-aligned rectangle with the current fill color.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Fill a disc with the current fill color.
    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_fill_color(&mut self, color: Color) {
        (**self).set_fill_color(color)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        (**self).fill_rect(x, y, width, height)
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        (**self).fill_circle(cx, cy, radius)
    }
}
