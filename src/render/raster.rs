//! In-memory RGBA raster surface backed by `image::RgbaImage`.

use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

use super::{RevealRegion, Surface};
use crate::pixels::Color;

/// Errors writing a raster out.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Failed to write image '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Raster surface with source-over alpha blending.
///
/// A pixel is covered by a shape when its centre `(x + 0.5, y + 0.5)` lies
/// inside the shape.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    fill: Color,
}

impl RasterSurface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            fill: Color::TRANSPARENT,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Color::from_channels(p.0))
    }

    /// Copy pixels of `original` inside `region` over the surface (x-ray).
    pub fn reveal(&mut self, original: &RgbaImage, region: RevealRegion) {
        let (x0, x1) = span(region.x - region.radius, region.x + region.radius, self.image.width());
        let (y0, y1) = span(region.y - region.radius, region.y + region.radius, self.image.height());
        let r2 = region.radius * region.radius;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - region.x;
                let dy = y as f64 + 0.5 - region.y;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                if let Some(p) = original.get_pixel_checked(x, y) {
                    self.image.put_pixel(x, y, *p);
                }
            }
        }
    }

    /// Encode as PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), SurfaceError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| SurfaceError::Write {
                path: path.display().to_string(),
                source,
            })
    }

    fn blend(&mut self, x: u32, y: u32) {
        let src = self.fill;
        if src.a == 0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        if src.a == 255 {
            *dst = Rgba(src.channels());
            return;
        }

        let sa = src.a as f32 / 255.0;
        let da = dst.0[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: u8, d: u8| -> u8 {
            let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        *dst = Rgba([
            mix(src.r, dst.0[0]),
            mix(src.g, dst.0[1]),
            mix(src.b, dst.0[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }
}

/// Pixel index range whose centres fall inside `[lo, hi)`, clamped to `0..max`.
fn span(lo: f64, hi: f64, max: u32) -> (u32, u32) {
    let start = (lo - 0.5).ceil().clamp(0.0, max as f64) as u32;
    let end = (hi - 0.5).ceil().clamp(0.0, max as f64) as u32;
    (start, end.max(start))
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.image.dimensions() {
            self.image = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let (x0, x1) = span(x, x + width, self.image.width());
        let (y0, y1) = span(y, y + height, self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py);
            }
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        if radius <= 0.0 {
            return;
        }
        let (x0, x1) = span(cx - radius, cx + radius, self.image.width());
        let (y0, y1) = span(cy - radius, cy + radius, self.image.height());
        let r2 = radius * radius;
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py);
                }
            }
        }
    }
}
