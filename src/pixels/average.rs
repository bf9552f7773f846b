//! Block averaging: downsample a pixel grid into a coarser grid of colors.
//!
//! Each output cell covers an `s x s` block of source pixels, but only the
//! top-left `ceil(s/2) x ceil(s/2)` sub-window is sampled. The sampled pixels
//! are combined with a per-channel root-mean-square rather than an arithmetic
//! mean, which keeps bright channels from washing out.
//!
//! The output always has one extra row and column past `ceil(n / s)` so the
//! trailing remainder of the image is covered. Cells whose window falls
//! entirely outside the source are degenerate and stored as `None`.

use super::{BlockSize, Color, PixelGrid};

/// Averaging over an empty sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no samples to average")]
pub struct DegenerateSampleError;

/// Downsampled grid of averaged colors. `None` marks a degenerate cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AveragedGrid {
    cells: Vec<Vec<Option<Color>>>,
    width: usize,
}

impl AveragedGrid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Averaged color at `(row, col)`. `None` for degenerate or out-of-range cells.
    pub fn cell(&self, row: usize, col: usize) -> Option<Color> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn rows(&self) -> &[Vec<Option<Color>>] {
        &self.cells
    }

    /// Iterate all cells in row-major order as `(row, col, color)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Option<Color>)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .map(move |(col, color)| (row, col, *color))
        })
    }

    /// Number of cells with no valid samples.
    pub fn degenerate_count(&self) -> usize {
        self.iter().filter(|(_, _, c)| c.is_none()).count()
    }
}

/// Side length of the sampled sub-window for a block size.
///
/// This is the number of integers `i` with `i < s / 2`, i.e. `ceil(s / 2)`,
/// so a block size of 1 still samples one pixel.
pub fn sample_window(block: BlockSize) -> usize {
    (block.get() as usize).div_ceil(2)
}

/// Output `(rows, cols)` for a source of `rows x cols` pixels.
///
/// `ceil(n / s) + 1` on each axis; zero for an empty source.
pub fn output_dimensions(rows: usize, cols: usize, block: BlockSize) -> (usize, usize) {
    if rows == 0 || cols == 0 {
        return (0, 0);
    }
    let s = block.get() as usize;
    (rows.div_ceil(s) + 1, cols.div_ceil(s) + 1)
}

/// Per-channel root-mean-square of a set of colors.
///
/// Each channel is squared, summed, divided by the sample count and
/// square-rooted. The result is rounded to the nearest integer.
pub fn rms_average(samples: &[Color]) -> Result<Color, DegenerateSampleError> {
    if samples.is_empty() {
        return Err(DegenerateSampleError);
    }

    let mut sums = [0f64; 4];
    for color in samples {
        for (sum, value) in sums.iter_mut().zip(color.channels()) {
            let v = value as f64;
            *sum += v * v;
        }
    }

    let n = samples.len() as f64;
    let channels = sums.map(|sum| (sum / n).sqrt().round().clamp(0.0, 255.0) as u8);
    Ok(Color::from_channels(channels))
}

/// Downsample a pixel grid into averaged blocks.
///
/// # Arguments
/// * `grid` - Source pixels
/// * `block` - Edge length of each sampling block
///
/// # Returns
/// A grid of `ceil(rows/s) + 1` by `ceil(cols/s) + 1` cells. Samples that
/// fall outside the source are skipped; a cell left with no samples is `None`.
pub fn average_blocks(grid: &PixelGrid, block: BlockSize) -> AveragedGrid {
    let (out_rows, out_cols) = output_dimensions(grid.height(), grid.width(), block);
    let s = block.get() as usize;
    let window = sample_window(block);

    // A window never yields more samples than the source has pixels
    let mut samples =
        Vec::with_capacity(window.min(grid.height()) * window.min(grid.width()));
    let mut cells = Vec::with_capacity(out_rows);

    for row in 0..out_rows {
        let mut out_row = Vec::with_capacity(out_cols);
        for col in 0..out_cols {
            samples.clear();
            for i in 0..window {
                let Some(source_row) = grid.rows().get(row * s + i) else {
                    break;
                };
                for j in 0..window {
                    match source_row.get(col * s + j) {
                        Some(color) => samples.push(*color),
                        None => break,
                    }
                }
            }
            out_row.push(rms_average(&samples).ok());
        }
        cells.push(out_row);
    }

    log::debug!(
        "Averaged {}x{} pixels into {}x{} cells (block {}, window {})",
        grid.width(),
        grid.height(),
        out_cols,
        out_rows,
        s,
        window
    );

    AveragedGrid {
        cells,
        width: out_cols,
    }
}
