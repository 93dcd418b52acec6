//! Mapping pixels onto a reduced palette, with optional error diffusion.
//!
//! Plain mapping picks the nearest palette color by squared RGB distance.
//! Error diffusion walks the block left to right, top to bottom, and pushes
//! each pixel's quantization error onto its unvisited neighbors according
//! to a [`Kernel`]. Either way the result only ever refers to palette
//! entries, so dithering cannot introduce new colors.

mod kernel;

pub use kernel::{Kernel, FLOYD_STEINBERG};

use crate::color::Rgb;
use crate::image::PixelBlock;

/// Error buffer for efficient error diffusion.
///
/// Manages a sliding window of error rows, storing only the rows that
/// the diffusion kernel can reach (determined by `max_dy`).
///
/// # Usage Pattern
///
/// 1. Create buffer with `new(width, row_depth)`
/// 2. For each row:
///    a. Read accumulated error with `get_accumulated(x)`
///    b. After processing pixel, distribute error with `add_error(x, dy, error)`
///    c. After row complete, call `advance_row()`
#[derive(Debug)]
pub struct ErrorBuffer {
    /// rows[0] is the current row, rows[1] the next one, and so on
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ErrorBuffer {
    /// Create a buffer `width` pixels wide tracking `row_depth` rows.
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth.max(1)).map(|_| vec![[0.0; 3]; width]).collect(),
            width,
        }
    }

    /// Accumulated error for a pixel in the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to a pixel `row_offset` rows below the current one.
    ///
    /// Silently ignores out-of-bounds coordinates.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            for (acc, e) in self.rows[row_offset][x].iter_mut().zip(error) {
                *acc += e;
            }
        }
    }

    /// Advance to the next row, recycling the finished row as the last one.
    pub fn advance_row(&mut self) {
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}

/// Index of the palette color nearest to `color`. Ties go to the lower index.
///
/// Returns `None` only for an empty palette.
pub fn nearest_index(palette: &[Rgb], color: Rgb) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &candidate) in palette.iter().enumerate() {
        let d = candidate.distance_squared(color);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

fn nearest_index_f32(palette: &[Rgb], color: [f32; 3]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, candidate) in palette.iter().enumerate() {
        let d: f32 = candidate
            .to_f32()
            .iter()
            .zip(color)
            .map(|(p, c)| (p - c) * (p - c))
            .sum();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Map every unmasked pixel to its nearest palette entry.
///
/// Masked pixels map to `None`.
pub fn map_nearest(block: &PixelBlock, palette: &[Rgb]) -> Vec<Option<usize>> {
    block
        .pixels
        .iter()
        .zip(&block.mask)
        .map(|(&pixel, &masked)| {
            if masked {
                None
            } else {
                nearest_index(palette, pixel)
            }
        })
        .collect()
}

/// Map every unmasked pixel to a palette entry with error diffusion.
///
/// The pixel value plus accumulated error is clamped to `0..=255` per
/// channel before matching, which also bounds the error passed on. Masked
/// pixels neither receive nor emit error and map to `None`.
pub fn diffuse(block: &PixelBlock, palette: &[Rgb], kernel: &Kernel) -> Vec<Option<usize>> {
    let (width, height) = (block.width, block.height);
    let mut output = vec![None; width * height];
    if palette.is_empty() {
        return output;
    }

    let mut error_buf = ErrorBuffer::new(width, kernel.max_dy + 1);
    let divisor = kernel.divisor as f32;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if block.mask[idx] {
                continue;
            }

            let acc = error_buf.get_accumulated(x);
            let mut value = block.pixels[idx].to_f32();
            for (v, e) in value.iter_mut().zip(acc) {
                *v = (*v + e).clamp(0.0, 255.0);
            }

            let Some(chosen) = nearest_index_f32(palette, value) else {
                continue;
            };
            output[idx] = Some(chosen);

            let target = palette[chosen].to_f32();
            let error = [
                value[0] - target[0],
                value[1] - target[1],
                value[2] - target[2],
            ];

            for &(dx, dy, weight) in kernel.entries {
                let nx = x as i64 + dx as i64;
                let ny = y + dy as usize;
                if nx < 0 || nx >= width as i64 || ny >= height {
                    continue;
                }
                if block.mask[ny * width + nx as usize] {
                    continue;
                }
                let w = weight as f32 / divisor;
                error_buf.add_error(
                    nx as usize,
                    dy as usize,
                    [error[0] * w, error[1] * w, error[2] * w],
                );
            }
        }
        error_buf.advance_row();
    }

    output
}
