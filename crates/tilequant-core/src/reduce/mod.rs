//! Color reduction: the pluggable "N colors down to K" capability.
//!
//! The search only relies on the [`ColorReducer`] contract:
//!
//! - the returned palette has at most `target` entries,
//! - every unmasked pixel is assigned one of those entries and masked
//!   pixels are assigned nothing,
//! - a block with fewer distinct colors than `target` comes back with fewer
//!   colors instead of failing,
//! - dithering only changes which palette entry a pixel gets.
//!
//! [`MedianCut`] is the built-in implementation.

mod median_cut;

pub use median_cut::MedianCut;

use crate::color::Rgb;
use crate::image::PixelBlock;

/// How pixels are mapped onto a reduced palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherMode {
    /// Nearest color, no diffusion
    #[default]
    None,
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
}

/// Result of reducing a [`PixelBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// Reduced colors
    pub palette: Vec<Rgb>,
    /// Palette entry per pixel, `None` for masked pixels
    pub assignment: Vec<Option<usize>>,
}

impl Reduction {
    /// Reduced color of pixel `i`, if it is unmasked.
    #[inline]
    pub fn color_of(&self, i: usize) -> Option<Rgb> {
        self.assignment[i].map(|p| self.palette[p])
    }

    /// The block's pixels after reduction.
    ///
    /// Masked pixels keep their original color.
    pub fn apply(&self, block: &PixelBlock) -> Vec<Rgb> {
        block
            .pixels
            .iter()
            .enumerate()
            .map(|(i, &original)| self.color_of(i).unwrap_or(original))
            .collect()
    }
}

/// Reduce a block of pixels to at most `target` colors.
///
/// Implementations must be deterministic: the search relies on identical
/// inputs producing identical outputs, including across threads.
///
/// # Example
///
/// ```
/// use tilequant_core::{ColorReducer, DitherMode, MedianCut, PixelBlock, Rgb};
///
/// let pixels = vec![
///     Rgb::new(0, 0, 0),
///     Rgb::new(10, 10, 10),
///     Rgb::new(250, 250, 250),
///     Rgb::new(255, 255, 255),
/// ];
/// let block = PixelBlock::new(2, 2, pixels);
/// let reduction = MedianCut.reduce(&block, 2, DitherMode::None);
///
/// assert_eq!(reduction.palette.len(), 2);
/// assert_eq!(reduction.assignment[0], reduction.assignment[1]);
/// assert_ne!(reduction.assignment[1], reduction.assignment[2]);
/// ```
pub trait ColorReducer: Send + Sync {
    /// Reduce `block` to at most `target` colors.
    fn reduce(&self, block: &PixelBlock, target: usize, dither: DitherMode) -> Reduction;
}

impl<T: ColorReducer + ?Sized> ColorReducer for &T {
    fn reduce(&self, block: &PixelBlock, target: usize, dither: DitherMode) -> Reduction {
        (**self).reduce(block, target, dither)
    }
}

impl<T: ColorReducer + ?Sized> ColorReducer for std::sync::Arc<T> {
    fn reduce(&self, block: &PixelBlock, target: usize, dither: DitherMode) -> Reduction {
        (**self).reduce(block, target, dither)
    }
}
