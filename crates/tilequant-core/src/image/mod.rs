//! Pixel storage and the tile grid.
//!
//! [`Image`] is an immutable RGB raster with a per-pixel transparency mask.
//! Every stage of the pipeline produces a new `Image` rather than editing
//! one in place. [`TileGrid`] describes how an image is cut into tiles and
//! larger blocks.

mod tiles;

pub use tiles::{BlockRect, TileCoord, TileGrid};

use std::collections::BTreeSet;

use crate::api::ConfigError;
use crate::color::Rgb;

/// Read-only access to a raster of RGB pixels.
///
/// Implement this for an existing pixel buffer to hand it to
/// [`Image::from_source`] without an intermediate copy step of your own.
pub trait PixelSource {
    /// Width in pixels.
    fn width(&self) -> usize;
    /// Height in pixels.
    fn height(&self) -> usize;
    /// Color of the pixel at `(x, y)`.
    fn pixel(&self, x: usize, y: usize) -> Rgb;
    /// Whether the source flags the pixel at `(x, y)` as transparent.
    fn is_transparent(&self, _x: usize, _y: usize) -> bool {
        false
    }
}

/// An owned RGB raster in row-major order with a transparency mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    mask: Vec<bool>,
}

impl Image {
    /// Create an image without transparent pixels.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PixelCount`] if `pixels.len() != width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, ConfigError> {
        let mask = vec![false; pixels.len()];
        Self::with_mask(width, height, pixels, mask)
    }

    /// Create an image with an explicit transparency mask.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PixelCount`] if either buffer does not hold
    /// `width * height` entries.
    pub fn with_mask(
        width: usize,
        height: usize,
        pixels: Vec<Rgb>,
        mask: Vec<bool>,
    ) -> Result<Self, ConfigError> {
        let expected = width * height;
        for actual in [pixels.len(), mask.len()] {
            if actual != expected {
                return Err(ConfigError::PixelCount { expected, actual });
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
            mask,
        })
    }

    /// Copy any [`PixelSource`] into an owned image.
    pub fn from_source<S: PixelSource + ?Sized>(source: &S) -> Self {
        let (width, height) = (source.width(), source.height());
        let mut pixels = Vec::with_capacity(width * height);
        let mut mask = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(source.pixel(x, y));
                mask.push(source.is_transparent(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
            mask,
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major pixel colors.
    #[inline]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Row-major transparency mask.
    #[inline]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the image.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    /// Whether the pixel at `(x, y)` is transparent.
    #[inline]
    pub fn is_transparent(&self, x: usize, y: usize) -> bool {
        self.mask[y * self.width + x]
    }

    /// Whether any pixel is transparent.
    pub fn has_transparency(&self) -> bool {
        self.mask.iter().any(|&m| m)
    }

    /// Distinct colors of the non-transparent pixels, sorted.
    pub fn distinct_colors(&self) -> BTreeSet<Rgb> {
        self.pixels
            .iter()
            .zip(&self.mask)
            .filter(|(_, masked)| !**masked)
            .map(|(&c, _)| c)
            .collect()
    }

    /// Copy a rectangle out into a [`PixelBlock`].
    pub fn block(&self, rect: BlockRect) -> PixelBlock {
        let mut pixels = Vec::with_capacity(rect.width * rect.height);
        let mut mask = Vec::with_capacity(rect.width * rect.height);
        for y in rect.y..rect.y + rect.height {
            let start = y * self.width + rect.x;
            pixels.extend_from_slice(&self.pixels[start..start + rect.width]);
            mask.extend_from_slice(&self.mask[start..start + rect.width]);
        }
        PixelBlock {
            width: rect.width,
            height: rect.height,
            pixels,
            mask,
        }
    }

    /// A new image with the rectangle's pixels replaced by `colors`.
    ///
    /// `colors` is row-major over the rectangle. The mask is unchanged.
    pub fn with_block(&self, rect: BlockRect, colors: &[Rgb]) -> Image {
        let mut out = self.clone();
        out.paste(rect, colors);
        out
    }

    /// Overwrite a rectangle in place. Only used on images this crate owns
    /// while building a new stage.
    pub(crate) fn paste(&mut self, rect: BlockRect, colors: &[Rgb]) {
        debug_assert_eq!(colors.len(), rect.width * rect.height);
        for (row, chunk) in colors.chunks(rect.width).enumerate() {
            let start = (rect.y + row) * self.width + rect.x;
            self.pixels[start..start + rect.width].copy_from_slice(chunk);
        }
    }

    /// A new image where every pixel equal to `color` is also transparent.
    pub fn mask_color(&self, color: Rgb) -> Image {
        let mask = self
            .pixels
            .iter()
            .zip(&self.mask)
            .map(|(&c, &m)| m || c == color)
            .collect();
        Image {
            mask,
            ..self.clone()
        }
    }

    /// A new image with the transparency mask cleared.
    pub fn without_mask(&self) -> Image {
        Image {
            mask: vec![false; self.pixels.len()],
            ..self.clone()
        }
    }
}

impl PixelSource for Image {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> Rgb {
        Image::pixel(self, x, y)
    }

    fn is_transparent(&self, x: usize, y: usize) -> bool {
        Image::is_transparent(self, x, y)
    }
}

/// A rectangular excerpt of an image, handed to a
/// [`ColorReducer`](crate::ColorReducer).
///
/// Masked (transparent) pixels carry a color but must not influence the
/// reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBlock {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Row-major colors
    pub pixels: Vec<Rgb>,
    /// Row-major transparency mask
    pub mask: Vec<bool>,
}

impl PixelBlock {
    /// A block without masked pixels.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Self {
        let mask = vec![false; pixels.len()];
        Self {
            width,
            height,
            pixels,
            mask,
        }
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the block has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Colors of the unmasked pixels, in row-major order.
    pub fn visible(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixels
            .iter()
            .zip(&self.mask)
            .filter(|(_, masked)| !**masked)
            .map(|(&c, _)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Image {
        let pixels = (0..width * height)
            .map(|i| Rgb::new(i as u8, 0, 0))
            .collect();
        Image::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_pixel_count() {
        let err = Image::new(2, 2, vec![Rgb::BLACK; 3]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PixelCount {
                expected: 4,
                actual: 3
            }
        );
        let err = Image::with_mask(2, 1, vec![Rgb::BLACK; 2], vec![false]).unwrap_err();
        assert!(matches!(err, ConfigError::PixelCount { actual: 1, .. }));
    }

    #[test]
    fn test_block_and_with_block() {
        let image = gradient(4, 4);
        let rect = BlockRect::new(1, 1, 2, 2);
        let block = image.block(rect);
        assert_eq!(block.width, 2);
        assert_eq!(
            block.pixels,
            vec![
                Rgb::new(5, 0, 0),
                Rgb::new(6, 0, 0),
                Rgb::new(9, 0, 0),
                Rgb::new(10, 0, 0)
            ]
        );

        let white = Rgb::new(255, 255, 255);
        let replaced = image.with_block(rect, &[white; 4]);
        assert_eq!(replaced.pixel(1, 1), white);
        assert_eq!(replaced.pixel(2, 2), white);
        assert_eq!(replaced.pixel(0, 0), Rgb::new(0, 0, 0));
        // source untouched
        assert_eq!(image.pixel(1, 1), Rgb::new(5, 0, 0));
    }

    #[test]
    fn test_mask_color_and_distinct() {
        let magenta = Rgb::new(255, 0, 255);
        let pixels = vec![magenta, Rgb::BLACK, magenta, Rgb::new(1, 2, 3)];
        let image = Image::new(2, 2, pixels).unwrap();
        assert_eq!(image.distinct_colors().len(), 3);

        let masked = image.mask_color(magenta);
        assert!(masked.is_transparent(0, 0));
        assert!(masked.is_transparent(0, 1));
        assert!(!masked.is_transparent(1, 0));
        assert!(masked.has_transparency());
        assert_eq!(masked.distinct_colors().len(), 2);

        assert!(!masked.without_mask().has_transparency());
    }

    #[test]
    fn test_from_source_copies_mask() {
        struct Checker;
        impl PixelSource for Checker {
            fn width(&self) -> usize {
                2
            }
            fn height(&self) -> usize {
                2
            }
            fn pixel(&self, x: usize, y: usize) -> Rgb {
                if (x + y) % 2 == 0 {
                    Rgb::BLACK
                } else {
                    Rgb::new(255, 255, 255)
                }
            }
            fn is_transparent(&self, x: usize, _y: usize) -> bool {
                x == 1
            }
        }

        let image = Image::from_source(&Checker);
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.pixel(1, 0), Rgb::new(255, 255, 255));
        assert_eq!(image.mask(), &[false, true, false, true]);
    }

    #[test]
    fn test_block_visible_skips_masked() {
        let block = PixelBlock {
            width: 2,
            height: 1,
            pixels: vec![Rgb::BLACK, Rgb::new(9, 9, 9)],
            mask: vec![true, false],
        };
        assert_eq!(block.visible().collect::<Vec<_>>(), vec![Rgb::new(9, 9, 9)]);
        assert_eq!(block.len(), 2);
    }
}
