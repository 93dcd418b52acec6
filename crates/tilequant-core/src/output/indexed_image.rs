//! The indexed result of a successful quantization.

use crate::color::Rgb;
use crate::dither::nearest_index;
use crate::image::{Image, TileGrid};
use crate::palette::Palette;
use crate::partition::Partition;

/// An image whose pixels index into a set of tile palettes.
///
/// Pixel values are global indices `palette * colors_per_palette + local`,
/// so the image can be written as a single indexed bitmap whose color table
/// is [`flat_palette`](Self::flat_palette). Every pixel of a tile uses the
/// same palette.
///
/// # Example
///
/// ```
/// use tilequant_core::{simple_convert, Image, QuantizeOptions, Rgb};
///
/// let red = Rgb::new(255, 0, 0);
/// let image = Image::new(8, 8, vec![red; 64]).unwrap();
/// let options = QuantizeOptions::new(2, 4);
/// let result = simple_convert(&image, &options).unwrap();
///
/// let indexed = &result.image;
/// assert_eq!(indexed.flat_palette().len(), 8);
/// assert_eq!(indexed.color_at(3, 3), red);
/// assert_eq!(indexed.tile_palettes(), &[0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: usize,
    height: usize,
    colors_per_palette: usize,
    indices: Vec<u16>,
    palettes: Vec<Palette>,
    tile_palettes: Vec<usize>,
    transparent: bool,
}

impl IndexedImage {
    /// Index `image` against the finalized palettes of `partition`.
    ///
    /// Transparent pixels take local index 0 of their tile's palette when it
    /// has a transparent slot. Any other pixel takes the entry of its color;
    /// colors missing from the palette, which a successful partition rules
    /// out, fall back to the nearest real color.
    pub(crate) fn build(
        image: &Image,
        grid: &TileGrid,
        partition: &Partition,
        palettes: Vec<Palette>,
        colors_per_palette: usize,
    ) -> Self {
        let (width, height) = image.dimensions();
        let transparent = palettes.first().is_some_and(|p| p.transparent().is_some());
        let mut indices = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let tile = grid.tile_index(grid.tile_of(x, y));
                let number = partition.assignment[tile];
                let palette = &palettes[number];
                let offset = usize::from(palette.transparent().is_some());

                let local = if image.is_transparent(x, y) && offset == 1 {
                    0
                } else {
                    let color = image.pixel(x, y);
                    palette
                        .index_of(color)
                        .or_else(|| nearest_index(palette.colors(), color).map(|i| i + offset))
                        .unwrap_or(offset)
                };
                indices.push((number * colors_per_palette + local) as u16);
            }
        }

        Self {
            width,
            height,
            colors_per_palette,
            indices,
            palettes,
            tile_palettes: partition.assignment.clone(),
            transparent,
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Entries per palette.
    #[inline]
    pub fn colors_per_palette(&self) -> usize {
        self.colors_per_palette
    }

    /// Row-major global indices.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Global index of the pixel at `(x, y)`.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> u16 {
        self.indices[y * self.width + x]
    }

    /// The palettes, unused ones included.
    #[inline]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Palette number of every tile in row-major order.
    #[inline]
    pub fn tile_palettes(&self) -> &[usize] {
        &self.tile_palettes
    }

    /// Whether slot 0 of every palette is the transparency marker.
    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.transparent
    }

    /// All palettes concatenated, each padded with black to
    /// `colors_per_palette` entries.
    pub fn flat_palette(&self) -> Vec<Rgb> {
        self.palettes
            .iter()
            .flat_map(|p| p.padded(self.colors_per_palette))
            .collect()
    }

    /// Global indices that are transparent slots.
    pub fn transparent_indices(&self) -> Vec<u16> {
        if !self.transparent {
            return Vec::new();
        }
        (0..self.palettes.len())
            .map(|p| (p * self.colors_per_palette) as u16)
            .collect()
    }

    /// Whether the pixel at `(x, y)` uses a transparent slot.
    pub fn is_transparent_at(&self, x: usize, y: usize) -> bool {
        self.transparent && self.index_at(x, y) as usize % self.colors_per_palette == 0
    }

    /// Color of the pixel at `(x, y)`. Transparent pixels report the marker.
    pub fn color_at(&self, x: usize, y: usize) -> Rgb {
        self.lookup(self.index_at(x, y))
    }

    /// Decode every pixel back to its color.
    pub fn to_rgb(&self) -> Vec<Rgb> {
        let flat = self.flat_palette();
        self.indices
            .iter()
            .map(|&i| flat.get(i as usize).copied().unwrap_or(Rgb::BLACK))
            .collect()
    }

    fn lookup(&self, index: u16) -> Rgb {
        let number = index as usize / self.colors_per_palette;
        let local = index as usize % self.colors_per_palette;
        self.palettes
            .get(number)
            .and_then(|p| p.entries().get(local).copied())
            .unwrap_or(Rgb::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transparency::Transparency;

    const MAGENTA: Rgb = Rgb::new(255, 0, 255);

    fn rgb(v: u8) -> Rgb {
        Rgb::new(v, v, v)
    }

    /// 4x2 image, two 2x2 tiles, with a transparent pixel in tile 1.
    fn build(transparency: Transparency) -> IndexedImage {
        let pixels = vec![rgb(1), rgb(2), rgb(3), MAGENTA, rgb(2), rgb(1), rgb(3), rgb(3)];
        let image = transparency.prepare(&Image::new(4, 2, pixels).unwrap());
        let grid = TileGrid::new(4, 2, 2, 2).unwrap();
        let partition = Partition {
            palettes: vec![vec![rgb(1), rgb(2)], vec![rgb(3)]],
            assignment: vec![0, 1],
        };
        let palettes = transparency.finalize(&partition.palettes, 3, 4).unwrap();
        IndexedImage::build(&image, &grid, &partition, palettes, 4)
    }

    #[test]
    fn test_global_indices_with_transparency() {
        let out = build(Transparency::Color(MAGENTA));
        assert_eq!(out.indices(), &[1, 2, 5, 4, 2, 1, 5, 5]);
        assert!(out.is_transparent_at(3, 0));
        assert!(!out.is_transparent_at(0, 0));
        assert_eq!(out.transparent_indices(), vec![0, 4, 8]);
        assert_eq!(out.color_at(3, 0), MAGENTA);
        assert_eq!(out.tile_palettes(), &[0, 1]);
    }

    #[test]
    fn test_flat_palette_is_padded() {
        let out = build(Transparency::Color(MAGENTA));
        let flat = out.flat_palette();
        assert_eq!(flat.len(), 12);
        assert_eq!(&flat[0..4], &[MAGENTA, rgb(1), rgb(2), Rgb::BLACK]);
        assert_eq!(&flat[8..12], &[MAGENTA, Rgb::BLACK, Rgb::BLACK, Rgb::BLACK]);
    }

    #[test]
    fn test_without_transparency_missing_color_maps_to_nearest() {
        let out = build(Transparency::Disabled);
        assert!(!out.has_transparency());
        assert!(out.transparent_indices().is_empty());
        // magenta is not in palette 1, which only holds rgb(3)
        assert_eq!(out.index_at(3, 0), 4);
        assert_eq!(out.indices(), &[0, 1, 4, 4, 1, 0, 4, 4]);
    }

    #[test]
    fn test_to_rgb_round_trip() {
        let out = build(Transparency::Color(MAGENTA));
        let colors = out.to_rgb();
        assert_eq!(
            colors,
            vec![rgb(1), rgb(2), rgb(3), MAGENTA, rgb(2), rgb(1), rgb(3), rgb(3)]
        );
    }
}
