//! Tile grid geometry

use crate::api::ConfigError;

/// Grid coordinate of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Tile row, counted from the top
    pub row: usize,
    /// Tile column, counted from the left
    pub column: usize,
}

/// A pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRect {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl BlockRect {
    /// Create a rectangle.
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Regular grid of equally sized tiles covering an image.
///
/// # Example
///
/// ```
/// use tilequant_core::{TileCoord, TileGrid};
///
/// let grid = TileGrid::new(32, 16, 8, 8).unwrap();
/// assert_eq!((grid.columns(), grid.rows()), (4, 2));
/// assert_eq!(grid.tile_index(TileCoord { row: 1, column: 2 }), 6);
/// assert!(TileGrid::new(30, 16, 8, 8).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    image_width: usize,
    image_height: usize,
    tile_width: usize,
    tile_height: usize,
}

impl TileGrid {
    /// Build the grid, checking that tiles cover the image exactly.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroSize`] if any dimension is zero
    /// - [`ConfigError::NotDivisible`] if the image is not a whole number of
    ///   tiles in either direction
    pub fn new(
        image_width: usize,
        image_height: usize,
        tile_width: usize,
        tile_height: usize,
    ) -> Result<Self, ConfigError> {
        for (value, what) in [
            (image_width, "image width"),
            (image_height, "image height"),
            (tile_width, "tile width"),
            (tile_height, "tile height"),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroSize { what });
            }
        }
        if image_width % tile_width != 0 || image_height % tile_height != 0 {
            return Err(ConfigError::NotDivisible {
                image_width,
                image_height,
                tile_width,
                tile_height,
            });
        }
        Ok(Self {
            image_width,
            image_height,
            tile_width,
            tile_height,
        })
    }

    /// Tiles per row.
    #[inline]
    pub fn columns(&self) -> usize {
        self.image_width / self.tile_width
    }

    /// Tiles per column.
    #[inline]
    pub fn rows(&self) -> usize {
        self.image_height / self.tile_height
    }

    /// Total number of tiles.
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.columns() * self.rows()
    }

    /// `(tile_width, tile_height)`.
    #[inline]
    pub fn tile_size(&self) -> (usize, usize) {
        (self.tile_width, self.tile_height)
    }

    /// `(image_width, image_height)`.
    #[inline]
    pub fn image_size(&self) -> (usize, usize) {
        (self.image_width, self.image_height)
    }

    /// Row-major index of a tile.
    #[inline]
    pub fn tile_index(&self, coord: TileCoord) -> usize {
        coord.row * self.columns() + coord.column
    }

    /// Tile containing pixel `(x, y)`.
    #[inline]
    pub fn tile_of(&self, x: usize, y: usize) -> TileCoord {
        TileCoord {
            row: y / self.tile_height,
            column: x / self.tile_width,
        }
    }

    /// Pixel rectangle of a tile.
    pub fn tile_rect(&self, coord: TileCoord) -> BlockRect {
        BlockRect::new(
            coord.column * self.tile_width,
            coord.row * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// All tiles, rows outer and columns inner.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let columns = self.columns();
        (0..self.rows()).flat_map(move |row| (0..columns).map(move |column| TileCoord { row, column }))
    }

    /// Blocks of an arbitrary size in row-major order.
    ///
    /// Blocks on the right and bottom edge are clamped to the image, so they
    /// can be smaller than requested. A zero block dimension yields nothing.
    pub fn blocks(&self, block_width: usize, block_height: usize) -> impl Iterator<Item = BlockRect> {
        let (width, height) = (self.image_width, self.image_height);
        let (step_x, step_y) = (block_width.max(1), block_height.max(1));
        let empty = block_width == 0 || block_height == 0;
        (0..height)
            .step_by(step_y)
            .filter(move |_| !empty)
            .flat_map(move |y| {
                (0..width).step_by(step_x).map(move |x| {
                    BlockRect::new(x, y, step_x.min(width - x), step_y.min(height - y))
                })
            })
    }
}
