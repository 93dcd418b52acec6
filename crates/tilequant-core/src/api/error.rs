//! Error types for the tilequant-core public API.
//!
//! [`QuantizeError`] is what the entry points return. Per-attempt failures
//! ([`PartitionError`]) are absorbed by the search and only surface inside
//! [`QuantizeError::Infeasible`] once every budget has been tried, or
//! directly from [`simple_convert`](crate::simple_convert), which makes a
//! single attempt.

use std::time::Duration;

use thiserror::Error;

use crate::palette::{PaletteError, ParseColorError};

/// Invalid static configuration. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A dimension (image or tile) is zero
    #[error("{what} must be positive")]
    ZeroSize {
        /// Which dimension
        what: &'static str,
    },
    /// A count parameter is zero
    #[error("{what} must be at least 1")]
    ZeroCount {
        /// Which parameter
        what: &'static str,
    },
    /// Image dimensions are not a multiple of the tile size
    #[error(
        "image size {image_width}x{image_height} is not divisible by tile size {tile_width}x{tile_height}"
    )]
    NotDivisible {
        /// Image width in pixels
        image_width: usize,
        /// Image height in pixels
        image_height: usize,
        /// Tile width in pixels
        tile_width: usize,
        /// Tile height in pixels
        tile_height: usize,
    },
    /// Pixel buffer does not match the declared dimensions
    #[error("expected {expected} pixels, got {actual}")]
    PixelCount {
        /// `width * height`
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },
    /// Transparency needs a reserved slot plus at least one color
    #[error("transparency needs at least 2 colors per palette, got {colors_per_palette}")]
    TransparencyNeedsTwoColors {
        /// Configured colors per palette
        colors_per_palette: usize,
    },
    /// Start of the budget range lies above its end
    #[error("start colors {start} exceeds max colors {max}")]
    BudgetRange {
        /// First budget of the range
        start: usize,
        /// Last budget of the range
        max: usize,
    },
    /// Global palette indices would not fit the output index type
    #[error("{num_palettes} palettes of {colors_per_palette} colors exceed the addressable index range")]
    IndexOverflow {
        /// Configured palette count
        num_palettes: usize,
        /// Configured colors per palette
        colors_per_palette: usize,
    },
    /// A palette could not be built
    #[error(transparent)]
    Palette(#[from] PaletteError),
    /// A color string could not be parsed
    #[error(transparent)]
    ParseColor(#[from] ParseColorError),
}

/// Why a single partition attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// A tile uses more colors than any palette can hold
    #[error("tile {tile} uses {colors} colors but a palette holds at most {capacity}")]
    TileTooComplex {
        /// Row-major tile index
        tile: usize,
        /// Distinct non-transparent colors in the tile
        colors: usize,
        /// Usable entries per palette
        capacity: usize,
    },
    /// All palettes are open and none can absorb the tile
    #[error("tile {tile} does not fit into any of the {palettes} palettes")]
    PaletteBudgetExceeded {
        /// Row-major tile index of the first tile that did not fit
        tile: usize,
        /// Number of palettes available
        palettes: usize,
    },
}

/// Why a search was stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The wall-clock deadline passed
    Deadline(Duration),
    /// The maximum number of attempts was reached
    MaxAttempts(usize),
    /// The shared cancel flag was raised
    Requested,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Deadline(limit) => write!(f, "deadline of {:?} passed", limit),
            CancelReason::MaxAttempts(n) => write!(f, "attempt limit of {} reached", n),
            CancelReason::Requested => write!(f, "cancelled by caller"),
        }
    }
}

/// Error returned by [`quantize`](crate::quantize) and
/// [`simple_convert`](crate::simple_convert).
///
/// # Example
///
/// ```
/// use tilequant_core::{simple_convert, Image, QuantizeError, QuantizeOptions, Rgb};
///
/// // 8x8 image with 3 colors in its single tile, but palettes of 2 colors.
/// let mut pixels = vec![Rgb::new(0, 0, 0); 64];
/// pixels[1] = Rgb::new(255, 0, 0);
/// pixels[2] = Rgb::new(0, 255, 0);
/// let image = Image::new(8, 8, pixels).unwrap();
///
/// let options = QuantizeOptions::new(1, 2).no_transparency();
/// let err = simple_convert(&image, &options).unwrap_err();
/// assert!(matches!(err, QuantizeError::Partition(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A single partition attempt failed (only from `simple_convert`)
    #[error("image does not satisfy the tile palette constraint: {0}")]
    Partition(#[from] PartitionError),
    /// Every budget in the range was tried and none succeeded
    #[error("no color budget in {budgets:?} produced a valid tile palette layout; last failure: {last_failure}")]
    Infeasible {
        /// Budgets tried, in schedule order
        budgets: Vec<usize>,
        /// Failure of the last attempt in schedule order
        last_failure: PartitionError,
    },
    /// The search stopped before the range was exhausted
    #[error("search cancelled after {attempts} attempts: {reason}")]
    Cancelled {
        /// What stopped the search
        reason: CancelReason,
        /// Attempts completed before stopping
        attempts: usize,
    },
}
