#![allow(clippy::module_inception)]

//! tilequant-core: palette quantization under tile constraints
//!
//! Tile-based graphics hardware draws an image as a grid of fixed-size
//! tiles. Each tile picks one of a small number of palettes, and each
//! palette holds a small number of colors. This crate reduces a full-color
//! image until every tile can be drawn from one of those palettes.
//!
//! # Quick Start
//!
//! The [`TileQuantizer`] builder is the primary entry point:
//!
//! ```
//! use tilequant_core::{Image, QuantizeOptions, Rgb, TileQuantizer};
//!
//! let pixels = (0..16 * 16)
//!     .map(|i| Rgb::new((i % 16 * 16) as u8, (i / 16 * 16) as u8, 128))
//!     .collect();
//! let image = Image::new(16, 16, pixels).unwrap();
//!
//! let options = QuantizeOptions::new(4, 16).tile_size(8, 8);
//! let result = TileQuantizer::new(options).quantize(&image).unwrap();
//!
//! assert_eq!(result.image.palettes().len(), 4);
//! assert_eq!(result.image.tile_palettes().len(), 4);
//! ```
//!
//! For one-off calls the free functions [`quantize`] and [`simple_convert`]
//! do the same with the default [`MedianCut`] reducer.
//!
//! # Pipeline
//!
//! ```text
//! Image (RGB + transparency mask)
//!     |
//!     v
//! [Transparency::prepare]   (mask pixels, reserve palette slot 0)
//!     |
//!     v
//! [MosaicLimiter]           (cap colors per tile, then per 2x2, 4x4, ...
//!     |                      blocks of tiles, once per search)
//!     v
//! ╔══════════════════════════════════════════╗
//! ║  SearchDriver (one attempt per budget)   ║
//! ║                                          ║
//! ║  ColorReducer::reduce(image, budget)     ║
//! ║      |                                   ║
//! ║      v                                   ║
//! ║  TilePartitioner::partition              ║
//! ║      |                                   ║
//! ║      +--> Ok  -> stop, keep result       ║
//! ║      +--> Err -> next budget             ║
//! ╚══════════════════════════════════════════╝
//!     |
//!     v
//! [Transparency::finalize]  (pad palettes, insert marker)
//!     |
//!     v
//! IndexedImage (u16 global indices + N palettes)
//! ```
//!
//! # Search
//!
//! Budgets run from `start_colors` to `max_colors` in steps of
//! `color_steps`, ascending by default. Each attempt is a pure function of
//! the conditioned image and the budget, so attempts can be evaluated in
//! parallel windows ([`QuantizeOptions::parallelism`]) while still returning
//! the first success in schedule order.
//!
//! # Color Reducers
//!
//! Any type implementing [`ColorReducer`] can replace the built-in
//! [`MedianCut`]. The search and the partitioner only rely on the reducer
//! returning at most `target` colors and mapping every unmasked pixel to one
//! of them.

pub mod api;
pub mod color;
pub mod dither;
pub mod image;
pub mod mosaic;
pub mod output;
pub mod palette;
pub mod partition;
pub mod reduce;
pub mod search;
pub mod transparency;


pub use api::{
    quantize, simple_convert, CancelReason, ConfigError, PartitionError, QuantizeError,
    QuantizeOptions, TileQuantizer,
};
pub use color::Rgb;
pub use dither::Kernel;
pub use image::{BlockRect, Image, PixelBlock, PixelSource, TileCoord, TileGrid};
pub use mosaic::{MosaicLimiter, MosaicStage};
pub use output::{IndexedImage, Quantized};
pub use palette::{Palette, PaletteError, ParseColorError};
pub use partition::{Partition, PaletteAssignment, TilePartitioner};
pub use reduce::{ColorReducer, DitherMode, MedianCut, Reduction};
pub use search::{BudgetSchedule, Budgets, Direction, SearchDriver, SearchOutcome, StopCondition};
pub use transparency::Transparency;
