//! Public API for the tilequant-core crate.
//!
//! [`TileQuantizer`] and [`QuantizeOptions`] form the builder API. The free
//! functions [`quantize`] and [`simple_convert`] run it once with the
//! default [`MedianCut`](crate::MedianCut) reducer.

mod builder;
mod error;

pub use builder::{QuantizeOptions, TileQuantizer};
pub use error::{CancelReason, ConfigError, PartitionError, QuantizeError};

use crate::image::Image;
use crate::output::Quantized;

/// Search for a color budget at which every tile fits one of the palettes.
///
/// Runs transparency masking, mosaic limiting, the budget search and the
/// final palette layout. See [`TileQuantizer::quantize`].
pub fn quantize(image: &Image, options: &QuantizeOptions) -> Result<Quantized, QuantizeError> {
    TileQuantizer::new(options.clone()).quantize(image)
}

/// Extract tile palettes from an image that already fits, without reducing
/// any colors. See [`TileQuantizer::simple_convert`].
pub fn simple_convert(image: &Image, options: &QuantizeOptions) -> Result<Quantized, QuantizeError> {
    TileQuantizer::new(options.clone()).simple_convert(image)
}
