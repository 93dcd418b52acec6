//! Output types.

mod indexed_image;

pub use indexed_image::IndexedImage;

/// Result of [`quantize`](crate::quantize) or
/// [`simple_convert`](crate::simple_convert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    /// The indexed image and its palettes
    pub image: IndexedImage,
    /// Total color budget of the successful attempt
    pub color_budget: usize,
    /// Attempts evaluated to get there
    pub attempts: usize,
}
