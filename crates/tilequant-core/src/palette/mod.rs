//! Palette types and utilities
//!
//! This module provides the finalized [`Palette`] emitted for each group of
//! tiles, together with the error types for color parsing and palette
//! validation.

mod error;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use palette::Palette;
