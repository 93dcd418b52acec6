//! Image file formats.

pub mod png;

pub use self::png::{decode, encode_indexed, optimize, DecodedImage};
