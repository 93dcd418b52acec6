//! Color type used throughout the quantizer.
//!
//! Colors are exact 8-bit RGB triples. Equality is exact-value equality:
//! once an image has been quantized, two pixels share a palette slot only
//! if their bytes match.
//!
//! # Example
//!
//! ```
//! use tilequant_core::Rgb;
//!
//! let magenta: Rgb = "#FF00FF".parse().unwrap();
//! assert_eq!(magenta, Rgb::new(255, 0, 255));
//! assert_eq!(magenta.to_string(), "#ff00ff");
//! ```

mod rgb;

pub use rgb::Rgb;
