//! Error types for palette operations

use std::num::ParseIntError;

use thiserror::Error;

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Hex string has invalid length (must be 3 or 6 characters after stripping '#')
    #[error("invalid hex color length (expected 3 or 6 characters)")]
    InvalidLength,
    /// Invalid hexadecimal character encountered
    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
}

/// Error type for palette validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// The same color appears twice
    #[error("duplicate color {color} at index {index}")]
    DuplicateColor {
        /// Index where the duplicate was found
        index: usize,
        /// The repeated color, as hex
        color: String,
    },
    /// More colors than the palette can hold
    #[error("palette holds at most {capacity} entries, got {len}")]
    TooManyColors {
        /// Entries requested, including the transparent slot
        len: usize,
        /// Maximum number of entries
        capacity: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_error_messages() {
        assert_eq!(
            ParseColorError::InvalidLength.to_string(),
            "invalid hex color length (expected 3 or 6 characters)"
        );
        let err = u8::from_str_radix("zz", 16).unwrap_err();
        assert!(ParseColorError::from(err)
            .to_string()
            .starts_with("invalid hex character"));
    }

    #[test]
    fn test_palette_error_messages() {
        let err = PaletteError::DuplicateColor {
            index: 2,
            color: "#ff0000".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate color #ff0000 at index 2");

        let err = PaletteError::TooManyColors {
            len: 17,
            capacity: 16,
        };
        assert_eq!(err.to_string(), "palette holds at most 16 entries, got 17");
    }
}
