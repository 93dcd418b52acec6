//! 8-bit RGB color type

use std::fmt;
use std::str::FromStr;

use crate::palette::ParseColorError;

/// An opaque 8-bit RGB color.
///
/// `Rgb` orders by `(r, g, b)`, which gives palettes and histograms a
/// stable, reproducible iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgb {
    /// Red channel (0..=255)
    pub r: u8,
    /// Green channel (0..=255)
    pub g: u8,
    /// Blue channel (0..=255)
    pub b: u8,
}

impl Rgb {
    /// Black, used to pad unused palette entries.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array `[R, G, B]`.
    ///
    /// # Example
    /// ```
    /// use tilequant_core::Rgb;
    /// assert_eq!(Rgb::from_bytes([1, 2, 3]), Rgb::new(1, 2, 3));
    /// ```
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array `[R, G, B]`.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as floats, for error diffusion arithmetic.
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Squared Euclidean distance in RGB space.
    #[inline]
    pub fn distance_squared(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a color from a hex string.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`, case-insensitive,
    /// with surrounding whitespace trimmed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(ParseColorError::InvalidLength);
        }

        match s.len() {
            3 => {
                // 0xF -> 0xFF
                let r = u8::from_str_radix(&s[0..1], 16)? * 17;
                let g = u8::from_str_radix(&s[1..2], 16)? * 17;
                let b = u8::from_str_radix(&s[2..3], 16)? * 17;
                Ok(Self::new(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16)?;
                let g = u8::from_str_radix(&s[2..4], 16)?;
                let b = u8::from_str_radix(&s[4..6], 16)?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing_6digit() {
        let magenta: Rgb = "#FF00FF".parse().unwrap();
        assert_eq!(magenta, Rgb::new(255, 0, 255));

        let no_hash: Rgb = "12ab56".parse().unwrap();
        assert_eq!(no_hash, Rgb::new(0x12, 0xab, 0x56));
    }

    #[test]
    fn test_hex_parsing_shorthand() {
        let color: Rgb = "#ABC".parse().unwrap();
        assert_eq!(color, Rgb::new(0xAA, 0xBB, 0xCC));

        let red: Rgb = "f00".parse().unwrap();
        assert_eq!(red, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_hex_parsing_errors() {
        assert!(matches!(
            "#GGG".parse::<Rgb>(),
            Err(ParseColorError::InvalidHex(_))
        ));
        assert!(matches!(
            "#FFFF".parse::<Rgb>(),
            Err(ParseColorError::InvalidLength)
        ));
        assert!(matches!("".parse::<Rgb>(), Err(ParseColorError::InvalidLength)));
        assert!(matches!("#".parse::<Rgb>(), Err(ParseColorError::InvalidLength)));
        // Multi-byte characters must not panic on slicing
        assert!("#ééé".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_hex_parsing_whitespace_and_case() {
        let upper: Rgb = "  #ABCDEF ".parse().unwrap();
        let lower: Rgb = "#abcdef".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_display_round_trips() {
        let color = Rgb::new(0x0a, 0xff, 0x10);
        assert_eq!(color.to_string(), "#0aff10");
        assert_eq!(color.to_string().parse::<Rgb>().unwrap(), color);
    }

    #[test]
    fn test_distance_squared() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(3, 4, 0);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
        assert_eq!(a.distance_squared(a), 0);
    }
}
