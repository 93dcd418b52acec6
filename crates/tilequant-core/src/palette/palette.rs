//! Finalized sub-palette with an optional transparent slot.
//!
//! A [`Palette`] is the unit of color a tile can address. Its ordering is
//! significant: when transparency is enabled, entry 0 is the transparency
//! marker and the real colors follow from entry 1; otherwise entry 0 is an
//! ordinary color.

use std::collections::HashSet;

use super::error::PaletteError;
use crate::color::Rgb;

/// An ordered set of distinct colors, optionally led by a transparent slot.
///
/// # Example
///
/// ```
/// use tilequant_core::{Palette, Rgb};
///
/// let colors = [Rgb::new(10, 10, 10), Rgb::new(200, 0, 0)];
/// let palette = Palette::new(&colors, Some(Rgb::new(255, 0, 255)), 4).unwrap();
///
/// assert_eq!(palette.len(), 3);
/// assert!(palette.is_transparent_slot(0));
/// assert_eq!(palette.index_of(Rgb::new(200, 0, 0)), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
    transparent: Option<Rgb>,
}

impl Palette {
    /// Create a palette from distinct colors.
    ///
    /// `transparent` reserves entry 0 for the given marker color. The marker
    /// does not take part in the distinctness check: a real color may share
    /// its value and still be addressed through its own entry.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::DuplicateColor`] if a color repeats
    /// - [`PaletteError::TooManyColors`] if the entries exceed `capacity`
    pub fn new(
        colors: &[Rgb],
        transparent: Option<Rgb>,
        capacity: usize,
    ) -> Result<Self, PaletteError> {
        let len = colors.len() + usize::from(transparent.is_some());
        if len > capacity {
            return Err(PaletteError::TooManyColors { len, capacity });
        }

        let mut seen = HashSet::with_capacity(colors.len());
        for (i, &color) in colors.iter().enumerate() {
            if !seen.insert(color) {
                return Err(PaletteError::DuplicateColor {
                    index: i,
                    color: color.to_string(),
                });
            }
        }

        Ok(Self {
            colors: colors.to_vec(),
            transparent,
        })
    }

    /// A palette with no real colors, used for unused palette slots.
    pub fn empty(transparent: Option<Rgb>) -> Self {
        Self {
            colors: Vec::new(),
            transparent,
        }
    }

    /// Number of entries, including the transparent slot.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len() + self.offset()
    }

    /// Returns true if the palette has no entries at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The real (non-marker) colors in order.
    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// The transparency marker color, if entry 0 is reserved.
    #[inline]
    pub fn transparent(&self) -> Option<Rgb> {
        self.transparent
    }

    /// Whether entry `index` is the transparent slot.
    #[inline]
    pub fn is_transparent_slot(&self, index: usize) -> bool {
        index == 0 && self.transparent.is_some()
    }

    /// All entries in order, the transparent marker first when present.
    pub fn entries(&self) -> Vec<Rgb> {
        self.transparent
            .into_iter()
            .chain(self.colors.iter().copied())
            .collect()
    }

    /// Entry index of a real color.
    ///
    /// Never returns the transparent slot, even when `color` equals the
    /// marker value.
    pub fn index_of(&self, color: Rgb) -> Option<usize> {
        self.colors
            .iter()
            .position(|&c| c == color)
            .map(|i| i + self.offset())
    }

    /// Whether every color in `colors` is a real color of this palette.
    pub fn contains_all<'a>(&self, colors: impl IntoIterator<Item = &'a Rgb>) -> bool {
        colors.into_iter().all(|c| self.colors.contains(c))
    }

    /// Entries padded with black to exactly `size` entries.
    ///
    /// Entries beyond `size` are dropped, which cannot happen for palettes
    /// built with `capacity <= size`.
    pub fn padded(&self, size: usize) -> Vec<Rgb> {
        let mut entries = self.entries();
        entries.resize(size, Rgb::BLACK);
        entries
    }

    #[inline]
    fn offset(&self) -> usize {
        usize::from(self.transparent.is_some())
    }
}
