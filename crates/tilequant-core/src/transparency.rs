//! Transparency handling around the search.
//!
//! Before the search, [`Transparency::prepare`] decides which pixels are
//! transparent. Those pixels are masked out of every reduction and every
//! tile color set, so they never count against a budget. After a
//! successful partition, [`Transparency::finalize`] puts the marker into
//! slot 0 of every palette, and the output maps transparent pixels to that
//! slot.

use tracing::debug;

use crate::api::ConfigError;
use crate::color::Rgb;
use crate::image::Image;
use crate::palette::Palette;

/// Where transparent pixels come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transparency {
    /// No transparency. Source flags are ignored and no slot is reserved.
    #[default]
    Disabled,
    /// Use the transparency flags of the source image. The marker is black.
    FromSource,
    /// Pixels exactly equal to this color are transparent, in addition to
    /// any flagged by the source. The color doubles as the marker.
    Color(Rgb),
}

impl Transparency {
    /// Whether a palette slot is reserved.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Transparency::Disabled)
    }

    /// Number of palette entries reserved for the marker: 0 or 1.
    #[inline]
    pub fn reserved_slots(&self) -> usize {
        usize::from(self.is_enabled())
    }

    /// Color written to slot 0 of every palette.
    pub fn marker(&self) -> Option<Rgb> {
        match self {
            Transparency::Disabled => None,
            Transparency::FromSource => Some(Rgb::BLACK),
            Transparency::Color(color) => Some(*color),
        }
    }

    /// Check that palettes have room for the marker and a real color.
    pub fn validate(&self, colors_per_palette: usize) -> Result<(), ConfigError> {
        if self.is_enabled() && colors_per_palette < 2 {
            return Err(ConfigError::TransparencyNeedsTwoColors { colors_per_palette });
        }
        Ok(())
    }

    /// The image with its mask set according to this policy.
    pub fn prepare(&self, image: &Image) -> Image {
        let prepared = match self {
            Transparency::Disabled => image.without_mask(),
            Transparency::FromSource => image.clone(),
            Transparency::Color(color) => image.mask_color(*color),
        };
        if self.is_enabled() {
            let transparent = prepared.mask().iter().filter(|&&m| m).count();
            debug!(transparent, marker = ?self.marker(), "transparency prepared");
        }
        prepared
    }

    /// Turn partitioned color groups into exactly `num_palettes` palettes.
    ///
    /// Each group keeps its order after the reserved slot. Missing palettes
    /// are filled with empty ones that still carry the marker.
    pub fn finalize(
        &self,
        groups: &[Vec<Rgb>],
        num_palettes: usize,
        colors_per_palette: usize,
    ) -> Result<Vec<Palette>, ConfigError> {
        let marker = self.marker();
        let mut palettes = groups
            .iter()
            .map(|colors| Palette::new(colors, marker, colors_per_palette))
            .collect::<Result<Vec<_>, _>>()?;
        palettes.resize_with(num_palettes.max(palettes.len()), || Palette::empty(marker));
        Ok(palettes)
    }
}
