//! TileQuantizer builder -- the primary entry point for the crate.
//!
//! [`QuantizeOptions`] collects every tunable of a run with the defaults of
//! the classic 8x8 tile layout. [`TileQuantizer`] pairs the options with a
//! [`ColorReducer`] and runs either the full search or the plain palette
//! extraction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::error::{ConfigError, QuantizeError};
use crate::color::Rgb;
use crate::image::{Image, TileGrid};
use crate::mosaic::MosaicLimiter;
use crate::output::{IndexedImage, Quantized};
use crate::partition::TilePartitioner;
use crate::reduce::{ColorReducer, DitherMode, MedianCut};
use crate::search::{BudgetSchedule, Direction, SearchDriver, StopCondition};
use crate::transparency::Transparency;

/// Default lower end of the budget range.
const DEFAULT_START_COLORS: usize = 4;
/// Default step between budgets.
const DEFAULT_COLOR_STEPS: usize = 4;

/// Options for a quantization run.
///
/// Only the palette layout is required; everything else has a default.
///
/// # Example
///
/// ```
/// use tilequant_core::{Direction, DitherMode, QuantizeOptions, Rgb};
///
/// let options = QuantizeOptions::new(16, 16)
///     .tile_size(8, 8)
///     .transparent_color(Rgb::new(255, 0, 255))
///     .color_limit_per_tile(15)
///     .direction(Direction::Descending)
///     .dither(DitherMode::FloydSteinberg);
///
/// assert_eq!(options.num_palettes(), 16);
/// assert_eq!(options.max_colors_or_default(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct QuantizeOptions {
    tile_width: usize,
    tile_height: usize,
    num_palettes: usize,
    colors_per_palette: usize,
    transparency: Transparency,
    color_limit_per_tile: Option<usize>,
    mosaic_limiting: bool,
    start_colors: Option<usize>,
    max_colors: Option<usize>,
    color_steps: usize,
    direction: Direction,
    dither: DitherMode,
    parallelism: usize,
    stop: StopCondition,
}

/// Validated settings derived from options and an image.
#[derive(Debug)]
struct Resolved {
    grid: TileGrid,
    partitioner: TilePartitioner,
}

impl QuantizeOptions {
    /// `num_palettes` palettes of `colors_per_palette` entries on 8x8 tiles,
    /// no transparency, mosaic limiting on, ascending search.
    pub fn new(num_palettes: usize, colors_per_palette: usize) -> Self {
        Self {
            tile_width: 8,
            tile_height: 8,
            num_palettes,
            colors_per_palette,
            transparency: Transparency::Disabled,
            color_limit_per_tile: None,
            mosaic_limiting: true,
            start_colors: None,
            max_colors: None,
            color_steps: DEFAULT_COLOR_STEPS,
            direction: Direction::Ascending,
            dither: DitherMode::None,
            parallelism: 1,
            stop: StopCondition::default(),
        }
    }

    /// Tile size in pixels.
    #[inline]
    pub fn tile_size(mut self, width: usize, height: usize) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    /// Transparency policy.
    #[inline]
    pub fn transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = transparency;
        self
    }

    /// Shorthand for [`Transparency::Color`].
    #[inline]
    pub fn transparent_color(self, color: Rgb) -> Self {
        self.transparency(Transparency::Color(color))
    }

    /// Shorthand for [`Transparency::Disabled`].
    #[inline]
    pub fn no_transparency(self) -> Self {
        self.transparency(Transparency::Disabled)
    }

    /// Colors each tile is reduced to before the search. Defaults to the
    /// usable entries per palette, `colors_per_palette` minus the
    /// transparent slot.
    #[inline]
    pub fn color_limit_per_tile(mut self, limit: usize) -> Self {
        self.color_limit_per_tile = Some(limit);
        self
    }

    /// Enable or disable the mosaic stages above tile size.
    #[inline]
    pub fn mosaic_limiting(mut self, enabled: bool) -> Self {
        self.mosaic_limiting = enabled;
        self
    }

    /// Lowest budget tried. Defaults to 4, or `max_colors` if smaller.
    #[inline]
    pub fn start_colors(mut self, colors: usize) -> Self {
        self.start_colors = Some(colors);
        self
    }

    /// Highest budget tried. Defaults to `num_palettes * colors_per_palette`.
    #[inline]
    pub fn max_colors(mut self, colors: usize) -> Self {
        self.max_colors = Some(colors);
        self
    }

    /// Distance between budgets. Defaults to 4.
    #[inline]
    pub fn color_steps(mut self, steps: usize) -> Self {
        self.color_steps = steps;
        self
    }

    /// Search direction.
    #[inline]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Dithering for every reduction.
    #[inline]
    pub fn dither(mut self, dither: DitherMode) -> Self {
        self.dither = dither;
        self
    }

    /// Budgets evaluated at once on the rayon pool. Defaults to 1.
    #[inline]
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Stop conditions for the search.
    #[inline]
    pub fn stop(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// Shorthand for a deadline stop condition.
    #[inline]
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.stop = self.stop.deadline(limit);
        self
    }

    /// Configured palette count.
    pub fn num_palettes(&self) -> usize {
        self.num_palettes
    }

    /// Configured entries per palette.
    pub fn colors_per_palette(&self) -> usize {
        self.colors_per_palette
    }

    /// Configured tile size.
    pub fn tile_dimensions(&self) -> (usize, usize) {
        (self.tile_width, self.tile_height)
    }

    /// Configured transparency policy.
    pub fn transparency_policy(&self) -> Transparency {
        self.transparency
    }

    /// Effective upper budget.
    pub fn max_colors_or_default(&self) -> usize {
        self.max_colors
            .unwrap_or(self.num_palettes.saturating_mul(self.colors_per_palette))
    }

    /// Effective lower budget.
    pub fn start_colors_or_default(&self) -> usize {
        self.start_colors
            .unwrap_or_else(|| DEFAULT_START_COLORS.min(self.max_colors_or_default()))
    }

    /// Effective per-tile color limit.
    pub fn color_limit_or_default(&self) -> usize {
        self.color_limit_per_tile.unwrap_or_else(|| {
            self.colors_per_palette
                .saturating_sub(self.transparency.reserved_slots())
        })
    }

    /// The budget schedule these options describe.
    pub fn schedule(&self) -> Result<BudgetSchedule, ConfigError> {
        BudgetSchedule::new(
            self.start_colors_or_default(),
            self.max_colors_or_default(),
            self.color_steps,
            self.direction,
        )
    }

    /// Check everything that does not depend on the budget range.
    fn resolve(&self, image: &Image) -> Result<Resolved, ConfigError> {
        if self.num_palettes == 0 {
            return Err(ConfigError::ZeroCount {
                what: "num_palettes",
            });
        }
        if self.colors_per_palette == 0 {
            return Err(ConfigError::ZeroCount {
                what: "colors_per_palette",
            });
        }
        if self.color_limit_per_tile == Some(0) {
            return Err(ConfigError::ZeroCount {
                what: "color_limit_per_tile",
            });
        }
        if self.num_palettes.saturating_mul(self.colors_per_palette) > usize::from(u16::MAX) + 1 {
            return Err(ConfigError::IndexOverflow {
                num_palettes: self.num_palettes,
                colors_per_palette: self.colors_per_palette,
            });
        }
        self.transparency.validate(self.colors_per_palette)?;

        let (width, height) = image.dimensions();
        let grid = TileGrid::new(width, height, self.tile_width, self.tile_height)?;
        let partitioner = TilePartitioner::new(
            grid,
            self.num_palettes,
            self.colors_per_palette,
            self.transparency.reserved_slots(),
        );
        Ok(Resolved { grid, partitioner })
    }
}

/// High-level tile quantizer.
///
/// Holds [`QuantizeOptions`] and the [`ColorReducer`] used for every
/// reduction. Both entry points take `&self`, so one quantizer can process
/// many images.
///
/// # Example
///
/// ```
/// use tilequant_core::{Image, MedianCut, QuantizeOptions, Rgb, TileQuantizer};
///
/// let colors = [
///     Rgb::new(0, 0, 0),
///     Rgb::new(255, 0, 0),
///     Rgb::new(0, 255, 0),
///     Rgb::new(0, 0, 255),
/// ];
/// let pixels = (0..256).map(|i| colors[i % 4]).collect();
/// let image = Image::new(16, 16, pixels).unwrap();
///
/// let quantizer = TileQuantizer::new(QuantizeOptions::new(1, 4)).reducer(MedianCut);
/// let result = quantizer.quantize(&image).unwrap();
///
/// assert_eq!(result.color_budget, 4);
/// assert_eq!(result.image.tile_palettes(), &[0, 0, 0, 0]);
/// ```
#[derive(Clone)]
pub struct TileQuantizer {
    options: QuantizeOptions,
    reducer: Arc<dyn ColorReducer>,
}

impl std::fmt::Debug for TileQuantizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileQuantizer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TileQuantizer {
    /// A quantizer using [`MedianCut`].
    pub fn new(options: QuantizeOptions) -> Self {
        Self {
            options,
            reducer: Arc::new(MedianCut),
        }
    }

    /// Replace the color reducer.
    pub fn reducer<R: ColorReducer + 'static>(mut self, reducer: R) -> Self {
        self.reducer = Arc::new(reducer);
        self
    }

    /// The options this quantizer runs with.
    pub fn options(&self) -> &QuantizeOptions {
        &self.options
    }

    /// Run the full search.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::Config`] for invalid options or image geometry
    /// - [`QuantizeError::Infeasible`] if no budget produced a valid layout
    /// - [`QuantizeError::Cancelled`] if a stop condition tripped first
    pub fn quantize(&self, image: &Image) -> Result<Quantized, QuantizeError> {
        let opts = &self.options;
        let Resolved { grid, partitioner } = opts.resolve(image)?;
        let schedule = opts.schedule()?;

        info!(
            width = image.width(),
            height = image.height(),
            tiles = grid.tile_count(),
            num_palettes = opts.num_palettes,
            colors_per_palette = opts.colors_per_palette,
            transparency = ?opts.transparency,
            "quantizing"
        );

        let started = Instant::now();
        let prepared = opts.transparency.prepare(image);
        let conditioned = MosaicLimiter::new(grid, opts.color_limit_or_default())
            .enabled(opts.mosaic_limiting)
            .apply_until(
                &prepared,
                self.reducer.as_ref(),
                opts.dither,
                &opts.stop,
                started,
            )
            .map_err(|reason| {
                warn!(%reason, "cancelled during mosaic limiting");
                QuantizeError::Cancelled {
                    reason,
                    attempts: 0,
                }
            })?;

        let outcome = SearchDriver::new(self.reducer.as_ref(), partitioner, schedule)
            .dither(opts.dither)
            .parallelism(opts.parallelism)
            .stop(opts.stop.clone())
            .run_since(&conditioned, started)?;

        let palettes = opts.transparency.finalize(
            &outcome.partition.palettes,
            opts.num_palettes,
            opts.colors_per_palette,
        )?;
        let indexed = IndexedImage::build(
            &outcome.image,
            &grid,
            &outcome.partition,
            palettes,
            opts.colors_per_palette,
        );
        Ok(Quantized {
            image: indexed,
            color_budget: outcome.budget,
            attempts: outcome.attempts,
        })
    }

    /// Extract palettes from an image that already satisfies the tile
    /// constraint, without reducing any colors.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::Config`] for invalid options or image geometry
    /// - [`QuantizeError::Partition`] if the image does not fit
    pub fn simple_convert(&self, image: &Image) -> Result<Quantized, QuantizeError> {
        let opts = &self.options;
        let Resolved { grid, partitioner } = opts.resolve(image)?;

        let prepared = opts.transparency.prepare(image);
        let partition = partitioner.partition(&prepared)?;
        info!(
            colors = prepared.distinct_colors().len(),
            palettes = partition.palettes.len(),
            "image already fits"
        );

        let palettes = opts.transparency.finalize(
            &partition.palettes,
            opts.num_palettes,
            opts.colors_per_palette,
        )?;
        let indexed = IndexedImage::build(
            &prepared,
            &grid,
            &partition,
            palettes,
            opts.colors_per_palette,
        );
        Ok(Quantized {
            image: indexed,
            color_budget: prepared.distinct_colors().len(),
            attempts: 1,
        })
    }
}
