//! Hierarchical pre-reduction of local color diversity.
//!
//! Stage 0 reduces every tile to `color_limit` colors. With mosaic limiting
//! enabled, each further stage doubles the block size and the color limit
//! and reduces the output of the previous stage again, as long as the
//! doubled block is still smaller than the image in both directions. The
//! full-image reduction is left to the search.

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::api::CancelReason;
use crate::color::Rgb;
use crate::image::{BlockRect, Image, TileGrid};
use crate::reduce::{ColorReducer, DitherMode};
use crate::search::StopCondition;

/// One reduction pass over blocks of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicStage {
    /// Block width in pixels
    pub block_width: usize,
    /// Block height in pixels
    pub block_height: usize,
    /// Maximum colors per block
    pub colors: usize,
}

/// Applies per-block color limits at increasing block sizes.
#[derive(Debug, Clone, Copy)]
pub struct MosaicLimiter {
    grid: TileGrid,
    color_limit: usize,
    enabled: bool,
}

impl MosaicLimiter {
    /// Limit every tile of `grid` to `color_limit` colors, with mosaic
    /// stages enabled.
    pub fn new(grid: TileGrid, color_limit: usize) -> Self {
        Self {
            grid,
            color_limit,
            enabled: true,
        }
    }

    /// Enable or disable the stages above tile size.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The stages that [`apply`](Self::apply) runs, finest first.
    pub fn stages(&self) -> Vec<MosaicStage> {
        let (image_width, image_height) = self.grid.image_size();
        let (mut width, mut height) = self.grid.tile_size();
        let mut colors = self.color_limit;

        let mut stages = vec![MosaicStage {
            block_width: width,
            block_height: height,
            colors,
        }];
        if !self.enabled {
            return stages;
        }
        loop {
            width *= 2;
            height *= 2;
            colors = colors.saturating_mul(2);
            if width >= image_width || height >= image_height {
                break;
            }
            stages.push(MosaicStage {
                block_width: width,
                block_height: height,
                colors,
            });
        }
        stages
    }

    /// Run every stage over `image` and return the conditioned image.
    ///
    /// Blocks within a stage do not overlap and are reduced in parallel.
    pub fn apply(&self, image: &Image, reducer: &dyn ColorReducer, dither: DitherMode) -> Image {
        let mut current = image.clone();
        for stage in self.stages() {
            self.run_stage(&mut current, stage, reducer, dither);
        }
        current
    }

    /// Like [`apply`](Self::apply), but checks `stop` before every stage.
    /// The deadline is measured from `started`.
    pub fn apply_until(
        &self,
        image: &Image,
        reducer: &dyn ColorReducer,
        dither: DitherMode,
        stop: &StopCondition,
        started: Instant,
    ) -> Result<Image, CancelReason> {
        let mut current = image.clone();
        for stage in self.stages() {
            if let Some(reason) = stop.check(started, 0) {
                return Err(reason);
            }
            self.run_stage(&mut current, stage, reducer, dither);
        }
        Ok(current)
    }

    fn run_stage(&self, current: &mut Image, stage: MosaicStage, reducer: &dyn ColorReducer, dither: DitherMode) {
        let rects: Vec<BlockRect> = self
            .grid
            .blocks(stage.block_width, stage.block_height)
            .collect();

        let source: &Image = current;
        let reduced: Vec<(BlockRect, Option<Vec<Rgb>>)> = rects
            .par_iter()
            .map(|&rect| {
                let block = source.block(rect);
                let distinct = {
                    let mut seen: Vec<Rgb> = block.visible().collect();
                    seen.sort_unstable();
                    seen.dedup();
                    seen.len()
                };
                if distinct <= stage.colors {
                    return (rect, None);
                }
                let reduction = reducer.reduce(&block, stage.colors, dither);
                (rect, Some(reduction.apply(&block)))
            })
            .collect();

        let mut changed = 0;
        for (rect, colors) in reduced {
            if let Some(colors) = colors {
                current.paste(rect, &colors);
                changed += 1;
            }
        }
        debug!(
            block_width = stage.block_width,
            block_height = stage.block_height,
            colors = stage.colors,
            blocks = rects.len(),
            changed,
            "mosaic stage"
        );
    }
}
