//! Median cut color reduction.
//!
//! Builds a histogram of the unmasked colors, then repeatedly splits the
//! color box with the highest `pixel count * RGB volume` along its widest
//! channel at the weighted median. Each final box contributes its weighted
//! mean color.

use std::collections::HashMap;

use tracing::trace;

use super::{ColorReducer, DitherMode, Reduction};
use crate::color::Rgb;
use crate::dither::{diffuse, map_nearest, FLOYD_STEINBERG};
use crate::image::PixelBlock;

/// Deterministic median cut reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianCut;

impl ColorReducer for MedianCut {
    fn reduce(&self, block: &PixelBlock, target: usize, dither: DitherMode) -> Reduction {
        let target = target.max(1);
        let histogram = histogram(block);

        if histogram.is_empty() {
            return Reduction {
                palette: Vec::new(),
                assignment: vec![None; block.len()],
            };
        }

        if histogram.len() <= target {
            // Every color survives, so there is no error to diffuse.
            let palette: Vec<Rgb> = histogram.iter().map(|&(c, _)| c).collect();
            let assignment = block
                .pixels
                .iter()
                .zip(&block.mask)
                .map(|(c, &masked)| {
                    if masked {
                        None
                    } else {
                        palette.binary_search(c).ok()
                    }
                })
                .collect();
            return Reduction {
                palette,
                assignment,
            };
        }

        let palette = cut(histogram, target);
        trace!(
            requested = target,
            colors = palette.len(),
            pixels = block.len(),
            "median cut"
        );

        let assignment = match dither {
            DitherMode::None => map_nearest(block, &palette),
            DitherMode::FloydSteinberg => diffuse(block, &palette, &FLOYD_STEINBERG),
        };
        Reduction {
            palette,
            assignment,
        }
    }
}

/// Sorted `(color, count)` pairs of the unmasked pixels.
fn histogram(block: &PixelBlock) -> Vec<(Rgb, u64)> {
    let mut counts: HashMap<Rgb, u64> = HashMap::new();
    for color in block.visible() {
        *counts.entry(color).or_insert(0) += 1;
    }
    let mut entries: Vec<(Rgb, u64)> = counts.into_iter().collect();
    entries.sort_unstable_by_key(|&(c, _)| c);
    entries
}

#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<(Rgb, u64)>,
    count: u64,
    min: [u8; 3],
    max: [u8; 3],
}

impl ColorBox {
    fn new(entries: Vec<(Rgb, u64)>) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        let mut count = 0;
        for &(color, n) in &entries {
            for (ch, v) in color.to_bytes().into_iter().enumerate() {
                min[ch] = min[ch].min(v);
                max[ch] = max[ch].max(v);
            }
            count += n;
        }
        Self {
            entries,
            count,
            min,
            max,
        }
    }

    fn range(&self, ch: usize) -> u64 {
        (self.max[ch] - self.min[ch]) as u64 + 1
    }

    fn volume(&self) -> u64 {
        self.range(0) * self.range(1) * self.range(2)
    }

    fn priority(&self) -> u64 {
        self.count * self.volume()
    }

    fn splittable(&self) -> bool {
        self.entries.len() > 1
    }

    /// Channel with the largest extent. Ties prefer red, then green.
    fn widest_channel(&self) -> usize {
        let mut best = 0;
        for ch in 1..3 {
            if self.range(ch) > self.range(best) {
                best = ch;
            }
        }
        best
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let ch = self.widest_channel();
        self.entries
            .sort_unstable_by_key(|&(c, _)| (c.to_bytes()[ch], c));

        // First index where the left half reaches half the weight.
        let half = self.count.div_ceil(2);
        let mut acc = 0;
        let mut at = 0;
        for (i, &(_, n)) in self.entries.iter().enumerate() {
            acc += n;
            if acc >= half {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.entries.len() - 1);

        let right = self.entries.split_off(at);
        (ColorBox::new(self.entries), ColorBox::new(right))
    }

    fn mean(&self) -> Rgb {
        let mut sums = [0u64; 3];
        for &(color, n) in &self.entries {
            for (s, v) in sums.iter_mut().zip(color.to_bytes()) {
                *s += v as u64 * n;
            }
        }
        let half = self.count / 2;
        let avg = |s: u64| ((s + half) / self.count).min(255) as u8;
        Rgb::new(avg(sums[0]), avg(sums[1]), avg(sums[2]))
    }
}

/// Cut the histogram into at most `target` boxes and return their means,
/// sorted and deduplicated.
fn cut(histogram: Vec<(Rgb, u64)>, target: usize) -> Vec<Rgb> {
    let mut boxes = vec![ColorBox::new(histogram)];

    while boxes.len() < target {
        let next = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.splittable())
            .max_by(|(ia, a), (ib, b)| a.priority().cmp(&b.priority()).then(ib.cmp(ia)))
            .map(|(i, _)| i);
        let Some(i) = next else {
            break;
        };
        let (left, right) = boxes.swap_remove(i).split();
        boxes.push(left);
        boxes.push(right);
    }

    let mut palette: Vec<Rgb> = boxes.iter().map(ColorBox::mean).collect();
    palette.sort_unstable();
    palette.dedup();
    palette
}
