//! The color budget search.
//!
//! Each attempt reduces the conditioned image to a candidate number of
//! colors and asks the [`TilePartitioner`] whether the result fits. Attempts
//! share nothing but the read-only input image, so a window of them can run
//! on the rayon pool at once. Results are still consumed in schedule order
//! and the first success in that order wins.

mod cancel;

pub use cancel::StopCondition;

use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::api::{ConfigError, PartitionError, QuantizeError};
use crate::image::{BlockRect, Image};
use crate::partition::{Partition, TilePartitioner};
use crate::reduce::{ColorReducer, DitherMode};

/// Order in which budgets are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Fewest colors first; finds a feasible budget quickly
    #[default]
    Ascending,
    /// Most colors first; keeps as many colors as possible
    Descending,
}

/// The budgets a search walks through.
///
/// # Example
///
/// ```
/// use tilequant_core::{BudgetSchedule, Direction};
///
/// let up = BudgetSchedule::new(4, 14, 4, Direction::Ascending).unwrap();
/// assert_eq!(up.budgets(), vec![4, 8, 12, 14]);
///
/// let down = BudgetSchedule::new(4, 14, 4, Direction::Descending).unwrap();
/// assert_eq!(down.budgets(), vec![14, 10, 6, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSchedule {
    start: usize,
    max: usize,
    step: usize,
    direction: Direction,
}

impl BudgetSchedule {
    /// Create a schedule over `start..=max` in steps of `step`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroCount`] if `start` or `step` is zero
    /// - [`ConfigError::BudgetRange`] if `start > max`
    pub fn new(start: usize, max: usize, step: usize, direction: Direction) -> Result<Self, ConfigError> {
        if start == 0 {
            return Err(ConfigError::ZeroCount { what: "start colors" });
        }
        if step == 0 {
            return Err(ConfigError::ZeroCount { what: "color steps" });
        }
        if start > max {
            return Err(ConfigError::BudgetRange { start, max });
        }
        Ok(Self {
            start,
            max,
            step,
            direction,
        })
    }

    /// Search direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Budgets in the order they are tried. Both ends of the range are
    /// always included, even when the step skips over one of them.
    pub fn budgets(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Walk the budgets lazily, in the order they are tried.
    pub fn iter(&self) -> Budgets {
        let first = match self.direction {
            Direction::Ascending => self.start,
            Direction::Descending => self.max,
        };
        Budgets {
            schedule: *self,
            next: Some(first),
        }
    }
}

impl IntoIterator for &BudgetSchedule {
    type Item = usize;
    type IntoIter = Budgets;

    fn into_iter(self) -> Budgets {
        self.iter()
    }
}

/// Iterator over the budgets of a [`BudgetSchedule`].
#[derive(Debug, Clone)]
pub struct Budgets {
    schedule: BudgetSchedule,
    next: Option<usize>,
}

impl Iterator for Budgets {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let BudgetSchedule {
            start, max, step, ..
        } = self.schedule;
        // clamp to the far end so it is always visited, and never wrap
        self.next = match self.schedule.direction {
            Direction::Ascending if current < max => {
                Some(current.checked_add(step).map_or(max, |b| b.min(max)))
            }
            Direction::Descending if current > start => {
                Some(current.checked_sub(step).map_or(start, |b| b.max(start)))
            }
            _ => None,
        };
        Some(current)
    }
}

/// A successful search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Budget of the winning attempt
    pub budget: usize,
    /// The image reduced to `budget` colors
    pub image: Image,
    /// How its tiles were grouped
    pub partition: Partition,
    /// Attempts evaluated in schedule order, including the winning one
    pub attempts: usize,
}

enum Evaluated {
    Done(usize, Result<(Image, Partition), PartitionError>),
    Skipped(crate::api::CancelReason),
}

/// Walks a [`BudgetSchedule`] until an attempt partitions successfully.
pub struct SearchDriver<'a> {
    reducer: &'a dyn ColorReducer,
    partitioner: TilePartitioner,
    schedule: BudgetSchedule,
    dither: DitherMode,
    parallelism: usize,
    stop: StopCondition,
}

impl<'a> SearchDriver<'a> {
    /// A sequential driver without stop conditions.
    pub fn new(reducer: &'a dyn ColorReducer, partitioner: TilePartitioner, schedule: BudgetSchedule) -> Self {
        Self {
            reducer,
            partitioner,
            schedule,
            dither: DitherMode::None,
            parallelism: 1,
            stop: StopCondition::default(),
        }
    }

    /// Dithering used by the global reduction.
    pub fn dither(mut self, dither: DitherMode) -> Self {
        self.dither = dither;
        self
    }

    /// Number of budgets evaluated at once. 0 is treated as 1.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Conditions for giving up early.
    pub fn stop(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// A single attempt: reduce `image` to `budget` colors and partition it.
    pub fn attempt(&self, image: &Image, budget: usize) -> Result<(Image, Partition), PartitionError> {
        let (width, height) = image.dimensions();
        let rect = BlockRect::new(0, 0, width, height);
        let block = image.block(rect);
        let reduction = self.reducer.reduce(&block, budget, self.dither);
        let reduced = image.with_block(rect, &reduction.apply(&block));
        let partition = self.partitioner.partition(&reduced)?;
        Ok((reduced, partition))
    }

    /// Run the search over an already conditioned image.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::Cancelled`] when a stop condition trips before a
    ///   success in schedule order was found
    /// - [`QuantizeError::Infeasible`] when every budget failed
    pub fn run(&self, image: &Image) -> Result<SearchOutcome, QuantizeError> {
        self.run_since(image, Instant::now())
    }

    /// Like [`run`](Self::run), with the deadline measured from `started`.
    pub fn run_since(&self, image: &Image, started: Instant) -> Result<SearchOutcome, QuantizeError> {
        info!(
            schedule = ?self.schedule,
            parallelism = self.parallelism,
            "search started"
        );

        let mut schedule = self.schedule.iter().peekable();
        let mut tried = Vec::new();
        let mut attempts = 0;
        let mut last_failure = None;

        while schedule.peek().is_some() {
            if let Some(reason) = self.stop.check(started, attempts) {
                warn!(%reason, attempts, "search cancelled");
                return Err(QuantizeError::Cancelled { reason, attempts });
            }
            let size = self
                .stop
                .remaining_attempts(attempts)
                .map_or(self.parallelism, |remaining| remaining.min(self.parallelism));
            let window: Vec<usize> = schedule.by_ref().take(size).collect();
            tried.extend_from_slice(&window);

            let done_before = attempts;
            let results: Vec<Evaluated> = window
                .par_iter()
                .map(|&budget| match self.stop.check(started, done_before) {
                    Some(reason) => Evaluated::Skipped(reason),
                    None => Evaluated::Done(budget, self.attempt(image, budget)),
                })
                .collect();

            for result in results {
                match result {
                    Evaluated::Skipped(reason) => {
                        warn!(%reason, attempts, "search cancelled");
                        return Err(QuantizeError::Cancelled { reason, attempts });
                    }
                    Evaluated::Done(budget, Ok((image, partition))) => {
                        attempts += 1;
                        info!(
                            budget,
                            attempts,
                            palettes = partition.palettes.len(),
                            "search succeeded"
                        );
                        return Ok(SearchOutcome {
                            budget,
                            image,
                            partition,
                            attempts,
                        });
                    }
                    Evaluated::Done(budget, Err(err)) => {
                        attempts += 1;
                        info!(budget, error = %err, "attempt failed");
                        last_failure = Some(err);
                    }
                }
            }
        }

        let last_failure = last_failure.ok_or(ConfigError::BudgetRange {
            start: self.schedule.start,
            max: self.schedule.max,
        })?;
        Err(QuantizeError::Infeasible {
            budgets: tried,
            last_failure,
        })
    }
}
