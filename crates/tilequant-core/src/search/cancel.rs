//! External stop conditions for a running search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::CancelReason;

/// Conditions under which a search gives up early.
///
/// All conditions are checked before each attempt starts. An attempt that
/// is already running is allowed to finish.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tilequant_core::StopCondition;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let stop = StopCondition::new()
///     .deadline(Duration::from_secs(30))
///     .max_attempts(10)
///     .cancel_flag(Arc::clone(&flag));
///
/// // from another thread:
/// flag.store(true, Ordering::Relaxed);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopCondition {
    deadline: Option<Duration>,
    max_attempts: Option<usize>,
    flag: Option<Arc<AtomicBool>>,
}

impl StopCondition {
    /// No stop conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once the search has run for `limit`.
    pub fn deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Stop after `max` attempts.
    pub fn max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = Some(max);
        self
    }

    /// Stop when `flag` is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Remaining attempts, if capped.
    pub(crate) fn remaining_attempts(&self, done: usize) -> Option<usize> {
        self.max_attempts.map(|max| max.saturating_sub(done))
    }

    /// The first tripped condition, if any.
    pub(crate) fn check(&self, started: Instant, attempts: usize) -> Option<CancelReason> {
        if self
            .flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some(CancelReason::Requested);
        }
        if let Some(limit) = self.deadline {
            if started.elapsed() >= limit {
                return Some(CancelReason::Deadline(limit));
            }
        }
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return Some(CancelReason::MaxAttempts(max));
            }
        }
        None
    }
}
