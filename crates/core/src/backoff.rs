// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry timing for transient upload failures.
//!
//! The base delay doubles per attempt and is capped at the configured
//! maximum; the scheduled delay adds a uniform jitter of up to one base on
//! top, still capped. Consecutive scheduled delays therefore never shrink:
//! attempt `k+1`'s floor (its base) equals attempt `k`'s ceiling until the
//! cap, and at the cap every delay is exactly the maximum.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff policy. Immutable; one per uploader pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    initial: Duration,
    max: Duration,
}

impl RetryPolicy {
    /// `initial` must not exceed `max`; config validation guarantees this.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Capped base delay for a 1-based attempt number: `initial * 2^(n-1)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial.saturating_mul(1u32 << shift).min(self.max)
    }

    /// Scheduled delay: base plus a uniform draw in `[0, base]`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::rng())
    }

    /// As [`delay`](Self::delay), with a caller-supplied RNG.
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt);
        if base >= self.max {
            return self.max;
        }
        let jitter_ms = rng.random_range(0..=base.as_millis() as u64);
        (base + Duration::from_millis(jitter_ms)).min(self.max)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
