// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Exponential backoff between delivery attempts.

use std::time::Duration;

/// Retry schedule of a batch delivery.
///
/// A batch is sent once and then retried up to [`RetryPolicy::retries`]
/// times. Before retry `n` (1-based) the shipper waits
/// `min(initial_backoff * multiplier^(n - 1), max_backoff)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub retries: u32,

    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Growth factor of the delay between consecutive retries.
    pub multiplier: f64,

    /// Upper bound of a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Returns the total number of delivery attempts, the first one
    /// included.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Returns the delay before the given 1-based `retry`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            self.max_backoff
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }

    /// Returns the delays before every retry, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.retries).map(|n| self.backoff(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_exponentially_up_to_cap() {
        let policy = RetryPolicy {
            retries: 6,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2.0,
            max_backoff: Duration::from_millis(1_000),
        };

        assert_eq!(
            policy.delays().map(|d| d.as_millis()).collect::<Vec<_>>(),
            [100, 200, 400, 800, 1_000, 1_000],
        );
        assert_eq!(policy.attempts(), 7);
    }

    #[test]
    fn constant_with_unit_multiplier() {
        let policy = RetryPolicy { multiplier: 1.0, ..RetryPolicy::default() };

        assert!(policy.delays().all(|d| d == Duration::from_millis(200)));
    }

    #[test]
    fn never_overflows() {
        let policy = RetryPolicy { multiplier: 1e300, ..RetryPolicy::default() };

        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy { retries: 0, ..RetryPolicy::default() };

        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delays().count(), 0);
    }
}
