// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Non-negative elapsed time.

use std::{fmt, iter, ops, time::{Duration, SystemTime}};

use derive_more::with_trait::{From, Into};

/// Non-negative elapsed time of a lifecycle entity.
///
/// Backed by a [`Duration`], so it can never be negative.
#[derive(Clone, Copy, Debug, Default, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Elapsed(Duration);

impl Elapsed {
    /// Zero [`Elapsed`] time.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Time elapsed from `start` to `end`, saturating to [`Elapsed::ZERO`] if
    /// the clock went backwards.
    #[must_use]
    pub fn between(start: SystemTime, end: SystemTime) -> Self {
        Self(end.duration_since(start).unwrap_or_default())
    }

    /// Creates an [`Elapsed`] from fractional seconds, clamping negative and
    /// non-finite input to zero and saturating values too large for a
    /// [`Duration`] to [`Duration::MAX`].
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        } else {
            Self::ZERO
        }
    }

    /// Returns the underlying [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns the elapsed time in fractional seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Renders as seconds with one decimal, like `12.3s`.
    #[must_use]
    pub fn short(self) -> String {
        format!("{:.1}s", self.0.as_secs_f64())
    }

    /// Renders whole seconds in human units, like `2m 5s`.
    #[must_use]
    pub fn human(self) -> String {
        humantime::format_duration(Duration::from_secs(self.0.as_secs()))
            .to_string()
    }
}

impl ops::Add for Elapsed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign for Elapsed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl iter::Sum for Elapsed {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_short() {
        assert_eq!(Elapsed::from(Duration::from_millis(12_340)).short(), "12.3s");
        assert_eq!(Elapsed::ZERO.short(), "0.0s");
    }

    #[test]
    fn renders_human() {
        assert_eq!(Elapsed::from(Duration::from_secs(125)).human(), "2m 5s");
        assert_eq!(Elapsed::from(Duration::from_millis(125_900)).human(), "2m 5s");
        assert_eq!(Elapsed::from(Duration::from_secs(3_720)).human(), "1h 2m");
        assert_eq!(Elapsed::ZERO.human(), "0s");
        assert_eq!(Elapsed::from(Duration::from_secs(7)).to_string(), "7s");
    }

    #[test]
    fn adds_and_orders() {
        let a = Elapsed::from(Duration::from_secs(1));
        let b = Elapsed::from(Duration::from_secs(2));

        assert_eq!(a + b, Elapsed::from(Duration::from_secs(3)));
        assert!(a < b);
        assert_eq!([a, b, a].into_iter().sum::<Elapsed>(), Elapsed::from(Duration::from_secs(4)));
    }

    #[test]
    fn never_negative() {
        let now = SystemTime::now();
        let later = now + Duration::from_secs(5);

        assert_eq!(Elapsed::between(later, now), Elapsed::ZERO);
        assert_eq!(Elapsed::between(now, later).as_duration(), Duration::from_secs(5));
        assert_eq!(Elapsed::from_secs_f64(-1.5), Elapsed::ZERO);
        assert_eq!(Elapsed::from_secs_f64(f64::NAN), Elapsed::ZERO);
    }

    #[test]
    fn saturates_huge_seconds() {
        assert_eq!(Elapsed::from_secs_f64(1e30).as_duration(), Duration::MAX);
        assert_eq!(Elapsed::from_secs_f64(f64::MAX).as_duration(), Duration::MAX);
        assert_eq!(Elapsed::from_secs_f64(1.5).as_duration(), Duration::from_millis(1500));
    }
}
