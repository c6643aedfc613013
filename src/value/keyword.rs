// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Gherkin step keywords.

use std::str::FromStr;

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Keyword a [`Step`] was written with.
///
/// [`Step`]: crate::Step
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Keyword {
    /// `Given` precondition.
    Given,

    /// `When` action.
    When,

    /// `Then` outcome.
    Then,

    /// `And` continuation.
    And,

    /// `But` continuation.
    But,
}

impl FromStr for Keyword {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "given" => Ok(Self::Given),
            "when" => Ok(Self::When),
            "then" => Ok(Self::Then),
            "and" => Ok(Self::And),
            "but" => Ok(Self::But),
            _ => Err("possible keywords: Given, When, Then, And, But"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gherkin_spelling() {
        assert_eq!("Given ".parse::<Keyword>(), Ok(Keyword::Given));
        assert_eq!("then".parse::<Keyword>(), Ok(Keyword::Then));
        assert!("Whenever".parse::<Keyword>().is_err());
    }

    #[test]
    fn displays_as_written() {
        assert_eq!(Keyword::But.to_string(), "But");
        assert_eq!(serde_json::to_string(&Keyword::And).unwrap(), "\"And\"");
    }
}
