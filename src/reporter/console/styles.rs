// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Coloring of console output.

use std::{borrow::Cow, str::FromStr};

use console::Style;

use crate::value::{ScenarioStatus, StepStatus};

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] to decide, whether output should
    /// be colored.
    #[default]
    Auto,

    /// Forcing of a colored output.
    Always,

    /// Forcing of a non-colored output.
    Never,
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

/// [`Style`]s for terminal output.
#[derive(Clone, Debug)]
pub struct Styles {
    /// [`Style`] for rendering passed entities.
    pub ok: Style,

    /// [`Style`] for rendering skipped and undefined entities.
    pub skipped: Style,

    /// [`Style`] for rendering errors and failed entities.
    pub err: Style,

    /// [`Style`] for rendering headers.
    pub header: Style,

    /// [`Style`] for rendering __bold__.
    pub bold: Style,

    /// Indicates whether output should be colored.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self::new(Coloring::Auto)
    }
}

impl Styles {
    /// Creates new [`Styles`] following the given [`Coloring`] policy.
    #[must_use]
    pub fn new(coloring: Coloring) -> Self {
        Self {
            ok: Style::new().green(),
            skipped: Style::new().cyan(),
            err: Style::new().red(),
            header: Style::new().blue(),
            bold: Style::new().bold(),
            is_present: match coloring {
                Coloring::Auto => console::colors_enabled(),
                Coloring::Always => true,
                Coloring::Never => false,
            },
        }
    }

    /// If coloring is on, applies the given [`Style`] to the `input`, or
    /// leaves it "as is" otherwise.
    fn paint<'a>(&self, style: &Style, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        if self.is_present {
            style.apply_to(input.into()).force_styling(true).to_string().into()
        } else {
            input.into()
        }
    }

    /// Colors `input` with [`Styles::ok`].
    #[must_use]
    pub fn ok<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.ok, input)
    }

    /// Colors `input` with [`Styles::skipped`].
    #[must_use]
    pub fn skipped<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.skipped, input)
    }

    /// Colors `input` with [`Styles::err`].
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.err, input)
    }

    /// Colors `input` with [`Styles::header`].
    #[must_use]
    pub fn header<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.header, input)
    }

    /// Makes `input` __bold__.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.bold, input)
    }

    /// Colors `input` according to the given [`StepStatus`].
    #[must_use]
    pub fn step<'a>(&self, status: StepStatus, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        match status {
            StepStatus::Passed => self.ok(input),
            StepStatus::Failed => self.err(input),
            StepStatus::Pending
            | StepStatus::Running
            | StepStatus::Skipped
            | StepStatus::Undefined => self.skipped(input),
        }
    }

    /// Colors `input` according to the given [`ScenarioStatus`].
    #[must_use]
    pub fn scenario<'a>(
        &self,
        status: ScenarioStatus,
        input: impl Into<Cow<'a, str>>,
    ) -> Cow<'a, str> {
        match status {
            ScenarioStatus::Passed => self.ok(input),
            ScenarioStatus::Failed | ScenarioStatus::Undefined => self.err(input),
            ScenarioStatus::Pending
            | ScenarioStatus::Running
            | ScenarioStatus::Skipped => self.skipped(input),
        }
    }
}
