// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//! Configuration of reporting and log shipping.
//!
//! Both [`ReportingConfig`] and [`ShipperConfig`] are [`clap::Args`], so a
//! driver can flatten them into its own CLI, and [`Default`] for
//! programmatic use.

use std::{path::PathBuf, str::FromStr, time::Duration};

use smart_default::SmartDefault;

use crate::{
    error::{ConfigError, ConfigResult},
    lifecycle::EmptyScenarioPolicy,
    logging::Logger,
    reporter::{
        console::Coloring,
        portal::{NestingMode, OversizedAttachment, PortalClient, PortalOptions},
        ConsoleReporter, Coordinator, JsonReporter, PortalReporter,
    },
    shipper::RetryPolicy,
    Reporter,
};

/// Reporter to activate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReportMode {
    /// Live terminal output.
    Console,

    /// JSON report file.
    Json,

    /// Third-party test-management portal.
    Portal,
}

impl FromStr for ReportMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "portal" => Ok(Self::Portal),
            _ => Err("possible options: console, json, portal"),
        }
    }
}

/// Options of the reporters.
#[derive(Clone, Debug, SmartDefault, clap::Args)]
#[group(skip)]
pub struct ReportingConfig {
    /// Reporters to activate, in delivery order.
    #[arg(
        long = "report",
        value_name = "console|json|portal",
        value_delimiter = ',',
        default_value = "console"
    )]
    #[default(vec![ReportMode::Console])]
    pub modes: Vec<ReportMode>,

    /// Path of the JSON report file.
    #[arg(long, value_name = "path")]
    pub json_path: Option<PathBuf>,

    /// Coloring policy for a console output.
    #[arg(long, value_name = "auto|always|never", default_value = "auto")]
    #[default(Coloring::Auto)]
    pub color: Coloring,

    /// Name of the portal launch.
    #[arg(long, value_name = "name", default_value = "BDD execution")]
    #[default = "BDD execution"]
    pub launch_name: String,

    /// How steps are mapped onto portal items.
    #[arg(long, value_name = "message|flat|nested", default_value = "nested")]
    #[default(NestingMode::Nested)]
    pub step_nesting: NestingMode,

    /// Maximum size of a portal attachment in bytes.
    #[arg(long, value_name = "bytes", default_value_t = 10 * 1024 * 1024)]
    #[default(10 * 1024 * 1024)]
    pub attachment_cap: u64,

    /// What to do with attachments exceeding the cap.
    #[arg(long, value_name = "truncate|skip", default_value = "skip")]
    #[default(OversizedAttachment::Skip)]
    pub oversized_attachments: OversizedAttachment,

    /// Status of a scenario completed without any step.
    #[arg(long, value_name = "passed|skipped|failed", default_value = "passed")]
    #[default(EmptyScenarioPolicy::Passed)]
    pub empty_scenario: EmptyScenarioPolicy,
}

impl ReportingConfig {
    /// Builds the configured reporters in [`ReportingConfig::modes`] order.
    ///
    /// # Errors
    ///
    /// - With [`ConfigError::NoReporters`] if no mode is configured.
    /// - With [`ConfigError::MissingJsonPath`] if `json` is requested
    ///   without [`ReportingConfig::json_path`].
    /// - With [`ConfigError::MissingPortalClient`] if `portal` is requested
    ///   without a `portal` client.
    pub fn build_reporters<C: PortalClient + 'static>(
        &self,
        portal: Option<C>,
        logger: &Logger,
    ) -> ConfigResult<Vec<Box<dyn Reporter>>> {
        if self.modes.is_empty() {
            return Err(ConfigError::NoReporters);
        }
        let mut portal = portal;
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::with_capacity(self.modes.len());
        for mode in &self.modes {
            match mode {
                ReportMode::Console => {
                    reporters.push(Box::new(ConsoleReporter::stdout(self.color)));
                }
                ReportMode::Json => {
                    let path = self.json_path.clone().ok_or(ConfigError::MissingJsonPath)?;
                    reporters.push(Box::new(JsonReporter::to_path(path)));
                }
                ReportMode::Portal => {
                    let client = portal.take().ok_or(ConfigError::MissingPortalClient)?;
                    reporters.push(Box::new(PortalReporter::new(
                        client,
                        self.portal_options(),
                        logger.clone(),
                    )));
                }
            }
        }
        Ok(reporters)
    }

    /// Builds a [`Coordinator`] over the configured reporters.
    ///
    /// # Errors
    ///
    /// See [`ReportingConfig::build_reporters()`].
    pub fn build_coordinator<C: PortalClient + 'static>(
        &self,
        portal: Option<C>,
        logger: Logger,
    ) -> ConfigResult<Coordinator> {
        let reporters = self.build_reporters(portal, &logger)?;
        Coordinator::new(reporters, logger)
    }

    /// Returns the [`PortalOptions`] described by this config.
    #[must_use]
    pub fn portal_options(&self) -> PortalOptions {
        PortalOptions {
            launch_name: self.launch_name.clone(),
            nesting: self.step_nesting,
            attachment_cap: self.attachment_cap,
            oversized: self.oversized_attachments,
        }
    }
}

/// Options of a [`BatchShipper`].
///
/// [`BatchShipper`]: crate::shipper::BatchShipper
#[derive(Clone, Debug, SmartDefault, clap::Args)]
#[group(skip)]
pub struct ShipperConfig {
    /// Number of records triggering a flush.
    #[arg(long = "ship-batch-size", value_name = "int", default_value_t = 100)]
    #[default(100)]
    pub batch_size: usize,

    /// Number of retries of a failed batch.
    #[arg(long = "ship-retries", value_name = "int", default_value_t = 3)]
    #[default(3)]
    pub retry_attempts: u32,

    /// Delay before the first retry.
    #[arg(
        long = "ship-backoff",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "200ms"
    )]
    #[default(Duration::from_millis(200))]
    pub initial_backoff: Duration,

    /// Growth factor of the delay between retries.
    #[arg(long = "ship-backoff-multiplier", value_name = "float", default_value_t = 2.0)]
    #[default(2.0)]
    pub backoff_multiplier: f64,

    /// Upper bound of a single retry delay.
    #[arg(
        long = "ship-max-backoff",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "5s"
    )]
    #[default(Duration::from_secs(5))]
    pub max_backoff: Duration,

    /// Bound of a single send.
    #[arg(
        long = "ship-timeout",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "10s"
    )]
    #[default(Duration::from_secs(10))]
    pub send_timeout: Duration,

    /// Bound of delivering pending records on close.
    #[arg(
        long = "ship-close-timeout",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "5s"
    )]
    #[default(Duration::from_secs(5))]
    pub close_timeout: Duration,

    /// Period of time-based flushes.
    #[arg(
        long = "ship-flush-interval",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "5s"
    )]
    #[default(Duration::from_secs(5))]
    pub flush_interval: Duration,
}

impl ShipperConfig {
    /// Checks this config for values a [`BatchShipper`] can't work with.
    ///
    /// # Errors
    ///
    /// If the batch size is zero, the backoff multiplier is below `1.0`, or
    /// a timeout is zero.
    ///
    /// [`BatchShipper`]: crate::shipper::BatchShipper
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if !(self.backoff_multiplier >= 1.0 && self.backoff_multiplier.is_finite()) {
            return Err(ConfigError::InvalidBackoff { multiplier: self.backoff_multiplier });
        }
        for (option, value) in [
            ("ship-timeout", self.send_timeout),
            ("ship-close-timeout", self.close_timeout),
            ("ship-flush-interval", self.flush_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { option });
            }
        }
        Ok(())
    }

    /// Returns the [`RetryPolicy`] described by this config.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry_attempts,
            initial_backoff: self.initial_backoff,
            multiplier: self.backoff_multiplier,
            max_backoff: self.max_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::reporter::portal::{ItemId, LogEntry, NewItem, NewLaunch, ItemStatus};

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        reporting: ReportingConfig,

        #[command(flatten)]
        shipping: ShipperConfig,
    }

    struct NoPortal;

    #[async_trait::async_trait]
    impl PortalClient for NoPortal {
        async fn start_launch(&mut self, _: NewLaunch<'_>) -> anyhow::Result<ItemId> {
            anyhow::bail!("offline")
        }

        async fn start_item(&mut self, _: NewItem<'_>) -> anyhow::Result<ItemId> {
            anyhow::bail!("offline")
        }

        async fn finish_item(
            &mut self,
            _: &ItemId,
            _: ItemStatus,
            _: std::time::SystemTime,
        ) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }

        async fn log(&mut self, _: &ItemId, _: LogEntry) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }

        async fn finish_launch(&mut self, _: &ItemId, _: std::time::SystemTime) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
    }

    #[test]
    fn cli_defaults_match_programmatic_defaults() {
        let cli = Cli::try_parse_from(["bdd"]).unwrap();
        let shipping = ShipperConfig::default();
        let reporting = ReportingConfig::default();

        assert_eq!(cli.shipping.batch_size, shipping.batch_size);
        assert_eq!(cli.shipping.retry_attempts, 3);
        assert_eq!(cli.shipping.initial_backoff, Duration::from_millis(200));
        assert_eq!(cli.shipping.max_backoff, shipping.max_backoff);
        assert_eq!(cli.shipping.send_timeout, Duration::from_secs(10));
        assert_eq!(cli.shipping.close_timeout, shipping.close_timeout);
        assert_eq!(cli.reporting.modes, reporting.modes);
        assert_eq!(cli.reporting.step_nesting, NestingMode::Nested);
        assert_eq!(cli.reporting.attachment_cap, reporting.attachment_cap);
        assert_eq!(cli.reporting.launch_name, reporting.launch_name);
        assert_eq!(cli.reporting.empty_scenario, EmptyScenarioPolicy::Passed);
    }

    #[test]
    fn parses_cli_overrides() {
        let cli = Cli::try_parse_from([
            "bdd",
            "--report=console,json",
            "--json-path=out/report.json",
            "--step-nesting=flat",
            "--oversized-attachments=truncate",
            "--ship-retries=5",
            "--ship-backoff=1s",
            "--ship-timeout=250ms",
        ])
        .unwrap();

        assert_eq!(cli.reporting.modes, [ReportMode::Console, ReportMode::Json]);
        assert_eq!(cli.reporting.json_path, Some(PathBuf::from("out/report.json")));
        assert_eq!(cli.reporting.step_nesting, NestingMode::Flat);
        assert_eq!(cli.reporting.oversized_attachments, OversizedAttachment::Truncate);
        assert_eq!(cli.shipping.retry_policy().attempts(), 6);
        assert_eq!(cli.shipping.initial_backoff, Duration::from_secs(1));
        assert_eq!(cli.shipping.send_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["bdd", "--report=carrier-pigeon"]).is_err());
    }

    #[test]
    fn builds_reporters_in_order() {
        let config = ReportingConfig {
            modes: vec![ReportMode::Portal, ReportMode::Json, ReportMode::Console],
            json_path: Some("report.json".into()),
            ..ReportingConfig::default()
        };

        let reporters = config.build_reporters(Some(NoPortal), &Logger::disabled()).unwrap();

        assert_eq!(
            reporters.iter().map(|r| r.name()).collect::<Vec<_>>(),
            ["portal", "json", "console"],
        );
    }

    #[test]
    fn reports_missing_dependencies() {
        let json = ReportingConfig { modes: vec![ReportMode::Json], ..ReportingConfig::default() };
        let portal =
            ReportingConfig { modes: vec![ReportMode::Portal], ..ReportingConfig::default() };
        let none = ReportingConfig { modes: Vec::new(), ..ReportingConfig::default() };

        assert_eq!(
            json.build_reporters(None::<NoPortal>, &Logger::disabled()).err(),
            Some(ConfigError::MissingJsonPath),
        );
        assert_eq!(
            portal.build_reporters(None::<NoPortal>, &Logger::disabled()).err(),
            Some(ConfigError::MissingPortalClient),
        );
        assert_eq!(
            none.build_coordinator(None::<NoPortal>, Logger::disabled()).err(),
            Some(ConfigError::NoReporters),
        );
    }

    #[test]
    fn validates_shipper_config() {
        assert!(ShipperConfig::default().validate().is_ok());
        assert_eq!(
            ShipperConfig { batch_size: 0, ..ShipperConfig::default() }.validate(),
            Err(ConfigError::InvalidBatchSize),
        );
        assert_eq!(
            ShipperConfig { backoff_multiplier: 0.5, ..ShipperConfig::default() }.validate(),
            Err(ConfigError::InvalidBackoff { multiplier: 0.5 }),
        );
        assert_eq!(
            ShipperConfig { send_timeout: Duration::ZERO, ..ShipperConfig::default() }.validate(),
            Err(ConfigError::ZeroDuration { option: "ship-timeout" }),
        );
    }
}
