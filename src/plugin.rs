use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{ReportError, ReportingClient, SERVICE_CONTROL_ENDPOINT};
use crate::config::{ConfigError, ConfigItem};
use crate::credentials::Credentials;
use crate::proto::ReportRequest;
use crate::record::{DataSet, ValueList};
use crate::value_set::build_value_set;
use crate::{metadata, operation, Config, InitError};

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "write_gsc";

/// Sink for assembled report requests.
pub trait Report {
    /// Submits one request.
    ///
    /// # Errors
    ///
    /// Errors if the request was not acknowledged.
    fn report(&self, request: ReportRequest) -> Result<(), ReportError>;
}

impl Report for ReportingClient {
    fn report(&self, request: ReportRequest) -> Result<(), ReportError> {
        ReportingClient::report(self, request)
    }
}

/// What became of a record handed to [`WriteGsc::write`].
///
/// Every outcome counts as handled; none is a failure of the host's write
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Reported,
    /// The record carries no export metadata.
    NotExported,
    /// Export metadata was present but unreadable; the record was dropped.
    Malformed,
    /// The report call failed; the record was dropped.
    ReportFailed,
}

impl WriteOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WriteOutcome::Reported => "reported",
            WriteOutcome::NotExported => "not_exported",
            WriteOutcome::Malformed => "malformed",
            WriteOutcome::ReportFailed => "report_failed",
        }
    }
}

/// The write plugin: configuration plus the one reporter it owns for the
/// lifetime of the process.
pub struct WriteGsc<R = ReportingClient> {
    config: Config,
    reporter: R,
}

impl WriteGsc {
    /// Configuration-load entry point.
    ///
    /// # Errors
    ///
    /// See [`Config::from_item`].
    pub fn configure(block: &ConfigItem) -> Result<Config, ConfigError> {
        Config::from_item(block)
    }

    /// Initialization entry point; connects to [`SERVICE_CONTROL_ENDPOINT`]
    /// using the instance's default service account.
    ///
    /// # Errors
    ///
    /// Errors if the reporting client cannot be created.
    pub fn init(config: Config) -> Result<Self, InitError> {
        let client =
            ReportingClient::connect(SERVICE_CONTROL_ENDPOINT, Credentials::compute_engine())?;

        Ok(WriteGsc::with_reporter(config, client))
    }
}

impl<R: Report> WriteGsc<R> {
    pub const fn with_reporter(config: Config, reporter: R) -> Self {
        WriteGsc { config, reporter }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Write entry point.
    ///
    /// Exports the record if its metadata marks it for export. Failures are
    /// logged and absorbed here; at most one report is attempted.
    pub fn write(&self, data_set: &DataSet, values: &ValueList) -> WriteOutcome {
        let outcome = self.export(data_set, values);
        metrics::counter!("write_gsc_records_total", "outcome" => outcome.as_str()).increment(1);

        outcome
    }

    fn export(&self, data_set: &DataSet, values: &ValueList) -> WriteOutcome {
        let identity = match metadata::interpret(values.meta.as_ref()) {
            Ok(Some(identity)) => identity,
            Ok(None) => return WriteOutcome::NotExported,
            Err(err) => {
                warn!(
                    identifier = %values.identifier(),
                    %err,
                    "Dropping record with malformed metadata"
                );

                return WriteOutcome::Malformed;
            }
        };

        let value_set = build_value_set(data_set, values, &identity);
        let operation = operation::assemble(value_set, &self.config);

        // Failures are logged by the reporter.
        match self
            .reporter
            .report(operation::report_request(operation, &self.config))
        {
            Ok(()) => WriteOutcome::Reported,
            Err(_) => WriteOutcome::ReportFailed,
        }
    }

    /// Flush entry point. Nothing is buffered, so there is nothing to do.
    pub fn flush(&self, timeout: Option<Duration>, identifier: Option<&str>) {
        debug!(?timeout, identifier, "Flush requested");
    }

    /// Shutdown entry point; releases the reporter.
    pub fn shutdown(self) {
        debug!(plugin = PLUGIN_NAME, "Shutting down");
    }
}
