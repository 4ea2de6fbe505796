//! Write plugin exporting collected metrics to a remote service controller.
//!
//! Records whose metadata carries [`metadata::EXPORT_NAME_KEY`] are turned
//! into a single-operation report request and submitted synchronously. All
//! failures after configuration are logged and absorbed.

mod client;
mod config;
mod credentials;
pub mod metadata;
pub mod operation;
mod plugin;
pub mod proto;
pub mod record;
pub mod value_set;

use std::collections::BTreeMap;

use thiserror::Error;

pub use crate::client::{ReportError, ReportingClient, SERVICE_CONTROL_ENDPOINT};
pub use crate::config::{ConfigError, ConfigItem, ConfigValue};
pub use crate::credentials::{ComputeEngineCredentials, Credentials, METADATA_TOKEN_URL};
pub use crate::plugin::{Report, WriteGsc, WriteOutcome, PLUGIN_NAME};

/// Loads the configuration block and initializes the plugin.
///
/// # Errors
///
/// Errors on invalid configuration, before any client is created, or on
/// failure to create the reporting client.
pub fn install(block: &ConfigItem) -> Result<WriteGsc, InitError> {
    let config = WriteGsc::configure(block)?;

    WriteGsc::init(config)
}

/// Plugin configuration, fixed once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Operation name stamped on every report.
    pub operation_name: String,
    /// Consumer the reports are attributed to (e.g. `project:<id>`).
    pub consumer_id: String,
    /// Service the reports are sent for.
    pub service_name: String,
    /// Labels identifying the monitored resource, attached to every
    /// operation.
    pub monitored_resource_labels: BTreeMap<String, String>,
}

/// Possible failure while creating the reporting client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to build the runtime driving the channel.
    #[error("Build runtime; err={0}")]
    Runtime(#[from] std::io::Error),
    /// Invalid endpoint or TLS configuration.
    #[error("Configure endpoint; err={0}")]
    Endpoint(#[from] tonic::transport::Error),
}

/// Possible failure while installing the plugin.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Load config; err={0}")]
    Config(#[from] ConfigError),
    #[error("Create client; err={0}")]
    Client(#[from] ClientError),
}
