use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::Config;

/// One node of the host's nested configuration block.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigItem {
    pub key: String,
    pub values: Vec<ConfigValue>,
    pub children: Vec<ConfigItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl ConfigItem {
    pub fn new(key: impl Into<String>) -> Self {
        ConfigItem { key: key.into(), values: Vec::new(), children: Vec::new() }
    }

    /// Leaf item carrying a single string value.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        ConfigItem {
            key: key.into(),
            values: vec![ConfigValue::String(value.into())],
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: ConfigItem) -> Self {
        self.children.push(child);

        self
    }

    fn single_string(&self) -> Result<String, ConfigError> {
        match self.values.as_slice() {
            [ConfigValue::String(value)] => Ok(value.clone()),
            _ => Err(ConfigError::ExpectedString(self.key.clone())),
        }
    }
}

/// Configuration rejected at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required key; key={0}")]
    Missing(&'static str),
    #[error("Expected exactly one string value; key={0}")]
    ExpectedString(String),
}

const OPERATION_NAME: &str = "OperationName";
const CONSUMER_ID: &str = "ConsumerId";
const SERVICE_NAME: &str = "ServiceName";
const MONITORED_RESOURCE_LABELS: &str = "MonitoredResourceLabels";

impl Config {
    /// Loads the plugin configuration from its block.
    ///
    /// Keys are matched case-insensitively. Unknown keys are ignored with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Errors if a required key is missing or empty, or a value is not a
    /// single string.
    pub fn from_item(block: &ConfigItem) -> Result<Config, ConfigError> {
        let mut operation_name = None;
        let mut consumer_id = None;
        let mut service_name = None;
        let mut monitored_resource_labels = BTreeMap::new();

        for child in &block.children {
            let key = child.key.as_str();
            if key.eq_ignore_ascii_case(OPERATION_NAME) {
                operation_name = Some(child.single_string()?);
            } else if key.eq_ignore_ascii_case(CONSUMER_ID) {
                consumer_id = Some(child.single_string()?);
            } else if key.eq_ignore_ascii_case(SERVICE_NAME) {
                service_name = Some(child.single_string()?);
            } else if key.eq_ignore_ascii_case(MONITORED_RESOURCE_LABELS) {
                for label in &child.children {
                    monitored_resource_labels.insert(label.key.clone(), label.single_string()?);
                }
            } else {
                warn!(key, "Ignoring unknown config key");
            }
        }

        Ok(Config {
            operation_name: required(operation_name, OPERATION_NAME)?,
            consumer_id: required(consumer_id, CONSUMER_ID)?,
            service_name: required(service_name, SERVICE_NAME)?,
            monitored_resource_labels,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    fn block() -> ConfigItem {
        ConfigItem::new("Plugin")
            .with_child(ConfigItem::string("OperationName", "collectd-write"))
            .with_child(ConfigItem::string("ConsumerId", "project:my-project"))
            .with_child(ConfigItem::string("ServiceName", "metrics.example.com"))
            .with_child(
                ConfigItem::new("MonitoredResourceLabels")
                    .with_child(ConfigItem::string("instance_id", "1234"))
                    .with_child(ConfigItem::string("zone", "us-central1-a")),
            )
    }

    #[test]
    fn full_block() {
        let config = Config::from_item(&block()).unwrap();

        assert_eq!(config.operation_name, "collectd-write");
        assert_eq!(config.consumer_id, "project:my-project");
        assert_eq!(config.service_name, "metrics.example.com");
        assert_eq!(
            config.monitored_resource_labels,
            BTreeMap::from_iter([
                ("instance_id".to_string(), "1234".to_string()),
                ("zone".to_string(), "us-central1-a".to_string()),
            ])
        );
    }

    #[test]
    fn labels_are_optional() {
        let block = ConfigItem::new("Plugin")
            .with_child(ConfigItem::string("operationname", "op"))
            .with_child(ConfigItem::string("CONSUMERID", "c"))
            .with_child(ConfigItem::string("serviceName", "s"));

        let config = Config::from_item(&block).unwrap();

        assert!(config.monitored_resource_labels.is_empty());
        assert_eq!(config.operation_name, "op");
    }

    #[test]
    fn missing_consumer_id() {
        let mut block = block();
        block.children.retain(|child| child.key != "ConsumerId");

        expect!["Missing required key; key=ConsumerId"]
            .assert_eq(&Config::from_item(&block).unwrap_err().to_string());
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let block = block().with_child(ConfigItem::string("ServiceName", ""));

        assert_eq!(Config::from_item(&block), Err(ConfigError::Missing("ServiceName")));
    }

    #[test]
    fn non_string_value_rejected() {
        let mut operation_name = ConfigItem::new("OperationName");
        operation_name.values.push(ConfigValue::Number(3.0));
        let block = block().with_child(operation_name);

        assert_eq!(
            Config::from_item(&block),
            Err(ConfigError::ExpectedString("OperationName".to_string()))
        );
    }

    #[test]
    fn non_string_label_rejected() {
        let mut label = ConfigItem::new("preemptible");
        label.values.push(ConfigValue::Boolean(true));
        let labels = ConfigItem::new("MonitoredResourceLabels").with_child(label);
        let block = block().with_child(labels);

        assert_eq!(
            Config::from_item(&block),
            Err(ConfigError::ExpectedString("preemptible".to_string()))
        );
    }

    #[test]
    fn unknown_keys_ignored() {
        let block = block().with_child(ConfigItem::string("Endpoint", "localhost"));

        assert!(Config::from_item(&block).is_ok());
    }
}
