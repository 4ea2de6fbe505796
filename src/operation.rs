use std::time::{SystemTime, UNIX_EPOCH};

use prost_types::Timestamp;
use uuid::Uuid;

use crate::proto::{MetricValueSet, Operation, ReportRequest};
use crate::Config;

/// Wraps a value-set into a fresh operation stamped with the current time.
#[must_use]
pub fn assemble(value_set: MetricValueSet, config: &Config) -> Operation {
    assemble_at(value_set, config, SystemTime::now())
}

/// Wraps a value-set into a fresh operation stamped with `now`.
///
/// The operation's interval is the single instant `now`, truncated to whole
/// seconds. Each call gets a new random operation id.
#[must_use]
pub fn assemble_at(value_set: MetricValueSet, config: &Config, now: SystemTime) -> Operation {
    let seconds = now.duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs());
    let instant = Timestamp { seconds: i64::try_from(seconds).unwrap_or(i64::MAX), nanos: 0 };

    Operation {
        operation_id: Uuid::new_v4().to_string(),
        operation_name: config.operation_name.clone(),
        consumer_id: config.consumer_id.clone(),
        start_time: Some(instant.clone()),
        end_time: Some(instant),
        labels: config.monitored_resource_labels.clone(),
        metric_value_sets: vec![value_set],
    }
}

/// Builds the request reporting a single operation.
#[must_use]
pub fn report_request(operation: Operation, config: &Config) -> ReportRequest {
    ReportRequest {
        service_name: config.service_name.clone(),
        operations: vec![operation],
        service_config_id: String::new(),
    }
}
