use prost_types::Timestamp;
use tracing::{error, warn};

use crate::metadata::MetricIdentity;
use crate::proto::{metric_value, MetricValue, MetricValueSet};
use crate::record::{DataSet, DataSourceKind, Value, ValueList};

/// Builds the value-set for one exported record.
///
/// Every value shares the record's `[time, time + interval]` window and the
/// identity's labels. Sources of an unrecognized kind are skipped; they never
/// fail the rest of the record.
///
/// # Panics
///
/// Panics if the data set declares no sources or the record's value count
/// does not match the declared sources.
#[must_use]
pub fn build_value_set(
    data_set: &DataSet,
    values: &ValueList,
    identity: &MetricIdentity,
) -> MetricValueSet {
    assert!(!data_set.sources.is_empty(), "Data set without sources; type={}", data_set.type_name);
    assert_eq!(
        data_set.sources.len(),
        values.values.len(),
        "Value count does not match data set; type={}",
        data_set.type_name
    );

    let (start_time, end_time) = value_window(values);

    let metric_values = data_set
        .sources
        .iter()
        .zip(&values.values)
        .filter_map(|(source, value)| {
            let Some(value) = typed_value(source.kind, *value) else {
                warn!(
                    identifier = %values.identifier(),
                    source = %source.name,
                    kind = ?source.kind,
                    "Skipping data source of unknown type"
                );
                metrics::counter!("write_gsc_sources_skipped_total").increment(1);

                return None;
            };

            Some(MetricValue {
                labels: identity.labels.clone(),
                start_time: Some(start_time.clone()),
                end_time: Some(end_time.clone()),
                value: Some(value),
            })
        })
        .collect();

    MetricValueSet { metric_name: identity.name.clone(), metric_values }
}

#[allow(clippy::cast_possible_wrap)]
fn typed_value(kind: DataSourceKind, value: Value) -> Option<metric_value::Value> {
    match kind {
        DataSourceKind::Counter => Some(metric_value::Value::Int64Value(value.as_counter() as i64)),
        DataSourceKind::Gauge => Some(metric_value::Value::DoubleValue(value.as_gauge())),
        DataSourceKind::Derive => Some(metric_value::Value::Int64Value(value.as_derive())),
        DataSourceKind::Absolute => {
            Some(metric_value::Value::Int64Value(value.as_absolute() as i64))
        }
        DataSourceKind::Other(_) => None,
    }
}

fn value_window(values: &ValueList) -> (Timestamp, Timestamp) {
    let start = values.time;
    let end = values.time.checked_add(values.interval).unwrap_or_else(|| {
        error!(
            identifier = %values.identifier(),
            interval = ?values.interval,
            "Value window end overflows, clamping to start"
        );

        start
    });

    (Timestamp::from(start), Timestamp::from(end))
}
