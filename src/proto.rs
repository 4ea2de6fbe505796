//! Wire messages for `google.api.servicecontrol.v1`.
//!
//! Only the subset of the service control schema that the writer emits or
//! inspects is declared here; unknown fields in responses are skipped by the
//! decoder.

use std::collections::BTreeMap;

use prost_types::Timestamp;

/// Fully qualified path of the unary `Report` method.
pub const REPORT_PATH: &str = "/google.api.servicecontrol.v1.ServiceController/Report";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportRequest {
    #[prost(string, tag = "1")]
    pub service_name: String,
    #[prost(message, repeated, tag = "2")]
    pub operations: Vec<Operation>,
    #[prost(string, tag = "3")]
    pub service_config_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportResponse {
    /// Operations the service refused; absent operations were accepted.
    #[prost(message, repeated, tag = "1")]
    pub report_errors: Vec<ReportError>,
    #[prost(string, tag = "2")]
    pub service_config_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportError {
    #[prost(string, tag = "1")]
    pub operation_id: String,
    #[prost(message, optional, tag = "2")]
    pub status: Option<Status>,
}

/// `google.rpc.Status`, without the `details` payloads.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(string, tag = "1")]
    pub operation_id: String,
    #[prost(string, tag = "2")]
    pub operation_name: String,
    #[prost(string, tag = "3")]
    pub consumer_id: String,
    #[prost(message, optional, tag = "4")]
    pub start_time: Option<Timestamp>,
    #[prost(message, optional, tag = "5")]
    pub end_time: Option<Timestamp>,
    /// Monitored resource labels.
    #[prost(btree_map = "string, string", tag = "6")]
    pub labels: BTreeMap<String, String>,
    #[prost(message, repeated, tag = "7")]
    pub metric_value_sets: Vec<MetricValueSet>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricValueSet {
    #[prost(string, tag = "1")]
    pub metric_name: String,
    #[prost(message, repeated, tag = "2")]
    pub metric_values: Vec<MetricValue>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricValue {
    #[prost(btree_map = "string, string", tag = "1")]
    pub labels: BTreeMap<String, String>,
    #[prost(message, optional, tag = "2")]
    pub start_time: Option<Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub end_time: Option<Timestamp>,
    #[prost(oneof = "metric_value::Value", tags = "4, 5, 6, 7")]
    pub value: Option<metric_value::Value>,
}

pub mod metric_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(bool, tag = "4")]
        BoolValue(bool),
        #[prost(int64, tag = "5")]
        Int64Value(i64),
        #[prost(double, tag = "6")]
        DoubleValue(f64),
        #[prost(string, tag = "7")]
        StringValue(String),
    }
}
