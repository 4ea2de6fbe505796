use std::fmt;
use std::time::{Duration, SystemTime};

use crate::metadata::MetaData;

/// Declared shape of a record: one typed source per value.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub type_name: String,
    pub sources: Vec<DataSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub kind: DataSourceKind,
}

impl DataSource {
    pub fn new(name: impl Into<String>, kind: impl Into<DataSourceKind>) -> Self {
        DataSource { name: name.into(), kind: kind.into() }
    }
}

/// Numeric kind of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Counter,
    Gauge,
    Derive,
    Absolute,
    /// A raw type code the writer does not know how to report.
    Other(i32),
}

impl From<i32> for DataSourceKind {
    fn from(raw: i32) -> Self {
        match raw {
            0 => DataSourceKind::Counter,
            1 => DataSourceKind::Gauge,
            2 => DataSourceKind::Derive,
            3 => DataSourceKind::Absolute,
            other => DataSourceKind::Other(other),
        }
    }
}

/// Raw 64-bit value cell.
///
/// The bits are interpreted according to the [`DataSourceKind`] declared for
/// the slot the value sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value(u64);

impl Value {
    #[must_use]
    pub const fn counter(value: u64) -> Self {
        Value(value)
    }

    #[must_use]
    pub const fn gauge(value: f64) -> Self {
        Value(value.to_bits())
    }

    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn derive(value: i64) -> Self {
        Value(value as u64)
    }

    #[must_use]
    pub const fn absolute(value: u64) -> Self {
        Value(value)
    }

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Value(bits)
    }

    #[must_use]
    pub const fn as_counter(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn as_gauge(self) -> f64 {
        f64::from_bits(self.0)
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_derive(self) -> i64 {
        self.0 as i64
    }

    #[must_use]
    pub const fn as_absolute(self) -> u64 {
        self.0
    }
}

/// One record delivered by the host for writing.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    pub type_: String,
    pub type_instance: String,
    /// Sample time.
    pub time: SystemTime,
    /// Collection interval.
    pub interval: Duration,
    pub values: Vec<Value>,
    pub meta: Option<MetaData>,
}

impl ValueList {
    /// Renders `host/plugin[-instance]/type[-instance]`.
    #[must_use]
    pub const fn identifier(&self) -> Identifier<'_> {
        Identifier(self)
    }
}

pub struct Identifier<'a>(&'a ValueList);

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ValueList { host, plugin, plugin_instance, type_, type_instance, .. } = self.0;

        write!(f, "{host}/{plugin}")?;
        if !plugin_instance.is_empty() {
            write!(f, "-{plugin_instance}")?;
        }
        write!(f, "/{type_}")?;
        if !type_instance.is_empty() {
            write!(f, "-{type_instance}")?;
        }

        Ok(())
    }
}
