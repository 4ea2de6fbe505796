use std::collections::BTreeMap;

use thiserror::Error;

/// Metadata key whose string value names the exported metric.
pub const EXPORT_NAME_KEY: &str = "stackdriver_metric_type";
/// Metadata keys with this prefix carry one label each; the suffix is the
/// label name.
pub const LABEL_PREFIX: &str = "label:";

/// Typed metadata value attached to a record.
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    SignedInt(i64),
    UnsignedInt(u64),
    Double(f64),
    Boolean(bool),
}

impl MetaValue {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            MetaValue::String(_) => "string",
            MetaValue::SignedInt(_) => "signed_int",
            MetaValue::UnsignedInt(_) => "unsigned_int",
            MetaValue::Double(_) => "double",
            MetaValue::Boolean(_) => "boolean",
        }
    }

    /// Canonical text form used as a label value.
    #[must_use]
    pub fn to_label_value(&self) -> String {
        match self {
            MetaValue::String(val) => val.clone(),
            MetaValue::SignedInt(val) => val.to_string(),
            MetaValue::UnsignedInt(val) => val.to_string(),
            MetaValue::Double(val) => val.to_string(),
            MetaValue::Boolean(val) => val.to_string(),
        }
    }
}

/// Key/value metadata table attached to one record.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    entries: Vec<(String, MetaValue)>,
}

impl MetaData {
    #[must_use]
    pub const fn new() -> Self {
        MetaData { entries: Vec::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);

        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find_map(|(existing, value)| (existing == key).then_some(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::SignedInt(value)
    }
}

impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        MetaValue::UnsignedInt(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Double(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Boolean(value)
    }
}

/// Export name and labels carried by a record's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricIdentity {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// Metadata marked a record for export but could not be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metric name of non-string type; kind={0}")]
    NameNotString(&'static str),
    #[error("Metric name is empty")]
    EmptyName,
}

/// Extracts the export identity from a record's metadata.
///
/// # Returns
///
/// - `Ok(None)` if the record is not marked for export (no metadata, or no
///   [`EXPORT_NAME_KEY`]). Labels found without a name are discarded.
/// - `Ok(Some(identity))` if the record should be exported.
///
/// # Errors
///
/// Errors if the record is marked for export but the export name is not a
/// non-empty string.
pub fn interpret(meta: Option<&MetaData>) -> Result<Option<MetricIdentity>, MetadataError> {
    let Some(meta) = meta else {
        return Ok(None);
    };

    let mut name = None;
    let mut labels = BTreeMap::new();
    for (key, value) in meta.iter() {
        if key == EXPORT_NAME_KEY {
            let MetaValue::String(value) = value else {
                return Err(MetadataError::NameNotString(value.kind()));
            };
            if value.is_empty() {
                return Err(MetadataError::EmptyName);
            }

            name = Some(value.clone());
        } else if let Some(label) = key.strip_prefix(LABEL_PREFIX) {
            // A bare prefix names the empty label.
            labels.insert(label.to_string(), value.to_label_value());
        }
    }

    Ok(name.map(|name| MetricIdentity { name, labels }))
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn no_metadata_is_not_exported() {
        assert_eq!(interpret(None), Ok(None));
    }

    #[test]
    fn labels_without_name_are_discarded() {
        let meta = MetaData::new().with("label:a", "x").with("label:b", 5i64);

        assert_eq!(interpret(Some(&meta)), Ok(None));
    }

    #[test]
    fn name_and_mixed_labels() {
        let meta = MetaData::new()
            .with(EXPORT_NAME_KEY, "m")
            .with("label:a", "x")
            .with("label:b", 5i64)
            .with("unrelated", 1.5);

        let identity = interpret(Some(&meta)).unwrap().unwrap();

        assert_eq!(identity.name, "m");
        assert_eq!(
            identity.labels,
            BTreeMap::from_iter([
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "5".to_string()),
            ])
        );
    }

    #[test]
    fn label_value_text() {
        let meta = MetaData::new()
            .with(EXPORT_NAME_KEY, "m")
            .with("label:signed", -7i64)
            .with("label:unsigned", u64::MAX)
            .with("label:double", 2.5)
            .with("label:yes", true)
            .with("label:no", false);

        let identity = interpret(Some(&meta)).unwrap().unwrap();

        let rendered: Vec<_> = identity.labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
        expect!["double=2.5,no=false,signed=-7,unsigned=18446744073709551615,yes=true"]
            .assert_eq(&rendered.join(","));
    }

    #[test]
    fn boolean_after_double_stringifies_boolean() {
        // The double must not leak into the boolean's text.
        let meta = MetaData::new()
            .with(EXPORT_NAME_KEY, "m")
            .with("label:ratio", 0.25)
            .with("label:enabled", true);

        let identity = interpret(Some(&meta)).unwrap().unwrap();

        assert_eq!(identity.labels["ratio"], "0.25");
        assert_eq!(identity.labels["enabled"], "true");
    }

    #[test]
    fn non_string_name_is_malformed() {
        let meta = MetaData::new().with(EXPORT_NAME_KEY, 3u64).with("label:a", "x");

        expect!["Metric name of non-string type; kind=unsigned_int"]
            .assert_eq(&interpret(Some(&meta)).unwrap_err().to_string());
    }

    #[test]
    fn empty_name_is_malformed() {
        let meta = MetaData::new().with(EXPORT_NAME_KEY, "");

        assert_eq!(interpret(Some(&meta)), Err(MetadataError::EmptyName));
    }

    #[test]
    fn bare_label_prefix_is_an_empty_label() {
        let meta = MetaData::new()
            .with(EXPORT_NAME_KEY, "m")
            .with(LABEL_PREFIX, "x")
            .with("label:a", "y");

        let identity = interpret(Some(&meta)).unwrap().unwrap();

        assert_eq!(identity.name, "m");
        assert_eq!(
            identity.labels,
            BTreeMap::from_iter([
                (String::new(), "x".to_string()),
                ("a".to_string(), "y".to_string()),
            ])
        );
    }

    #[test]
    fn bare_label_prefix_without_export_name_is_not_exported() {
        let meta = MetaData::new().with(LABEL_PREFIX, "x");

        assert_eq!(interpret(Some(&meta)), Ok(None));
    }

    #[test]
    fn insert_replaces_existing_key() {
        let meta = MetaData::new().with("label:a", "x").with("label:a", "y");

        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("label:a"), Some(&MetaValue::String("y".to_string())));
    }

    #[test]
    fn without_export_name_never_exported() {
        proptest!(|(entries: Vec<(String, MetaValue)>)| {
            let mut meta = MetaData::new();
            for (key, value) in entries {
                if key != EXPORT_NAME_KEY {
                    meta.insert(key, value);
                }
            }

            prop_assert_eq!(interpret(Some(&meta)), Ok(None));
        });
    }

    #[test]
    fn every_label_key_becomes_a_label() {
        proptest!(|(name in "[a-z]{1,8}", labels: Vec<(String, MetaValue)>)| {
            let mut meta = MetaData::new().with(EXPORT_NAME_KEY, name.as_str());
            for (label, value) in &labels {
                meta.insert(format!("{LABEL_PREFIX}{label}"), value.clone());
            }

            let identity = interpret(Some(&meta)).unwrap().unwrap();

            prop_assert_eq!(identity.name, name);
            prop_assert_eq!(identity.labels.len(), meta.len() - 1);
        });
    }
}
