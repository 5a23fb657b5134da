//! Watched-path resolution for the aliveness check.
//!
//! The `ALIVENESS_URL` setting is loosely typed. It is classified once into
//! an [`AlivenessSetting`] and then normalized into [`WatchedPaths`]. Every
//! shape that is not a string or a list of strings goes through the same
//! fallback: log and return what could be salvaged.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

/// Name of the setting, as operators write it in the config file.
pub const SETTING_NAME: &str = "ALIVENESS_URL";

/// The raw `ALIVENESS_URL` entry, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AlivenessSetting {
    /// The key is missing from the configuration.
    Absent,
    /// The key is present and explicitly `null`: the check is switched off.
    Null,
    /// A single path.
    Single(String),
    /// A list of candidate paths. Elements are not yet known to be strings.
    Collection(Vec<Value>),
    /// Anything else (number, boolean, table).
    Other(Value),
}

impl From<Option<&Value>> for AlivenessSetting {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None => Self::Absent,
            Some(Value::Null) => Self::Null,
            Some(Value::String(path)) => Self::Single(path.clone()),
            Some(Value::Array(items)) => Self::Collection(items.clone()),
            Some(other) => Self::Other(other.clone()),
        }
    }
}

/// The set of request paths answered by the aliveness check.
///
/// Immutable once resolved. An empty set is valid and disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchedPaths(BTreeSet<String>);

impl WatchedPaths {
    /// Exact, case-sensitive membership test.
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for WatchedPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Resolve the watched-path set from the aliveness setting.
///
/// Never fails. Problems are reported as `warn` events and the offending
/// values are dropped.
pub fn resolve_paths(setting: &AlivenessSetting) -> WatchedPaths {
    match setting {
        AlivenessSetting::Absent => {
            warn!("{} was not set", SETTING_NAME);
            WatchedPaths::default()
        }
        AlivenessSetting::Null => WatchedPaths::default(),
        AlivenessSetting::Single(path) => std::iter::once(path.as_str()).collect(),
        AlivenessSetting::Collection(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(path) => Some(path.as_str()),
                other => {
                    warn!("Item in {} was not a string: {}", SETTING_NAME, other);
                    None
                }
            })
            .collect(),
        AlivenessSetting::Other(value) => {
            warn!(
                "{} must be a string or a list of strings, got {} ({})",
                SETTING_NAME,
                value,
                kind(value)
            );
            WatchedPaths::default()
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "table",
    }
}
