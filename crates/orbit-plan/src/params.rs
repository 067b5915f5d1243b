use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::PlanError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// Scalar value stored in a parameter bag.
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParamValue {
    /// Renders the value the way it appears in URLs and chat text.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Parameter bag carried between steps. Ordered so serialized plans are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Trimmed textual value; blank text counts as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(ParamValue::render)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    pub fn require_text(&self, key: &str) -> Result<String, PlanError> {
        self.text(key).ok_or_else(|| PlanError::missing(key))
    }

    /// Issue numbers arrive as integers from buttons and as text from chat.
    pub fn require_number(&self, key: &str) -> Result<u64, PlanError> {
        match self.get(key) {
            None => Err(PlanError::missing(key)),
            Some(ParamValue::Int(value)) => {
                u64::try_from(*value).map_err(|_| PlanError::InvalidParameter {
                    name: key.to_string(),
                    value: value.to_string(),
                    reason: "must be a positive number".to_string(),
                })
            }
            Some(other) => {
                let raw = other.render();
                raw.trim()
                    .trim_start_matches('#')
                    .parse::<u64>()
                    .map_err(|error| PlanError::InvalidParameter {
                        name: key.to_string(),
                        value: raw.clone(),
                        reason: error.to_string(),
                    })
            }
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(ParamValue::Bool(value)) => *value,
            Some(ParamValue::Int(value)) => *value != 0,
            Some(ParamValue::Text(value)) => {
                matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            None => false,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
