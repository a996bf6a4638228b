//! Parameter value types
//!
//! `ParamValue` is the closed set of shapes the encoder understands. Types
//! outside that set opt in by implementing [`ToParam`].

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A single request parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Free-form string
    String(String),
    /// Enum constant, encoded as its string form
    Enum(String),
    /// Integer
    Integer(i64),
    /// Floating point number (must be finite to encode)
    Float(f64),
    /// Boolean, encoded as `true` / `false`
    Bool(bool),
    /// Calendar date, encoded as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Timestamp, encoded as RFC 3339 in UTC
    DateTime(DateTime<Utc>),
    /// List, encoded as repeated `key[]` entries
    List(Vec<ParamValue>),
    /// Nested structure, encoded as `key[sub]` entries
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Create an enum value from its wire constant
    pub fn enumeration(value: impl Into<String>) -> Self {
        Self::Enum(value.into())
    }

    /// Convert a JSON value, dropping nulls.
    ///
    /// Returns `None` when the value itself is null.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Integer(i),
                (None, Some(f)) if n.is_f64() => Self::Float(f),
                // u64 beyond i64::MAX
                _ => Self::String(n.to_string()),
            }),
            Value::String(s) => Some(Self::String(s)),
            Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Value::Object(map) => Some(Self::Map(
                map.into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Conversion into a [`ParamValue`]
///
/// Implement this for domain types that should be accepted as parameters.
pub trait ToParam {
    /// Convert to a parameter value
    fn to_param(&self) -> ParamValue;
}

/// An enum whose variants map to API string constants
pub trait ApiEnum {
    /// The wire constant for this variant
    fn as_str(&self) -> &str;
}

impl ToParam for ParamValue {
    fn to_param(&self) -> ParamValue {
        self.clone()
    }
}

impl ToParam for &str {
    fn to_param(&self) -> ParamValue {
        ParamValue::String((*self).to_string())
    }
}

impl ToParam for String {
    fn to_param(&self) -> ParamValue {
        ParamValue::String(self.clone())
    }
}

impl ToParam for bool {
    fn to_param(&self) -> ParamValue {
        ParamValue::Bool(*self)
    }
}

impl ToParam for i32 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Integer(i64::from(*self))
    }
}

impl ToParam for u32 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Integer(i64::from(*self))
    }
}

impl ToParam for i64 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Integer(*self)
    }
}

impl ToParam for u64 {
    fn to_param(&self) -> ParamValue {
        i64::try_from(*self)
            .map_or_else(|_| ParamValue::String(self.to_string()), ParamValue::Integer)
    }
}

impl ToParam for usize {
    fn to_param(&self) -> ParamValue {
        i64::try_from(*self)
            .map_or_else(|_| ParamValue::String(self.to_string()), ParamValue::Integer)
    }
}

impl ToParam for f64 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Float(*self)
    }
}

impl ToParam for NaiveDate {
    fn to_param(&self) -> ParamValue {
        ParamValue::Date(*self)
    }
}

impl ToParam for DateTime<Utc> {
    fn to_param(&self) -> ParamValue {
        ParamValue::DateTime(*self)
    }
}

impl<T: ToParam> ToParam for Vec<T> {
    fn to_param(&self) -> ParamValue {
        ParamValue::List(self.iter().map(ToParam::to_param).collect())
    }
}

impl<T: ToParam> ToParam for BTreeMap<String, T> {
    fn to_param(&self) -> ParamValue {
        ParamValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_param()))
                .collect(),
        )
    }
}

/// Request parameters keyed by name
///
/// Keys are kept sorted so encodings are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Create an empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToParam) -> &mut Self {
        self.values.insert(key.into(), value.to_param());
        self
    }

    /// Set a parameter only if the caller provided one
    pub fn insert_opt<V: ToParam>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Set an enum parameter by its wire constant
    pub fn insert_enum<E: ApiEnum + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &E,
    ) -> &mut Self {
        self.values
            .insert(key.into(), ParamValue::enumeration(value.as_str()));
        self
    }

    /// Set a structured parameter from any serializable value.
    ///
    /// The value is flattened into nested sub-fields; null fields are dropped.
    /// A value serializing to null is treated as unset.
    pub fn insert_serialize<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self> {
        let key = key.into();
        let json = serde_json::to_value(value).map_err(|e| Error::encode(&key, e.to_string()))?;
        if let Some(param) = ParamValue::from_json(json) {
            self.values.insert(key, param);
        }
        Ok(self)
    }

    /// Builder-style [`Params::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToParam) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style [`Params::insert_opt`]
    #[must_use]
    pub fn with_opt<V: ToParam>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Remove a parameter
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    /// Number of top-level parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

impl<K: Into<String>, V: ToParam> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
