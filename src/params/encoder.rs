//! Rails-style parameter encoder

use super::types::{ParamValue, Params};
use crate::error::{Error, Result};
use chrono::SecondsFormat;
use url::form_urlencoded;

/// Flatten parameters into `(key, value)` pairs in key order.
///
/// Lists expand to repeated `key[]` pairs, maps to `key[sub]` pairs, both
/// recursively.
pub fn encode_pairs(params: &Params) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params.iter() {
        if key.is_empty() {
            return Err(Error::encode(key, "parameter name is empty"));
        }
        encode_value(key, value, &mut pairs)?;
    }
    Ok(pairs)
}

/// Encode parameters as an `application/x-www-form-urlencoded` string.
///
/// Used both for query strings and form bodies.
pub fn to_query_string(params: &Params) -> Result<String> {
    let pairs = encode_pairs(params)?;
    Ok(form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish())
}

fn encode_value(key: &str, value: &ParamValue, out: &mut Vec<(String, String)>) -> Result<()> {
    match value {
        ParamValue::List(items) => {
            let item_key = format!("{key}[]");
            for item in items {
                encode_value(&item_key, item, out)?;
            }
        }
        ParamValue::Map(fields) => {
            for (sub, field) in fields {
                if sub.is_empty() {
                    return Err(Error::encode(key, "nested field name is empty"));
                }
                encode_value(&format!("{key}[{sub}]"), field, out)?;
            }
        }
        scalar => out.push((key.to_string(), encode_scalar(key, scalar)?)),
    }
    Ok(())
}

fn encode_scalar(key: &str, value: &ParamValue) -> Result<String> {
    let encoded = match value {
        ParamValue::String(s) | ParamValue::Enum(s) => s.clone(),
        ParamValue::Integer(i) => i.to_string(),
        ParamValue::Float(f) if f.is_finite() => f.to_string(),
        ParamValue::Float(f) => {
            return Err(Error::encode(key, format!("float {f} is not finite")));
        }
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        ParamValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ParamValue::List(_) | ParamValue::Map(_) => {
            return Err(Error::encode(key, "expected a scalar value"));
        }
    };
    Ok(encoded)
}
