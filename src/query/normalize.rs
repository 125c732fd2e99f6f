//! Store-to-JSON normalization at the read boundary.
//!
//! The record store carries numbers as decimal strings. Read-view callers
//! expect native JSON numbers, so every attribute crossing out of the store
//! passes through here: integers stay integers, everything else numeric
//! becomes a float, and a string that parses as neither passes through
//! unchanged.

use crate::store::AttrValue;
use std::collections::BTreeMap;

/// Convert one attribute value to plain JSON.
#[must_use]
pub fn to_json(value: &AttrValue) -> serde_json::Value {
    match value {
        AttrValue::S(s) => serde_json::Value::String(s.clone()),
        AttrValue::N(n) => parse_number(n),
        AttrValue::Bool(b) => serde_json::Value::Bool(*b),
        AttrValue::Null => serde_json::Value::Null,
        AttrValue::L(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        AttrValue::M(map) => map_to_json(map),
    }
}

/// Convert an attribute map to a JSON object.
#[must_use]
pub fn map_to_json(map: &BTreeMap<String, AttrValue>) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
}

fn parse_number(text: &str) -> serde_json::Value {
    if let Ok(i) = text.parse::<i64>() {
        return serde_json::Value::Number(i.into());
    }

    if let Ok(u) = text.parse::<u64>() {
        return serde_json::Value::Number(u.into());
    }

    if let Ok(f) = text.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return serde_json::Value::Number(n);
    }

    serde_json::Value::String(text.to_owned())
}
