//! Tolerant field decoders. Specifications are produced by an editor that is
//! loose about JSON types, so numbers may arrive as strings and flags as
//! strings or nulls.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64().map(|f| f as f32),
        Some(Value::String(s)) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}

/// Out-of-range values clamp to the `i32` bounds
pub(crate) fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64().map(|f| f.round() as i32),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    })
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(opt_flag(d)?.unwrap_or(false))
}

pub(crate) fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().parse::<bool>().ok(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

/// Strings pass through; scalars are printed; structured values keep their JSON text
pub(crate) fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

pub(crate) fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A list of `[key, value]` pairs; malformed entries are dropped
pub(crate) fn pairs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, Value)>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items.into_iter().filter_map(pair).collect(),
        _ => Vec::new(),
    })
}

fn pair(item: Value) -> Option<(String, Value)> {
    match item {
        Value::Array(mut entry) if entry.len() == 2 => {
            let value = entry.pop()?;
            match entry.pop()? {
                Value::String(key) => Some((key, value)),
                _ => None,
            }
        }
        _ => {
            log::warn!("skipping malformed [key, node] entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    struct Fields {
        #[serde(default, deserialize_with = "opt_f32")]
        size: Option<f32>,
        #[serde(default, deserialize_with = "opt_i32")]
        number: Option<i32>,
        #[serde(default, deserialize_with = "flag")]
        bold: bool,
        #[serde(default, deserialize_with = "opt_string")]
        value: Option<String>,
        #[serde(default, deserialize_with = "pairs")]
        entries: Vec<(String, Value)>,
    }

    #[test]
    fn lenient_values() {
        let fields: Fields = serde_json::from_str(
            r#"{"size": "12.5", "bold": "true", "value": 42, "entries": [["a", {}], ["b"], 3]}"#,
        )
        .expect("decodes");
        assert_eq!(fields.size, Some(12.5));
        assert!(fields.bold);
        assert_eq!(fields.value.as_deref(), Some("42"));
        assert_eq!(fields.entries.len(), 1);
        assert_eq!(fields.entries[0].0, "a");
    }

    #[test]
    fn nulls_and_absences() {
        let fields: Fields = serde_json::from_str(r#"{"size": null, "bold": null}"#).expect("decodes");
        assert_eq!(fields.size, None);
        assert!(!fields.bold);
        assert_eq!(fields.value, None);
        assert!(fields.entries.is_empty());
    }

    #[test]
    fn integers_clamp_to_their_range() {
        let fields: Fields = serde_json::from_str(r#"{"number": -1e20}"#).expect("decodes");
        assert_eq!(fields.number, Some(i32::MIN));
        let fields: Fields = serde_json::from_str(r#"{"number": " 4294967296 "}"#).expect("decodes");
        assert_eq!(fields.number, Some(i32::MAX));
        let fields: Fields = serde_json::from_str(r#"{"number": "2.6"}"#).expect("decodes");
        assert_eq!(fields.number, Some(3));
    }
}
