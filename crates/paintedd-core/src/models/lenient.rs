//! Record-by-record parsing for hand-edited data files.
//!
//! One malformed entry is logged and dropped; the rest of the file loads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Parse every element on its own, dropping the ones that do not fit `T`.
pub fn parse_each<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    let kind = short_type_name::<T>();
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(kind = kind, index = index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// `deserialize_with` helper for list fields; `null` reads as empty.
pub fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(parse_each(values))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[derive(Debug, Deserialize)]
    struct File {
        #[serde(default, deserialize_with = "skip_malformed")]
        rows: Vec<Row>,
    }

    #[test]
    fn test_bad_rows_are_dropped() {
        let file: File = serde_json::from_value(serde_json::json!({
            "rows": [{"id": 1}, {"id": "two"}, "junk", {"id": 3}]
        }))
        .unwrap();
        assert_eq!(file.rows, vec![Row { id: 1 }, Row { id: 3 }]);
    }

    #[test]
    fn test_null_and_missing_lists_are_empty() {
        let file: File = serde_json::from_str(r#"{"rows": null}"#).unwrap();
        assert!(file.rows.is_empty());
        let file: File = serde_json::from_str("{}").unwrap();
        assert!(file.rows.is_empty());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Row>(), "Row");
    }
}
