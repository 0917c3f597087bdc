use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw inventory row as the backend reports it. Dealers upload stock through several different
/// tools, so field presence is inconsistent; everything beyond the owner id is optional and gets
/// validated downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stone {
    #[serde(default, alias = "stock", alias = "stock_id")]
    pub stock_number: Option<String>,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default, alias = "carat", alias = "carats")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub clarity: Option<String>,
    #[serde(default, alias = "ppc", alias = "price_per_carat_usd")]
    pub price_per_carat: Option<f64>,
}

/// Keys under which the backend has been observed to wrap the stone array.
const ARRAY_KEYS: [&str; 4] = ["data", "stones", "items", "results"];

/// Normalizes the backend's inventory payload into a list of stones.
///
/// Accepts either a bare JSON array, or an object wrapping an array under one of [`ARRAY_KEYS`].
/// Any other shape yields an empty list (fail closed): a malformed dealer inventory must never
/// abort the scan of the remaining dealers. Rows that do not deserialize are skipped individually.
pub fn normalize_stone_payload(payload: Value) -> Vec<Stone> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let Some(items) = ARRAY_KEYS.iter().find_map(|k| map.remove(*k)) else {
                warn!("🗄️ Inventory payload is an object without a recognized array field. Treating as empty.");
                return Vec::new();
            };
            match items {
                Value::Array(items) => items,
                other => {
                    warn!("🗄️ Inventory payload wraps a {} where an array was expected. Treating as empty.", type_name(&other));
                    return Vec::new();
                },
            }
        },
        other => {
            warn!("🗄️ Inventory payload is a {}, not an array or object. Treating as empty.", type_name(&other));
            return Vec::new();
        },
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Stone>(item) {
            Ok(stone) => Some(stone),
            Err(e) => {
                debug!("🗄️ Skipping unreadable inventory row. {e}");
                None
            },
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_array() {
        let stones = normalize_stone_payload(json!([
            {"stock_number": "A-1", "shape": "round", "weight": 1.5, "color": "D", "clarity": "VS1", "price_per_carat": 5000.0}
        ]));
        assert_eq!(stones.len(), 1);
        assert_eq!(stones[0].stock_number.as_deref(), Some("A-1"));
        assert_eq!(stones[0].weight, Some(1.5));
    }

    #[test]
    fn wrapped_array() {
        for key in ["data", "stones", "items", "results"] {
            let stones = normalize_stone_payload(json!({key: [{"shape": "oval"}]}));
            assert_eq!(stones.len(), 1, "expected array under {key}");
            assert_eq!(stones[0].shape.as_deref(), Some("oval"));
        }
    }

    #[test]
    fn aliases_are_accepted() {
        let stones = normalize_stone_payload(json!([{"stock": "B-2", "carat": 2.0, "ppc": 3000.0}]));
        assert_eq!(stones[0].stock_number.as_deref(), Some("B-2"));
        assert_eq!(stones[0].weight, Some(2.0));
        assert_eq!(stones[0].price_per_carat, Some(3000.0));
    }

    #[test]
    fn unrecognized_shapes_fail_closed() {
        assert!(normalize_stone_payload(json!("nope")).is_empty());
        assert!(normalize_stone_payload(json!(42)).is_empty());
        assert!(normalize_stone_payload(json!({"rows": []})).is_empty());
        assert!(normalize_stone_payload(json!({"data": "not-an-array"})).is_empty());
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let stones = normalize_stone_payload(json!([{"shape": "pear"}, "garbage", {"weight": "heavy"}]));
        assert_eq!(stones.len(), 1);
    }
}
