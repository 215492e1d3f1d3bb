use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row as the vision reader produced it. Every field may be absent,
/// null, or the wrong type; nothing is trusted until it has been through
/// the coercion functions below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOrderRecord {
    pub store: Value,
    pub item: Value,
    pub spec: Value,
    pub unit: Value,
    pub boxes: Value,
    pub remainder: Value,
}

/// A row after normalization: names resolved, counts coerced, spec always
/// a string. Empty strings are allowed, null never is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOrderRecord {
    pub store: String,
    pub item: String,
    pub spec: String,
    pub unit: u32,
    pub boxes: u32,
    pub remainder: u32,
}

/// Coerce any JSON value to trimmed text. Null becomes the empty string;
/// non-string scalars render as their JSON form.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Coerce any JSON value to a count by keeping only its digits:
/// `"30本"` → 30, `"× 30"` → 30, null/absent/empty → 0. Digit runs past
/// `u32::MAX` clamp.
pub fn coerce_count(value: &Value) -> u32 {
    match value {
        Value::Null => 0,
        Value::Number(n) => match n.as_u64() {
            Some(v) => clamp_u32(v),
            None => digits_only(&n.to_string()),
        },
        Value::String(s) => digits_only(s),
        _ => 0,
    }
}

fn digits_only(s: &str) -> u32 {
    let Ok(re) = Regex::new(r"[^0-9]") else {
        return 0;
    };
    let digits = re.replace_all(s, "");
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map_or(u32::MAX, clamp_u32)
}

fn clamp_u32(v: u64) -> u32 {
    v.min(u64::from(u32::MAX)) as u32
}

/// Parse a batch the way the upstream reader hands it over: a JSON array
/// of objects, or a single object treated as a one-element batch.
/// Non-object elements degrade to an all-default record; only top-level
/// JSON that does not parse at all is an error.
pub fn parse_raw_records(text: &str) -> Result<Vec<RawOrderRecord>, serde_json::Error> {
    let parsed: Value = serde_json::from_str(text)?;
    let elements = match parsed {
        Value::Array(elements) => elements,
        single => vec![single],
    };
    Ok(elements
        .into_iter()
        .map(|element| serde_json::from_value(element).unwrap_or_default())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_coercion() {
        assert_eq!(coerce_count(&json!(null)), 0);
        assert_eq!(coerce_count(&json!("")), 0);
        assert_eq!(coerce_count(&json!("30本")), 30);
        assert_eq!(coerce_count(&json!("× 30")), 30);
        assert_eq!(coerce_count(&json!(7)), 7);
        assert_eq!(coerce_count(&json!("3ケース5")), 35); // digits concatenate
        assert_eq!(coerce_count(&json!(true)), 0);
    }

    #[test]
    fn test_count_clamps_oversized() {
        assert_eq!(coerce_count(&json!("99999999999")), u32::MAX);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(coerce_text(&json!(null)), "");
        assert_eq!(coerce_text(&json!("  鎌ケ谷  ")), "鎌ケ谷");
        assert_eq!(coerce_text(&json!(12)), "12");
    }

    #[test]
    fn test_parse_single_object_as_batch() {
        let records = parse_raw_records(r#"{"store": "五香", "unit": "10"}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(coerce_text(&records[0].store), "五香");
        assert!(records[0].item.is_null());
    }

    #[test]
    fn test_parse_array_with_junk_element() {
        let records = parse_raw_records(r#"[{"item": "胡瓜"}, "junk"]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(coerce_text(&records[1].item), ""); // degraded to defaults
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_raw_records("not json at all").is_err());
    }
}
