//! Firestore typed values (`{"stringValue": "..."}` and friends) to plain JSON and back.

use chrono::DateTime;
use serde_json::{json, Map, Number, Value};

use crate::documents::Document;

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decodes a typed value. Timestamps become epoch milliseconds; geo points
/// become `{latitude, longitude}` maps; unknown shapes become null.
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };

    if let Some(b) = typed.get("booleanValue") {
        return Value::Bool(b.as_bool().unwrap_or(false));
    }
    if let Some(i) = typed.get("integerValue") {
        // Firestore sends int64 as a JSON string
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            other => other.as_i64(),
        };
        return parsed.map(Value::from).unwrap_or(Value::Null);
    }
    if let Some(d) = typed.get("doubleValue") {
        return d
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Some(ts) = typed.get("timestampValue").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(ts)
            .map(|dt| Value::from(dt.timestamp_millis()))
            .unwrap_or(Value::Null);
    }
    for key in ["stringValue", "referenceValue", "bytesValue"] {
        if let Some(s) = typed.get(key).and_then(Value::as_str) {
            return Value::String(s.to_string());
        }
    }
    if let Some(geo) = typed.get("geoPointValue") {
        return json!({
            "latitude": geo.get("latitude").and_then(Value::as_f64).unwrap_or_default(),
            "longitude": geo.get("longitude").and_then(Value::as_f64).unwrap_or_default(),
        });
    }
    if let Some(array) = typed.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map.get("fields").and_then(Value::as_object);
        return Value::Object(fields.map(decode_fields).unwrap_or_default());
    }

    Value::Null
}

pub fn decode_fields(fields: &Map<String, Value>) -> Document {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}
