use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::store::Fields;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl FirestoreDocument {
    /// Last path segment of the resource name.
    pub fn key(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Request body for create and patch calls.
#[derive(Debug, Serialize)]
pub struct WriteDocumentRequest {
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    // int64 travels as a decimal string
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::NullValue(()),
            serde_json::Value::Bool(b) => Value::BooleanValue(*b),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Value::IntegerValue(n.to_string()),
            serde_json::Value::Number(n) => Value::DoubleValue(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::StringValue(s.clone()),
            serde_json::Value::Array(items) => Value::ArrayValue(ArrayValue {
                values: items.iter().map(Value::from).collect(),
            }),
            serde_json::Value::Object(map) => Value::MapValue(MapValue {
                fields: map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect(),
            }),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::NullValue(()) => serde_json::Value::Null,
            Value::BooleanValue(b) => serde_json::Value::Bool(*b),
            Value::IntegerValue(raw) => raw
                .parse::<i64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .unwrap_or_else(|_| serde_json::Value::String(raw.clone())),
            Value::DoubleValue(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::TimestampValue(s)
            | Value::StringValue(s)
            | Value::BytesValue(s)
            | Value::ReferenceValue(s) => serde_json::Value::String(s.clone()),
            Value::GeoPointValue(point) => serde_json::json!({
                "latitude": point.latitude,
                "longitude": point.longitude,
            }),
            Value::ArrayValue(array) => {
                serde_json::Value::Array(array.values.iter().map(serde_json::Value::from).collect())
            }
            Value::MapValue(map) => serde_json::Value::Object(
                map.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

pub fn encode_fields(fields: &Fields) -> HashMap<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
}

pub fn decode_fields(fields: &HashMap<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_typed_values_from_wire() {
        let wire = json!({
            "name": "projects/p/databases/(default)/documents/academic_fees/Xy12",
            "fields": {
                "purpose": { "stringValue": "Semester Fee" },
                "total": { "integerValue": "1500" },
                "remarks": { "nullValue": null },
                "createdAt": { "timestampValue": "2025-01-01T10:00:00.123456Z" },
                "items": { "arrayValue": { "values": [
                    { "mapValue": { "fields": {
                        "detail": { "stringValue": "Tuition" },
                        "amount": { "doubleValue": 1500.5 }
                    } } }
                ] } },
                "empty": { "mapValue": {} }
            },
            "createTime": "2025-01-01T10:00:00.123456Z",
            "updateTime": "2025-01-01T10:00:00.123456Z"
        });

        let doc: FirestoreDocument = serde_json::from_value(wire).unwrap();
        assert_eq!(doc.key(), "Xy12");

        let fields = decode_fields(&doc.fields);
        assert_eq!(fields["purpose"], "Semester Fee");
        assert_eq!(fields["total"], 1500);
        assert!(fields["remarks"].is_null());
        assert_eq!(fields["createdAt"], "2025-01-01T10:00:00.123456Z");
        assert_eq!(fields["items"][0]["amount"], 1500.5);
        assert_eq!(fields["empty"], json!({}));
    }

    #[test]
    fn encodes_json_into_typed_values() {
        let fields = json!({
            "code": "CSE-101",
            "teachers": ["Dr. A", ""],
            "credits": 3,
            "weight": 0.5,
            "active": true
        });
        let encoded = encode_fields(fields.as_object().unwrap());
        let wire = serde_json::to_value(&encoded).unwrap();

        assert_eq!(wire["code"], json!({ "stringValue": "CSE-101" }));
        assert_eq!(wire["credits"], json!({ "integerValue": "3" }));
        assert_eq!(wire["weight"], json!({ "doubleValue": 0.5 }));
        assert_eq!(wire["active"], json!({ "booleanValue": true }));
        assert_eq!(
            wire["teachers"],
            json!({ "arrayValue": { "values": [ { "stringValue": "Dr. A" }, { "stringValue": "" } ] } })
        );
    }

    #[test]
    fn null_serializes_as_null_value() {
        let wire = serde_json::to_value(Value::NullValue(())).unwrap();
        assert_eq!(wire, json!({ "nullValue": null }));
    }
}
