//! Response normalization.
//!
//! The backend is not consistent about how it shapes payloads. Collections come back as a
//! bare array, as `{"data": [...]}` or wrapped in a named key (`{"departments": [...]}`).
//! Foreign keys come back either as a bare identifier or "populated" as the full referenced
//! object. Everything that reaches local state goes through this module first, so consumers
//! only ever see flat records with bare identifiers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AppError, Result};

/// Generic envelope key used by most list endpoints.
pub const DATA_KEY: &str = "data";

/// Identifier properties of an embedded object, in lookup order.
const ID_KEYS: [&str; 2] = ["_id", "id"];

/// Reduce a decoded collection payload to a plain ordered list of records.
///
/// Resolution order: the value itself if it is an array, then `data`, then `collection_key`.
/// Anything else yields an empty list; an unrecognized envelope means "no records", not failure.
pub fn unwrap_collection(value: Value, collection_key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(DATA_KEY) {
                debug!("Unwrapped '{DATA_KEY}' envelope ({} records)", items.len());
                return items;
            }
            if let Some(Value::Array(items)) = map.remove(collection_key) {
                debug!("Unwrapped '{collection_key}' envelope ({} records)", items.len());
                return items;
            }
            debug!("Unrecognized collection envelope, treating as empty");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Reduce a foreign key that may be populated as an object to its bare identifier.
///
/// Only string and numeric identifiers are taken, which keeps the function idempotent:
/// the result is either a primitive or the untouched input.
pub fn unwrap_foreign_key(value: Value) -> Value {
    if let Some(id) = embedded_id(&value).cloned() {
        return id;
    }
    value
}

/// Apply [`unwrap_foreign_key`] to the named fields of a record; every other field is kept as-is.
pub fn normalize_record(record: Value, fk_fields: &[&str]) -> Value {
    match record {
        Value::Object(mut map) => {
            for field in fk_fields {
                if let Some(slot) = map.get_mut(*field) {
                    *slot = unwrap_foreign_key(slot.take());
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Collapse `_id` and `id` into the single property `key`, preferring a usable `_id`.
///
/// Serializers that emit virtuals send both; a record carrying only one keeps it under `key`.
pub fn canonical_id(record: Value, key: &str) -> Value {
    let Value::Object(mut map) = record else {
        return record;
    };
    let primary = map.remove(ID_KEYS[0]);
    let secondary = map.remove(ID_KEYS[1]);
    let chosen = match (primary, secondary) {
        (Some(p), _) if is_usable_id(&p) => Some(p),
        (_, Some(s)) if is_usable_id(&s) => Some(s),
        (p, s) => p.or(s),
    };
    if let Some(id) = chosen {
        map.insert(key.to_string(), id);
    }
    Value::Object(map)
}

/// [`canonical_id`] applied to every object of a nested payload.
pub fn canonical_ids_nested(value: Value, key: &str) -> Value {
    match value {
        Value::Object(map) => {
            let map = map
                .into_iter()
                .map(|(k, v)| (k, canonical_ids_nested(v, key)))
                .collect();
            canonical_id(Value::Object(map), key)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| canonical_ids_nested(v, key)).collect()),
        other => other,
    }
}

fn is_usable_id(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

fn embedded_id(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    ID_KEYS.iter().filter_map(|key| map.get(*key)).find(|id| is_usable_id(id))
}

/// Collections served by the backend, with their envelope key and foreign-key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Departments,
    Positions,
    ChangeRequests,
    Employees,
}

impl Collection {
    /// Named-wrapper key the backend may use for this collection.
    pub fn envelope_key(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Positions => "positions",
            Self::ChangeRequests => "changeRequests",
            Self::Employees => "employees",
        }
    }

    /// Fields that may arrive populated.
    pub fn foreign_keys(self) -> &'static [&'static str] {
        match self {
            Self::Departments => &["headPositionId"],
            Self::Positions => &["departmentId", "reportsToPositionId"],
            Self::ChangeRequests => &[
                "requestedByEmployeeId",
                "targetDepartmentId",
                "targetPositionId",
                "submittedByEmployeeId",
            ],
            Self::Employees => &["primaryPositionId", "primaryDepartmentId"],
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Positions => "positions",
            Self::ChangeRequests => "change requests",
            Self::Employees => "employees",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a response body and normalize every record of the collection.
///
/// Undecodable JSON is an error; a decodable body with no recognizable collection is `Ok(vec![])`.
pub fn decode_collection(body: &str, collection: Collection) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body)?;
    let fk_fields = collection.foreign_keys();

    Ok(unwrap_collection(value, collection.envelope_key())
        .into_iter()
        .map(|record| canonical_id(normalize_record(record, fk_fields), ID_KEYS[0]))
        .collect())
}

/// Like [`decode_collection`], then decode each record into `T`.
///
/// A record that does not fit `T` fails the whole collection.
pub fn decode_records<T: DeserializeOwned>(body: &str, collection: Collection) -> Result<Vec<T>> {
    decode_collection(body, collection)?
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(AppError::from))
        .collect()
}

/// Foreign key as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ForeignKey {
    /// Bare identifier.
    Id(IdRepr),
    /// Populated object.
    Embedded(Map<String, Value>),
    /// Anything else (booleans, arrays); resolves to no reference.
    Other(Value),
}

/// Identifier in either textual or numeric form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Text(String),
    Number(serde_json::Number),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

impl ForeignKey {
    /// Resolve to a bare identifier. Empty ids and objects without one resolve to `None`.
    pub fn into_id(self) -> Option<String> {
        let id = match self {
            Self::Id(repr) => repr.into_string(),
            Self::Embedded(map) => {
                let value = Value::Object(map);
                let id = embedded_id(&value).cloned()?;
                serde_json::from_value::<IdRepr>(id).ok()?.into_string()
            }
            Self::Other(_) => return None,
        };
        (!id.is_empty()).then_some(id)
    }
}

/// `deserialize_with` helper for optional foreign-key fields.
pub fn foreign_key<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ForeignKey>::deserialize(deserializer)?.and_then(ForeignKey::into_id))
}

/// `deserialize_with` helper for text fields the backend may send as `null`.
///
/// `null` reads like an absent field: the empty string for `String`, and the `From<String>`
/// fallback for the enum types.
pub fn text<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(T::from(Option::<String>::deserialize(deserializer)?.unwrap_or_default()))
}

/// `deserialize_with` helper for `isActive`: `null` counts as active, like an absent field.
pub fn active_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// `deserialize_with` helper for record identifiers that may be numeric.
pub fn record_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(IdRepr::deserialize(deserializer)?.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_passes_through() {
        let input = json!([{"_id": "b"}, {"_id": "a"}, 3, "x"]);
        let out = unwrap_collection(input.clone(), "departments");
        assert_eq!(Value::Array(out), input);
    }

    #[test]
    fn test_data_envelope() {
        assert_eq!(unwrap_collection(json!({"data": [1, 2, 3]}), "positions"), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_named_envelope() {
        let out = unwrap_collection(json!({"positions": [{}]}), "positions");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_data_wins_over_named() {
        let out = unwrap_collection(json!({"data": [1], "positions": [1, 2]}), "positions");
        assert_eq!(out, vec![json!(1)]);
    }

    #[test]
    fn test_non_array_data_falls_through_to_named() {
        let out = unwrap_collection(json!({"data": {"total": 2}, "departments": [1, 2]}), "departments");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        assert!(unwrap_collection(json!({}), "departments").is_empty());
        assert!(unwrap_collection(Value::Null, "departments").is_empty());
        assert!(unwrap_collection(json!("departments"), "departments").is_empty());
        assert!(unwrap_collection(json!({"positions": [1]}), "departments").is_empty());
    }

    #[test]
    fn test_unwrap_foreign_key() {
        assert_eq!(unwrap_foreign_key(json!({"_id": "a1", "code": "HR"})), json!("a1"));
        assert_eq!(unwrap_foreign_key(json!({"id": 7})), json!(7));
        assert_eq!(unwrap_foreign_key(json!("a1")), json!("a1"));
        assert_eq!(unwrap_foreign_key(Value::Null), Value::Null);
    }

    #[test]
    fn test_object_without_usable_id_is_unchanged() {
        let empty_id = json!({"_id": "", "code": "HR"});
        assert_eq!(unwrap_foreign_key(empty_id.clone()), empty_id);

        let nested = json!({"_id": {"_id": "a1"}});
        assert_eq!(unwrap_foreign_key(nested.clone()), nested);
    }

    #[test]
    fn test_unwrap_foreign_key_idempotent() {
        let samples = [
            json!({"_id": "a1"}),
            json!({"id": 12, "title": "Lead"}),
            json!({"_id": ""}),
            json!({"_id": {"_id": "deep"}}),
            json!("a1"),
            json!(42),
            json!(true),
            json!([1, 2]),
            Value::Null,
        ];
        for x in samples {
            let once = unwrap_foreign_key(x);
            let twice = unwrap_foreign_key(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_record_preserves_other_fields() {
        let record = json!({
            "_id": "d1",
            "code": "ENG",
            "name": "Engineering",
            "headPositionId": {"_id": "p9", "title": "CTO"},
            "meta": {"_id": "keep-me"},
            "tags": ["a", "b"],
            "isActive": true
        });
        let out = normalize_record(record.clone(), &["headPositionId"]);

        assert_eq!(out["headPositionId"], json!("p9"));
        for (key, value) in record.as_object().unwrap() {
            if key != "headPositionId" {
                assert_eq!(&out[key], value, "field {key} changed");
            }
        }
        assert_eq!(out.as_object().unwrap().len(), record.as_object().unwrap().len());
    }

    #[test]
    fn test_normalize_record_absent_field_stays_absent() {
        let out = normalize_record(json!({"_id": "p1"}), &["reportsToPositionId"]);
        assert!(out.get("reportsToPositionId").is_none());
    }

    #[test]
    fn test_normalize_record_non_object() {
        assert_eq!(normalize_record(json!("x"), &["a"]), json!("x"));
    }

    #[test]
    fn test_decode_collection_normalizes_each_record() {
        let body = r#"{"positions":[
            {"_id":"p1","departmentId":{"_id":"d1","name":"Eng"},"reportsToPositionId":null},
            {"_id":"p2","departmentId":"d2","reportsToPositionId":{"_id":"p1"}}
        ]}"#;
        let records = decode_collection(body, Collection::Positions).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["departmentId"], json!("d1"));
        assert_eq!(records[0]["reportsToPositionId"], Value::Null);
        assert_eq!(records[1]["reportsToPositionId"], json!("p1"));
    }

    #[test]
    fn test_decode_collection_garbage_is_distinct_from_empty() {
        assert!(decode_collection("{}", Collection::Departments).unwrap().is_empty());
        assert!(matches!(
            decode_collection("<html>502</html>", Collection::Departments),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn test_foreign_key_into_id() {
        let fk: ForeignKey = serde_json::from_value(json!({"_id": "a1", "code": "X"})).unwrap();
        assert_eq!(fk.into_id().as_deref(), Some("a1"));

        let fk: ForeignKey = serde_json::from_value(json!("a1")).unwrap();
        assert_eq!(fk.into_id().as_deref(), Some("a1"));

        let fk: ForeignKey = serde_json::from_value(json!(15)).unwrap();
        assert_eq!(fk.into_id().as_deref(), Some("15"));

        let fk: ForeignKey = serde_json::from_value(json!("")).unwrap();
        assert_eq!(fk.into_id(), None);

        let fk: ForeignKey = serde_json::from_value(json!({"name": "orphan"})).unwrap();
        assert_eq!(fk.into_id(), None);

        let fk: ForeignKey = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(fk.into_id(), None);

        let fk: ForeignKey = serde_json::from_value(json!(["p1"])).unwrap();
        assert_eq!(fk.into_id(), None);
    }

    #[test]
    fn test_canonical_id_prefers_usable_underscore_id() {
        assert_eq!(canonical_id(json!({"_id": "d1", "id": "d1", "code": "ENG"}), "_id"), json!({"_id": "d1", "code": "ENG"}));
        assert_eq!(canonical_id(json!({"_id": "", "id": 7}), "_id"), json!({"_id": 7}));
        assert_eq!(canonical_id(json!({"id": "d2"}), "_id"), json!({"_id": "d2"}));
        assert_eq!(canonical_id(json!({"_id": "e1", "id": "e9"}), "id"), json!({"id": "e1"}));
        assert_eq!(canonical_id(json!({"code": "HR"}), "_id"), json!({"code": "HR"}));
    }

    #[test]
    fn test_canonical_ids_nested() {
        let out = canonical_ids_nested(
            json!({"me": {"_id": "e1", "id": "e1", "boss": {"_id": "e0"}}, "team": [{"id": "e2", "_id": "e2"}]}),
            "id",
        );
        assert_eq!(out, json!({"me": {"id": "e1", "boss": {"id": "e0"}}, "team": [{"id": "e2"}]}));
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(rename = "_id", deserialize_with = "record_id")]
        id: String,
        #[serde(default, deserialize_with = "text")]
        code: String,
        #[serde(default, deserialize_with = "foreign_key")]
        department_id: Option<String>,
        #[serde(default = "crate::models::default_true", deserialize_with = "active_flag")]
        active: bool,
    }

    #[test]
    fn test_decode_records_with_both_id_properties() {
        let records: Vec<Sample> = decode_records(
            r#"[{"_id":"d1","id":"d1","code":"ENG"},{"id":4,"code":"HR"}]"#,
            Collection::Departments,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "d1");
        assert_eq!(records[1].id, "4");
    }

    #[test]
    fn test_decode_records_tolerates_null_and_odd_values() {
        let records: Vec<Sample> = decode_records(
            r#"{"positions":[{"_id":"p1","code":null,"department_id":true,"active":null}]}"#,
            Collection::Positions,
        )
        .unwrap();

        assert_eq!(records[0].code, "");
        assert!(records[0].department_id.is_none());
        assert!(records[0].active);
    }
}
