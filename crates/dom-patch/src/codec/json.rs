//! JSON codec for patch operations.
//!
//! Converts operations to/from `serde_json::Value` in the RFC 6902 shape
//! `{op, path, value?, from?}`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use dom_path::Path;

use crate::error::PatchError;
use crate::operation::{PatchOperation, PatchOperationType, Payload};
use crate::patch::Patch;

// ── Path helpers ──────────────────────────────────────────────────────────

fn decode_path(obj: &Map<String, Value>, key: &str, op: PatchOperationType) -> Result<Path, PatchError> {
    let s = obj
        .get(key)
        .ok_or_else(|| PatchError::Invalid(format!("{op} requires '{key}'")))?
        .as_str()
        .ok_or_else(|| PatchError::Invalid(format!("'{key}' must be a string")))?;
    Path::parse(s).map_err(|e| PatchError::Invalid(format!("bad '{key}': {e}")))
}

fn decode_value(obj: &Map<String, Value>, op: PatchOperationType) -> Result<Value, PatchError> {
    obj.get("value")
        .cloned()
        .ok_or_else(|| PatchError::Invalid(format!("{op} requires 'value'")))
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize a [`PatchOperation`] to its structural form.
pub fn to_json(op: &PatchOperation) -> Value {
    let mut m = Map::new();
    m.insert("op".into(), Value::String(op.op_name().into()));
    m.insert("path".into(), Value::String(op.destination_path().to_string()));
    match op.payload() {
        Payload::None => {}
        Payload::Value(value) => {
            m.insert("value".into(), value.clone());
        }
        Payload::Source(from) => {
            m.insert("from".into(), Value::String(from.to_string()));
        }
    }
    Value::Object(m)
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Deserialize a [`PatchOperation`] from its structural form.
///
/// The decoded paths must also pass [`PatchOperation::validate`]: `-` only
/// as the last destination entry and never in `from`.
pub fn from_json(v: &Value) -> Result<PatchOperation, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::Invalid("operation must be an object".into()))?;
    let op: PatchOperationType = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::Invalid("missing 'op' field".into()))?
        .parse()?;
    let path = decode_path(obj, "path", op)?;

    let decoded = match op {
        PatchOperationType::Add => PatchOperation::Add { path, value: decode_value(obj, op)? },
        PatchOperationType::Remove => PatchOperation::Remove { path },
        PatchOperationType::Replace => PatchOperation::Replace { path, value: decode_value(obj, op)? },
        PatchOperationType::Copy => PatchOperation::Copy { path, from: decode_path(obj, "from", op)? },
        PatchOperationType::Move => PatchOperation::Move { path, from: decode_path(obj, "from", op)? },
        PatchOperationType::Test => PatchOperation::Test { path, value: decode_value(obj, op)? },
    };
    decoded
        .validate()
        .map_err(|e| PatchError::Invalid(format!("bad {op} operation: {e}")))?;
    Ok(decoded)
}

/// Serialize a patch to a JSON array.
pub fn to_json_patch(patch: &Patch) -> Value {
    Value::Array(patch.iter().map(to_json).collect())
}

/// Deserialize a JSON array into a patch.
pub fn from_json_patch(v: &Value) -> Result<Patch, PatchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| PatchError::Invalid("patch must be an array".into()))?;
    arr.iter().map(from_json).collect()
}

impl PatchOperation {
    pub fn get_dom_representation(&self) -> Value {
        to_json(self)
    }

    pub fn create_from_dom_representation(v: &Value) -> Result<Self, PatchError> {
        from_json(v)
    }
}

impl Patch {
    pub fn get_dom_representation(&self) -> Value {
        to_json_patch(self)
    }

    pub fn create_from_dom_representation(v: &Value) -> Result<Self, PatchError> {
        from_json_patch(v)
    }
}

// ── serde bridge ──────────────────────────────────────────────────────────

impl Serialize for PatchOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatchOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        from_json(&v).map_err(D::Error::custom)
    }
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json_patch(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        from_json_patch(&v).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn encode_shapes() {
        assert_eq!(
            to_json(&PatchOperation::add(p("/a~1b"), 1)),
            json!({"op": "add", "path": "/a~1b", "value": 1})
        );
        assert_eq!(to_json(&PatchOperation::remove(p("/a"))), json!({"op": "remove", "path": "/a"}));
        assert_eq!(
            to_json(&PatchOperation::move_op(p("/b"), p("/a"))),
            json!({"op": "move", "path": "/b", "from": "/a"})
        );
    }

    #[test]
    fn decode_null_value() {
        let op = from_json(&json!({"op": "test", "path": "", "value": null})).unwrap();
        assert_eq!(op, PatchOperation::test(Path::root(), Value::Null));
    }

    #[test]
    fn decode_errors_are_invalid() {
        let cases = [
            json!(1),
            json!({"path": "/a"}),
            json!({"op": "flip", "path": "/a"}),
            json!({"op": "remove"}),
            json!({"op": "remove", "path": 3}),
            json!({"op": "remove", "path": "a"}),
            json!({"op": "remove", "path": "/a~2"}),
            json!({"op": "add", "path": "/a"}),
            json!({"op": "copy", "path": "/a"}),
            json!({"op": "move", "path": "/a", "from": "x"}),
            json!({"op": "add", "path": "/-/a", "value": 1}),
            json!({"op": "move", "path": "/a", "from": "/arr/-"}),
            json!({"op": "copy", "path": "/a", "from": "/-"}),
        ];
        for case in cases {
            assert!(matches!(from_json(&case), Err(PatchError::Invalid(_))), "{case}");
        }
    }

    #[test]
    fn decode_accepts_trailing_append_marker() {
        let op = from_json(&json!({"op": "add", "path": "/arr/-", "value": 1})).unwrap();
        assert_eq!(op, PatchOperation::add(p("/arr/-"), 1));
        assert!(matches!(
            from_json_patch(&json!([{"op": "remove", "path": "/-/0"}])),
            Err(PatchError::Invalid(_))
        ));
    }

    #[test]
    fn patch_must_be_array() {
        assert!(matches!(from_json_patch(&json!({})), Err(PatchError::Invalid(_))));
        assert_eq!(from_json_patch(&json!([])).unwrap(), Patch::new());
    }

    #[test]
    fn serde_bridge() {
        let text = r#"[{"op":"add","path":"/arr/-","value":3},{"op":"copy","path":"/b","from":"/a"}]"#;
        let patch: Patch = serde_json::from_str(text).unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(serde_json::to_string(&patch).unwrap(), text);
        assert!(serde_json::from_str::<PatchOperation>(r#"{"op":"nope","path":""}"#).is_err());
    }
}
