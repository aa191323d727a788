//! The built-in type adapters.
//!
//! Payload shapes of the persisted document:
//!
//! | Adapter | Shape |
//! |---|---|
//! | enum | string (member name) |
//! | vector | object with a subset of `x`,`y`,`z`,`t` sized by dimensionality |
//! | path | string |
//! | dense array | `{"shape": [..], "dtype": "..", "data": base64}` |
//! | default | JSON-safe scalar unchanged |

use std::path::PathBuf;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use observable::{Dtype, NdArray, Value};
use serde_json::{json, Value as Json};

use crate::adapter::{AdapterError, TypeAdapter};

/// Enumerated constants persist as their member name.
pub struct EnumAdapter;

impl TypeAdapter for EnumAdapter {
    fn handles(&self, value: &dyn Value) -> bool {
        value.as_enum().is_some()
    }

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError> {
        let member = value.as_enum().ok_or(AdapterError::Unhandled)?;
        Ok(Json::String(member.variant_name().to_string()))
    }

    fn deserialize(&self, target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError> {
        let name = raw
            .as_str()
            .ok_or_else(|| AdapterError::Payload("expected a member-name string".into()))?;
        let witness = target.as_enum().ok_or(AdapterError::Unhandled)?;
        witness
            .with_variant(name)
            .ok_or_else(|| AdapterError::UnknownVariant(name.to_string()))
    }
}

/// Fixed-arity vectors persist as component objects; the dimensionality is
/// inferred from the runtime type of the target field.
pub struct VectorAdapter;

impl TypeAdapter for VectorAdapter {
    fn handles(&self, value: &dyn Value) -> bool {
        value.as_vector().is_some()
    }

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError> {
        let vector = value.as_vector().ok_or(AdapterError::Unhandled)?;
        let mut map = serde_json::Map::new();
        for component in vector.components() {
            let v = vector
                .component(component)
                .ok_or_else(|| AdapterError::Payload(format!("missing component '{component}'")))?;
            let number = serde_json::Number::from_f64(v)
                .ok_or_else(|| AdapterError::Payload(format!("component '{component}' is not finite")))?;
            map.insert((*component).to_string(), Json::Number(number));
        }
        Ok(Json::Object(map))
    }

    fn deserialize(&self, target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError> {
        let witness = target.as_vector().ok_or(AdapterError::Unhandled)?;
        let map = raw
            .as_object()
            .ok_or_else(|| AdapterError::Payload("expected a component object".into()))?;
        witness
            .rebuild(&|component| map.get(component).and_then(Json::as_f64))
            .ok_or_else(|| AdapterError::Payload("missing vector component".into()))
    }
}

/// Filesystem paths round-trip through their string form.
pub struct PathAdapter;

impl TypeAdapter for PathAdapter {
    fn handles(&self, value: &dyn Value) -> bool {
        value.as_path().is_some()
    }

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError> {
        let path = value.as_path().ok_or(AdapterError::Unhandled)?;
        Ok(Json::String(path.to_string_lossy().into_owned()))
    }

    fn deserialize(&self, _target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError> {
        let text = raw
            .as_str()
            .ok_or_else(|| AdapterError::Payload("expected a path string".into()))?;
        Ok(Box::new(PathBuf::from(text)))
    }
}

const SHAPE_KEY: &str = "shape";
const DTYPE_KEY: &str = "dtype";
const DATA_KEY: &str = "data";

/// Dense numeric arrays persist as shape + element type + base64 raw bytes
/// and are rebuilt via reshape.
pub struct ArrayAdapter;

impl TypeAdapter for ArrayAdapter {
    fn handles(&self, value: &dyn Value) -> bool {
        value.as_array().is_some()
    }

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError> {
        let array = value.as_array().ok_or(AdapterError::Unhandled)?;
        Ok(json!({
            SHAPE_KEY: array.shape(),
            DTYPE_KEY: array.dtype().name(),
            DATA_KEY: BASE64.encode(array.data()),
        }))
    }

    fn deserialize(&self, target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError> {
        if target.as_array().is_none() {
            return Err(AdapterError::Unhandled);
        }
        let obj = raw
            .as_object()
            .ok_or_else(|| AdapterError::Payload("expected an array object".into()))?;

        let shape: Vec<usize> = obj
            .get(SHAPE_KEY)
            .and_then(Json::as_array)
            .ok_or_else(|| AdapterError::Payload("missing 'shape'".into()))?
            .iter()
            .map(|v| v.as_u64().map(|n| n as usize))
            .collect::<Option<_>>()
            .ok_or_else(|| AdapterError::Payload("non-integer shape entry".into()))?;

        let dtype_name = obj
            .get(DTYPE_KEY)
            .and_then(Json::as_str)
            .ok_or_else(|| AdapterError::Payload("missing 'dtype'".into()))?;
        let dtype = Dtype::from_str(dtype_name)
            .map_err(|_| AdapterError::Payload(format!("unknown dtype '{dtype_name}'")))?;

        let encoded = obj
            .get(DATA_KEY)
            .and_then(Json::as_str)
            .ok_or_else(|| AdapterError::Payload("missing 'data'".into()))?;
        let data = BASE64
            .decode(encoded)
            .map_err(|e| AdapterError::Payload(format!("invalid base64 data: {e}")))?;

        let array = NdArray::from_bytes(shape, dtype, data)
            .map_err(|e| AdapterError::Payload(e.to_string()))?;
        Ok(Box::new(array))
    }
}

/// Identity for already-JSON-safe scalars; matches everything and is tried
/// last.
pub struct DefaultAdapter;

impl TypeAdapter for DefaultAdapter {
    fn handles(&self, _value: &dyn Value) -> bool {
        true
    }

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError> {
        value.as_scalar().ok_or(AdapterError::NotScalar)
    }

    fn deserialize(&self, target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError> {
        target
            .from_scalar(raw)
            .ok_or_else(|| AdapterError::Payload("value does not fit the field type".into()))
    }
}
