//! The type-adapter strategy seam of the serialization engine.

use observable::Value;
use serde_json::Value as Json;
use thiserror::Error;

/// Recoverable per-field adapter failures. The engine logs these and leaves
/// the field (or key) alone.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("adapter does not handle this value type")]
    Unhandled,

    #[error("unknown enum member '{0}'")]
    UnknownVariant(String),

    #[error("payload mismatch: {0}")]
    Payload(String),

    #[error("value is not representable as a JSON scalar")]
    NotScalar,
}

/// A strategy that serializes and deserializes one family of value types.
///
/// Adapters are consulted in a fixed priority list; the first whose
/// [`handles`](TypeAdapter::handles) accepts the value wins. The default
/// pass-through adapter accepts everything and is tried last.
pub trait TypeAdapter: Send + Sync {
    fn handles(&self, value: &dyn Value) -> bool;

    fn serialize(&self, value: &dyn Value) -> Result<Json, AdapterError>;

    /// Rebuild a value from its persisted form. `target` is the field's
    /// current value, serving as the expected-type witness.
    fn deserialize(&self, target: &dyn Value, raw: &Json) -> Result<Box<dyn Value>, AdapterError>;
}
