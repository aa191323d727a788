//! The reflection capability implemented by every field value type.
//!
//! Traversal and serialization never rely on implicit attribute dictionaries.
//! Instead, every value stored in an [`ObservableField`](crate::ObservableField)
//! implements [`Value`], a small object-safe trait that lets generic code ask
//! what kind of value it is looking at: a JSON-safe scalar, an enumerated
//! constant, a fixed-arity vector, a filesystem path, a dense numeric array,
//! or a nested container of further fields.
//!
//! Equality goes through [`Value::eq_value`] rather than `PartialEq` so that
//! reference-typed values (`Arc<C>`) can compare by identity without forcing
//! a deep, possibly cyclic, structural comparison.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::container::Container;
use crate::ndarray::NdArray;

/// Identity of a heap-allocated value, used by the graph walker and the
/// serialization engine to break cycles. Derived from the allocation address,
/// never from value equality, so unhashable or mutable payloads are fine.
pub type ObjectId = usize;

/// Capability trait for observable field values.
///
/// All accessors default to "not this kind"; concrete impls opt into the
/// kinds they support. The trait is object safe so fields can be handled
/// through type-erased [`FieldHandle`](crate::container::FieldHandle)s.
pub trait Value: Any + Send + Sync {
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Clone behind the trait object.
    fn clone_value(&self) -> Box<dyn Value>;

    /// Equality behind the trait object. Implementations downcast `other`;
    /// a type mismatch is simply `false`.
    fn eq_value(&self, other: &dyn Value) -> bool;

    /// View as an enumerated constant.
    fn as_enum(&self) -> Option<&dyn EnumValue> {
        None
    }

    /// View as a fixed-arity component vector.
    fn as_vector(&self) -> Option<&dyn VectorValue> {
        None
    }

    /// View as a filesystem path.
    fn as_path(&self) -> Option<&Path> {
        None
    }

    /// View as a dense numeric array.
    fn as_array(&self) -> Option<&NdArray> {
        None
    }

    /// Render as an already-JSON-safe scalar, if the value is one.
    fn as_scalar(&self) -> Option<serde_json::Value> {
        None
    }

    /// Rebuild a value of this type from a JSON scalar, using `self` as the
    /// type witness. `None` means the raw value does not fit.
    fn from_scalar(&self, _raw: &serde_json::Value) -> Option<Box<dyn Value>> {
        None
    }

    /// View the value as a nested container of further fields.
    fn as_container(&self) -> Option<Arc<dyn Container>> {
        None
    }

    /// Whether the value is callable (an action), which excludes it from
    /// persistence.
    fn is_callable(&self) -> bool {
        false
    }

    /// Identity for cycle detection. `None` for plain values that are never
    /// recursed into.
    fn object_id(&self) -> Option<ObjectId> {
        None
    }
}

impl std::fmt::Debug for dyn Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Value")
    }
}

/// An enumerated constant that converts to and from its member name.
pub trait EnumValue: Send + Sync {
    /// Name of the current member.
    fn variant_name(&self) -> &'static str;

    /// Build a value of the same enum type from a member name, `None` for an
    /// unknown name. `self` only serves as the type witness.
    fn with_variant(&self, name: &str) -> Option<Box<dyn Value>>;
}

/// A fixed-arity numeric vector with named components.
pub trait VectorValue: Send + Sync {
    /// Component names in declaration order, a subset of `x`, `y`, `z`, `t`.
    fn components(&self) -> &'static [&'static str];

    /// Read one component by name.
    fn component(&self, name: &str) -> Option<f64>;

    /// Build a vector of the same type from a component lookup. `None` when a
    /// required component is missing. `self` only serves as the type witness.
    fn rebuild(&self, read: &dyn Fn(&str) -> Option<f64>) -> Option<Box<dyn Value>>;
}

/// A callable value for action fields. Compared by identity.
#[derive(Clone)]
pub struct ActionValue(Arc<dyn Fn() + Send + Sync>);

impl ActionValue {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the action.
    pub fn call(&self) {
        (self.0)()
    }
}

impl std::fmt::Debug for ActionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ActionValue")
    }
}

impl Value for ActionValue {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| Arc::ptr_eq(&self.0, &o.0))
    }

    fn is_callable(&self) -> bool {
        true
    }
}

macro_rules! impl_int_value {
    ($($ty:ty),+) => {
        $(
            impl Value for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn clone_value(&self) -> Box<dyn Value> {
                    Box::new(*self)
                }

                fn eq_value(&self, other: &dyn Value) -> bool {
                    other.as_any().downcast_ref::<$ty>().is_some_and(|o| o == self)
                }

                fn as_scalar(&self) -> Option<serde_json::Value> {
                    Some(serde_json::Value::from(*self))
                }

                fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
                    let n = raw.as_i64()?;
                    <$ty>::try_from(n).ok().map(|v| Box::new(v) as Box<dyn Value>)
                }
            }
        )+
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32, usize);

macro_rules! impl_float_value {
    ($($ty:ty),+) => {
        $(
            impl Value for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn clone_value(&self) -> Box<dyn Value> {
                    Box::new(*self)
                }

                fn eq_value(&self, other: &dyn Value) -> bool {
                    other.as_any().downcast_ref::<$ty>().is_some_and(|o| o == self)
                }

                fn as_scalar(&self) -> Option<serde_json::Value> {
                    // Non-finite floats have no JSON representation; reported
                    // as "not a scalar" so the engine drops the key with a
                    // warning instead of writing an invalid document.
                    serde_json::Number::from_f64(*self as f64).map(serde_json::Value::Number)
                }

                fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
                    raw.as_f64().map(|v| Box::new(v as $ty) as Box<dyn Value>)
                }
            }
        )+
    };
}

impl_float_value!(f32, f64);

impl Value for bool {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(*self)
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<bool>().is_some_and(|o| o == self)
    }

    fn as_scalar(&self) -> Option<serde_json::Value> {
        Some(serde_json::Value::Bool(*self))
    }

    fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
        raw.as_bool().map(|v| Box::new(v) as Box<dyn Value>)
    }
}

impl Value for String {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<String>().is_some_and(|o| o == self)
    }

    fn as_scalar(&self) -> Option<serde_json::Value> {
        Some(serde_json::Value::String(self.clone()))
    }

    fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
        raw.as_str().map(|v| Box::new(v.to_string()) as Box<dyn Value>)
    }
}

impl Value for () {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<()>().is_some()
    }

    fn as_scalar(&self) -> Option<serde_json::Value> {
        Some(serde_json::Value::Null)
    }
}

impl Value for PathBuf {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<PathBuf>().is_some_and(|o| o == self)
    }

    fn as_path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl<T: Value + Clone> Value for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        // Array-like equality reduces element comparisons with "all equal".
        other.as_any().downcast_ref::<Vec<T>>().is_some_and(|o| {
            self.len() == o.len() && self.iter().zip(o).all(|(a, b)| a.eq_value(b))
        })
    }

    fn as_scalar(&self) -> Option<serde_json::Value> {
        let items: Option<Vec<_>> = self.iter().map(Value::as_scalar).collect();
        items.map(serde_json::Value::Array)
    }

    fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
        let items = raw.as_array()?;
        if items.is_empty() {
            return Some(Box::new(Vec::<T>::new()));
        }
        // Elements are rebuilt against the first current element as witness;
        // an empty current list can only absorb an empty input.
        let witness = self.first()?;
        let rebuilt: Option<Vec<T>> = items
            .iter()
            .map(|item| {
                witness
                    .from_scalar(item)
                    .and_then(|boxed| boxed.as_any().downcast_ref::<T>().cloned())
            })
            .collect();
        rebuilt.map(|v| Box::new(v) as Box<dyn Value>)
    }
}

impl<T: Value + Clone> Value for Option<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        match other.as_any().downcast_ref::<Option<T>>() {
            Some(Some(o)) => self.as_ref().is_some_and(|v| v.eq_value(o)),
            Some(None) => self.is_none(),
            None => false,
        }
    }

    fn as_scalar(&self) -> Option<serde_json::Value> {
        match self {
            Some(v) => v.as_scalar(),
            None => Some(serde_json::Value::Null),
        }
    }

    fn from_scalar(&self, raw: &serde_json::Value) -> Option<Box<dyn Value>> {
        if raw.is_null() {
            return Some(Box::new(None::<T>));
        }
        let witness = self.as_ref()?;
        let inner = witness.from_scalar(raw)?;
        inner
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .map(|v| Box::new(Some(v)) as Box<dyn Value>)
    }

    fn as_container(&self) -> Option<Arc<dyn Container>> {
        self.as_ref().and_then(Value::as_container)
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.as_ref().and_then(Value::object_id)
    }
}

impl<C: Container + Send + Sync + 'static> Value for Arc<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(Arc::clone(self))
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        // Identity comparison; nested container graphs may be cyclic.
        other
            .as_any()
            .downcast_ref::<Arc<C>>()
            .is_some_and(|o| Arc::ptr_eq(self, o))
    }

    fn as_container(&self) -> Option<Arc<dyn Container>> {
        Some(Arc::clone(self) as Arc<dyn Container>)
    }

    fn object_id(&self) -> Option<ObjectId> {
        Some(Arc::as_ptr(self) as *const () as usize)
    }
}

/// Implements [`Value`] and [`EnumValue`] for an enum deriving
/// `strum_macros::EnumString` and `strum_macros::IntoStaticStr`
/// (plus `Clone` and `PartialEq`).
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
/// enum Quality { Low, Medium, High }
/// reflect_enum!(Quality);
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ty) => {
        impl $crate::value::Value for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn clone_value(&self) -> ::std::boxed::Box<dyn $crate::value::Value> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn eq_value(&self, other: &dyn $crate::value::Value) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$ty>()
                    .is_some_and(|o| o == self)
            }

            fn as_enum(&self) -> ::std::option::Option<&dyn $crate::value::EnumValue> {
                ::std::option::Option::Some(self)
            }
        }

        impl $crate::value::EnumValue for $ty {
            fn variant_name(&self) -> &'static str {
                ::std::convert::Into::into(self)
            }

            fn with_variant(
                &self,
                name: &str,
            ) -> ::std::option::Option<::std::boxed::Box<dyn $crate::value::Value>> {
                <$ty as ::std::str::FromStr>::from_str(name)
                    .ok()
                    .map(|v| ::std::boxed::Box::new(v) as ::std::boxed::Box<dyn $crate::value::Value>)
            }
        }
    };
}
