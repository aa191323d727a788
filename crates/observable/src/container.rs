//! The "describe your fields" capability of attribute-bag objects.
//!
//! Traversal never inspects an implicit attribute dictionary; a type opts in
//! by implementing [`Container`], usually through [`reflect_container!`].
//! Fields are handed out as type-erased [`FieldHandle`]s so the graph walker,
//! the serialization engine and the section-tree builder can operate without
//! knowing the concrete value types.

use std::any::Any;
use std::sync::Arc;

use crate::annotation::{Annotation, Category};
use crate::value::{ObjectId, Value};

/// An object exposing an enumerable, ordered set of observable fields.
pub trait Container: Send + Sync {
    /// The contained fields in declaration order.
    fn fields(&self) -> Vec<(&'static str, FieldHandle)>;
}

/// Type-erased handle to one observable field.
pub type FieldHandle = Arc<dyn ErasedField>;

/// The erased field API consumed by walkers and engines.
pub trait ErasedField: Send + Sync {
    /// Annotations stored under `category`, `None` when the field carries no
    /// slot for that category.
    fn annotations(&self, category: Category) -> Option<Vec<Arc<dyn Annotation>>>;

    /// Store an annotation in the slot of its own category, replacing or
    /// appending according to the category's multiplicity.
    fn store_annotation(&self, annotation: Arc<dyn Annotation>);

    /// Clone of the current value (runs the get-interceptor chain).
    fn value_boxed(&self) -> Box<dyn Value>;

    /// Write an erased value through the normal set path. `false` when the
    /// value's runtime type does not match the field (recoverable).
    fn set_value_boxed(&self, value: Box<dyn Value>) -> bool;

    /// Like [`set_value_boxed`](Self::set_value_boxed) with publishing
    /// disabled for the duration of the write.
    fn set_value_boxed_silent(&self, value: Box<dyn Value>) -> bool;

    /// The value viewed as a nested container, if it is one.
    fn nested_container(&self) -> Option<Arc<dyn Container>>;

    /// Identity of the current value, for cycle detection.
    fn value_object_id(&self) -> Option<ObjectId>;

    /// Whether the current value is callable.
    fn is_callable_value(&self) -> bool;

    /// Downcast support (to the concrete `ObservableField<T>`).
    fn as_any(&self) -> &dyn Any;
}

/// Identity of a container reference, comparable with
/// [`Value::object_id`](crate::value::Value::object_id) of `Arc<C>` values.
pub fn container_id(container: &dyn Container) -> ObjectId {
    container as *const dyn Container as *const () as usize
}

/// An external collaborator with named, writable attributes; the target of
/// [`ObservableField::bind_to_attribute`](crate::ObservableField::bind_to_attribute).
pub trait AttributeSink: Send + Sync {
    /// Whether the named attribute currently exists on the sink.
    fn has_attribute(&self, name: &str) -> bool;

    /// Write a value into the named attribute.
    fn set_attribute(&self, name: &str, value: Box<dyn Value>);
}

/// Implements [`Container`] for a struct by listing its observable fields in
/// declaration order.
///
/// ```ignore
/// struct Config {
///     speed: ObservableField<f64>,
///     label: ObservableField<String>,
/// }
/// reflect_container!(Config { speed, label });
/// ```
#[macro_export]
macro_rules! reflect_container {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::container::Container for $ty {
            fn fields(
                &self,
            ) -> ::std::vec::Vec<(&'static str, $crate::container::FieldHandle)> {
                ::std::vec![$((stringify!($field), self.$field.handle())),+]
            }
        }
    };
}
