//! Reactive property layer: observable value cells, declarative annotations
//! and cycle-safe discovery of annotated fields in object graphs.
//!
//! The building blocks, leaves first:
//!
//! - [`ChangeEvent`]: a synchronous multicast notification channel with a
//!   blocking [`wait`](event::ChangeEvent::wait) for consumer threads.
//! - [`ObservableField`]: a value cell that fires its change event when a
//!   write actually changes the value.
//! - [`Annotation`] / [`Category`]: typed markers attached to fields under
//!   per-category storage keys, applied with the fluent [`tag`] builder.
//! - [`Container`] / [`Value`]: the explicit reflection capability that lets
//!   generic code enumerate an object's fields and classify their values.
//! - [`AnnotationFinder`]: the cycle-safe graph walker collecting fields that
//!   carry a target annotation category, keyed by [`PathIdentifier`].

pub mod annotation;
pub mod container;
pub mod event;
pub mod field;
pub mod finder;
pub mod list;
pub mod ndarray;
pub mod plugin;
pub mod shared;
pub mod value;
pub mod vector;

pub use annotation::{tag, tag_all, Annotation, AnnotationError, AnnotationList, Category};
pub use container::{AttributeSink, Container, ErasedField, FieldHandle};
pub use event::{ChangeEvent, EventStream, SubscriptionId};
pub use field::ObservableField;
pub use finder::{AnnotationFinder, PathIdentifier};
pub use list::{ObservableList, SelectableList};
pub use ndarray::{ArrayError, Dtype, NdArray};
pub use plugin::FieldPlugin;
pub use shared::{SharedCell, SharedValuePlugin};
pub use value::{ActionValue, EnumValue, ObjectId, Value, VectorValue};
pub use vector::{Vec2, Vec3, Vec4};
