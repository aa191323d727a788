//! Declarative annotation tagging.
//!
//! An [`Annotation`] is a typed marker attached to an observable field under
//! the fixed storage key of its [`Category`]. Independent concerns (UI,
//! persistence, CLI arguments, shared memory) use distinct categories on the
//! same field. A field carries at most one stored slot per category key; the
//! slot holds an ordered list, with more than one entry only when the
//! category allows multiples.
//!
//! Application is a fluent builder: `tag(field, annotation)` returns the same
//! field with the metadata attached, so call sites read as a declarative
//! chain.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::container::{ErasedField, FieldHandle};
use crate::field::ObservableField;
use crate::value::Value;

/// A fixed, category-unique storage key plus its multiplicity rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Category {
    key: &'static str,
    multiple: bool,
}

impl Category {
    /// UI annotations: several per field are allowed.
    pub const UI: Category = Category::new_multiple("ui");
    /// Persistence annotations: exactly one per field.
    pub const SETTINGS: Category = Category::new("settings");
    /// CLI argument annotations: exactly one per field.
    pub const ARGUMENT: Category = Category::new("argument");
    /// Shared-memory annotations: exactly one per field.
    pub const SHARED: Category = Category::new("shared");

    /// A single-value category under a caller-supplied key. External
    /// consumers bring their own categories.
    pub const fn new(key: &'static str) -> Self {
        Self { key, multiple: false }
    }

    /// A category allowing multiple annotations per field.
    pub const fn new_multiple(key: &'static str) -> Self {
        Self { key, multiple: true }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn allows_multiple(&self) -> bool {
        self.multiple
    }
}

/// A typed marker attachable to an observable field.
pub trait Annotation: Any + Send + Sync {
    /// The category whose storage key this annotation lives under.
    fn category(&self) -> Category;

    /// Downcast support for consumers.
    fn as_any(&self) -> &dyn Any;

    /// Called after the annotation has been stored on a field. Annotations
    /// applied later in an [`AnnotationList`] observe the side effects of
    /// earlier ones through this hook.
    fn on_applied(&self, _field: &dyn ErasedField) {}
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation of category '{0}' can only be applied to an observable field")]
    InvalidTarget(&'static str),
}

/// Attach an annotation to a field, returning the same field.
pub fn tag<T, A>(field: ObservableField<T>, annotation: A) -> ObservableField<T>
where
    T: Value + Clone,
    A: Annotation,
{
    field.with(annotation)
}

/// An ordered composition of annotations, applied in declaration order.
#[derive(Default)]
pub struct AnnotationList {
    annotations: Vec<Arc<dyn Annotation>>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation to the list.
    pub fn with(mut self, annotation: impl Annotation) -> Self {
        self.annotations.push(Arc::new(annotation));
        self
    }

    /// Apply every wrapped annotation, in order, to the field.
    pub fn apply(&self, field: &dyn ErasedField) {
        for annotation in &self.annotations {
            field.store_annotation(Arc::clone(annotation));
            annotation.on_applied(field);
        }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Attach every annotation of a list to a field, returning the same field.
pub fn tag_all<T>(field: ObservableField<T>, list: AnnotationList) -> ObservableField<T>
where
    T: Value + Clone,
{
    list.apply(&field);
    field
}

/// Dynamic application path: `target` must be a [`FieldHandle`]; anything
/// else fails immediately with an invalid-target error.
pub fn apply_erased(
    annotation: Arc<dyn Annotation>,
    target: &dyn Any,
) -> Result<(), AnnotationError> {
    let Some(field) = target.downcast_ref::<FieldHandle>() else {
        return Err(AnnotationError::InvalidTarget(annotation.category().key()));
    };
    field.store_annotation(Arc::clone(&annotation));
    annotation.on_applied(&**field);
    Ok(())
}
