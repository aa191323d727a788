//! The persistence annotation.

use std::any::Any;

use observable::{Annotation, Category};

/// Marks a field for persistence and configures how it is written.
///
/// Fields without an explicit order key keep their declaration order
/// relative to each other; explicit keys sort numerically (stable).
#[derive(Debug, Clone, Default)]
pub struct Persist {
    name: Option<String>,
    hidden: bool,
    save_order: Option<i64>,
    load_order: Option<i64>,
}

impl Persist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist under this key instead of the attribute name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Keep the annotation but exclude the field from documents.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn save_order(mut self, order: i64) -> Self {
        self.save_order = Some(order);
        self
    }

    pub fn load_order(mut self, order: i64) -> Self {
        self.load_order = Some(order);
        self
    }

    /// The override key, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the field appears in documents.
    pub fn exposed(&self) -> bool {
        !self.hidden
    }

    pub fn save_order_key(&self) -> i64 {
        self.save_order.unwrap_or(0)
    }

    pub fn load_order_key(&self) -> i64 {
        self.load_order.unwrap_or(0)
    }
}

impl Annotation for Persist {
    fn category(&self) -> Category {
        Category::SETTINGS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
