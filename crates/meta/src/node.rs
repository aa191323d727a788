//! The property-tree node.

use std::fmt;
use std::sync::Arc;

use observable::FieldHandle;

use crate::annotations::UiAnnotation;

/// One node of the folded property tree.
///
/// Section annotations form interior nodes whose `children` hold the nested
/// structure; every other annotation is a leaf for a single field.
pub struct MetaNode {
    pub name: String,
    pub annotation: Arc<dyn UiAnnotation>,
    pub field: Option<FieldHandle>,
    pub children: Vec<MetaNode>,
}

impl MetaNode {
    /// An interior node without a field reference.
    pub fn section(name: impl Into<String>, annotation: Arc<dyn UiAnnotation>) -> Self {
        Self {
            name: name.into(),
            annotation,
            field: None,
            children: Vec::new(),
        }
    }

    /// A leaf node for one field.
    pub fn leaf(
        name: impl Into<String>,
        annotation: Arc<dyn UiAnnotation>,
        field: FieldHandle,
    ) -> Self {
        Self {
            name: name.into(),
            annotation,
            field: Some(field),
            children: Vec::new(),
        }
    }
}

impl fmt::Debug for MetaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaNode")
            .field("name", &self.name)
            .field("kind", &self.annotation.kind_name())
            .field("children", &self.children)
            .finish()
    }
}
