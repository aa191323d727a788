//! Folding a flat annotated-field list into a section tree.

use std::sync::Arc;

use observable::{AnnotationFinder, Category, Container};
use thiserror::Error;

use crate::annotations::{EndSection, StartSection, SubSection, Title, UiAnnotation, UiTag};
use crate::node::MetaNode;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetaError {
    /// An end-of-section marker with no open section to close. This is a
    /// declaration bug in the annotated container, not bad runtime data.
    #[error("unmatched end-of-section marker on field '{field}'")]
    UnmatchedEndSection { field: String },
}

/// Fold the UI annotations of `root`'s fields into a tree.
///
/// Fields are visited in declaration order; annotations sharing a field are
/// stable-sorted by importance first, so an [`EndSection`] always closes its
/// section after the field's own widget has been emitted. Sections left open
/// at the end of the walk stay in the tree as written.
pub fn build(root: &dyn Container) -> Result<Vec<MetaNode>, MetaError> {
    // The stack holds open sections; finished nodes attach to their parent
    // when the section closes.
    let mut stack: Vec<MetaNode> = vec![MetaNode::section(
        "root",
        Arc::new(Title::new("root")) as Arc<dyn UiAnnotation>,
    )];

    let found = AnnotationFinder::new(Category::UI).find(root);
    for (field_name, (field, slot)) in found {
        let mut annotations: Vec<Arc<dyn UiAnnotation>> = slot
            .iter()
            .filter_map(|a| a.as_any().downcast_ref::<UiTag>())
            .map(|t| Arc::clone(t.inner()))
            .collect();
        annotations.sort_by_key(|a| a.importance());

        for annotation in annotations {
            let name = annotation.name().to_string();

            if annotation.as_any().downcast_ref::<StartSection>().is_some() {
                stack.push(MetaNode::section(name, annotation));
                continue;
            }

            if annotation.as_any().downcast_ref::<SubSection>().is_some() {
                let mut node = MetaNode::leaf(name, annotation, Arc::clone(&field));
                match field.nested_container() {
                    Some(nested) => node.children = build(&*nested)?,
                    None => log::warn!(
                        "sub-section on '{field_name}' holds no nested container, leaving it empty"
                    ),
                }
                attach(&mut stack, node);
                continue;
            }

            if annotation.as_any().downcast_ref::<EndSection>().is_some() {
                if stack.len() <= 1 {
                    return Err(MetaError::UnmatchedEndSection { field: field_name });
                }
                if let Some(section) = stack.pop() {
                    attach(&mut stack, section);
                }
                continue;
            }

            attach(&mut stack, MetaNode::leaf(name, annotation, Arc::clone(&field)));
        }
    }

    // Unwind sections left open; inner-first keeps the nesting intact.
    while stack.len() > 1 {
        if let Some(section) = stack.pop() {
            attach(&mut stack, section);
        }
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn attach(stack: &mut Vec<MetaNode>, node: MetaNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

/// Indented one-line-per-node rendition of a tree, for logs and debugging.
pub fn render_tree(nodes: &[MetaNode]) -> String {
    fn render(nodes: &[MetaNode], level: usize, out: &mut String) {
        for node in nodes {
            out.push_str(&"    ".repeat(level));
            out.push_str(&node.name);
            out.push_str(" (");
            out.push_str(node.annotation.kind_name());
            out.push_str(")\n");
            render(&node.children, level + 1, out);
        }
    }

    let mut out = String::new();
    render(nodes, 0, &mut out);
    out
}
