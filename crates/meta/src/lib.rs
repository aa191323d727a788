//! Presentation metadata for observable containers.
//!
//! Fields are described with [`UiAnnotation`]s attached through [`ui`];
//! [`build`] then folds the flat, declaration-ordered annotation list into a
//! tree of [`MetaNode`]s, with [`StartSection`]/[`EndSection`] pairs and
//! [`SubSection`] markers forming the interior nodes. The tree is what a
//! widget layer renders; this crate stops at the structure.

pub mod annotations;
pub mod node;
pub mod tree;

pub use annotations::{
    ui, Action, Boolean, DialogKind, EndSection, Number, Options, PathPicker, Progress, Slider,
    StartSection, SubSection, Text, Title, UiAnnotation, UiTag,
};
pub use node::MetaNode;
pub use tree::{build, render_tree, MetaError};
