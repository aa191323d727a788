//! The UI annotation vocabulary.
//!
//! Each annotation describes how one observable field should be presented:
//! as a checkbox, a number box, a slider, a selection list, and so on.
//! Section markers ([`StartSection`], [`SubSection`], [`EndSection`]) carry
//! no widget themselves; the tree builder folds them into interior nodes.
//!
//! Annotations are attached through [`ui`], which wraps them in the
//! [`UiTag`] carrier of the UI category, so one field can combine a widget
//! annotation with section markers.

use std::any::Any;
use std::sync::Arc;

use observable::{Annotation, Category};

/// Presentation metadata for one field.
///
/// `importance` ranks the annotations attached to the same field before
/// emission: lower values are emitted first. Widgets default to 10;
/// [`EndSection`] uses 15 so a section always closes after its field's
/// widget, regardless of attachment order.
pub trait UiAnnotation: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    fn tooltip(&self) -> &str {
        ""
    }

    fn read_only(&self) -> bool {
        false
    }

    /// Emission rank among annotations on the same field.
    fn importance(&self) -> i32 {
        10
    }

    /// Short kind label for tree rendering.
    fn kind_name(&self) -> &'static str;

    /// Downcast support for the tree builder.
    fn as_any(&self) -> &dyn Any;
}

/// The carrier that stores a [`UiAnnotation`] under the UI category.
#[derive(Clone)]
pub struct UiTag(Arc<dyn UiAnnotation>);

impl UiTag {
    pub fn new(annotation: impl UiAnnotation + 'static) -> Self {
        Self(Arc::new(annotation))
    }

    pub fn inner(&self) -> &Arc<dyn UiAnnotation> {
        &self.0
    }
}

impl Annotation for UiTag {
    fn category(&self) -> Category {
        Category::UI
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wrap a presentation annotation for attachment:
/// `tag(field, ui(Slider::new("Gain")))`.
pub fn ui(annotation: impl UiAnnotation + 'static) -> UiTag {
    UiTag::new(annotation)
}

macro_rules! impl_ui_annotation {
    ($ty:ident) => {
        impl UiAnnotation for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn tooltip(&self) -> &str {
                &self.tooltip
            }

            fn read_only(&self) -> bool {
                self.read_only
            }

            fn kind_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// A static heading above a read-only field.
#[derive(Debug, Clone, Default)]
pub struct Title {
    name: String,
    tooltip: String,
}

impl Title {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }
}

impl UiAnnotation for Title {
    fn name(&self) -> &str {
        &self.name
    }

    fn tooltip(&self) -> &str {
        &self.tooltip
    }

    fn read_only(&self) -> bool {
        true
    }

    fn kind_name(&self) -> &'static str {
        "Title"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A checkbox.
#[derive(Debug, Clone)]
pub struct Boolean {
    name: String,
    tooltip: String,
    read_only: bool,
}

impl Boolean {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl_ui_annotation!(Boolean);

/// A numeric input box with limits and display precision.
#[derive(Debug, Clone)]
pub struct Number {
    name: String,
    tooltip: String,
    read_only: bool,
    min: f64,
    max: f64,
    precision: u8,
}

impl Number {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
            min: f64::MIN,
            max: f64::MAX,
            precision: 3,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn limits(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn display_precision(&self) -> u8 {
        self.precision
    }
}

impl_ui_annotation!(Number);

/// A bounded slider, 0..=1 unless configured otherwise.
#[derive(Debug, Clone)]
pub struct Slider {
    name: String,
    tooltip: String,
    read_only: bool,
    min: f64,
    max: f64,
}

impl Slider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
            min: 0.0,
            max: 1.0,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn limits(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl_ui_annotation!(Slider);

/// A single-line text input.
#[derive(Debug, Clone)]
pub struct Text {
    name: String,
    tooltip: String,
    read_only: bool,
    placeholder: String,
}

impl Text {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
            placeholder: String::new(),
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn placeholder_text(&self) -> &str {
        &self.placeholder
    }
}

impl_ui_annotation!(Text);

/// A read-only progress bar over a 0..=1 field.
#[derive(Debug, Clone)]
pub struct Progress {
    name: String,
    tooltip: String,
}

impl Progress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }
}

impl UiAnnotation for Progress {
    fn name(&self) -> &str {
        &self.name
    }

    fn tooltip(&self) -> &str {
        &self.tooltip
    }

    fn read_only(&self) -> bool {
        true
    }

    fn kind_name(&self) -> &'static str {
        "Progress"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A fixed selection list.
#[derive(Debug, Clone)]
pub struct Options {
    name: String,
    tooltip: String,
    read_only: bool,
    options: Vec<String>,
}

impl Options {
    pub fn new(name: impl Into<String>, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.options
    }
}

impl_ui_annotation!(Options);

/// Which file dialog a path picker opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogKind {
    #[default]
    OpenFile,
    OpenDirectory,
    SaveFile,
}

/// A path picker.
#[derive(Debug, Clone)]
pub struct PathPicker {
    name: String,
    tooltip: String,
    read_only: bool,
    placeholder: String,
    dialog_title: String,
    dialog: DialogKind,
}

impl PathPicker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            read_only: false,
            placeholder: String::new(),
            dialog_title: "Please choose a path".to_string(),
            dialog: DialogKind::default(),
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn dialog_title(mut self, title: impl Into<String>) -> Self {
        self.dialog_title = title.into();
        self
    }

    pub fn dialog(mut self, dialog: DialogKind) -> Self {
        self.dialog = dialog;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn dialog_kind(&self) -> DialogKind {
        self.dialog
    }
}

impl_ui_annotation!(PathPicker);

/// A button invoking a callable field.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    tooltip: String,
    text: Option<String>,
    show_label: bool,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: String::new(),
            text: None,
            show_label: false,
        }
    }

    /// Button caption; the display name is used when unset.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn show_label(mut self) -> Self {
        self.show_label = true;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn caption(&self) -> &str {
        self.text.as_deref().unwrap_or(&self.name)
    }

    pub fn label_shown(&self) -> bool {
        self.show_label
    }
}

impl UiAnnotation for Action {
    fn name(&self) -> &str {
        &self.name
    }

    fn tooltip(&self) -> &str {
        &self.tooltip
    }

    fn kind_name(&self) -> &'static str {
        "Action"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Opens a collapsible section; later fields nest inside until a matching
/// [`EndSection`].
#[derive(Debug, Clone)]
pub struct StartSection {
    name: String,
    collapsed: bool,
}

impl StartSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collapsed: false,
        }
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}

impl UiAnnotation for StartSection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_name(&self) -> &'static str {
        "StartSection"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A section whose content is the nested container held by the annotated
/// field itself; no [`EndSection`] pairs with it.
#[derive(Debug, Clone)]
pub struct SubSection {
    name: String,
    collapsed: bool,
}

impl SubSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collapsed: false,
        }
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}

impl UiAnnotation for SubSection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_name(&self) -> &'static str {
        "SubSection"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Closes the innermost open [`StartSection`]. Ranked after every widget on
/// the same field, so the field still lands inside the section it closes.
#[derive(Debug, Clone, Default)]
pub struct EndSection;

impl EndSection {
    pub fn new() -> Self {
        Self
    }
}

impl UiAnnotation for EndSection {
    fn name(&self) -> &str {
        ""
    }

    fn importance(&self) -> i32 {
        15
    }

    fn kind_name(&self) -> &'static str {
        "EndSection"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
