//! The serialization engine.
//!
//! Documents are flat-per-level JSON objects: every persisted field of a
//! container becomes one key, nested containers become nested objects.
//! Per-field problems (unknown enum member, malformed payload, a value with
//! no JSON form) are logged and skipped; only file I/O and JSON parsing are
//! fatal.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use observable::container::container_id;
use observable::{Annotation, AnnotationFinder, Category, Container, FieldHandle, ObjectId, Value};
use serde_json::Value as Json;

use crate::adapter::TypeAdapter;
use crate::adapters::{ArrayAdapter, DefaultAdapter, EnumAdapter, PathAdapter, VectorAdapter};
use crate::errors::SettingsError;
use crate::persist::Persist;

/// One level of a persisted document.
pub type Document = serde_json::Map<String, Json>;

/// Serializes and deserializes the persisted fields of a container graph.
///
/// Owns the adapter priority list. Custom adapters registered with
/// [`with_adapter`](Settings::with_adapter) are consulted before the built-in
/// ones; the pass-through default always stays last.
pub struct Settings {
    adapters: Vec<Box<dyn TypeAdapter>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Box::new(EnumAdapter),
                Box::new(VectorAdapter),
                Box::new(PathAdapter),
                Box::new(ArrayAdapter),
                Box::new(DefaultAdapter),
            ],
        }
    }

    /// Register a custom adapter ahead of the built-in ones.
    pub fn with_adapter(mut self, adapter: impl TypeAdapter + 'static) -> Self {
        self.adapters.insert(0, Box::new(adapter));
        self
    }

    /// Write the persisted fields of `root` to a pretty-printed JSON file.
    pub fn save(&self, path: impl AsRef<Path>, root: &dyn Container) -> Result<(), SettingsError> {
        let document = Json::Object(self.serialize(root));
        let text = serde_json::to_string_pretty(&document)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Read a JSON file written by [`save`](Settings::save) back into `root`.
    pub fn load(&self, path: impl AsRef<Path>, root: &dyn Container) -> Result<(), SettingsError> {
        let text = fs::read_to_string(path)?;
        self.load_json(&text, root)
    }

    /// Render the persisted fields of `root` as a pretty JSON string.
    pub fn save_json(&self, root: &dyn Container) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(&Json::Object(
            self.serialize(root),
        ))?)
    }

    /// Apply a JSON document to `root`. A top-level value that is not an
    /// object is ignored with a warning.
    pub fn load_json(&self, text: &str, root: &dyn Container) -> Result<(), SettingsError> {
        let document: Json = serde_json::from_str(text)?;
        match document.as_object() {
            Some(map) => self.deserialize(map, root),
            None => log::warn!("document root is not an object, nothing loaded"),
        }
        Ok(())
    }

    /// Serialize one container graph into a document.
    ///
    /// Keys appear in save order: declaration order, stable-sorted by the
    /// `save_order` keys of the fields' [`Persist`] annotations.
    pub fn serialize(&self, root: &dyn Container) -> Document {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        visited.insert(container_id(root));
        self.serialize_level(root, &mut visited)
    }

    fn serialize_level(&self, container: &dyn Container, visited: &mut HashSet<ObjectId>) -> Document {
        let mut document = Document::new();
        for (name, field, persist) in persisted_fields(container, Persist::save_order_key) {
            let key = persist.name().unwrap_or(&name).to_string();
            let value = field.value_boxed();

            // A non-empty nested rendition supersedes whatever an adapter
            // would produce for the reference itself.
            let candidate = match self.serialize_nested(&field, &*value, visited) {
                Some(nested) if !nested.is_empty() => Json::Object(nested),
                _ => match self.adapter_for(&*value).serialize(&*value) {
                    Ok(raw) => raw,
                    Err(err) => {
                        log::warn!("skipping '{key}': {err}");
                        continue;
                    }
                },
            };

            match serde_json::to_string(&candidate) {
                Ok(_) => {
                    document.insert(key, candidate);
                }
                Err(err) => log::warn!("skipping '{key}': value is not encodable: {err}"),
            }
        }
        document
    }

    fn serialize_nested(
        &self,
        field: &FieldHandle,
        value: &dyn Value,
        visited: &mut HashSet<ObjectId>,
    ) -> Option<Document> {
        let nested = value.as_container()?;
        let id = field.value_object_id().unwrap_or(container_id(&*nested));
        if !visited.insert(id) {
            log::debug!("object already serialized elsewhere in the graph");
            return None;
        }
        Some(self.serialize_level(&*nested, visited))
    }

    /// Apply a document to one container graph.
    ///
    /// Fields are processed in load order (declaration order, stable-sorted
    /// by `load_order` keys). Keys absent from the document leave their
    /// fields untouched; malformed values are logged and skipped.
    pub fn deserialize(&self, document: &Document, root: &dyn Container) {
        for (name, field, persist) in persisted_fields(root, Persist::load_order_key) {
            let key = persist.name().unwrap_or(&name);
            let Some(raw) = document.get(key) else {
                continue;
            };

            // Structural descent claims the key for fields holding nested
            // containers; everything else, including vectors and dense
            // arrays, goes through the adapters.
            if let Some(nested) = field.nested_container() {
                match raw.as_object() {
                    Some(map) => self.deserialize(map, &*nested),
                    None => log::warn!("skipping '{key}': expected a nested object"),
                }
                continue;
            }

            let witness = field.value_boxed();
            match self.adapter_for(&*witness).deserialize(&*witness, raw) {
                Ok(value) => {
                    if !field.set_value_boxed(value) {
                        log::warn!("skipping '{key}': rebuilt value has the wrong type");
                    }
                }
                Err(err) => log::warn!("skipping '{key}': {err}"),
            }
        }
    }

    fn adapter_for(&self, value: &dyn Value) -> &dyn TypeAdapter {
        self.adapters
            .iter()
            .find(|adapter| adapter.handles(value))
            .map(|adapter| adapter.as_ref())
            // The default adapter matches everything.
            .unwrap_or(&DefaultAdapter)
    }
}

/// One level of persisted fields: uncallable, exposed, in declaration order
/// stable-sorted by the given order key.
fn persisted_fields(
    container: &dyn Container,
    order: impl Fn(&Persist) -> i64,
) -> Vec<(String, FieldHandle, Persist)> {
    let found = AnnotationFinder::new(Category::SETTINGS)
        .with_predicate(|field, annotations| {
            !field.is_callable_value() && persist_of(annotations).exposed()
        })
        .find(container);

    let mut fields: Vec<(String, FieldHandle, Persist)> = found
        .into_iter()
        .map(|(name, (field, annotations))| {
            let persist = persist_of(&annotations);
            (name, field, persist)
        })
        .collect();
    fields.sort_by_key(|(_, _, persist)| order(persist));
    fields
}

fn persist_of(annotations: &[Arc<dyn Annotation>]) -> Persist {
    annotations
        .iter()
        .find_map(|a| a.as_any().downcast_ref::<Persist>().cloned())
        .unwrap_or_default()
}
