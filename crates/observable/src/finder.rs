//! Cycle-safe discovery of annotated fields in an object graph.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::annotation::{Annotation, Category};
use crate::container::{container_id, Container, FieldHandle};
use crate::value::ObjectId;

/// Separator of dotted field paths.
pub const PATH_SEPARATOR: &str = ".";

/// Canonical dotted-path name of a field reachable from some root.
///
/// Equality and hashing are computed from the joined path string only, never
/// from segment-list identity, so identifiers built from different walks
/// compare equal whenever they name the same location.
#[derive(Clone, Debug)]
pub struct PathIdentifier {
    pub name: String,
    pub parents: Vec<String>,
}

impl PathIdentifier {
    pub fn new(name: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parents,
        }
    }

    /// The dot-joined path string.
    pub fn path(&self) -> String {
        let mut segments = self.parents.clone();
        segments.push(self.name.clone());
        segments.join(PATH_SEPARATOR)
    }

    /// Parse a dotted path string back into an identifier.
    pub fn from_path(path: &str) -> Self {
        let mut segments: Vec<String> = path.split(PATH_SEPARATOR).map(String::from).collect();
        let name = segments.pop().unwrap_or_default();
        Self {
            name,
            parents: segments,
        }
    }
}

impl fmt::Display for PathIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl PartialEq for PathIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Eq for PathIdentifier {}

impl Hash for PathIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().hash(state);
    }
}

/// Predicate deciding whether a discovered field should be reported.
pub type FieldPredicate = Arc<dyn Fn(&FieldHandle, &[Arc<dyn Annotation>]) -> bool + Send + Sync>;

/// One discovery result: the field and its annotation slot.
pub type Found = (FieldHandle, Vec<Arc<dyn Annotation>>);

/// Generic, cycle-safe depth-first walker over a graph of containers,
/// collecting fields that carry a target annotation category.
///
/// Walk state (visited set, path stack) is created fresh per call, so
/// repeated calls on an unchanged graph are idempotent.
pub struct AnnotationFinder {
    category: Category,
    predicate: Option<FieldPredicate>,
    recursive: bool,
}

impl AnnotationFinder {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            predicate: None,
            recursive: false,
        }
    }

    /// Only report fields the predicate accepts. Rejected fields are skipped
    /// silently, without recursing into them.
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&FieldHandle, &[Arc<dyn Annotation>]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Descend into fields whose values are themselves containers.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Discover annotated fields, keyed by dotted path string.
    pub fn find(&self, root: &dyn Container) -> IndexMap<String, Found> {
        self.find_with_identifier(root)
            .into_iter()
            .map(|(identifier, found)| (identifier.path(), found))
            .collect()
    }

    /// Discover annotated fields, keyed by [`PathIdentifier`].
    pub fn find_with_identifier(&self, root: &dyn Container) -> IndexMap<PathIdentifier, Found> {
        let mut results = IndexMap::new();
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut parents: Vec<String> = Vec::new();
        visited.insert(container_id(root));
        self.walk(root, &mut visited, &mut parents, &mut results);
        results
    }

    fn walk(
        &self,
        container: &dyn Container,
        visited: &mut HashSet<ObjectId>,
        parents: &mut Vec<String>,
        results: &mut IndexMap<PathIdentifier, Found>,
    ) {
        for (name, field) in container.fields() {
            if let Some(annotations) = field.annotations(self.category) {
                if let Some(predicate) = &self.predicate {
                    if !predicate(&field, &annotations) {
                        continue;
                    }
                }
                results.insert(
                    PathIdentifier::new(name, parents.clone()),
                    (field, annotations),
                );
            } else if self.recursive {
                let Some(nested) = field.nested_container() else {
                    continue;
                };
                // Identity check, not value equality: already-visited objects
                // are skipped, which also breaks reference cycles.
                let id = field.value_object_id().unwrap_or(container_id(&*nested));
                if !visited.insert(id) {
                    log::trace!("skipping already-visited object at '{name}'");
                    continue;
                }
                parents.push(name.to_string());
                self.walk(&*nested, visited, parents, results);
                parents.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::tag;
    use crate::field::ObservableField;
    use crate::reflect_container;
    use std::any::Any;

    #[derive(Debug)]
    struct Mark;

    impl Annotation for Mark {
        fn category(&self) -> Category {
            Category::SETTINGS
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Inner {
        gain: ObservableField<f64>,
    }

    reflect_container!(Inner { gain });

    struct Outer {
        enabled: ObservableField<bool>,
        untagged: ObservableField<i32>,
        inner: ObservableField<Arc<Inner>>,
    }

    reflect_container!(Outer {
        enabled,
        untagged,
        inner,
    });

    fn sample() -> Outer {
        Outer {
            enabled: tag(ObservableField::new(true), Mark),
            untagged: ObservableField::new(0),
            inner: ObservableField::new(Arc::new(Inner {
                gain: tag(ObservableField::new(0.5), Mark),
            })),
        }
    }

    #[test]
    fn test_path_identifier_equality_uses_path_string() {
        let a = PathIdentifier::new("gain", vec!["inner".into()]);
        let b = PathIdentifier::from_path("inner.gain");
        assert_eq!(a, b);
        assert_eq!(a.path(), "inner.gain");
        assert_eq!(b.parents, vec!["inner".to_string()]);
    }

    #[test]
    fn test_non_recursive_find_stays_on_one_level() {
        let root = sample();
        let found = AnnotationFinder::new(Category::SETTINGS).find(&root);
        assert_eq!(found.keys().collect::<Vec<_>>(), ["enabled"]);
    }

    #[test]
    fn test_recursive_find_builds_dotted_paths() {
        let root = sample();
        let found = AnnotationFinder::new(Category::SETTINGS)
            .recursive(true)
            .find(&root);
        assert_eq!(found.keys().collect::<Vec<_>>(), ["enabled", "inner.gain"]);
    }

    #[test]
    fn test_find_is_idempotent() {
        let root = sample();
        let finder = AnnotationFinder::new(Category::SETTINGS).recursive(true);
        let first: Vec<String> = finder.find(&root).keys().cloned().collect();
        let second: Vec<String> = finder.find(&root).keys().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_predicate_rejection_is_silent() {
        let root = sample();
        let found = AnnotationFinder::new(Category::SETTINGS)
            .recursive(true)
            .with_predicate(|_, _| false)
            .find(&root);
        assert!(found.is_empty());
    }

    struct Node {
        label: ObservableField<String>,
        partner: ObservableField<Option<Arc<Node>>>,
    }

    reflect_container!(Node { label, partner });

    #[test]
    fn test_cycles_terminate() {
        let a = Arc::new(Node {
            label: tag(ObservableField::new("a".to_string()), Mark),
            partner: ObservableField::new(None),
        });
        let b = Arc::new(Node {
            label: tag(ObservableField::new("b".to_string()), Mark),
            partner: ObservableField::new(Some(Arc::clone(&a))),
        });
        a.partner.set(Some(Arc::clone(&b)));

        let found = AnnotationFinder::new(Category::SETTINGS)
            .recursive(true)
            .find(&*a);
        // Each object is visited at most once.
        assert_eq!(
            found.keys().collect::<Vec<_>>(),
            ["label", "partner.label"]
        );
    }
}
