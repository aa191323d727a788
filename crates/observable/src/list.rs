//! Observable collections layered on [`ObservableField`].

use crate::container::FieldHandle;
use crate::field::ObservableField;
use crate::value::Value;

/// A list whose mutations each fire the underlying field's change event once.
pub struct ObservableList<T: Value + Clone> {
    field: ObservableField<Vec<T>>,
}

impl<T: Value + Clone> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
        }
    }
}

impl<T: Value + Clone> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Value + Clone> ObservableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            field: ObservableField::new(items),
        }
    }

    /// The backing field, for subscriptions, bindings and tagging.
    pub fn field(&self) -> &ObservableField<Vec<T>> {
        &self.field
    }

    /// Erased handle of the backing field, so lists drop into
    /// [`reflect_container!`](crate::reflect_container) like plain fields.
    pub fn handle(&self) -> FieldHandle {
        self.field.handle()
    }

    pub fn push(&self, item: T) {
        let mut items = self.field.raw();
        items.push(item);
        self.field.set(items);
    }

    pub fn insert(&self, index: usize, item: T) {
        let mut items = self.field.raw();
        items.insert(index, item);
        self.field.set(items);
    }

    /// Remove and return the item at `index`, `None` when out of bounds.
    pub fn remove(&self, index: usize) -> Option<T> {
        let mut items = self.field.raw();
        if index >= items.len() {
            return None;
        }
        let removed = items.remove(index);
        self.field.set(items);
        Some(removed)
    }

    pub fn clear(&self) {
        self.field.set(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.field.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.raw().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.field.raw().get(index).cloned()
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<T> {
        self.field.raw()
    }
}

/// An observable list with an observable selection.
pub struct SelectableList<T: Value + Clone> {
    list: ObservableList<T>,
    selected_index: ObservableField<Option<usize>>,
}

impl<T: Value + Clone> SelectableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            list: ObservableList::new(items),
            selected_index: ObservableField::new(None),
        }
    }

    pub fn list(&self) -> &ObservableList<T> {
        &self.list
    }

    /// The selection field; fires when the selection changes.
    pub fn selected_index(&self) -> &ObservableField<Option<usize>> {
        &self.selected_index
    }

    pub fn select(&self, index: Option<usize>) {
        self.selected_index.set(index);
    }

    pub fn selected_item(&self) -> Option<T> {
        self.selected_index.get().and_then(|i| self.list.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_each_mutation_fires_once() {
        let list = ObservableList::new(vec![1i32]);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        list.field().subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        list.push(2);
        list.insert(0, 0);
        assert_eq!(list.remove(1), Some(1));
        list.clear();
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert!(list.is_empty());

        // Clearing an already-empty list changes nothing and stays silent.
        list.clear();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_remove_out_of_bounds_is_none() {
        let list = ObservableList::new(vec![1i32]);
        assert_eq!(list.remove(5), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_selection_follows_the_list() {
        let list = SelectableList::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.selected_item(), None);

        list.select(Some(1));
        assert_eq!(list.selected_item(), Some("b".to_string()));

        list.select(None);
        assert_eq!(list.selected_item(), None);
    }
}
