//! Rebinding a field's backing storage to a shared value cell.
//!
//! [`SharedValuePlugin`] routes every access of a field through a
//! [`SharedCell`], a cell that other parties hold handles to. The plugin pins
//! itself to the end of the interceptor chain, so it commits after all other
//! set interceptors and its reads reflect the final committed value.

use std::sync::{Arc, Mutex, PoisonError};

use crate::field::ObservableField;
use crate::plugin::FieldPlugin;
use crate::value::Value;

/// A value cell shared between otherwise independent owners. Cloning shares
/// the cell.
pub struct SharedCell<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> SharedCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    pub fn get(&self) -> T {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, value: T) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Interceptor that mirrors a field into a [`SharedCell`].
///
/// Ordered last in the chain: sets commit the fully transformed value to the
/// cell, and gets and fires read the cell back so every handle observes the
/// shared state.
pub struct SharedValuePlugin<T> {
    cell: SharedCell<T>,
}

impl<T> SharedValuePlugin<T> {
    pub fn new(cell: SharedCell<T>) -> Self {
        Self { cell }
    }
}

impl<T: Value + Clone> FieldPlugin<T> for SharedValuePlugin<T> {
    fn order_index(&self) -> i32 {
        i32::MAX
    }

    fn on_register(&self, field: &ObservableField<T>) {
        // Seed the cell with the field's current backing value.
        self.cell.set(field.raw());
    }

    fn on_set_value(&self, _field: &ObservableField<T>, _old: T, new: T) -> T {
        self.cell.set(new.clone());
        new
    }

    fn on_get_value(&self, _field: &ObservableField<T>, _value: T) -> T {
        self.cell.get()
    }

    fn on_fire(&self, _field: &ObservableField<T>, _value: T) -> T {
        self.cell.get()
    }
}
