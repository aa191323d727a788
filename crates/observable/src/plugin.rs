//! Value-interceptor plugins.
//!
//! A field holds an ordered chain of plugins, sorted ascending by
//! [`order_index`](FieldPlugin::order_index). The chain runs in ascending
//! priority order on get, set and fire, so the plugin ordered last observes
//! the final committed value on every access. Shared-memory plugins pin
//! themselves to the end of the chain (see
//! [`SharedValuePlugin`](crate::shared::SharedValuePlugin)).

use crate::field::ObservableField;
use crate::value::Value;

/// An interceptor invoked around field access. All hooks default to
/// pass-through.
pub trait FieldPlugin<T: Value + Clone>: Send + Sync {
    /// Position in the chain; lower values run earlier.
    fn order_index(&self) -> i32 {
        0
    }

    fn on_register(&self, _field: &ObservableField<T>) {}

    fn on_unregister(&self, _field: &ObservableField<T>) {}

    /// Transform the value returned by a get.
    fn on_get_value(&self, _field: &ObservableField<T>, value: T) -> T {
        value
    }

    /// Transform the value being written by a set.
    fn on_set_value(&self, _field: &ObservableField<T>, _old: T, new: T) -> T {
        new
    }

    /// Transform the value passed to subscribers on fire.
    fn on_fire(&self, _field: &ObservableField<T>, value: T) -> T {
        value
    }
}
