//! The reactive primitive: a value cell with a change notification channel.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::annotation::{Annotation, Category};
use crate::container::{AttributeSink, Container, ErasedField, FieldHandle};
use crate::event::{ChangeEvent, SubscriptionId};
use crate::plugin::FieldPlugin;
use crate::value::{ObjectId, Value};

struct FieldState<T> {
    value: T,
    publish_enabled: bool,
    plugins: Vec<Arc<dyn FieldPlugin<T>>>,
    /// Category key -> ordered annotation slot.
    annotations: HashMap<&'static str, Vec<Arc<dyn Annotation>>>,
}

/// A mutable value wrapped in an observable cell.
///
/// Cloning yields another handle to the same cell; containers hand these out
/// freely. The field owns exactly one [`ChangeEvent`] which fires when a set
/// actually changes the value (judged by [`Value::eq_value`]) while
/// publishing is enabled.
pub struct ObservableField<T: Value + Clone> {
    state: Arc<Mutex<FieldState<T>>>,
    on_changed: ChangeEvent<T>,
}

impl<T: Value + Clone> Clone for ObservableField<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            on_changed: self.on_changed.clone(),
        }
    }
}

impl<T: Value + Clone + std::fmt::Debug> std::fmt::Debug for ObservableField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ObservableField")
            .field("value", &state.value)
            .field("publish_enabled", &state.publish_enabled)
            .finish()
    }
}

/// Restores the previous publish flag on every exit path, including unwinds.
struct PublishGuard<T: Value + Clone> {
    field: ObservableField<T>,
    previous: bool,
}

impl<T: Value + Clone> Drop for PublishGuard<T> {
    fn drop(&mut self) {
        self.field.lock().publish_enabled = self.previous;
    }
}

impl<T: Value + Clone> ObservableField<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(FieldState {
                value,
                publish_enabled: true,
                plugins: Vec::new(),
                annotations: HashMap::new(),
            })),
            on_changed: ChangeEvent::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FieldState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The field's notification channel.
    pub fn on_changed(&self) -> &ChangeEvent<T> {
        &self.on_changed
    }

    /// Shorthand for subscribing to the notification channel.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.on_changed.subscribe(subscriber)
    }

    /// Current value, run through the get-interceptor chain in ascending
    /// order.
    pub fn get(&self) -> T {
        let (value, plugins) = {
            let state = self.lock();
            (state.value.clone(), state.plugins.clone())
        };
        plugins
            .iter()
            .fold(value, |v, plugin| plugin.on_get_value(self, v))
    }

    /// Backing value without interceptors.
    pub fn raw(&self) -> T {
        self.lock().value.clone()
    }

    /// Write a value. The value runs through the set-interceptor chain in
    /// ascending priority order and is stored; when publishing is enabled
    /// and the stored value differs from the previous one, the change event
    /// fires.
    pub fn set(&self, value: T) {
        let (old, plugins) = {
            let state = self.lock();
            (state.value.clone(), state.plugins.clone())
        };
        let value = plugins
            .iter()
            .fold(value, |v, plugin| plugin.on_set_value(self, old.clone(), v));

        let fire = {
            let mut state = self.lock();
            state.value = value;
            state.publish_enabled && !state.value.eq_value(&old)
        };
        if fire {
            self.fire();
        }
    }

    /// Write a value with publishing disabled for the duration of the write.
    /// The previous publish flag is restored on every exit path.
    pub fn set_silent(&self, value: T) {
        let _guard = self.disable_publishing();
        self.set(value);
    }

    fn disable_publishing(&self) -> PublishGuard<T> {
        let previous = {
            let mut state = self.lock();
            std::mem::replace(&mut state.publish_enabled, false)
        };
        PublishGuard {
            field: self.clone(),
            previous,
        }
    }

    pub fn publish_enabled(&self) -> bool {
        self.lock().publish_enabled
    }

    pub fn set_publish_enabled(&self, enabled: bool) {
        self.lock().publish_enabled = enabled;
    }

    /// Fire the change event with the current value (run through the
    /// fire-interceptor chain), invoking every subscriber in registration
    /// order and waking blocking waiters.
    pub fn fire(&self) {
        let (value, plugins) = {
            let state = self.lock();
            (state.value.clone(), state.plugins.clone())
        };
        let value = plugins
            .iter()
            .fold(value, |v, plugin| plugin.on_fire(self, v));
        self.on_changed.invoke(&value);
    }

    /// Fire only the most recently registered subscriber with the current
    /// value; no-op when none is registered.
    pub fn fire_latest(&self) {
        let value = self.lock().value.clone();
        self.on_changed.invoke_latest(&value);
    }

    /// One-way binding: on change, push this field's value into `other` with
    /// `other`'s publishing disabled for the duration of the write, so the
    /// propagation cannot feed back.
    pub fn bind_to(&self, other: &ObservableField<T>) -> SubscriptionId {
        let target = other.clone();
        self.on_changed.subscribe(move |value| {
            target.set_silent(value.clone());
        })
    }

    /// Two one-way bindings; each propagation step disables publishing on its
    /// target, so no feedback loop forms.
    pub fn bind_bidirectional(&self, other: &ObservableField<T>) {
        self.bind_to(other);
        other.bind_to(self);
    }

    /// On change, write the (optionally converted) value into a named
    /// attribute of an external sink, if the sink currently has it. With
    /// `fire_now` the binding is exercised immediately with the current
    /// value.
    pub fn bind_to_attribute(
        &self,
        sink: Arc<dyn AttributeSink>,
        name: impl Into<String>,
        converter: Option<Arc<dyn Fn(&T) -> Box<dyn Value> + Send + Sync>>,
        fire_now: bool,
    ) -> SubscriptionId {
        let name = name.into();
        let id = self.on_changed.subscribe(move |value| {
            if sink.has_attribute(&name) {
                let out = match &converter {
                    Some(convert) => convert(value),
                    None => value.clone_value(),
                };
                sink.set_attribute(&name, out);
            }
        });
        if fire_now {
            self.fire_latest();
        }
        id
    }

    /// Register an interceptor plugin; the chain is stable-sorted ascending
    /// by order index. The returned handle identifies the plugin for
    /// [`unregister_plugin`](Self::unregister_plugin).
    pub fn register_plugin(&self, plugin: impl FieldPlugin<T> + 'static) -> Arc<dyn FieldPlugin<T>> {
        let plugin: Arc<dyn FieldPlugin<T>> = Arc::new(plugin);
        {
            let mut state = self.lock();
            state.plugins.push(Arc::clone(&plugin));
            state.plugins.sort_by_key(|p| p.order_index());
        }
        plugin.on_register(self);
        plugin
    }

    /// Remove one plugin from the chain, calling its unregister hook.
    /// Returns whether it was registered; the rest of the chain keeps its
    /// order.
    pub fn unregister_plugin(&self, plugin: &Arc<dyn FieldPlugin<T>>) -> bool {
        let removed = {
            let mut state = self.lock();
            let before = state.plugins.len();
            state.plugins.retain(|p| !Arc::ptr_eq(p, plugin));
            state.plugins.len() != before
        };
        if removed {
            plugin.on_unregister(self);
        }
        removed
    }

    /// Remove all interceptor plugins, calling their unregister hooks.
    pub fn clear_plugins(&self) {
        let removed = {
            let mut state = self.lock();
            std::mem::take(&mut state.plugins)
        };
        for plugin in removed {
            plugin.on_unregister(self);
        }
    }

    /// Attach an annotation, returning the same field for fluent chains.
    pub fn with(self, annotation: impl Annotation) -> Self {
        let annotation: Arc<dyn Annotation> = Arc::new(annotation);
        self.store_annotation(Arc::clone(&annotation));
        annotation.on_applied(&self);
        self
    }

    /// Annotations stored under `category`, `None` when the field has no
    /// slot for it.
    pub fn annotations(&self, category: Category) -> Option<Vec<Arc<dyn Annotation>>> {
        let state = self.lock();
        state.annotations.get(category.key()).cloned()
    }

    /// A type-erased handle to this field.
    pub fn handle(&self) -> FieldHandle {
        Arc::new(self.clone())
    }
}

impl<T: Value + Clone> ErasedField for ObservableField<T> {
    fn annotations(&self, category: Category) -> Option<Vec<Arc<dyn Annotation>>> {
        ObservableField::annotations(self, category)
    }

    fn store_annotation(&self, annotation: Arc<dyn Annotation>) {
        let category = annotation.category();
        let mut state = self.lock();
        let slot = state.annotations.entry(category.key()).or_default();
        if category.allows_multiple() {
            slot.push(annotation);
        } else {
            // Single-value categories keep only the latest application.
            slot.clear();
            slot.push(annotation);
        }
    }

    fn value_boxed(&self) -> Box<dyn Value> {
        Box::new(self.get())
    }

    fn set_value_boxed(&self, value: Box<dyn Value>) -> bool {
        match value.as_any().downcast_ref::<T>() {
            Some(v) => {
                self.set(v.clone());
                true
            }
            None => false,
        }
    }

    fn set_value_boxed_silent(&self, value: Box<dyn Value>) -> bool {
        match value.as_any().downcast_ref::<T>() {
            Some(v) => {
                self.set_silent(v.clone());
                true
            }
            None => false,
        }
    }

    fn nested_container(&self) -> Option<Arc<dyn Container>> {
        self.lock().value.as_container()
    }

    fn value_object_id(&self) -> Option<ObjectId> {
        self.lock().value.object_id()
    }

    fn is_callable_value(&self) -> bool {
        self.lock().value.is_callable()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_subscriber(field: &ObservableField<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        field.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_set_fires_only_on_change() {
        let field = ObservableField::new(5i32);
        let count = counted_subscriber(&field);

        field.set(5);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        field.set(6);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(field.get(), 6);
    }

    #[test]
    fn test_fire_carries_new_value() {
        let field = ObservableField::new(0i32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        field.subscribe(move |v| s.lock().unwrap().push(*v));

        field.set(3);
        field.set(3);
        field.set(4);
        assert_eq!(*seen.lock().unwrap(), [3, 4]);
    }

    #[test]
    fn test_set_silent_restores_publish_flag() {
        let field = ObservableField::new(0i32);
        let count = counted_subscriber(&field);

        field.set_silent(1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(field.get(), 1);
        assert!(field.publish_enabled());

        // A previously disabled flag stays disabled afterwards.
        field.set_publish_enabled(false);
        field.set_silent(2);
        assert!(!field.publish_enabled());
    }

    struct ExplodingPlugin;

    impl FieldPlugin<i32> for ExplodingPlugin {
        fn on_set_value(&self, _field: &ObservableField<i32>, _old: i32, _new: i32) -> i32 {
            panic!("interceptor exploded")
        }
    }

    #[test]
    fn test_set_silent_restores_flag_across_unwind() {
        let field = ObservableField::new(0i32);
        field.register_plugin(ExplodingPlugin);

        let f = field.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            f.set_silent(1);
        }));
        assert!(result.is_err());
        // The guard restored the flag while unwinding out of the write.
        assert!(field.publish_enabled());
    }

    #[test]
    fn test_bind_to_updates_target_once_without_notifying_it() {
        let a = ObservableField::new(0i32);
        let b = ObservableField::new(0i32);
        a.bind_to(&b);

        let b_count = counted_subscriber(&b);
        a.set(10);
        assert_eq!(b.get(), 10);
        // Propagation wrote with b's publishing disabled.
        assert_eq!(b_count.load(Ordering::SeqCst), 0);

        // One-way: mutating b does not affect a.
        b.set(99);
        assert_eq!(a.get(), 10);
    }

    #[test]
    fn test_bind_bidirectional_has_no_feedback() {
        let a = ObservableField::new(0i32);
        let b = ObservableField::new(0i32);
        a.bind_bidirectional(&b);

        let a_count = counted_subscriber(&a);

        a.set(1);
        assert_eq!(b.get(), 1);
        // a fired once for its own mutation, with no re-entrant third update.
        assert_eq!(a_count.load(Ordering::SeqCst), 1);

        b.set(2);
        assert_eq!(a.get(), 2);
    }

    #[test]
    fn test_cascades_run_inline() {
        let a = ObservableField::new(0i32);
        let b = ObservableField::new(0i32);
        let b2 = b.clone();
        a.subscribe(move |v| b2.set(v * 2));

        a.set(21);
        assert_eq!(b.get(), 42);
    }

    struct OffsetPlugin {
        offset: i32,
        order: i32,
    }

    impl FieldPlugin<i32> for OffsetPlugin {
        fn order_index(&self) -> i32 {
            self.order
        }

        fn on_get_value(&self, _field: &ObservableField<i32>, value: i32) -> i32 {
            value + self.offset
        }
    }

    #[test]
    fn test_plugins_run_in_priority_order() {
        let field = ObservableField::new(0i32);
        field.register_plugin(OffsetPlugin { offset: 1, order: 10 });
        field.register_plugin(OffsetPlugin { offset: 100, order: -10 });

        // Both offsets apply regardless of registration order.
        assert_eq!(field.get(), 101);
        assert_eq!(field.raw(), 0);

        field.clear_plugins();
        assert_eq!(field.get(), 0);
    }

    #[test]
    fn test_unregister_plugin_removes_one_interceptor() {
        struct TrackedOffset {
            offset: i32,
            order: i32,
            unregistered: Arc<AtomicUsize>,
        }

        impl FieldPlugin<i32> for TrackedOffset {
            fn order_index(&self) -> i32 {
                self.order
            }

            fn on_unregister(&self, _field: &ObservableField<i32>) {
                self.unregistered.fetch_add(1, Ordering::SeqCst);
            }

            fn on_get_value(&self, _field: &ObservableField<i32>, value: i32) -> i32 {
                value + self.offset
            }
        }

        let unregistered = Arc::new(AtomicUsize::new(0));
        let field = ObservableField::new(0i32);
        field.register_plugin(OffsetPlugin { offset: 1, order: 0 });
        let middle = field.register_plugin(TrackedOffset {
            offset: 10,
            order: 5,
            unregistered: Arc::clone(&unregistered),
        });
        field.register_plugin(OffsetPlugin { offset: 100, order: 10 });
        assert_eq!(field.get(), 111);

        // Detaching the middle plugin leaves the rest of the chain intact.
        assert!(field.unregister_plugin(&middle));
        assert_eq!(field.get(), 101);
        assert_eq!(unregistered.load(Ordering::SeqCst), 1);

        // A second removal is a no-op and does not re-run the hook.
        assert!(!field.unregister_plugin(&middle));
        assert_eq!(unregistered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_to_attribute() {
        struct Sink {
            values: Mutex<Vec<String>>,
        }

        impl AttributeSink for Sink {
            fn has_attribute(&self, name: &str) -> bool {
                name == "label"
            }

            fn set_attribute(&self, _name: &str, value: Box<dyn Value>) {
                let text = value.as_any().downcast_ref::<String>().unwrap().clone();
                self.values.lock().unwrap().push(text);
            }
        }

        let sink = Arc::new(Sink {
            values: Mutex::new(Vec::new()),
        });
        let field = ObservableField::new(2i32);
        field.bind_to_attribute(
            sink.clone(),
            "label",
            Some(Arc::new(|v: &i32| Box::new(format!("value: {v}")))),
            true,
        );

        field.set(3);
        assert_eq!(
            *sink.values.lock().unwrap(),
            ["value: 2".to_string(), "value: 3".to_string()]
        );

        // A missing attribute is skipped without error.
        let other = ObservableField::new(1i32);
        other.bind_to_attribute(sink.clone(), "missing", None, false);
        other.set(2);
        assert_eq!(sink.values.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_erased_set_rejects_type_mismatch() {
        let field = ObservableField::new(1i32);
        let handle = field.handle();
        assert!(!handle.set_value_boxed(Box::new("oops".to_string())));
        assert!(handle.set_value_boxed(Box::new(2i32)));
        assert_eq!(field.get(), 2);
    }
}
