//! The synchronous multicast notification channel owned by a field.
//!
//! Subscribers run inline on the invoking thread, in registration order; a
//! subscriber that mutates another field cascades depth-first with no event
//! queue. The channel keeps the most recent invocation arguments and a
//! condition-variable signal so a consumer thread can block in [`wait`]
//! until the next invocation.
//!
//! The channel is transient state: it carries nothing serializable and is
//! never part of a persisted snapshot.
//!
//! [`wait`]: ChangeEvent::wait

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Identifies one registered subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct EventState<T> {
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_id: u64,
    /// Most recent invocation arguments.
    latest: Option<T>,
    /// Set by `invoke`, cleared by whichever waiter wakes first.
    signaled: bool,
}

/// A multicast change notification channel.
///
/// Cloning shares the same channel; all handles see the same subscribers.
pub struct ChangeEvent<T> {
    shared: Arc<(Mutex<EventState<T>>, Condvar)>,
}

impl<T> Clone for ChangeEvent<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Default for ChangeEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ChangeEvent<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new((
                Mutex::new(EventState {
                    subscribers: Vec::new(),
                    next_id: 0,
                    latest: None,
                    signaled: false,
                }),
                Condvar::new(),
            )),
        }
    }

    fn state(&self) -> MutexGuard<'_, EventState<T>> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber; it will be called after all previously
    /// registered ones.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut state = self.state();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscribers.push((id, Arc::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        state.subscribers.len() != before
    }

    /// Whether the subscription is still registered.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.state().subscribers.iter().any(|(sid, _)| *sid == id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.state().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().subscribers.is_empty()
    }

    /// Remove all subscribers.
    pub fn clear(&self) {
        self.state().subscribers.clear();
    }

    /// Invoke every subscriber in registration order, synchronously, on the
    /// calling thread, and wake blocking waiters.
    ///
    /// The subscriber list is snapshotted before the calls, so subscribers
    /// may re-enter the channel (or mutate other fields) freely.
    pub fn invoke(&self, value: &T) {
        let snapshot: Vec<Subscriber<T>> = {
            let mut state = self.state();
            state.latest = Some(value.clone());
            state.signaled = true;
            state.subscribers.iter().map(|(_, s)| Arc::clone(s)).collect()
        };
        self.shared.1.notify_all();
        for subscriber in snapshot {
            subscriber(value);
        }
    }

    /// Invoke only the most recently registered subscriber; no-op when none
    /// is registered. Waiters are not signaled.
    pub fn invoke_latest(&self, value: &T) {
        let last = {
            let state = self.state();
            state.subscribers.last().map(|(_, s)| Arc::clone(s))
        };
        if let Some(subscriber) = last {
            subscriber(value);
        }
    }

    /// Most recent invocation arguments, if the channel has fired at least
    /// once.
    pub fn latest(&self) -> Option<T> {
        self.state().latest.clone()
    }

    /// Block until the next [`invoke`](Self::invoke) or until `timeout`
    /// elapses. Returns the latest invocation arguments and clears the
    /// signal; `None` on timeout.
    ///
    /// Intended for a single consumer thread. With multiple concurrent
    /// waiters, whichever waiter wakes first clears the shared signal, so the
    /// others may miss that update. This race is part of the design and is
    /// not guarded against.
    pub fn wait(&self, timeout: Duration) -> Option<T> {
        let deadline = std::time::Instant::now() + timeout;
        let mut state = self.state();
        while !state.signaled {
            let remaining = deadline.checked_duration_since(std::time::Instant::now())?;
            let (guard, result) = self
                .shared
                .1
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
            if result.timed_out() && !state.signaled {
                return None;
            }
        }
        state.signaled = false;
        state.latest.clone()
    }

    /// An unbounded lazy sequence of invocation arguments, produced by
    /// repeatedly calling [`wait`](Self::wait) with the given timeout. The
    /// iterator ends on the first timeout; calling `stream` again restarts
    /// it.
    pub fn stream(&self, timeout: Duration) -> EventStream<T> {
        EventStream {
            event: self.clone(),
            timeout,
        }
    }
}

/// See [`ChangeEvent::stream`].
pub struct EventStream<T> {
    event: ChangeEvent<T>,
    timeout: Duration,
}

impl<T: Clone> Iterator for EventStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.event.wait(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let event = ChangeEvent::<i32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            event.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        event.invoke(&1);
        assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn test_invoke_latest_calls_only_newest() {
        let event = ChangeEvent::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        // No-op without subscribers.
        event.invoke_latest(&0);

        let c1 = Arc::clone(&count);
        event.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&count);
        event.subscribe(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        event.invoke_latest(&0);
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_unsubscribe() {
        let event = ChangeEvent::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = event.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(event.contains(id));
        assert!(event.unsubscribe(id));
        assert!(!event.unsubscribe(id));

        event.invoke(&1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wait_returns_latest_arguments() {
        let event = ChangeEvent::<i32>::new();
        let producer = event.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.invoke(&7);
        });

        assert_eq!(event.wait(Duration::from_secs(5)), Some(7));
        handle.join().unwrap();

        // Signal was cleared by the first wait.
        assert_eq!(event.wait(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_wait_times_out() {
        let event = ChangeEvent::<i32>::new();
        assert_eq!(event.wait(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_stream_yields_until_timeout() {
        let event = ChangeEvent::<i32>::new();
        let producer = event.clone();

        let handle = thread::spawn(move || {
            for i in 0..3 {
                thread::sleep(Duration::from_millis(10));
                producer.invoke(&i);
            }
        });

        let values: Vec<i32> = event.stream(Duration::from_millis(500)).take(3).collect();
        assert_eq!(values, [0, 1, 2]);
        handle.join().unwrap();
    }
}
