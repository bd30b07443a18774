#![forbid(unsafe_code)]

//! Change-notification primitives.
//!
//! - [`Observable`]: a shared, version-tracked value with subscriber callbacks.
//! - [`Notifier`]: a value-less event that broadcasts an argument to its
//!   subscribers (the "changed" hook a bindable type exposes per property).
//! - [`Subscription`]: RAII guard; dropping it disconnects the callback.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Setting an `Observable` to a value equal to the current one is a no-op
//!    (no version bump, no notifications).
//! 3. A callback whose `Subscription` has been dropped never runs again, even
//!    when the drop happens earlier in the same notification cycle.
//! 4. No internal borrow is held while callbacks run, so callbacks may read,
//!    write, subscribe, or unsubscribe re-entrantly.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<A> = Box<dyn Fn(&A)>;

/// Weakly held callback list shared by [`Observable`] and [`Notifier`].
struct Subscribers<A: 'static> {
    slots: RefCell<Vec<Weak<Callback<A>>>>,
}

impl<A: 'static> Subscribers<A> {
    fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: Rc<Callback<A>> = Rc::new(Box::new(callback));
        self.slots.borrow_mut().push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    fn notify(&self, arg: &A) {
        let slots: Vec<Weak<Callback<A>>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.clone()
        };
        for slot in slots {
            if let Some(callback) = slot.upgrade() {
                callback(arg);
            }
        }
    }

    fn len(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a registered callback.
///
/// The notifying side only holds a `Weak` reference; this guard owns the
/// callback. Dropping it disconnects the callback.
#[must_use = "dropping a Subscription disconnects its callback"]
pub struct Subscription {
    _guard: Rc<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// A value-less event broadcasting `&A` to its subscribers.
pub struct Notifier<A: 'static = ()> {
    subscribers: Subscribers<A>,
}

impl<A: 'static> Notifier<A> {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    /// Register a callback. It stays connected while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Invoke every live callback with `arg`.
    pub fn notify(&self, arg: &A) {
        self.subscribers.notify(arg);
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Notifier<()> {
    /// Fire a value-less notification.
    pub fn emit(&self) {
        self.subscribers.notify(&());
    }
}

impl<A: 'static> Default for Notifier<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: Subscribers<T>,
}

/// A shared, version-tracked value with change notification.
///
/// Clones share the same underlying value.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Returns `true` when the value changed and
    /// subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        let snapshot = self.get();
        self.inner.subscribers.notify(&snapshot);
        true
    }

    /// Register a callback invoked with the new value after each change.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }

    /// Number of changes applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new(5);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));

        assert!(!obs.set(5));
        assert_eq!(obs.version(), 0);
        assert_eq!(hits.get(), 0);

        assert!(obs.set(6));
        assert_eq!(obs.version(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscribers_fire_in_registration_order() {
        let notifier: Notifier<u8> = Notifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let _a = notifier.subscribe(move |v| l1.borrow_mut().push(("a", *v)));
        let _b = notifier.subscribe(move |v| l2.borrow_mut().push(("b", *v)));

        notifier.notify(&3);
        assert_eq!(*log.borrow(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn dropped_subscription_stops_callbacks() {
        let notifier: Notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = notifier.subscribe(move |()| h.set(h.get() + 1));
        notifier.emit();
        drop(sub);
        notifier.emit();
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_during_notification_is_honored() {
        let notifier: Notifier = Notifier::new();
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let fired = Rc::new(Cell::new(false));

        let slot = Rc::clone(&later);
        let _first = notifier.subscribe(move |()| {
            slot.borrow_mut().take();
        });
        let f = Rc::clone(&fired);
        *later.borrow_mut() = Some(notifier.subscribe(move |()| f.set(true)));

        notifier.emit();
        assert!(!fired.get(), "second callback was dropped by the first");
    }

    #[test]
    fn callbacks_may_read_the_observable() {
        let obs = Observable::new(String::from("a"));
        let seen = Rc::new(RefCell::new(String::new()));
        let reader = obs.clone();
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |_| *s.borrow_mut() = reader.get());
        obs.set("b".into());
        assert_eq!(*seen.borrow(), "b");
    }
}
