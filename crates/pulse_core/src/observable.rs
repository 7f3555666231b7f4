//! Observable values
//!
//! [`Observable<T>`] holds one value and notifies subscribers when it
//! changes (by `PartialEq`). [`ReadOnly<T>`] is a view over the same value
//! with no write surface, so an owner can keep the `Observable` private and
//! hand out views.
//!
//! # Re-entrant sets
//!
//! A subscriber may set the observable it is subscribed to. The new value
//! is stored immediately, but its notification is queued and delivered as a
//! separate pass once the current pass returns. Chains of re-sets therefore
//! run as sequential passes at constant stack depth, and every assigned
//! value is delivered in assignment order.
//!
//! ```rust
//! use pulse_core::Observable;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let health = Observable::new(100);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = Rc::clone(&seen);
//! let _sub = health.read_only().subscribe(move |hp| log.borrow_mut().push(*hp));
//!
//! health.set(100); // equal, suppressed
//! health.set(80);
//! assert_eq!(*seen.borrow(), vec![80]);
//! ```

use crate::subscription::{SubscriberList, Subscription};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Subscriber<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    /// Set while a notification pass for this observable is running.
    notifying: Cell<bool>,
    /// Values assigned during a pass, delivered after it in order.
    queued: RefCell<VecDeque<T>>,
    subscribers: SubscriberList<Subscriber<T>>,
}

impl<T: Clone + PartialEq + 'static> ObservableInner<T> {
    fn get(&self) -> T {
        self.value.borrow().clone()
    }

    fn subscribe(&self, subscriber: impl Fn(&T) + 'static) -> Subscription {
        let subscriber: Rc<Subscriber<T>> = Rc::new(subscriber);
        self.subscribers.subscribe(subscriber)
    }

    /// Deliver the stored value, or queue it when a pass is already running.
    fn notify_current(&self) {
        if self.notifying.get() {
            let value = self.get();
            self.queued.borrow_mut().push_back(value);
            return;
        }
        if self.subscribers.is_empty() {
            return;
        }

        self.notifying.set(true);
        let _pass = NotifyPass { inner: self };

        let mut next = Some(self.get());
        while let Some(value) = next {
            self.subscribers.dispatch(|subscriber| subscriber(&value));
            next = self.queued.borrow_mut().pop_front();
        }
    }
}

/// Clears the notifying flag when the outer pass ends. Values still queued
/// at that point belong to a pass that unwound and are discarded.
struct NotifyPass<'a, T> {
    inner: &'a ObservableInner<T>,
}

impl<T> Drop for NotifyPass<'_, T> {
    fn drop(&mut self) {
        self.inner.notifying.set(false);
        self.inner.queued.borrow_mut().clear();
    }
}

/// A mutable value with change notification
///
/// Cloning an `Observable` yields another writer for the same value and
/// subscribers. Hand out [`ReadOnly`] views to consumers that must not
/// write.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                notifying: Cell::new(false),
                queued: RefCell::new(VecDeque::new()),
                subscribers: SubscriberList::new(),
            }),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T {
        self.inner.get()
    }

    /// Borrow the current value without cloning.
    ///
    /// `f` must not set this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store a new value and notify subscribers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.notify_current();
    }

    /// Compute the next value from the current one and [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.get();
        self.set(f(&current));
    }

    /// Notify every subscriber with the current value, even if unchanged.
    pub fn notify_all(&self) {
        self.inner.notify_current();
    }

    /// Register a subscriber for future changes.
    ///
    /// The subscriber is not called with the current value.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribe(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Number of stored changes since construction
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Create a view with no write access
    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("notifying", &self.inner.notifying.get())
            .finish()
    }
}

/// Read-only view of an [`Observable`]
pub struct ReadOnly<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.inner.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn subscribe(&self, subscriber: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribe(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }
}

impl<T: Clone + PartialEq + 'static> From<&Observable<T>> for ReadOnly<T> {
    fn from(observable: &Observable<T>) -> Self {
        observable.read_only()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnly")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}
