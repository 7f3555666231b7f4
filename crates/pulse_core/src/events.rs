//! Event dispatch system
//!
//! A typed, synchronous publish/subscribe bus. Each payload type gets its
//! own subscriber list, created on first subscription; lists for different
//! payload types never interact.
//!
//! Dispatch is fail-fast: when a fallible handler returns an error the
//! publish stops and the error is returned to the publisher. Handlers later
//! in the list do not run for that publish.
//!
//! ```rust
//! use pulse_core::EventBus;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! struct Damage(u32);
//!
//! let bus = EventBus::new();
//! let total = Rc::new(Cell::new(0));
//!
//! let sum = Rc::clone(&total);
//! bus.subscribe(move |hit: &Damage| sum.set(sum.get() + hit.0));
//!
//! bus.publish(Damage(3)).unwrap();
//! bus.publish(Damage(4)).unwrap();
//! assert_eq!(total.get(), 7);
//! ```

use crate::error::{HandlerError, PulseError, Result};
use crate::subscription::{SubscriberList, Subscription};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

/// Stored form of every handler, fallible or not
type Handler<P> = dyn Fn(&P) -> std::result::Result<(), HandlerError>;

/// Subscriber list for one payload type
type Channel<P> = SubscriberList<Handler<P>>;

/// Dispatches typed events to subscribed handlers
///
/// Cloning the bus yields another handle to the same channels, so handlers
/// can capture a clone to publish or subscribe from inside a dispatch.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Rc<RefCell<FxHashMap<TypeId, Box<dyn Any>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for payloads of type `P`
    pub fn subscribe<P, F>(&self, handler: F) -> Subscription
    where
        P: 'static,
        F: Fn(&P) + 'static,
    {
        self.try_subscribe(move |payload: &P| {
            handler(payload);
            Ok::<(), Infallible>(())
        })
    }

    /// Register a handler whose error aborts the publish that invoked it
    pub fn try_subscribe<P, E, F>(&self, handler: F) -> Subscription
    where
        P: 'static,
        E: Into<HandlerError>,
        F: Fn(&P) -> std::result::Result<(), E> + 'static,
    {
        let handler: Rc<Handler<P>> =
            Rc::new(move |payload: &P| -> std::result::Result<(), HandlerError> {
                handler(payload).map_err(Into::into)
            });
        let subscription = self.channel::<P>().subscribe(handler);
        tracing::trace!(
            payload = std::any::type_name::<P>(),
            id = ?subscription.id(),
            "event handler subscribed"
        );
        subscription
    }

    /// Deliver `payload` to every handler of `P` in subscription order.
    ///
    /// Returns the first handler error. Publishing a type nobody subscribed
    /// to does nothing.
    pub fn publish<P: 'static>(&self, payload: P) -> Result<()> {
        let Some(channel) = self.existing_channel::<P>() else {
            return Ok(());
        };
        channel
            .try_dispatch(|handler| handler(&payload))
            .map_err(|source| {
                tracing::debug!(
                    payload = std::any::type_name::<P>(),
                    error = %source,
                    "event handler failed; publish aborted"
                );
                PulseError::handler::<P>(source)
            })
    }

    /// Number of handlers the next publish of `P` will reach
    pub fn subscriber_count<P: 'static>(&self) -> usize {
        self.existing_channel::<P>()
            .map_or(0, |channel| channel.len())
    }

    /// Number of payload types that have ever had a subscriber
    pub fn channel_count(&self) -> usize {
        self.channels.borrow().len()
    }

    fn existing_channel<P: 'static>(&self) -> Option<Channel<P>> {
        self.channels
            .borrow()
            .get(&TypeId::of::<P>())
            .and_then(|channel| channel.downcast_ref::<Channel<P>>())
            .cloned()
    }

    fn channel<P: 'static>(&self) -> Channel<P> {
        if let Some(channel) = self.existing_channel::<P>() {
            return channel;
        }
        let channel = Channel::<P>::new();
        self.channels
            .borrow_mut()
            .insert(TypeId::of::<P>(), Box::new(channel.clone()));
        channel
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channel_count())
            .finish()
    }
}
