//! Subscriber lists and subscription handles
//!
//! Every broadcast in the core (event bus channels, observable values and
//! state machine transition listeners) goes through a [`SubscriberList`].
//! The list guarantees:
//!
//! - Handlers run in subscription order, never resorted.
//! - Subscribing or disposing while the list is being dispatched is
//!   deferred until the outermost dispatch pass returns. The live pass
//!   never sees a shortened or lengthened list.
//! - Bookkeeping is restored even when a handler fails or unwinds.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Key identifying a subscriber within its list
    pub struct SubscriberId;
}

/// Mutation requested while the list was dispatching
enum PendingOp {
    Attach(SubscriberId),
    Detach(SubscriberId),
}

struct ListState<H: ?Sized> {
    handlers: SlotMap<SubscriberId, Rc<H>>,
    /// Dispatch order. Only changes while no pass is running.
    order: SmallVec<[SubscriberId; 4]>,
    dispatch_depth: u32,
    pending: SmallVec<[PendingOp; 2]>,
}

impl<H: ?Sized> ListState<H> {
    fn remove(&mut self, id: SubscriberId) -> Option<Rc<H>> {
        let handler = self.handlers.remove(id)?;
        self.order.retain(|entry| *entry != id);
        Some(handler)
    }

    /// Apply deferred mutations in request order.
    ///
    /// Removed handlers are handed back so the caller can drop them after
    /// releasing the borrow: a handler may own a guard for this same list.
    fn apply_pending(&mut self) -> SmallVec<[Rc<H>; 2]> {
        let mut released = SmallVec::new();
        for op in std::mem::take(&mut self.pending) {
            match op {
                PendingOp::Attach(id) => {
                    if self.handlers.contains_key(id) {
                        self.order.push(id);
                    }
                }
                PendingOp::Detach(id) => released.extend(self.remove(id)),
            }
        }
        released
    }
}

/// Type-erased detach entry point held weakly by [`Subscription`]
trait Detach {
    fn detach(&self, id: SubscriberId);
}

impl<H: ?Sized> Detach for RefCell<ListState<H>> {
    fn detach(&self, id: SubscriberId) {
        let released = {
            let mut state = self.borrow_mut();
            if !state.handlers.contains_key(id) {
                return;
            }
            if state.dispatch_depth > 0 {
                tracing::trace!(?id, "detach deferred until dispatch completes");
                state.pending.push(PendingOp::Detach(id));
                return;
            }
            state.remove(id)
        };
        drop(released);
    }
}

/// Ordered list of shared handlers with deferred mutation during dispatch
///
/// `H` is the handler trait object, e.g. `dyn Fn(&T)`. Cloning the list
/// yields another handle to the same subscribers.
pub(crate) struct SubscriberList<H: ?Sized> {
    state: Rc<RefCell<ListState<H>>>,
}

impl<H: ?Sized> Clone for SubscriberList<H> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<H: ?Sized + 'static> SubscriberList<H> {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState {
                handlers: SlotMap::with_key(),
                order: SmallVec::new(),
                dispatch_depth: 0,
                pending: SmallVec::new(),
            })),
        }
    }

    /// Append a handler. During dispatch it joins from the next pass on.
    pub(crate) fn subscribe(&self, handler: Rc<H>) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.handlers.insert(handler);
            if state.dispatch_depth > 0 {
                state.pending.push(PendingOp::Attach(id));
            } else {
                state.order.push(id);
            }
            id
        };
        tracing::trace!(?id, "subscriber attached");

        let list: Weak<RefCell<ListState<H>>> = Rc::downgrade(&self.state);
        Subscription {
            id,
            list,
            disposed: Cell::new(false),
        }
    }

    /// Number of handlers the next pass will invoke, ignoring requests
    /// still deferred by an active pass.
    pub(crate) fn len(&self) -> usize {
        self.state.borrow().order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler in order, stopping at the first error.
    ///
    /// An empty list returns immediately without entering a pass.
    pub(crate) fn try_dispatch<E>(
        &self,
        mut invoke: impl FnMut(&H) -> Result<(), E>,
    ) -> Result<(), E> {
        {
            let mut state = self.state.borrow_mut();
            if state.order.is_empty() {
                return Ok(());
            }
            state.dispatch_depth += 1;
        }
        let _pass = DispatchPass { state: &*self.state };

        let mut index = 0;
        while let Some(handler) = self.handler_at(index) {
            index += 1;
            invoke(&handler)?;
        }
        Ok(())
    }

    /// Invoke every handler in order.
    pub(crate) fn dispatch(&self, mut invoke: impl FnMut(&H)) {
        let outcome = self.try_dispatch(|handler| {
            invoke(handler);
            Ok::<(), Infallible>(())
        });
        match outcome {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    fn handler_at(&self, index: usize) -> Option<Rc<H>> {
        let state = self.state.borrow();
        let id = state.order.get(index)?;
        state.handlers.get(*id).cloned()
    }
}

/// Marks one dispatch pass; flushes deferred mutations when the outermost
/// pass ends, including on early return or unwind.
struct DispatchPass<'a, H: ?Sized> {
    state: &'a RefCell<ListState<H>>,
}

impl<H: ?Sized> Drop for DispatchPass<'_, H> {
    fn drop(&mut self) {
        let released = {
            let mut state = self.state.borrow_mut();
            state.dispatch_depth -= 1;
            if state.dispatch_depth > 0 {
                return;
            }
            state.apply_pending()
        };
        drop(released);
    }
}

/// Disposable token returned by every `subscribe` call
///
/// Dropping a `Subscription` leaves the handler attached; call
/// [`dispose`](Self::dispose) to detach it, or convert it into a
/// [`SubscriptionGuard`] to detach on drop.
pub struct Subscription {
    id: SubscriberId,
    list: Weak<dyn Detach>,
    disposed: Cell<bool>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Detach the handler.
    ///
    /// During a dispatch of the same list the handler keeps running for the
    /// rest of that pass. Disposing more than once does nothing.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(list) = self.list.upgrade() {
            list.detach(self.id);
        }
        tracing::trace!(id = ?self.id, "subscription disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Tie the subscription to a scope: it is disposed when the guard drops.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

/// RAII wrapper disposing its [`Subscription`] on drop
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl std::ops::Deref for SubscriptionGuard {
    type Target = Subscription;

    fn deref(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}
