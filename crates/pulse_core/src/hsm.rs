//! Hierarchical states
//!
//! A [`HierarchicalState`] is a [`State`] that owns a nested
//! [`StateMachine`]. The parent machine drives it like any other state:
//!
//! - `enter` restarts the nested machine at its initial state, so nested
//!   progress never survives an exit/enter cycle of the owning state.
//! - `advance` ticks the nested machine.
//! - `exit` only runs the caller's cleanup hook; the nested current state
//!   is not exited.
//!
//! Nested triggers never reach the parent on their own. To report upward,
//! wire an explicit callback, typically a nested transition listener that
//! fires a parent [`Trigger`](crate::fsm::Trigger).

use crate::fsm::{Id, State, StateMachine};
use smallvec::SmallVec;

/// Hook run against the nested machine on enter or exit
pub type NestedHook<S, T> = Box<dyn FnMut(&mut StateMachine<S, T>)>;

/// A state that drives its own nested state machine
pub struct HierarchicalState<S: Id, T: Id> {
    machine: StateMachine<S, T>,
    initial: S,
    enter_hooks: SmallVec<[NestedHook<S, T>; 1]>,
    exit_hooks: SmallVec<[NestedHook<S, T>; 1]>,
}

impl<S: Id, T: Id> HierarchicalState<S, T> {
    /// Wrap `machine`, which will be (re)started at `initial` on every enter
    pub fn new(machine: StateMachine<S, T>, initial: S) -> Self {
        Self {
            machine,
            initial,
            enter_hooks: SmallVec::new(),
            exit_hooks: SmallVec::new(),
        }
    }

    /// Run `hook` after the nested machine has been restarted
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut StateMachine<S, T>) + 'static,
    {
        self.enter_hooks.push(Box::new(hook));
        self
    }

    /// Run `hook` when the owning state is exited
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut StateMachine<S, T>) + 'static,
    {
        self.exit_hooks.push(Box::new(hook));
        self
    }

    pub fn initial(&self) -> S {
        self.initial
    }

    pub fn nested(&self) -> &StateMachine<S, T> {
        &self.machine
    }

    pub fn nested_mut(&mut self) -> &mut StateMachine<S, T> {
        &mut self.machine
    }
}

impl<S: Id, T: Id> State for HierarchicalState<S, T> {
    fn enter(&mut self) {
        self.machine.reset();
        if !self.machine.start(self.initial) {
            tracing::warn!(initial = ?self.initial, "nested state machine failed to start");
        }
        for hook in self.enter_hooks.iter_mut() {
            hook(&mut self.machine);
        }
    }

    fn advance(&mut self, dt: f32) {
        let step = self.machine.tick(dt);
        tracing::trace!(?step, "nested state machine ticked");
    }

    fn exit(&mut self) {
        for hook in self.exit_hooks.iter_mut() {
            hook(&mut self.machine);
        }
    }
}
