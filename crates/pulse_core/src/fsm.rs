//! State Machine Runtime
//!
//! Trigger-driven state machines advanced by an external tick.
//! Supports:
//! - Flat state machines with enter/advance/exit lifecycles
//! - A (state, trigger) -> state transition table
//! - One pending trigger per machine, resolved on the next tick
//! - Transition listeners
//!
//! Hierarchical machines are built by nesting, see [`crate::hsm`].
//!
//! # Tick order
//!
//! `tick(dt)` first takes the pending trigger out of its slot, then
//! resolves it: `exit` on the old state, bookkeeping switch, `enter` on the
//! new state, transition listeners. Finally the current state advances by
//! `dt`. Because the slot is emptied before resolution, a trigger fired from
//! any of those callbacks becomes the pending trigger for the next tick.

use crate::subscription::{SubscriberList, Subscription};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::Cell;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::rc::Rc;

/// Requirements for state and trigger identifiers
pub trait Id: Copy + Eq + Hash + Debug + 'static {}

impl<X: Copy + Eq + Hash + Debug + 'static> Id for X {}

/// Lifecycle of a state registered with a [`StateMachine`]
pub trait State {
    /// Called once when the state becomes current
    fn enter(&mut self) {}

    /// Called once per tick while the state is current
    fn advance(&mut self, _dt: f32) {}

    /// Called once when the state stops being current
    fn exit(&mut self) {}
}

/// An action function executed on enter or exit
pub type Action = Box<dyn FnMut()>;

/// An action function executed on every advance
pub type AdvanceAction = Box<dyn FnMut(f32)>;

/// A [`State`] assembled from closures
#[derive(Default)]
pub struct CallbackState {
    enter: SmallVec<[Action; 1]>,
    advance: SmallVec<[AdvanceAction; 1]>,
    exit: SmallVec<[Action; 1]>,
}

impl CallbackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry action
    pub fn on_enter<F: FnMut() + 'static>(mut self, action: F) -> Self {
        self.enter.push(Box::new(action));
        self
    }

    /// Add a per-tick action
    pub fn on_advance<F: FnMut(f32) + 'static>(mut self, action: F) -> Self {
        self.advance.push(Box::new(action));
        self
    }

    /// Add an exit action
    pub fn on_exit<F: FnMut() + 'static>(mut self, action: F) -> Self {
        self.exit.push(Box::new(action));
        self
    }
}

impl State for CallbackState {
    fn enter(&mut self) {
        for action in self.enter.iter_mut() {
            action();
        }
    }

    fn advance(&mut self, dt: f32) {
        for action in self.advance.iter_mut() {
            action(dt);
        }
    }

    fn exit(&mut self) {
        for action in self.exit.iter_mut() {
            action();
        }
    }
}

/// A completed transition, as delivered to transition listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateChange<S> {
    pub from: S,
    pub to: S,
}

/// What a single [`StateMachine::tick`] did before advancing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step<S, T> {
    /// `start` has not been called; nothing advanced
    NotStarted,
    /// No trigger was pending
    Idle,
    /// The pending trigger moved the machine
    Transitioned(StateChange<S>),
    /// No transition is registered for the pending trigger
    Unresolved { state: S, trigger: T },
    /// The transition leads to a state that was never registered
    MissingDestination { state: S, trigger: T, destination: S },
}

impl<S: Copy, T> Step<S, T> {
    pub fn transition(&self) -> Option<StateChange<S>> {
        match self {
            Step::Transitioned(change) => Some(*change),
            _ => None,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Step::Transitioned(_))
    }
}

/// Result of firing a trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fired<T> {
    /// The trigger is pending; the slot was empty
    Pending,
    /// The trigger is pending and displaced the one held before
    Replaced(T),
    /// The machine has not started; the trigger was dropped
    Ignored,
}

struct TriggerSlot<T> {
    pending: Cell<Option<T>>,
    started: Cell<bool>,
}

/// Handle for firing triggers into a machine from inside callbacks
///
/// States and listeners capture a clone of the handle returned by
/// [`StateMachine::trigger_handle`]; the machine itself is mutably borrowed
/// while their callbacks run.
pub struct Trigger<T> {
    slot: Rc<TriggerSlot<T>>,
}

impl<T> Clone for Trigger<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Id> Trigger<T> {
    fn new() -> Self {
        Self {
            slot: Rc::new(TriggerSlot {
                pending: Cell::new(None),
                started: Cell::new(false),
            }),
        }
    }

    /// Make `trigger` the pending trigger for the next tick.
    ///
    /// A trigger already pending is overwritten, never queued.
    pub fn fire(&self, trigger: T) -> Fired<T> {
        if !self.slot.started.get() {
            tracing::warn!(?trigger, "trigger fired before start; ignored");
            return Fired::Ignored;
        }
        match self.slot.pending.replace(Some(trigger)) {
            Some(previous) => {
                tracing::warn!(?previous, ?trigger, "pending trigger overwritten");
                Fired::Replaced(previous)
            }
            None => Fired::Pending,
        }
    }

    pub fn pending(&self) -> Option<T> {
        self.slot.pending.get()
    }

    fn take(&self) -> Option<T> {
        self.slot.pending.take()
    }

    fn set_started(&self, started: bool) {
        self.slot.started.set(started);
        if !started {
            self.slot.pending.set(None);
        }
    }
}

impl<T: Debug + Copy> Debug for Trigger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("pending", &self.slot.pending.get())
            .field("started", &self.slot.started.get())
            .finish()
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S: Id, T: Id> {
    machine: StateMachine<S, T>,
}

impl<S: Id, T: Id> StateMachineBuilder<S, T> {
    /// Register a state
    pub fn state<St: State + 'static>(mut self, id: S, state: St) -> Self {
        self.machine.add_state(id, state);
        self
    }

    /// Add a transition (from, trigger, to)
    pub fn on(mut self, from: S, trigger: T, to: S) -> Self {
        self.machine.add_transition(from, trigger, to);
        self
    }

    /// Build the state machine (not yet started)
    pub fn build(self) -> StateMachine<S, T> {
        self.machine
    }
}

/// A trigger-driven state machine instance
pub struct StateMachine<S: Id, T: Id> {
    states: FxHashMap<S, Box<dyn State>>,
    transitions: FxHashMap<(S, T), S>,
    current: Option<S>,
    trigger: Trigger<T>,
    listeners: SubscriberList<dyn Fn(&StateChange<S>)>,
}

impl<S: Id, T: Id> StateMachine<S, T> {
    /// Create an empty, unstarted state machine
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty machine with room for `states` registrations
    pub fn with_capacity(states: usize) -> Self {
        Self {
            states: FxHashMap::with_capacity_and_hasher(states, Default::default()),
            transitions: FxHashMap::default(),
            current: None,
            trigger: Trigger::new(),
            listeners: SubscriberList::new(),
        }
    }

    /// Create a builder for a state machine
    pub fn builder() -> StateMachineBuilder<S, T> {
        StateMachineBuilder {
            machine: Self::new(),
        }
    }

    /// Register a state, returning the instance it replaced.
    ///
    /// Replacing the current state exits the old instance and enters the
    /// new one.
    pub fn add_state<St: State + 'static>(&mut self, id: S, state: St) -> Option<Box<dyn State>> {
        let mut replaced = self.states.insert(id, Box::new(state));
        let Some(previous) = replaced.as_mut() else {
            return None;
        };
        if self.current != Some(id) {
            tracing::warn!(state = ?id, "state registered twice; previous instance replaced");
            return replaced;
        }

        // The current state is swapped in place: the old instance leaves and
        // the new one enters, with no transition reported to listeners.
        tracing::warn!(state = ?id, "current state replaced; re-entering new instance");
        previous.exit();
        if let Some(state) = self.states.get_mut(&id) {
            state.enter();
        }
        replaced
    }

    /// Register a transition, returning the destination it replaced
    pub fn add_transition(&mut self, from: S, trigger: T, to: S) -> Option<S> {
        let replaced = self.transitions.insert((from, trigger), to);
        if let Some(previous) = replaced {
            tracing::warn!(
                state = ?from,
                ?trigger,
                ?previous,
                destination = ?to,
                "transition registered twice; destination overwritten"
            );
        }
        replaced
    }

    /// Enter `initial` and begin accepting triggers.
    ///
    /// Returns `false` without side effects if the machine already started
    /// or `initial` is not registered.
    pub fn start(&mut self, initial: S) -> bool {
        if let Some(current) = self.current {
            tracing::warn!(?current, requested = ?initial, "start called twice; ignored");
            return false;
        }
        let Some(state) = self.states.get_mut(&initial) else {
            tracing::warn!(state = ?initial, "cannot start in unregistered state");
            return false;
        };

        self.current = Some(initial);
        self.trigger.set_started(true);
        tracing::debug!(state = ?initial, "state machine started");
        state.enter();
        true
    }

    /// Return to the unstarted phase, keeping registered states and
    /// transitions. No lifecycle method is called.
    pub fn reset(&mut self) {
        self.current = None;
        self.trigger.set_started(false);
    }

    /// Set the pending trigger, see [`Trigger::fire`]
    pub fn fire(&self, trigger: T) -> Fired<T> {
        self.trigger.fire(trigger)
    }

    /// A handle for firing triggers from inside callbacks
    pub fn trigger_handle(&self) -> Trigger<T> {
        self.trigger.clone()
    }

    /// Resolve the pending trigger, then advance the current state by `dt`.
    pub fn tick(&mut self, dt: f32) -> Step<S, T> {
        let Some(current) = self.current else {
            tracing::warn!(dt, "tick called before start; ignored");
            return Step::NotStarted;
        };

        // The slot must be empty before resolution so triggers fired from
        // exit/enter/listeners land on the next tick.
        let step = match self.trigger.take() {
            Some(trigger) => self.resolve(current, trigger),
            None => Step::Idle,
        };

        if let Some(state) = self.current.and_then(|id| self.states.get_mut(&id)) {
            state.advance(dt);
        }
        step
    }

    fn resolve(&mut self, from: S, trigger: T) -> Step<S, T> {
        let Some(&to) = self.transitions.get(&(from, trigger)) else {
            tracing::warn!(state = ?from, ?trigger, "no transition for trigger; ignored");
            return Step::Unresolved {
                state: from,
                trigger,
            };
        };
        if !self.states.contains_key(&to) {
            tracing::warn!(
                state = ?from,
                ?trigger,
                destination = ?to,
                "transition leads to unregistered state; ignored"
            );
            return Step::MissingDestination {
                state: from,
                trigger,
                destination: to,
            };
        }

        if let Some(state) = self.states.get_mut(&from) {
            state.exit();
        }
        self.current = Some(to);
        if let Some(state) = self.states.get_mut(&to) {
            state.enter();
        }

        let change = StateChange { from, to };
        tracing::debug!(from = ?from, to = ?to, ?trigger, "state transition");
        self.listeners.dispatch(|listener| listener(&change));
        Step::Transitioned(change)
    }

    /// Register a listener called after every completed transition
    pub fn on_transition<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StateChange<S>) + 'static,
    {
        let listener: Rc<dyn Fn(&StateChange<S>)> = Rc::new(listener);
        self.listeners.subscribe(listener)
    }

    /// Get the current state, `None` before `start`
    pub fn current_state(&self) -> Option<S> {
        self.current
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current == Some(state)
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    pub fn pending_trigger(&self) -> Option<T> {
        self.trigger.pending()
    }

    /// Check if a trigger has a transition from the current state
    pub fn can_fire(&self, trigger: T) -> bool {
        self.current
            .is_some_and(|current| self.transitions.contains_key(&(current, trigger)))
    }

    /// Look up the destination registered for (from, trigger)
    pub fn destination(&self, from: S, trigger: T) -> Option<S> {
        self.transitions.get(&(from, trigger)).copied()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<S: Id, T: Id> Default for StateMachine<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Id, T: Id> Debug for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("pending", &self.trigger.pending())
            .field("states", &self.states.len())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    // State constants for tests
    const IDLE: u32 = 0;
    const HOVERED: u32 = 1;
    const PRESSED: u32 = 2;

    // Trigger constants for tests
    const POINTER_ENTER: u8 = 1;
    const POINTER_LEAVE: u8 = 2;
    const POINTER_DOWN: u8 = 3;
    const POINTER_UP: u8 = 4;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logged(log: &Log, name: &'static str) -> CallbackState {
        let (on_enter, on_exit) = (Rc::clone(log), Rc::clone(log));
        CallbackState::new()
            .on_enter(move || on_enter.borrow_mut().push(format!("enter {name}")))
            .on_exit(move || on_exit.borrow_mut().push(format!("exit {name}")))
    }

    fn button(log: &Log) -> StateMachine<u32, u8> {
        StateMachine::builder()
            .state(IDLE, logged(log, "idle"))
            .state(HOVERED, logged(log, "hovered"))
            .state(PRESSED, logged(log, "pressed"))
            .on(IDLE, POINTER_ENTER, HOVERED)
            .on(HOVERED, POINTER_LEAVE, IDLE)
            .on(HOVERED, POINTER_DOWN, PRESSED)
            .on(PRESSED, POINTER_UP, HOVERED)
            .build()
    }

    #[test]
    fn test_simple_transitions() {
        let log = Log::default();
        let mut fsm = button(&log);

        assert_eq!(fsm.current_state(), None);
        assert!(fsm.start(IDLE));
        assert_eq!(fsm.current_state(), Some(IDLE));

        fsm.fire(POINTER_ENTER);
        assert_eq!(fsm.current_state(), Some(IDLE));
        fsm.tick(0.016);
        assert_eq!(fsm.current_state(), Some(HOVERED));

        fsm.fire(POINTER_DOWN);
        fsm.tick(0.016);
        assert!(fsm.is_in(PRESSED));

        fsm.fire(POINTER_UP);
        fsm.tick(0.016);
        fsm.fire(POINTER_LEAVE);
        fsm.tick(0.016);
        assert!(fsm.is_in(IDLE));
    }

    #[test]
    fn test_exit_before_enter() {
        let log = Log::default();
        let mut fsm = button(&log);
        fsm.start(IDLE);
        log.borrow_mut().clear();

        fsm.fire(POINTER_ENTER);
        let step = fsm.tick(0.0);

        assert_eq!(
            step,
            Step::Transitioned(StateChange {
                from: IDLE,
                to: HOVERED
            })
        );
        assert_eq!(*log.borrow(), vec!["exit idle", "enter hovered"]);
    }

    #[test]
    fn test_self_transition_exits_and_enters() {
        let log = Log::default();
        let mut fsm: StateMachine<u32, u8> = StateMachine::builder()
            .state(IDLE, logged(&log, "idle"))
            .on(IDLE, POINTER_DOWN, IDLE)
            .build();
        fsm.start(IDLE);

        fsm.fire(POINTER_DOWN);
        assert!(fsm.tick(0.0).is_transition());
        assert_eq!(*log.borrow(), vec!["enter idle", "exit idle", "enter idle"]);
    }

    #[test]
    fn test_invalid_trigger_no_transition() {
        let log = Log::default();
        let mut fsm = button(&log);
        fsm.start(IDLE);

        // POINTER_DOWN is not valid in IDLE state
        fsm.fire(POINTER_DOWN);
        let step = fsm.tick(0.0);
        assert_eq!(
            step,
            Step::Unresolved {
                state: IDLE,
                trigger: POINTER_DOWN
            }
        );
        assert!(fsm.is_in(IDLE));
    }

    #[test]
    fn test_missing_destination_stays_put() {
        let mut fsm: StateMachine<u32, u8> = StateMachine::new();
        fsm.add_state(IDLE, CallbackState::new());
        fsm.add_transition(IDLE, POINTER_ENTER, HOVERED);
        fsm.start(IDLE);

        fsm.fire(POINTER_ENTER);
        assert_eq!(
            fsm.tick(0.0),
            Step::MissingDestination {
                state: IDLE,
                trigger: POINTER_ENTER,
                destination: HOVERED
            }
        );
        assert!(fsm.is_in(IDLE));
        assert_eq!(fsm.pending_trigger(), None);
    }

    #[test]
    fn test_fire_overwrites_pending() {
        let log = Log::default();
        let mut fsm = button(&log);
        fsm.start(IDLE);

        assert_eq!(fsm.fire(POINTER_ENTER), Fired::Pending);
        assert_eq!(fsm.fire(POINTER_DOWN), Fired::Replaced(POINTER_ENTER));
        assert_eq!(fsm.pending_trigger(), Some(POINTER_DOWN));

        fsm.tick(0.0);
        assert!(fsm.is_in(IDLE));
        assert_eq!(fsm.pending_trigger(), None);
    }

    #[test]
    fn test_lifecycle_calls_before_start() {
        let log = Log::default();
        let mut fsm = button(&log);

        assert_eq!(fsm.fire(POINTER_ENTER), Fired::Ignored);
        assert_eq!(fsm.tick(0.1), Step::NotStarted);
        assert!(log.borrow().is_empty());
        assert!(!fsm.start(7));
        assert!(!fsm.is_started());
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let log = Log::default();
        let mut fsm = button(&log);

        assert!(fsm.start(IDLE));
        assert!(!fsm.start(HOVERED));
        assert!(fsm.is_in(IDLE));
        assert_eq!(*log.borrow(), vec!["enter idle"]);
    }

    #[test]
    fn test_duplicate_registration_overwrites() {
        let mut fsm: StateMachine<u32, u8> = StateMachine::new();
        assert!(fsm.add_state(IDLE, CallbackState::new()).is_none());
        assert!(fsm.add_state(IDLE, CallbackState::new()).is_some());
        assert_eq!(fsm.state_count(), 1);

        assert_eq!(fsm.add_transition(IDLE, POINTER_ENTER, HOVERED), None);
        assert_eq!(fsm.add_transition(IDLE, POINTER_ENTER, PRESSED), Some(HOVERED));
        assert_eq!(fsm.destination(IDLE, POINTER_ENTER), Some(PRESSED));
        assert_eq!(fsm.transition_count(), 1);
    }

    #[test]
    fn test_advance_runs_every_tick() {
        let elapsed = Rc::new(Cell::new(0.0f32));
        let total = Rc::clone(&elapsed);
        let mut fsm: StateMachine<u32, u8> = StateMachine::builder()
            .state(
                IDLE,
                CallbackState::new().on_advance(move |dt| total.set(total.get() + dt)),
            )
            .build();
        fsm.start(IDLE);

        for _ in 0..4 {
            assert_eq!(fsm.tick(0.25), Step::Idle);
        }
        assert_eq!(elapsed.get(), 1.0);
    }

    #[test]
    fn test_trigger_fired_on_enter_waits_a_tick() {
        let mut fsm: StateMachine<u32, u8> = StateMachine::new();
        let trigger = fsm.trigger_handle();
        fsm.add_state(IDLE, CallbackState::new());
        fsm.add_state(
            HOVERED,
            CallbackState::new().on_enter(move || {
                trigger.fire(POINTER_DOWN);
            }),
        );
        fsm.add_state(PRESSED, CallbackState::new());
        fsm.add_transition(IDLE, POINTER_ENTER, HOVERED);
        fsm.add_transition(HOVERED, POINTER_DOWN, PRESSED);
        fsm.start(IDLE);

        fsm.fire(POINTER_ENTER);
        fsm.tick(0.0);
        assert!(fsm.is_in(HOVERED));
        assert_eq!(fsm.pending_trigger(), Some(POINTER_DOWN));

        fsm.tick(0.0);
        assert!(fsm.is_in(PRESSED));
    }

    #[test]
    fn test_replacing_current_state_reenters() {
        let log = Log::default();
        let mut fsm = button(&log);
        fsm.start(IDLE);

        assert!(fsm.add_state(IDLE, logged(&log, "idle again")).is_some());
        assert!(fsm.add_state(PRESSED, logged(&log, "pressed again")).is_some());
        assert!(fsm.is_in(IDLE));
        assert_eq!(
            *log.borrow(),
            vec!["enter idle", "exit idle", "enter idle again"]
        );

        fsm.fire(POINTER_ENTER);
        fsm.tick(0.0);
        assert_eq!(log.borrow().last().map(String::as_str), Some("enter hovered"));
        assert_eq!(log.borrow()[3], "exit idle again");
    }

    #[test]
    fn test_trigger_fired_on_advance_waits_a_tick() {
        let mut fsm: StateMachine<u32, u8> = StateMachine::new();
        let trigger = fsm.trigger_handle();
        fsm.add_state(
            IDLE,
            CallbackState::new().on_advance(move |_| {
                trigger.fire(POINTER_ENTER);
            }),
        );
        fsm.add_state(HOVERED, CallbackState::new());
        fsm.add_transition(IDLE, POINTER_ENTER, HOVERED);
        fsm.start(IDLE);

        assert_eq!(fsm.tick(0.0), Step::Idle);
        assert!(fsm.is_in(IDLE));
        assert_eq!(fsm.pending_trigger(), Some(POINTER_ENTER));

        assert!(fsm.tick(0.0).is_transition());
        assert!(fsm.is_in(HOVERED));
        assert_eq!(fsm.pending_trigger(), None);
    }

    #[test]
    fn test_trigger_fired_on_exit_waits_a_tick() {
        let mut fsm: StateMachine<u32, u8> = StateMachine::new();
        let trigger = fsm.trigger_handle();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let outcomes = Rc::clone(&fired);
        fsm.add_state(IDLE, CallbackState::new());
        fsm.add_state(
            HOVERED,
            CallbackState::new().on_exit(move || {
                outcomes.borrow_mut().push(trigger.fire(POINTER_ENTER));
            }),
        );
        fsm.add_transition(IDLE, POINTER_ENTER, HOVERED);
        fsm.add_transition(HOVERED, POINTER_LEAVE, IDLE);
        fsm.start(IDLE);

        fsm.fire(POINTER_ENTER);
        fsm.tick(0.0);
        fsm.fire(POINTER_LEAVE);
        fsm.tick(0.0);
        assert!(fsm.is_in(IDLE));
        assert_eq!(fsm.pending_trigger(), Some(POINTER_ENTER));
        // The slot was emptied before resolution, so nothing was displaced
        assert_eq!(*fired.borrow(), vec![Fired::Pending]);

        fsm.tick(0.0);
        assert!(fsm.is_in(HOVERED));
    }

    #[test]
    fn test_trigger_fired_from_listener_waits_a_tick() {
        let log = Log::default();
        let mut fsm = button(&log);
        let trigger = fsm.trigger_handle();
        let _press = fsm.on_transition(move |change| {
            if change.to == HOVERED {
                trigger.fire(POINTER_DOWN);
            }
        });
        fsm.start(IDLE);

        fsm.fire(POINTER_ENTER);
        fsm.tick(0.0);
        assert!(fsm.is_in(HOVERED));
        assert_eq!(fsm.pending_trigger(), Some(POINTER_DOWN));

        fsm.tick(0.0);
        assert!(fsm.is_in(PRESSED));
        assert_eq!(fsm.pending_trigger(), None);
    }

    #[test]
    fn test_transition_listener() {
        let log = Log::default();
        let mut fsm = button(&log);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&changes);
        let sub = fsm.on_transition(move |change| seen.borrow_mut().push(*change));
        fsm.start(IDLE);

        fsm.fire(POINTER_ENTER);
        fsm.tick(0.0);
        assert_eq!(
            *changes.borrow(),
            vec![StateChange {
                from: IDLE,
                to: HOVERED
            }]
        );

        sub.dispose();
        fsm.fire(POINTER_LEAVE);
        fsm.tick(0.0);
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(fsm.listener_count(), 0);
    }

    #[test]
    fn test_can_fire() {
        let log = Log::default();
        let mut fsm = button(&log);
        assert!(!fsm.can_fire(POINTER_ENTER));

        fsm.start(IDLE);
        assert!(fsm.can_fire(POINTER_ENTER));
        assert!(!fsm.can_fire(POINTER_DOWN));
    }

    #[test]
    fn test_reset_returns_to_unstarted() {
        let log = Log::default();
        let mut fsm = button(&log);
        fsm.start(IDLE);
        fsm.fire(POINTER_ENTER);

        fsm.reset();
        assert!(!fsm.is_started());
        assert_eq!(fsm.pending_trigger(), None);
        assert!(fsm.start(HOVERED));
        assert_eq!(*log.borrow(), vec!["enter idle", "enter hovered"]);
    }
}
