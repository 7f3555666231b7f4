//! Pulse Core Runtime
//!
//! This crate provides the state and notification primitives the rest of a
//! component framework is built on:
//!
//! - **State Machines**: trigger-driven machines advanced by an external tick,
//!   flat or nested
//! - **Event Bus**: typed synchronous publish/subscribe
//! - **Observables**: values that notify subscribers on change
//!
//! Everything is single-threaded and callback-driven. Callbacks may call back
//! into the instance that invoked them: list mutations during a dispatch are
//! deferred until the dispatch ends, re-entrant observable sets are queued
//! into sequential passes, and triggers fired during a tick wait for the next
//! tick.
//!
//! Anomalies such as unknown triggers or duplicate registrations are never
//! fatal; they are reported through `tracing` and through return values.
//!
//! # Example
//!
//! ```rust
//! use pulse_core::{CallbackState, EventBus, Observable, StateMachine};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Door { Closed, Open }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Push { Toggle }
//!
//! struct DoorMoved(Door);
//!
//! let bus = EventBus::new();
//! let status = Observable::new(Door::Closed);
//!
//! let mut door = StateMachine::builder()
//!     .state(Door::Closed, CallbackState::new())
//!     .state(Door::Open, CallbackState::new())
//!     .on(Door::Closed, Push::Toggle, Door::Open)
//!     .on(Door::Open, Push::Toggle, Door::Closed)
//!     .build();
//!
//! // Republish transitions for other subsystems
//! let (relay, writer) = (bus.clone(), status.clone());
//! door.on_transition(move |change| {
//!     writer.set(change.to);
//!     relay.publish(DoorMoved(change.to)).unwrap();
//! });
//!
//! door.start(Door::Closed);
//! door.fire(Push::Toggle);
//! door.tick(1.0 / 60.0);
//!
//! assert_eq!(door.current_state(), Some(Door::Open));
//! assert_eq!(status.read_only().get(), Door::Open);
//! ```

pub mod error;
pub mod events;
pub mod fsm;
pub mod hsm;
pub mod observable;
pub mod subscription;

pub use error::{HandlerError, PulseError, Result};
pub use events::EventBus;
pub use fsm::{
    CallbackState, Fired, Id, State, StateChange, StateMachine, StateMachineBuilder, Step, Trigger,
};
pub use hsm::HierarchicalState;
pub use observable::{Observable, ReadOnly};
pub use subscription::{SubscriberId, Subscription, SubscriptionGuard};
