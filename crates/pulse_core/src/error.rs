//! Core error types

use thiserror::Error;

/// Error returned by a fallible subscriber
pub type HandlerError = Box<dyn std::error::Error + 'static>;

/// Errors surfaced to callers of the reactive core
///
/// Lifecycle anomalies (unknown triggers, duplicate registrations, calls
/// before `start`) are not errors; they are logged and reported through
/// return values instead.
#[derive(Error, Debug)]
pub enum PulseError {
    /// A subscriber failed while an event was being published
    #[error("subscriber for `{payload}` failed: {source}")]
    Handler {
        /// Type name of the payload being published
        payload: &'static str,
        #[source]
        source: HandlerError,
    },
}

impl PulseError {
    pub(crate) fn handler<P: ?Sized>(source: HandlerError) -> Self {
        PulseError::Handler {
            payload: std::any::type_name::<P>(),
            source,
        }
    }
}

/// Result type for reactive core operations
pub type Result<T> = std::result::Result<T, PulseError>;
