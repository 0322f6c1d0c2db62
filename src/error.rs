//! Error types used by the hub and by subscriber handlers.
//!
//! This module defines two enums:
//!
//! - [`HubError`]: returned synchronously to whoever called a hub operation.
//! - [`HandlerError`]: raised by a subscriber while handling one event; it is logged by the
//!   dispatcher and never propagated to the publisher.
//!
//! Both provide `as_label` for logs/metrics.

use thiserror::Error;

/// # Errors returned by hub operations.
///
/// Unknown acknowledgements are **not** errors; `acknowledge` is idempotent.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Argument rejected at the call site (empty interest mask, non-positive interval, ...).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// The hub loop has stopped; the command was not accepted.
    #[error("hub loop is closed")]
    Closed,
}

impl HubError {
    /// Shorthand for [`HubError::InvalidArgument`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        HubError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::HubError;
    ///
    /// assert_eq!(HubError::Closed.as_label(), "hub_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HubError::InvalidArgument { .. } => "hub_invalid_argument",
            HubError::Closed => "hub_closed",
        }
    }
}

/// # Errors raised while a subscriber handles an event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {reason}")]
    Failed {
        /// The underlying error message.
        reason: String,
    },

    /// Handler panicked; the panic was caught at the dispatcher boundary.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic message, if it was a string.
        info: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    ///
    /// # Example
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// let err = HandlerError::failed("template missing");
    /// assert_eq!(err.to_string(), "handler failed: template missing");
    /// ```
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(HubError::invalid("x").as_label(), "hub_invalid_argument");
        assert_eq!(HandlerError::failed("x").as_label(), "handler_failed");
        assert_eq!(
            HandlerError::Panicked { info: "boom".into() }.as_label(),
            "handler_panicked"
        );
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = HubError::invalid("interest mask must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid argument: interest mask must be non-zero"
        );
    }
}
