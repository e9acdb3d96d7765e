//! Error types used by the monitoring engine and its collaborators.
//!
//! This module defines the error enums that can leave the crate:
//!
//! - [`EngineError`]: configuration and lifecycle errors of the engine itself.
//! - [`TransportError`]: failures of a single status request below HTTP.
//! - [`NotifyError`]: failures while rendering or delivering a recovery notice.
//! - [`Cancelled`]: a cancellable operation observed its token.
//!
//! Remote-call failures never surface as `Err` from the engine: they are
//! classified into [`CheckOutcome`](crate::CheckOutcome) variants and folded
//! into the retry/poll cycle. All enums provide `as_label` for logs.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the monitoring engine.
///
/// `EmptyPool` and `InvalidConfig` are startup errors; `GraceExceeded` is
/// reported by shutdown when some tasks did not exit in time; `Signal` when
/// signal handlers could not be registered.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// The credential pool has no tokens to hand out or rotate through.
    #[error("credential pool is empty")]
    EmptyPool,

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Shutdown grace period was exceeded; stuck tasks were aborted.
    #[error("monitors still running after {grace:?} grace, aborted: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Entities whose tasks did not stop in time.
        stuck: Vec<String>,
    },

    /// OS signal listeners could not be installed.
    #[error("failed to listen for shutdown signals: {error}")]
    Signal {
        /// The underlying I/O error message.
        error: String,
    },
}

impl EngineError {
    /// Snake_case label used in log fields.
    ///
    /// # Example
    /// ```
    /// use recoverwatch::EngineError;
    ///
    /// assert_eq!(EngineError::EmptyPool.as_label(), "engine_empty_pool");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::EmptyPool => "engine_empty_pool",
            EngineError::InvalidConfig { .. } => "engine_invalid_config",
            EngineError::GraceExceeded { .. } => "engine_grace_exceeded",
            EngineError::Signal { .. } => "engine_signal",
        }
    }
}

/// # Transport-level failures of one status request.
///
/// Anything that prevented an HTTP status from being observed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the injected timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established (DNS, refused, reset, proxy).
    #[error("connection failed: {error}")]
    Connect {
        /// The underlying error message.
        error: String,
    },

    /// Any other transport failure (body read, TLS, malformed request).
    #[error("transport failed: {error}")]
    Other {
        /// The underlying error message.
        error: String,
    },
}

impl TransportError {
    /// Snake_case label used in log fields.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Timeout => "transport_timeout",
            TransportError::Connect { .. } => "transport_connect",
            TransportError::Other { .. } => "transport_other",
        }
    }
}

/// # Failures while producing or delivering a recovery notification.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Attachment rendering failed or produced nothing.
    #[error("attachment rendering failed: {error}")]
    Render {
        /// The underlying error message.
        error: String,
    },

    /// The message could not be delivered to its destination.
    #[error("delivery failed: {error}")]
    Delivery {
        /// The underlying error message.
        error: String,
    },
}

impl NotifyError {
    /// Snake_case label used in log fields.
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyError::Render { .. } => "notify_render",
            NotifyError::Delivery { .. } => "notify_delivery",
        }
    }
}

/// A cancellable operation was aborted because its token fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = EngineError::GraceExceeded {
            grace: Duration::from_secs(5),
            stuck: vec!["foo".into()],
        };
        assert_eq!(err.as_label(), "engine_grace_exceeded");
        assert!(err.to_string().contains("foo"));

        assert_eq!(TransportError::Timeout.as_label(), "transport_timeout");
        let connect = TransportError::Connect {
            error: "refused".into(),
        };
        assert_eq!(connect.to_string(), "connection failed: refused");

        let render = NotifyError::Render {
            error: "empty".into(),
        };
        assert_eq!(render.as_label(), "notify_render");
    }

    #[test]
    fn panic_payloads_are_readable() {
        let caught = std::panic::catch_unwind(|| -> u8 { panic!("boom {}", 7) }).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "boom 7");
        let caught = std::panic::catch_unwind(|| -> u8 { panic!("static") }).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "static");
    }
}
