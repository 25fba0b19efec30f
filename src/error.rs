//! Error taxonomy for the transition engine.
//!
//! Every failure carries structured, machine-readable fields so callers can
//! render messages from the states and names involved instead of parsing
//! free text.

use crate::core::Scalar;
use thiserror::Error;

/// Boxed error type used by hooks and persistence collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn join(scalars: &[Scalar]) -> String {
    scalars
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by [`Machine::transition_to`](crate::machine::Machine::transition_to)
/// and scalar normalization.
///
/// The first five variants are the transition protocol proper; `Persistence`
/// covers a failing `save()` requested by the caller after the transition
/// has already committed.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The requested target is not a member of the declared enumeration.
    #[error("'{value}' is not a valid state (expected one of: {})", join(.legal))]
    InvalidState {
        /// The offending raw value
        value: Scalar,
        /// The legal state set
        legal: Vec<Scalar>,
    },

    /// The target is not reachable from the current state in the graph.
    #[error("cannot transition from '{from}' to '{to}' (allowed: {})", join(.allowed))]
    InvalidTransition {
        from: Scalar,
        to: Scalar,
        /// Adjacency list of the current state
        allowed: Vec<Scalar>,
    },

    /// The guard predicate for the target state returned false.
    #[error("guard '{guard}' rejected transition from '{from}' to '{to}'")]
    Guard {
        from: Scalar,
        to: Scalar,
        /// Rendered guard name, e.g. `guard_can_paid`
        guard: String,
    },

    /// `before_transition` vetoed the transition.
    #[error("transition from '{from}' to '{to}' was blocked")]
    Blocked {
        from: Scalar,
        to: Scalar,
        reason: Option<String>,
    },

    /// A lifecycle hook failed.
    ///
    /// When the failing hook is the entry hook the state field was never
    /// written; when it is a post-commit hook the transition stands.
    #[error("hook '{hook}' failed during transition from '{from}' to '{to}'")]
    Callback {
        from: Scalar,
        to: Scalar,
        /// Rendered hook name, e.g. `on_enter_shipped`
        hook: String,
        #[source]
        source: BoxError,
    },

    /// `save()` failed after the transition committed.
    #[error("failed to persist entity after transition")]
    Persistence(#[source] BoxError),
}

/// Errors from a history storage backend.
///
/// These never escape the recorder's fire-and-forget path during a
/// transition; they surface only from explicit history queries.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage failed")]
    Storage(#[source] BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_renders_allowed_set() {
        let err = TransitionError::InvalidTransition {
            from: Scalar::from("pending"),
            to: Scalar::from("shipped"),
            allowed: vec![Scalar::from("paid"), Scalar::from("cancelled")],
        };

        let msg = err.to_string();
        assert!(msg.contains("pending"));
        assert!(msg.contains("shipped"));
        assert!(msg.contains("paid, cancelled"));
    }

    #[test]
    fn callback_preserves_the_original_error() {
        let source: BoxError = "disk on fire".into();
        let err = TransitionError::Callback {
            from: Scalar::from("a"),
            to: Scalar::from("b"),
            hook: "on_enter_b".to_string(),
            source,
        };

        let rendered = std::error::Error::source(&err).unwrap().to_string();
        assert_eq!(rendered, "disk on fire");
    }

    #[test]
    fn invalid_state_carries_legal_set() {
        let err = TransitionError::InvalidState {
            value: Scalar::from("limbo"),
            legal: vec![Scalar::from("draft"), Scalar::from("final")],
        };

        match err {
            TransitionError::InvalidState { value, legal } => {
                assert_eq!(value, Scalar::from("limbo"));
                assert_eq!(legal.len(), 2);
            }
            _ => panic!("wrong variant"),
        }
    }
}
