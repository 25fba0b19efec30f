//! Core State trait for entity states.
//!
//! A state is a typed value with a total, infallible mapping to the scalar
//! form its entity actually persists. Declaring the mapping on a trait keeps
//! normalization in one place instead of scattering raw-value parsing across
//! the engine.

use super::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for entity states.
///
/// All methods are pure. States are immutable values describing the current
/// position in an entity's transition graph, with a two-way mapping to the
/// [`Scalar`] form stored in the entity's state field.
///
/// Most implementations come from the [`states!`](crate::states) macro; write
/// the trait by hand only when the stored values need custom logic.
///
/// # Required Traits
///
/// - `Clone`: states are cloned into history records and error values
/// - `PartialEq`: transition logic compares states
/// - `Debug`: diagnostics
/// - `Serialize` + `Deserialize`: states ride along in persisted entities
///
/// # Example
///
/// ```rust
/// use stateline::core::{Scalar, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum TicketState {
///     Open,
///     InProgress,
///     Closed,
/// }
///
/// impl State for TicketState {
///     fn to_scalar(&self) -> Scalar {
///         match self {
///             Self::Open => Scalar::from("open"),
///             Self::InProgress => Scalar::from("in_progress"),
///             Self::Closed => Scalar::from("closed"),
///         }
///     }
///
///     fn from_scalar(raw: &Scalar) -> Option<Self> {
///         Self::all().into_iter().find(|s| &s.to_scalar() == raw)
///     }
///
///     fn all() -> Vec<Self> {
///         vec![Self::Open, Self::InProgress, Self::Closed]
///     }
/// }
///
/// assert_eq!(TicketState::from_scalar(&Scalar::from("closed")), Some(TicketState::Closed));
/// assert_eq!(TicketState::from_scalar(&Scalar::from("lost")), None);
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Convert to the stored scalar form.
    fn to_scalar(&self) -> Scalar;

    /// Normalize a stored scalar back into a typed state.
    ///
    /// Returns `None` when the raw value does not belong to the
    /// enumeration. Pass-through implementations (see [`RawState`]) never
    /// return `None`.
    fn from_scalar(raw: &Scalar) -> Option<Self>
    where
        Self: Sized;

    /// The declared enumeration of legal states.
    ///
    /// An empty vector means no closed enumeration is declared; graph
    /// introspection then derives the state set structurally.
    fn all() -> Vec<Self>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Lower-case token used to render guard and hook names in errors.
    fn token(&self) -> String {
        self.to_scalar().to_string()
    }
}

/// Pass-through state for entities without a declared enumeration.
///
/// Wraps the stored scalar directly: normalization is the identity and every
/// value is legal. Pair it with a non-strict
/// [`StateConfig`](crate::config::StateConfig) when the transition graph is
/// open-ended.
///
/// # Example
///
/// ```rust
/// use stateline::core::{RawState, Scalar, State};
///
/// let state = RawState(Scalar::from("anything"));
/// assert_eq!(RawState::from_scalar(&state.to_scalar()), Some(state));
/// assert!(RawState::all().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawState(pub Scalar);

impl State for RawState {
    fn to_scalar(&self) -> Scalar {
        self.0.clone()
    }

    fn from_scalar(raw: &Scalar) -> Option<Self> {
        Some(Self(raw.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::states! {
        enum TestState {
            Pending = "pending",
            Active = "active",
            Done = "done",
        }
    }

    #[test]
    fn to_scalar_yields_stored_token() {
        assert_eq!(TestState::Pending.to_scalar(), Scalar::from("pending"));
        assert_eq!(TestState::Done.to_scalar(), Scalar::from("done"));
    }

    #[test]
    fn from_scalar_normalizes_members() {
        assert_eq!(
            TestState::from_scalar(&Scalar::from("active")),
            Some(TestState::Active)
        );
        assert_eq!(TestState::from_scalar(&Scalar::from("missing")), None);
    }

    #[test]
    fn all_lists_declared_enumeration() {
        assert_eq!(
            TestState::all(),
            vec![TestState::Pending, TestState::Active, TestState::Done]
        );
    }

    #[test]
    fn token_is_the_stored_text() {
        assert_eq!(TestState::Active.token(), "active");
    }

    #[test]
    fn raw_state_is_pass_through() {
        let raw = Scalar::from("whatever");
        let state = RawState::from_scalar(&raw).unwrap();
        assert_eq!(state.to_scalar(), raw);
        assert!(RawState::all().is_empty());
    }

    #[test]
    fn state_roundtrips_through_serde() {
        let json = serde_json::to_string(&TestState::Pending).unwrap();
        let back: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestState::Pending);
    }
}
