//! Traits the host entity implements.
//!
//! The engine never reflects over its host. Everything it needs — the state
//! field, persistence, identity for history rows, and the lifecycle hooks —
//! is expressed as trait methods, with every hook defaulting to a no-op.

use crate::core::{Scalar, State, TransitionContext};
use crate::error::{BoxError, TransitionError};

/// A persistent entity carrying a state field.
///
/// `current_state` and `set_current_state` are the only access the engine
/// has to the stored state; `target_type` and `target_id` identify the
/// entity in history rows, and `save` is invoked only when the caller asks
/// for it.
pub trait Entity {
    /// The entity's state type.
    type State: State;

    /// Read the state field.
    fn current_state(&self) -> Self::State;

    /// Write the state field. Called exactly once per committed transition.
    fn set_current_state(&mut self, next: Self::State);

    /// Stable type tag stored in history rows, e.g. `"order"`.
    fn target_type() -> &'static str
    where
        Self: Sized;

    /// Stable identity once the entity has been persisted.
    ///
    /// `None` means the entity is unsaved and cannot be tied to a history
    /// row yet; the recorder skips it.
    fn target_id(&self) -> Option<String>;

    /// Persist the entity. Invoked only with `TransitionOptions::save`.
    fn save(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Lifecycle hooks dispatched around a transition.
///
/// Every method has a no-op default, so hosts implement only the hooks they
/// care about — an absent hook is simply the default implementation.
///
/// Dispatch order during a transition: `guard`, `before_transition`,
/// `on_exit`, `on_enter`, `on_transition`, `after_transition`. Only `guard`
/// and `before_transition` can veto; an `on_enter` failure aborts before the
/// state field is written; failures in later hooks propagate but leave the
/// committed transition in place.
pub trait Hooks: Entity {
    /// Predicate consulted before committing a transition into `_target`.
    ///
    /// Returning false vetoes the transition with no side effects.
    fn guard(&self, _target: &Self::State, _ctx: &TransitionContext) -> bool {
        true
    }

    /// Runs before any state-specific hook. Returning false blocks the
    /// transition.
    fn before_transition(
        &mut self,
        _from: &Self::State,
        _to: &Self::State,
        _ctx: &TransitionContext,
    ) -> bool {
        true
    }

    /// Runs when leaving `_leaving`, before the state field changes.
    fn on_exit(&mut self, _leaving: &Self::State, _ctx: &TransitionContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs against the staged target state. An error here aborts the
    /// transition before the state field is written.
    fn on_enter(
        &mut self,
        _entering: &Self::State,
        _ctx: &TransitionContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs for the specific `_from -> _to` edge after the state field has
    /// been written. Failures propagate but do not undo the transition.
    fn on_transition(
        &mut self,
        _from: &Self::State,
        _to: &Self::State,
        _ctx: &TransitionContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs last on every successful transition. Failures propagate but do
    /// not undo the transition.
    fn after_transition(
        &mut self,
        _from: &Self::State,
        _to: &Self::State,
        _ctx: &TransitionContext,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Host-side extension point for reacting to failed transitions.
    ///
    /// The engine itself never calls this; callers that want centralized
    /// failure handling invoke it from their own error path.
    fn on_transition_error(
        &mut self,
        _from: &Self::State,
        _to: &Self::State,
        _error: &TransitionError,
        _ctx: &TransitionContext,
    ) {
    }
}

/// Query collaborator for class-level lookups.
///
/// Backends filter their own result sets by the stored scalar form; the
/// machine converts typed states before delegating.
pub trait StateQuery {
    /// The row/entity type returned by lookups.
    type Item;

    /// All items whose state field equals `state`.
    fn find_where_state(&self, state: &Scalar) -> Vec<Self::Item>;

    /// Count of items whose state field equals `state`.
    fn count_where_state(&self, state: &Scalar) -> usize {
        self.find_where_state(state).len()
    }

    /// Count of items whose state field equals any of `states`.
    fn count_where_states(&self, states: &[Scalar]) -> usize {
        states.iter().map(|s| self.count_where_state(s)).sum()
    }
}
