//! The transition engine.
//!
//! A [`Machine`] validates and executes transitions for one entity type: it
//! owns the shared [`StateConfig`], dispatches the host's [`Hooks`] in a
//! fixed order around each transition, and optionally records committed
//! transitions into a [`HistoryRecorder`].
//!
//! The engine is synchronous and performs no locking; serializing concurrent
//! transitions against the same logical entity is the caller's
//! responsibility.

mod entity;

pub use entity::{Entity, Hooks, StateQuery};

use crate::config::StateConfig;
use crate::core::{Scalar, State, TransitionContext};
use crate::error::TransitionError;
use crate::history::{HistoryRecorder, HistoryStore, InMemoryHistory};
use std::sync::Arc;
use tracing::debug;

/// Per-call options for `transition_to`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    /// Skip the graph-membership check (and only that check).
    pub force: bool,
    /// Invoke the entity's `save()` after a committed transition.
    pub save: bool,
}

impl TransitionOptions {
    /// Default options: graph enforced, no save.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the graph-membership check. Guards and hooks still run.
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Persist the entity after the transition commits.
    pub fn and_save(mut self) -> Self {
        self.save = true;
        self
    }
}

/// Transition engine for one entity type.
///
/// Holds the immutable per-type configuration (shared via `Arc`, constructed
/// once at entity-type registration) and an optional history recorder.
///
/// # Example
///
/// ```rust
/// use stateline::config::StateConfig;
/// use stateline::core::TransitionContext;
/// use stateline::machine::{Entity, Hooks, Machine, TransitionOptions};
/// use stateline::states;
/// use std::sync::Arc;
///
/// states! {
///     enum LightState {
///         Red = "red",
///         Green = "green",
///         Yellow = "yellow",
///     }
/// }
///
/// struct Light {
///     state: LightState,
/// }
///
/// impl Entity for Light {
///     type State = LightState;
///     fn current_state(&self) -> LightState { self.state.clone() }
///     fn set_current_state(&mut self, next: LightState) { self.state = next; }
///     fn target_type() -> &'static str { "light" }
///     fn target_id(&self) -> Option<String> { None }
/// }
///
/// impl Hooks for Light {}
///
/// let config = Arc::new(
///     StateConfig::builder()
///         .initial(LightState::Red)
///         .permit(LightState::Red, LightState::Green)
///         .permit(LightState::Green, LightState::Yellow)
///         .permit(LightState::Yellow, LightState::Red)
///         .build()
///         .unwrap(),
/// );
///
/// let mut machine = Machine::new(config);
/// let mut light = Light { state: LightState::Red };
///
/// machine
///     .transition_to(
///         &mut light,
///         LightState::Green,
///         &TransitionContext::new(),
///         TransitionOptions::new(),
///     )
///     .unwrap();
/// assert_eq!(machine.state(&light), LightState::Green);
/// ```
pub struct Machine<E: Hooks, H: HistoryStore = InMemoryHistory> {
    config: Arc<StateConfig<E::State>>,
    history: Option<HistoryRecorder<H>>,
}

impl<E: Hooks> Machine<E, InMemoryHistory> {
    /// Create a machine without history tracking.
    pub fn new(config: Arc<StateConfig<E::State>>) -> Self {
        Self {
            config,
            history: None,
        }
    }

    /// Create a machine recording history into an in-memory store.
    pub fn with_default_history(config: Arc<StateConfig<E::State>>) -> Self {
        Self {
            config,
            history: Some(HistoryRecorder::new(InMemoryHistory::new())),
        }
    }
}

impl<E: Hooks, H: HistoryStore> Machine<E, H> {
    /// Create a machine recording history through `recorder`.
    pub fn with_history(config: Arc<StateConfig<E::State>>, recorder: HistoryRecorder<H>) -> Self {
        Self {
            config,
            history: Some(recorder),
        }
    }

    /// The shared per-type configuration.
    pub fn config(&self) -> &StateConfig<E::State> {
        &self.config
    }

    /// The attached history recorder, if any.
    pub fn history(&self) -> Option<&HistoryRecorder<H>> {
        self.history.as_ref()
    }

    /// Mutable access to the attached history recorder.
    pub fn history_mut(&mut self) -> Option<&mut HistoryRecorder<H>> {
        self.history.as_mut()
    }

    /// Unconditionally set the entity to the declared initial state.
    ///
    /// No graph check, no hooks, no history. Used when an entity is first
    /// constructed.
    pub fn init_state(&self, entity: &mut E) {
        entity.set_current_state(self.config.initial_state().clone());
    }

    /// The entity's current (normalized) state.
    pub fn state(&self, entity: &E) -> E::State {
        entity.current_state()
    }

    /// Whether the entity is currently in `state`.
    pub fn is_state(&self, entity: &E, state: &E::State) -> bool {
        entity.current_state() == *state
    }

    /// Whether the entity is currently in any of `states`.
    pub fn is_any_state(&self, entity: &E, states: &[E::State]) -> bool {
        let current = entity.current_state();
        states.iter().any(|s| *s == current)
    }

    /// The adjacency list of the entity's current state.
    pub fn available_transitions(&self, entity: &E) -> &[E::State] {
        self.config.transitions_from(&entity.current_state())
    }

    /// Whether a transition into `target` would pass the graph check.
    ///
    /// True when `target` equals the current state, strict mode is off, or
    /// `target` is in the current state's adjacency list. Guards and hooks
    /// are not consulted.
    pub fn can_transition_to(&self, entity: &E, target: &E::State) -> bool {
        let current = entity.current_state();
        *target == current
            || !self.config.strict()
            || self.config.transitions_from(&current).contains(target)
    }

    /// Whether the current state has no outgoing edges.
    pub fn is_terminal_state(&self, entity: &E) -> bool {
        self.available_transitions(entity).is_empty()
    }

    /// Whether the current state equals the declared initial state.
    pub fn is_initial_state(&self, entity: &E) -> bool {
        entity.current_state() == *self.config.initial_state()
    }

    /// Validate and execute one transition.
    ///
    /// Dispatch order: graph check, `guard`, `before_transition`, `on_exit`,
    /// `on_enter` (against the staged target), state-field write,
    /// `on_transition`, `after_transition`, history recording, optional
    /// `save()`.
    ///
    /// Failure semantics: everything up to and including `on_enter` leaves
    /// the entity completely unchanged — the state field is written only
    /// after the entry hook succeeds. Failures in `on_transition`,
    /// `after_transition`, or `save()` propagate but do not undo the
    /// committed transition. History recording never fails the call.
    ///
    /// Transitioning into the current state is idempotent: it returns `Ok`
    /// immediately and invokes no hooks.
    pub fn transition_to(
        &mut self,
        entity: &mut E,
        target: E::State,
        ctx: &TransitionContext,
        opts: TransitionOptions,
    ) -> Result<(), TransitionError> {
        let current = entity.current_state();

        if target == current {
            return Ok(());
        }

        if !opts.force && self.config.strict() {
            let allowed = self.config.transitions_from(&current);
            if !allowed.contains(&target) {
                return Err(TransitionError::InvalidTransition {
                    from: current.to_scalar(),
                    to: target.to_scalar(),
                    allowed: allowed.iter().map(State::to_scalar).collect(),
                });
            }
        }

        if !entity.guard(&target, ctx) {
            return Err(TransitionError::Guard {
                from: current.to_scalar(),
                to: target.to_scalar(),
                guard: format!("guard_can_{}", target.token()),
            });
        }

        if !entity.before_transition(&current, &target, ctx) {
            return Err(TransitionError::Blocked {
                from: current.to_scalar(),
                to: target.to_scalar(),
                reason: None,
            });
        }

        entity
            .on_exit(&current, ctx)
            .map_err(|source| TransitionError::Callback {
                from: current.to_scalar(),
                to: target.to_scalar(),
                hook: format!("on_exit_{}", current.token()),
                source,
            })?;

        // Two-phase commit: the entry hook runs against the staged target,
        // and the authoritative field is written only once it succeeds.
        entity
            .on_enter(&target, ctx)
            .map_err(|source| TransitionError::Callback {
                from: current.to_scalar(),
                to: target.to_scalar(),
                hook: format!("on_enter_{}", target.token()),
                source,
            })?;

        entity.set_current_state(target.clone());
        debug!(
            from = %current.to_scalar(),
            to = %target.to_scalar(),
            "transition committed"
        );

        entity
            .on_transition(&current, &target, ctx)
            .map_err(|source| TransitionError::Callback {
                from: current.to_scalar(),
                to: target.to_scalar(),
                hook: format!("on_transition_{}_{}", current.token(), target.token()),
                source,
            })?;

        entity
            .after_transition(&current, &target, ctx)
            .map_err(|source| TransitionError::Callback {
                from: current.to_scalar(),
                to: target.to_scalar(),
                hook: "after_transition".to_string(),
                source,
            })?;

        if let Some(recorder) = self.history.as_mut() {
            recorder.record(entity, &current, &target, ctx);
        }

        if opts.save {
            entity.save().map_err(TransitionError::Persistence)?;
        }

        Ok(())
    }

    /// Resolve a raw stored value and transition into it.
    ///
    /// Fails with [`TransitionError::InvalidState`] when `raw` is outside
    /// the declared enumeration.
    pub fn transition_to_scalar(
        &mut self,
        entity: &mut E,
        raw: &Scalar,
        ctx: &TransitionContext,
        opts: TransitionOptions,
    ) -> Result<(), TransitionError> {
        let target = self.config.resolve(raw)?;
        self.transition_to(entity, target, ctx, opts)
    }

    /// Non-raising variant of [`transition_to`](Self::transition_to).
    ///
    /// Returns false on any failure instead of an error. The no-write
    /// guarantee around the entry hook holds regardless.
    pub fn try_transition_to(
        &mut self,
        entity: &mut E,
        target: E::State,
        ctx: &TransitionContext,
        opts: TransitionOptions,
    ) -> bool {
        self.transition_to(entity, target, ctx, opts).is_ok()
    }

    /// All items of `query` currently in `state`.
    pub fn find_by_state<Q: StateQuery>(&self, query: &Q, state: &E::State) -> Vec<Q::Item> {
        query.find_where_state(&state.to_scalar())
    }

    /// Count of items of `query` currently in `state`.
    pub fn count_by_state<Q: StateQuery>(&self, query: &Q, state: &E::State) -> usize {
        query.count_where_state(&state.to_scalar())
    }

    /// Count of items of `query` currently in any of `states`.
    pub fn count_by_states<Q: StateQuery>(&self, query: &Q, states: &[E::State]) -> usize {
        let scalars: Vec<Scalar> = states.iter().map(State::to_scalar).collect();
        query.count_where_states(&scalars)
    }
}
