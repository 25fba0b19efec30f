//! Per-entity-type transition configuration.
//!
//! A `StateConfig` is an immutable value declared once per entity type: the
//! transition graph, the declared initial state, and the strict-mode flag.
//! It is constructed through a builder and shared by reference (typically an
//! `Arc`) with every machine for that type. Instances never mutate it.

use crate::core::{Scalar, State};
use crate::error::TransitionError;
use thiserror::Error;

/// Errors that can occur when building a state configuration.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No transitions defined for a strict configuration. Add transitions or call .strict(false)")]
    NoTransitions,
}

/// Immutable transition configuration for one entity type.
///
/// Holds the adjacency graph `state -> [allowed targets]`, the declared
/// initial state, and whether the graph is enforced (`strict`). All query
/// methods are pure functions of this static structure.
///
/// # Example
///
/// ```rust
/// use stateline::config::StateConfig;
/// use stateline::states;
///
/// states! {
///     enum OrderState {
///         Pending = "pending",
///         Paid = "paid",
///         Shipped = "shipped",
///         Completed = "completed",
///         Cancelled = "cancelled",
///     }
/// }
///
/// let config = StateConfig::builder()
///     .initial(OrderState::Pending)
///     .transition(OrderState::Pending, [OrderState::Paid, OrderState::Cancelled])
///     .transition(OrderState::Paid, [OrderState::Shipped, OrderState::Cancelled])
///     .transition(OrderState::Shipped, [OrderState::Completed])
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     config.transitions_from(&OrderState::Pending),
///     &[OrderState::Paid, OrderState::Cancelled]
/// );
/// assert!(config.terminal_states().contains(&OrderState::Completed));
/// ```
#[derive(Clone, Debug)]
pub struct StateConfig<S: State> {
    initial: S,
    graph: Vec<(S, Vec<S>)>,
    strict: bool,
}

impl<S: State> StateConfig<S> {
    /// Start building a configuration.
    pub fn builder() -> StateConfigBuilder<S> {
        StateConfigBuilder::new()
    }

    /// The declared initial state, written by `init_state`.
    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    /// Whether the graph is enforced.
    ///
    /// When false, any transition is permitted regardless of the graph.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Adjacency list of `state`. Empty when the state has no outgoing edges.
    pub fn transitions_from(&self, state: &S) -> &[S] {
        self.graph
            .iter()
            .find(|(from, _)| from == state)
            .map(|(_, targets)| targets.as_slice())
            .unwrap_or(&[])
    }

    /// The raw adjacency structure.
    pub fn transitions_map(&self) -> &[(S, Vec<S>)] {
        &self.graph
    }

    /// Every known state.
    ///
    /// The declared enumeration when one exists, otherwise the union of
    /// graph keys, graph targets, and the initial state in first-seen order.
    pub fn all_states(&self) -> Vec<S> {
        let declared = S::all();
        if !declared.is_empty() {
            return declared;
        }

        let mut states = vec![self.initial.clone()];
        for (from, targets) in &self.graph {
            for state in std::iter::once(from).chain(targets) {
                if !states.contains(state) {
                    states.push(state.clone());
                }
            }
        }
        states
    }

    /// States with no outgoing edges.
    pub fn terminal_states(&self) -> Vec<S> {
        self.all_states()
            .into_iter()
            .filter(|s| self.transitions_from(s).is_empty())
            .collect()
    }

    /// States that never appear as a transition target.
    ///
    /// Computed structurally from the graph; this can legitimately disagree
    /// with the declared initial state.
    pub fn initial_states(&self) -> Vec<S> {
        self.all_states()
            .into_iter()
            .filter(|s| {
                !self
                    .graph
                    .iter()
                    .any(|(_, targets)| targets.contains(s))
            })
            .collect()
    }

    /// Normalize a stored scalar into a typed state.
    ///
    /// Fails with [`TransitionError::InvalidState`] carrying the legal set
    /// when the value is outside the enumeration.
    pub fn resolve(&self, raw: &Scalar) -> Result<S, TransitionError> {
        S::from_scalar(raw).ok_or_else(|| TransitionError::InvalidState {
            value: raw.clone(),
            legal: self.all_states().iter().map(State::to_scalar).collect(),
        })
    }
}

/// Builder for [`StateConfig`] with a fluent API.
pub struct StateConfigBuilder<S: State> {
    initial: Option<S>,
    graph: Vec<(S, Vec<S>)>,
    strict: bool,
}

impl<S: State> StateConfigBuilder<S> {
    /// Create a new builder (strict by default).
    pub fn new() -> Self {
        Self {
            initial: None,
            graph: Vec::new(),
            strict: true,
        }
    }

    /// Set the declared initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Declare the allowed targets of `from`.
    ///
    /// Repeated declarations for the same state merge, preserving order.
    pub fn transition(mut self, from: S, targets: impl IntoIterator<Item = S>) -> Self {
        let entry = self.graph.iter_mut().find(|(f, _)| *f == from);
        match entry {
            Some((_, existing)) => {
                for to in targets {
                    if !existing.contains(&to) {
                        existing.push(to);
                    }
                }
            }
            None => {
                let mut list = Vec::new();
                for to in targets {
                    if !list.contains(&to) {
                        list.push(to);
                    }
                }
                self.graph.push((from, list));
            }
        }
        self
    }

    /// Declare a single edge `from -> to`.
    pub fn permit(self, from: S, to: S) -> Self {
        self.transition(from, [to])
    }

    /// Disable or enable graph enforcement.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<StateConfig<S>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if self.strict && self.graph.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        Ok(StateConfig {
            initial,
            graph: self.graph,
            strict: self.strict,
        })
    }
}

impl<S: State> Default for StateConfigBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
