//! Stateline: a transition engine for persistent entities.
//!
//! Stateline attaches a declared transition graph to any entity type,
//! validates and executes transitions against it, dispatches a fixed set of
//! lifecycle hooks and guard predicates around each transition, and can
//! append an audit trail that replays as a gap-free timeline.
//!
//! # Core Concepts
//!
//! - **State**: typed states with a total mapping to their stored scalar
//!   form, via the `State` trait and the `states!` macro
//! - **StateConfig**: the immutable per-type transition graph, built once
//!   and shared with every machine for that type
//! - **Hooks**: guard and lifecycle callbacks the host entity opts into,
//!   every one defaulting to a no-op
//! - **History**: an append-only transition log with derived queries —
//!   counts, last change, time in state, and a contiguous timeline
//!
//! # Example
//!
//! ```rust
//! use stateline::config::StateConfig;
//! use stateline::core::TransitionContext;
//! use stateline::machine::{Entity, Hooks, Machine, TransitionOptions};
//! use stateline::states;
//! use std::sync::Arc;
//!
//! states! {
//!     enum OrderState {
//!         Pending = "pending",
//!         Paid = "paid",
//!         Cancelled = "cancelled",
//!     }
//! }
//!
//! struct Order {
//!     id: Option<String>,
//!     state: OrderState,
//! }
//!
//! impl Entity for Order {
//!     type State = OrderState;
//!     fn current_state(&self) -> OrderState { self.state.clone() }
//!     fn set_current_state(&mut self, next: OrderState) { self.state = next; }
//!     fn target_type() -> &'static str { "order" }
//!     fn target_id(&self) -> Option<String> { self.id.clone() }
//! }
//!
//! impl Hooks for Order {}
//!
//! let config = Arc::new(
//!     StateConfig::builder()
//!         .initial(OrderState::Pending)
//!         .transition(OrderState::Pending, [OrderState::Paid, OrderState::Cancelled])
//!         .build()
//!         .unwrap(),
//! );
//!
//! let mut machine = Machine::with_default_history(config);
//! let mut order = Order { id: Some("o-1".into()), state: OrderState::Pending };
//!
//! machine
//!     .transition_to(
//!         &mut order,
//!         OrderState::Paid,
//!         &TransitionContext::new().with("reason", "card charged"),
//!         TransitionOptions::new(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(machine.state(&order), OrderState::Paid);
//! let history = machine.history().unwrap();
//! assert_eq!(history.state_change_count(&order).unwrap(), 1);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod machine;

mod macros;

// Re-export commonly used types
pub use config::{BuildError, StateConfig, StateConfigBuilder};
pub use core::{RawState, Scalar, State, TransitionContext};
pub use error::{BoxError, HistoryError, TransitionError};
pub use history::{
    HistoryRecorder, HistoryStore, InMemoryHistory, RecordQuery, StateInterval, TransitionRecord,
};
pub use machine::{Entity, Hooks, Machine, StateQuery, TransitionOptions};
