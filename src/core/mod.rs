//! Core value types for the transition engine.
//!
//! This module contains the pure value layer:
//! - State definitions via the `State` trait and its stored `Scalar` form
//! - The caller-supplied `TransitionContext` that flows through hooks
//!
//! Nothing here performs I/O or mutates an entity.

mod context;
mod scalar;
mod state;

pub use context::{TransitionContext, CHANGED_BY_KEY, REASON_KEY};
pub use scalar::Scalar;
pub use state::{RawState, State};
