//! Caller-supplied context for a single transition.
//!
//! The context flows unmodified through every hook invoked during one
//! `transition_to` call. Two keys are reserved for the history layer:
//! `reason` and `changed_by`; everything else is an opaque payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Reserved context key lifted into a history record's `reason` column.
pub const REASON_KEY: &str = "reason";

/// Reserved context key lifted into a history record's `changed_by` column.
pub const CHANGED_BY_KEY: &str = "changed_by";

/// Arbitrary key→value map supplied by the caller for one transition.
///
/// Values are stored as `serde_json::Value` so hooks and the history layer
/// can read them without knowing the caller's concrete types. Inserting a
/// value that fails to serialize is best-effort: the key is skipped and a
/// debug event is emitted, never an error.
///
/// # Example
///
/// ```rust
/// use stateline::core::TransitionContext;
///
/// let ctx = TransitionContext::new()
///     .with("reason", "payment confirmed")
///     .with("changed_by", "billing-worker")
///     .with("invoice_id", 4711);
///
/// assert_eq!(ctx.reason(), Some("payment confirmed"));
/// assert_eq!(ctx.changed_by(), Some("billing-worker"));
/// assert_eq!(ctx.extras().len(), 1); // invoice_id only
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionContext {
    values: BTreeMap<String, Value>,
}

impl TransitionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, consuming and returning the context for chaining.
    ///
    /// Serialization failures are swallowed: the key is simply not added.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.values.insert(key, value);
            }
            Err(err) => {
                debug!(key = %key, error = %err, "context value not serializable, skipping");
            }
        }
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The reserved `reason` key, when present and textual.
    pub fn reason(&self) -> Option<&str> {
        self.values.get(REASON_KEY).and_then(Value::as_str)
    }

    /// The reserved `changed_by` key, when present and textual.
    pub fn changed_by(&self) -> Option<&str> {
        self.values.get(CHANGED_BY_KEY).and_then(Value::as_str)
    }

    /// All entries except the reserved keys.
    ///
    /// This is the payload the history layer serializes into a record's
    /// `context` blob.
    pub fn extras(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != REASON_KEY && k.as_str() != CHANGED_BY_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// True when no keys are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
