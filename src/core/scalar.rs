//! Stored form of a state value.
//!
//! Entities persist their state as a plain scalar column — a string for most
//! schemas, an integer for legacy ones. `Scalar` is that stored form, and the
//! `State` trait maps between it and the typed enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The persisted representation of a state.
///
/// A `Scalar` is what actually sits in the entity's state field and in
/// history rows. Typed states convert to and from it via
/// [`State::to_scalar`](crate::core::State::to_scalar) and
/// [`State::from_scalar`](crate::core::State::from_scalar).
///
/// # Example
///
/// ```rust
/// use stateline::core::Scalar;
///
/// let text = Scalar::from("pending");
/// let code = Scalar::from(3);
///
/// assert_eq!(text.to_string(), "pending");
/// assert_eq!(code.to_string(), "3");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// String-valued state column
    Text(String),
    /// Integer-valued state column
    Int(i64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
