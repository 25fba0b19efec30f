//! Macros for declaring state enumerations.

/// Generate a state enum with its `State` implementation.
///
/// Each variant is paired with the scalar value stored in the entity's state
/// field; string values double as the lower-case token used in guard and
/// hook names.
///
/// # Example
///
/// ```
/// use stateline::states;
///
/// states! {
///     pub enum OrderState {
///         Pending = "pending",
///         Paid = "paid",
///         Shipped = "shipped",
///         Completed = "completed",
///         Cancelled = "cancelled",
///     }
/// }
/// ```
#[macro_export]
macro_rules! states {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        impl $crate::core::State for $name {
            fn to_scalar(&self) -> $crate::core::Scalar {
                match self {
                    $(Self::$variant => $crate::core::Scalar::from($value)),+
                }
            }

            fn from_scalar(raw: &$crate::core::Scalar) -> Option<Self> {
                $(
                    if raw == &$crate::core::Scalar::from($value) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }

            fn all() -> Vec<Self> {
                vec![$(Self::$variant),+]
            }
        }
    };
}
