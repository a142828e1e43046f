//! Type system errors

use thiserror::Error;

/// Errors that can occur while querying the type context
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A flexible type whose bounds do not describe one type
    #[error("Invalid flexible type: lower bound {lower} is not a subtype of upper bound {upper}")]
    InvalidFlexibleBounds {
        /// Lower bound
        lower: String,
        /// Upper bound
        upper: String,
    },
}
