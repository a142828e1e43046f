//! Resolved syntax tree
//!
//! Every node carries a [`NodeId`] used as the key into the resolution
//! tables and a [`Span`] that is preserved through lowering.

mod declaration;
mod expression;
pub mod visitor;

pub use declaration::*;
pub use expression::*;
pub use visitor::*;

pub use crate::span::{NodeId, Span};
