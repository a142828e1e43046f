//! Kiln Type System
//!
//! Interned type representation, nullability queries and the subtyping
//! relation used by IR lowering and the implicit coercion pass.

#![warn(missing_docs)]

pub mod ty;
pub mod context;
pub mod error;
pub mod nullability;
pub mod subtyping;

pub use ty::{BuiltinType, ClassType, FlexibleType, Type, TypeId};
pub use context::TypeContext;
pub use error::TypeError;
pub use subtyping::SubtypingContext;
