//! Subtyping rules for the Kiln type system
//!
//! Implements the subtyping relation T <: U (T is a subtype of U).

use crate::context::TypeContext;
use crate::ty::{BuiltinType, Type, TypeId};

/// Context for checking subtyping relationships
#[derive(Debug, Clone, Copy)]
pub struct SubtypingContext<'a> {
    /// Type context for resolving types
    type_ctx: &'a TypeContext,
}

impl<'a> SubtypingContext<'a> {
    /// Create a new subtyping context
    pub fn new(type_ctx: &'a TypeContext) -> Self {
        SubtypingContext { type_ctx }
    }

    /// Check if `sub` is a subtype of `sup` (sub <: sup)
    ///
    /// Returns true if a value of type `sub` can be used where `sup` is expected.
    /// The error type is compatible in both directions so that one bad
    /// expression does not cascade into further mismatches.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        // Reflexivity: T <: T
        if sub == sup {
            return true;
        }

        let sub_ty = match self.type_ctx.get(sub) {
            Some(ty) => ty,
            None => return false,
        };

        let sup_ty = match self.type_ctx.get(sup) {
            Some(ty) => ty,
            None => return false,
        };

        match (sub_ty, sup_ty) {
            (Type::Error, _) | (_, Type::Error) => true,

            // A platform type is checked through its lower bound on the left
            // and its upper bound on the right
            (Type::Flexible(flexible), _) => self.is_subtype(flexible.lower, sup),
            (_, Type::Flexible(flexible)) => self.is_subtype(sub, flexible.upper),

            // Nothing is subtype of everything
            (Type::Builtin(BuiltinType::Nothing), _) => true,

            (Type::Nullable(inner), Type::Nullable(sup_inner)) => {
                self.is_subtype(*inner, *sup_inner)
            }

            // A nullable type never fits a non-null one
            (Type::Nullable(_), _) => false,

            (_, Type::Nullable(sup_inner)) => self.is_subtype(sub, *sup_inner),

            // Every non-null type is an Any
            (_, Type::Builtin(BuiltinType::Any)) => true,

            (Type::Builtin(b1), Type::Builtin(b2)) => b1 == b2,

            // Class subtyping (nominal): only through declared supertypes
            (Type::Class(class), _) => class
                .supertypes
                .iter()
                .any(|&supertype| self.is_subtype(supertype, sup)),

            (Type::Builtin(_), Type::Class(_)) => false,
        }
    }

    /// Check if two types are mutually subtypes
    pub fn is_equivalent(&self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype(a, b) && self.is_subtype(b, a)
    }
}
