//! Nullability queries over interned types

use crate::context::TypeContext;
use crate::ty::{BuiltinType, Type, TypeId};

impl TypeContext {
    /// Check whether values of this type may be `null`
    pub fn is_nullable(&self, id: TypeId) -> bool {
        match self.get(id) {
            Some(Type::Nullable(_)) => true,
            Some(Type::Flexible(flexible)) => self.is_nullable(flexible.upper),
            _ => false,
        }
    }

    /// Check whether this is a platform type whose bounds disagree on nullability
    pub fn is_nullability_flexible(&self, id: TypeId) -> bool {
        match self.get(id) {
            Some(Type::Flexible(flexible)) => {
                self.is_nullable(flexible.lower) != self.is_nullable(flexible.upper)
            }
            _ => false,
        }
    }

    /// Strip nullability: `T?` and `T!` both become `T`
    pub fn make_not_nullable(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Some(Type::Nullable(inner)) => self.make_not_nullable(*inner),
            Some(Type::Flexible(flexible)) => self.make_not_nullable(flexible.lower),
            _ => id,
        }
    }

    /// Widen to the nullable variant
    pub fn make_nullable(&mut self, id: TypeId) -> TypeId {
        match self.get(id) {
            Some(Type::Nullable(_)) | Some(Type::Error) | None => id,
            Some(Type::Flexible(flexible)) => {
                let upper = flexible.upper;
                self.make_nullable(upper)
            }
            Some(_) => self.intern(Type::Nullable(id)),
        }
    }

    /// Check for `Unit`
    pub fn is_unit(&self, id: TypeId) -> bool {
        matches!(self.get(id), Some(Type::Builtin(BuiltinType::Unit)))
    }

    /// Check for non-null `Nothing`
    pub fn is_nothing(&self, id: TypeId) -> bool {
        matches!(self.get(id), Some(Type::Builtin(BuiltinType::Nothing)))
    }

    /// Check for the error type
    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.get(id), Some(Type::Error))
    }
}
