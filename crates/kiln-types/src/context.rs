//! Type context for managing types and type interning

use crate::error::TypeError;
use crate::ty::{BuiltinType, ClassType, FlexibleType, Type, TypeId};
use rustc_hash::FxHashMap;

/// Type context that owns every type of a compilation unit
///
/// Types are interned, so structurally identical types share one `TypeId`
/// and type equality is handle equality.
#[derive(Debug, Clone)]
pub struct TypeContext {
    /// Storage for all types, indexed by TypeId
    types: Vec<Type>,

    /// Reverse mapping from Type to TypeId for interning
    type_to_id: FxHashMap<Type, TypeId>,

    /// Declared class types by name
    named_types: FxHashMap<String, TypeId>,

    error: TypeId,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Create a context with every builtin pre-interned
    pub fn new() -> Self {
        let mut ctx = TypeContext {
            types: Vec::new(),
            type_to_id: FxHashMap::default(),
            named_types: FxHashMap::default(),
            error: TypeId(0),
        };

        // Builtins occupy the first ids, in declaration order
        for builtin in BuiltinType::ALL {
            ctx.intern(Type::Builtin(builtin));
        }
        ctx.error = ctx.intern(Type::Error);

        ctx
    }

    /// Intern a type, returning its TypeId
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }

        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.type_to_id.insert(ty, id);
        id
    }

    /// Get a type by its TypeId
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.0 as usize)
    }

    /// Look up a declared class type by name
    pub fn lookup_named_type(&self, name: &str) -> Option<TypeId> {
        self.named_types.get(name).copied()
    }

    // Convenience methods for common types

    /// Id of a builtin type
    pub fn builtin(&self, builtin: BuiltinType) -> TypeId {
        TypeId(builtin as u32)
    }

    /// `Any`
    pub fn any_type(&self) -> TypeId {
        self.builtin(BuiltinType::Any)
    }

    /// `Nothing`
    pub fn nothing_type(&self) -> TypeId {
        self.builtin(BuiltinType::Nothing)
    }

    /// `Unit`
    pub fn unit_type(&self) -> TypeId {
        self.builtin(BuiltinType::Unit)
    }

    /// `Boolean`
    pub fn boolean_type(&self) -> TypeId {
        self.builtin(BuiltinType::Boolean)
    }

    /// `Int`
    pub fn int_type(&self) -> TypeId {
        self.builtin(BuiltinType::Int)
    }

    /// `String`
    pub fn string_type(&self) -> TypeId {
        self.builtin(BuiltinType::String)
    }

    /// `Throwable`
    pub fn throwable_type(&self) -> TypeId {
        self.builtin(BuiltinType::Throwable)
    }

    /// The error type
    pub fn error_type(&self) -> TypeId {
        self.error
    }

    /// `Nothing?`, the type of the `null` literal
    pub fn null_type(&mut self) -> TypeId {
        let nothing = self.nothing_type();
        self.make_nullable(nothing)
    }

    /// Declare a class type and register it by name
    pub fn class_type(&mut self, name: impl Into<String>, supertypes: Vec<TypeId>) -> TypeId {
        let name = name.into();
        let id = self.intern(Type::Class(ClassType {
            name: name.clone(),
            supertypes,
        }));
        self.named_types.insert(name, id);
        id
    }

    /// Create the platform type `T!` from its non-null lower bound
    pub fn flexible_type(&mut self, lower: TypeId) -> TypeId {
        let lower = self.make_not_nullable(lower);
        let upper = self.make_nullable(lower);
        self.intern(Type::Flexible(FlexibleType { lower, upper }))
    }

    /// Create a flexible type from explicit bounds
    pub fn flexible_type_with_bounds(
        &mut self,
        lower: TypeId,
        upper: TypeId,
    ) -> Result<TypeId, TypeError> {
        if !crate::SubtypingContext::new(self).is_subtype(lower, upper) {
            return Err(TypeError::InvalidFlexibleBounds {
                lower: self.display(lower),
                upper: self.display(upper),
            });
        }
        Ok(self.intern(Type::Flexible(FlexibleType { lower, upper })))
    }

    /// Get a display string for a type
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Some(Type::Builtin(builtin)) => builtin.type_name().to_string(),
            Some(Type::Class(class)) => class.name.clone(),
            Some(Type::Nullable(inner)) => format!("{}?", self.display(*inner)),
            Some(Type::Flexible(flexible)) => format!("{}!", self.display(flexible.lower)),
            Some(Type::Error) => "<error>".to_string(),
            None => format!("InvalidType({})", id.0),
        }
    }

    /// Get the number of types in the context
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
