//! Core type definitions for the Kiln type system

use std::fmt;

/// Unique identifier for a type in the type context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Raw index of this type in its context
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Types known to the compiler without a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// Top of the non-null hierarchy
    Any,
    /// Bottom type: the type of `throw`, `return` and the `null` literal's inner type
    Nothing,
    /// Result type of statements and procedures
    Unit,
    /// `Boolean`
    Boolean,
    /// `Char`
    Char,
    /// `Int`
    Int,
    /// `Long`
    Long,
    /// `Double`
    Double,
    /// `String`
    String,
    /// Root of all throwable classes
    Throwable,
}

impl BuiltinType {
    /// Every builtin, in the order the context pre-interns them
    pub const ALL: [BuiltinType; 10] = [
        BuiltinType::Any,
        BuiltinType::Nothing,
        BuiltinType::Unit,
        BuiltinType::Boolean,
        BuiltinType::Char,
        BuiltinType::Int,
        BuiltinType::Long,
        BuiltinType::Double,
        BuiltinType::String,
        BuiltinType::Throwable,
    ];

    /// Source-level name of the builtin
    pub fn type_name(&self) -> &'static str {
        match self {
            BuiltinType::Any => "Any",
            BuiltinType::Nothing => "Nothing",
            BuiltinType::Unit => "Unit",
            BuiltinType::Boolean => "Boolean",
            BuiltinType::Char => "Char",
            BuiltinType::Int => "Int",
            BuiltinType::Long => "Long",
            BuiltinType::Double => "Double",
            BuiltinType::String => "String",
            BuiltinType::Throwable => "Throwable",
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Nominal class type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    /// Fully qualified class name
    pub name: String,
    /// Direct supertypes (superclass and interfaces)
    pub supertypes: Vec<TypeId>,
}

/// Platform type whose nullability is not known statically: `T!`
///
/// `lower` is the non-null view and `upper` the nullable view of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlexibleType {
    /// Lower bound
    pub lower: TypeId,
    /// Upper bound
    pub upper: TypeId,
}

/// The core type representation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Builtin type
    Builtin(BuiltinType),

    /// Declared class, interface or object type
    Class(ClassType),

    /// `T?`
    Nullable(TypeId),

    /// `T!`
    Flexible(FlexibleType),

    /// Type of an erroneous expression; compatible with everything
    Error,
}

impl Type {
    /// Check if this is the given builtin
    pub fn is_builtin(&self, builtin: BuiltinType) -> bool {
        matches!(self, Type::Builtin(b) if *b == builtin)
    }

    /// Get as class type if this is a class
    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Get the flexible bounds if this is a flexible type
    pub fn as_flexible(&self) -> Option<FlexibleType> {
        match self {
            Type::Flexible(flexible) => Some(*flexible),
            _ => None,
        }
    }

    /// Check if this is the error type
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }
}
