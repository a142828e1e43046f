//! Symbols declared by semantic analysis
//!
//! The IR refers to declarations through [`SymbolId`] handles into a
//! [`SymbolTable`] that outlives every tree built from it.

use std::fmt;

use kiln_types::{TypeContext, TypeId};

use crate::span::Span;

/// Handle of a symbol in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym{}", self.0)
    }
}

/// Class-like declaration flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Object,
    CompanionObject,
    EnumClass,
}

impl ClassKind {
    /// Whether the declaration has exactly one instance referenced by name
    pub fn is_singleton(&self) -> bool {
        matches!(self, ClassKind::Object | ClassKind::CompanionObject)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueParameter {
    pub name: String,
    pub ty: TypeId,
    pub has_default: bool,
    pub is_vararg: bool,
}

impl ValueParameter {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
            is_vararg: false,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// Signature of a function, accessor or constructor
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Type of `this` for members
    pub dispatch_receiver: Option<TypeId>,
    /// Receiver type of extension functions
    pub extension_receiver: Option<TypeId>,
    pub parameters: Vec<ValueParameter>,
    pub return_type: TypeId,
}

impl FunctionSignature {
    pub fn new(parameters: Vec<ValueParameter>, return_type: TypeId) -> Self {
        Self {
            dispatch_receiver: None,
            extension_receiver: None,
            parameters,
            return_type,
        }
    }

    pub fn with_dispatch_receiver(mut self, ty: TypeId) -> Self {
        self.dispatch_receiver = Some(ty);
        self
    }

    pub fn with_extension_receiver(mut self, ty: TypeId) -> Self {
        self.extension_receiver = Some(ty);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    pub ty: TypeId,
    pub mutable: bool,
    pub dispatch_receiver: Option<TypeId>,
    pub extension_receiver: Option<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassInfo {
    pub kind: ClassKind,
    /// The class type, or for enum entries the enum's type
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableInfo {
    pub ty: TypeId,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Function(FunctionSignature),
    Constructor(FunctionSignature),
    Property(PropertySignature),
    Class(ClassInfo),
    EnumEntry(ClassInfo),
    Variable(VariableInfo),
    ValueParameter(VariableInfo),
    TypeAlias,
}

/// Symbol information
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declaration site
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            span: Span::default(),
        }
    }

    /// Signature of functions and constructors
    pub fn as_callable(&self) -> Option<&FunctionSignature> {
        match &self.kind {
            SymbolKind::Function(sig) | SymbolKind::Constructor(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertySignature> {
        match &self.kind {
            SymbolKind::Property(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassInfo> {
        match &self.kind {
            SymbolKind::Class(info) => Some(info),
            _ => None,
        }
    }

    /// Locals and parameters
    pub fn as_variable(&self) -> Option<&VariableInfo> {
        match &self.kind {
            SymbolKind::Variable(info) | SymbolKind::ValueParameter(info) => Some(info),
            _ => None,
        }
    }

    /// Type of a value of this symbol: variable, property or return type
    pub fn value_type(&self) -> Option<TypeId> {
        match &self.kind {
            SymbolKind::Function(sig) | SymbolKind::Constructor(sig) => Some(sig.return_type),
            SymbolKind::Property(sig) => Some(sig.ty),
            SymbolKind::Class(info) | SymbolKind::EnumEntry(info) => Some(info.ty),
            SymbolKind::Variable(info) | SymbolKind::ValueParameter(info) => Some(info.ty),
            SymbolKind::TypeAlias => None,
        }
    }

    /// Short description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            SymbolKind::Function(_) => "function",
            SymbolKind::Constructor(_) => "constructor",
            SymbolKind::Property(_) => "property",
            SymbolKind::Class(_) => "class",
            SymbolKind::EnumEntry(_) => "enum entry",
            SymbolKind::Variable(_) => "variable",
            SymbolKind::ValueParameter(_) => "value parameter",
            SymbolKind::TypeAlias => "type alias",
        }
    }
}

/// Intrinsics the lowering emits calls to without a resolution record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    /// `EQEQ(a: Any?, b: Any?): Boolean`
    pub equals: SymbolId,
    /// `Boolean.not(): Boolean`
    pub not: SymbolId,
}

/// Flat table of every symbol in a compilation unit
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    builtins: Builtins,
}

impl SymbolTable {
    /// Create a table holding the builtin intrinsics
    pub fn new(types: &mut TypeContext) -> Self {
        let any = types.any_type();
        let nullable_any = types.make_nullable(any);
        let boolean = types.boolean_type();

        let mut symbols = Vec::new();
        let equals = SymbolId(symbols.len() as u32);
        symbols.push(Symbol::new(
            "EQEQ",
            SymbolKind::Function(FunctionSignature::new(
                vec![
                    ValueParameter::new("arg0", nullable_any),
                    ValueParameter::new("arg1", nullable_any),
                ],
                boolean,
            )),
        ));
        let not = SymbolId(symbols.len() as u32);
        symbols.push(Symbol::new(
            "not",
            SymbolKind::Function(
                FunctionSignature::new(vec![], boolean).with_dispatch_receiver(boolean),
            ),
        ));

        SymbolTable {
            symbols,
            builtins: Builtins { equals, not },
        }
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Name of a symbol, or a placeholder for unknown ids
    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id).map_or("<unknown>", |s| s.name.as_str())
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    // Convenience constructors

    pub fn add_function(&mut self, name: &str, signature: FunctionSignature) -> SymbolId {
        self.add(Symbol::new(name, SymbolKind::Function(signature)))
    }

    pub fn add_constructor(&mut self, name: &str, signature: FunctionSignature) -> SymbolId {
        self.add(Symbol::new(name, SymbolKind::Constructor(signature)))
    }

    pub fn add_property(&mut self, name: &str, signature: PropertySignature) -> SymbolId {
        self.add(Symbol::new(name, SymbolKind::Property(signature)))
    }

    pub fn add_class(&mut self, name: &str, kind: ClassKind, ty: TypeId) -> SymbolId {
        self.add(Symbol::new(name, SymbolKind::Class(ClassInfo { kind, ty })))
    }

    pub fn add_variable(&mut self, name: &str, ty: TypeId, mutable: bool) -> SymbolId {
        self.add(Symbol::new(
            name,
            SymbolKind::Variable(VariableInfo { ty, mutable }),
        ))
    }

    pub fn add_parameter(&mut self, name: &str, ty: TypeId) -> SymbolId {
        self.add(Symbol::new(
            name,
            SymbolKind::ValueParameter(VariableInfo { ty, mutable: false }),
        ))
    }
}
