//! Kiln resolved syntax
//!
//! The input side of IR lowering: the syntax tree produced by the parser,
//! the symbols declared by semantic analysis and the resolution tables that
//! bind the two together. Everything here is read-only to the middle-end.

pub mod ast;
pub mod bindings;
pub mod builder;
pub mod index;
pub mod span;
pub mod symbols;

pub use bindings::{BindingContext, Receiver, ResolvedCall, ResolvedValueArgument};
pub use builder::AstBuilder;
pub use index::AstIndex;
pub use span::{NodeId, Span};
pub use symbols::{
    Builtins, ClassInfo, ClassKind, FunctionSignature, PropertySignature, Symbol, SymbolId,
    SymbolKind, SymbolTable, ValueParameter, VariableInfo,
};
