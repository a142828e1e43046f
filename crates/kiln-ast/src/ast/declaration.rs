//! Declaration nodes

use super::{Argument, Block, Expr, NodeId, Span};

/// Compilation unit: all files compiled together
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Function(FunctionDecl),
    Property(PropertyDecl),
    Class(ClassDecl),
    TypeAlias(TypeAliasDecl),
}

impl Declaration {
    pub fn id(&self) -> NodeId {
        match self {
            Declaration::Function(d) => d.id,
            Declaration::Property(d) => d.id,
            Declaration::Class(d) => d.id,
            Declaration::TypeAlias(d) => d.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Function(d) => d.span,
            Declaration::Property(d) => d.span,
            Declaration::Class(d) => d.span,
            Declaration::TypeAlias(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Option<FunctionBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub default_value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// fun f() { ... }
    Block(Block),
    /// fun f() = e
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub initializer: Option<Expr>,
    /// val p by delegate
    pub delegate: Option<Expr>,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
}

/// Custom getter or setter
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub id: NodeId,
    pub span: Span,
    pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub primary_constructor: Option<PrimaryConstructor>,
    /// Superclass constructor invocation in the header: `: Base(x)`
    pub super_call: Option<SuperCall>,
    pub enum_entries: Vec<EnumEntryDecl>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryConstructor {
    pub id: NodeId,
    pub span: Span,
    pub parameters: Vec<ConstructorParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorParameter {
    pub parameter: Parameter,
    /// Node declaring the property for `val`/`var` parameters
    pub property: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperCall {
    pub id: NodeId,
    pub span: Span,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Function(FunctionDecl),
    Property(PropertyDecl),
    Class(ClassDecl),
    SecondaryConstructor(SecondaryConstructor),
    /// init { ... }
    Initializer(Block),
    TypeAlias(TypeAliasDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryConstructor {
    pub id: NodeId,
    pub span: Span,
    pub parameters: Vec<Parameter>,
    /// : this(...) or : super(...)
    pub delegation: Option<SuperCall>,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntryDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
}
