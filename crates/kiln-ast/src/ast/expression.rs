//! Expression and statement nodes

use super::{Declaration, NodeId, Parameter, Span};

/// Expression (produces a value, possibly `Unit`)
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Constant literal: 1, "a", null
    Literal(Literal),

    /// String template: "a${b}c"
    StringTemplate(Vec<TemplateEntry>),

    /// Simple name: x
    Name(String),

    /// Call with a simple callee: f(a, b = 1)
    Call(CallExpr),

    /// Qualified access: a.b, a.f(), a?.b
    Qualified(QualifiedExpr),

    /// this, this@Label
    This(Option<String>),

    /// Binary operation: a + b
    Binary(BinaryExpr),

    /// Unary operation: -a, !a, ++a, a++, a!!
    Unary(UnaryExpr),

    /// Assignment: a = b, a += b
    Assign(AssignExpr),

    /// Block: { ... }
    Block(Block),

    /// if (c) a else b
    If(IfExpr),

    /// when (s) { ... }
    When(WhenExpr),

    /// while (c) body
    While(LoopExpr),

    /// do body while (c)
    DoWhile(LoopExpr),

    /// break, break@label
    Break(Option<String>),

    /// continue, continue@label
    Continue(Option<String>),

    /// return, return@label value
    Return(ReturnExpr),

    /// throw e
    Throw(Box<Expr>),

    /// try { } catch (e: E) { } finally { }
    Try(TryExpr),

    /// e is T, e !is T
    TypeCheck(TypeCheckExpr),

    /// e as T, e as? T
    Cast(CastExpr),

    /// (e)
    Parenthesized(Box<Expr>),

    /// { x -> body }
    Lambda(Block),

    /// ::name
    CallableReference(String),

    /// a[i]
    Index(IndexExpr),

    /// T::class
    ClassLiteral(TypeRef),
}

impl Expr {
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }

    /// Strip any number of enclosing parentheses
    pub fn deparenthesize(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Parenthesized(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// Check if this expression is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Long(i64),
    Double(f64),
    Char(char),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateEntry {
    /// Literal text between interpolations
    Text { span: Span, value: String },
    /// ${expr} or $name
    Expression(Expr),
}

/// Value argument as written at the call site
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Name for `f(name = value)`
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedExpr {
    pub receiver: Box<Expr>,
    /// Name or call evaluated against the receiver
    pub selector: Box<Expr>,
    /// `?.` rather than `.`
    pub safe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Elvis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
    NotNullAssert,
}

impl UnaryOp {
    pub fn is_increment(&self) -> bool {
        matches!(
            self,
            UnaryOp::PrefixIncrement
                | UnaryOp::PrefixDecrement
                | UnaryOp::PostfixIncrement
                | UnaryOp::PostfixDecrement
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

/// Braced statement list
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub span: Span,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expr),
    Variable(VariableDecl),
    Destructuring(DestructuringDecl),
    /// Local function or class
    Declaration(Declaration),
}

/// val x = e, var x: T, val x by d
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub mutable: bool,
    pub initializer: Option<Expr>,
    pub delegate: Option<Expr>,
}

/// val (a, b) = e
#[derive(Debug, Clone, PartialEq)]
pub struct DestructuringDecl {
    pub id: NodeId,
    pub span: Span,
    pub entries: Vec<DestructuringEntry>,
    pub initializer: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DestructuringEntry {
    pub id: NodeId,
    pub span: Span,
    /// `_` skips the component
    pub name: String,
}

impl DestructuringEntry {
    pub fn is_skipped(&self) -> bool {
        self.name == "_"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenExpr {
    pub subject: Option<Box<Expr>>,
    pub entries: Vec<WhenEntry>,
    pub else_branch: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenEntry {
    pub id: NodeId,
    pub span: Span,
    /// Boolean conditions, or values compared against the subject
    pub conditions: Vec<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopExpr {
    pub label: Option<String>,
    pub condition: Box<Expr>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnExpr {
    pub label: Option<String>,
    pub value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryExpr {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub id: NodeId,
    pub span: Span,
    pub parameter: Parameter,
    pub body: Block,
}

/// Reference to a type in source: the `T` of `e as T`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCheckExpr {
    pub expr: Box<Expr>,
    pub target: TypeRef,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub expr: Box<Expr>,
    pub target: TypeRef,
    /// `as?`
    pub safe: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub receiver: Box<Expr>,
    pub indices: Vec<Expr>,
}
