//! IR nodes
//!
//! A node is a span, an optional semantic type, its position in the tree and
//! a kind-specific payload. Children are stored in the payload as optional
//! handles, one per slot; list slots keep their positions when a child is
//! detached so that every slot index stays stable.

use std::fmt;

use kiln_ast::{Span, SymbolId};
use kiln_types::TypeId;

use super::slot::Slot;

/// Handle of a node in its [`IrTree`](super::IrTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrNodeId(pub u32);

impl IrNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Where a node currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeLocation {
    Detached,
    Attached { parent: IrNodeId, slot: Slot },
}

/// Handle of a lowering-introduced local
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporaryId(pub u32);

/// Local variable introduced by lowering rather than declared in source
#[derive(Debug, Clone, PartialEq)]
pub struct Temporary {
    /// `tmp<N>_<hint>`
    pub name: String,
    pub ty: Option<TypeId>,
}

/// Variable read or written by the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRef {
    Symbol(SymbolId),
    Temporary(TemporaryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Constructor,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    DoWhile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonKind {
    Object,
    EnumEntry,
}

/// Operator carried by a type-operator node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOperator {
    /// `e!!`
    NotNull,
    /// `e as T`
    Cast,
    /// `e as? T`
    SafeCast,
    /// `e is T`
    InstanceOf,
    /// `e !is T`
    NotInstanceOf,
    /// Inserted by the coercion pass for platform types
    ImplicitNotNull,
    /// Inserted by the coercion pass where the type does not fit
    ImplicitCast,
}

impl fmt::Display for TypeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeOperator::NotNull => "NOT_NULL",
            TypeOperator::Cast => "CAST",
            TypeOperator::SafeCast => "SAFE_CAST",
            TypeOperator::InstanceOf => "INSTANCEOF",
            TypeOperator::NotInstanceOf => "NOT_INSTANCEOF",
            TypeOperator::ImplicitNotNull => "IMPLICIT_NOTNULL",
            TypeOperator::ImplicitCast => "IMPLICIT_CAST",
        };
        f.write_str(name)
    }
}

/// Source construct a synthesized node was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrOrigin {
    /// Block of ordered temporaries around a reordered call
    SyntheticBlock,
    Destructuring,
    /// `componentN()` call of a destructuring entry
    ComponentN(u32),
    SafeCall,
    Elvis,
    If,
    When,
    AndAnd,
    OrOr,
    Eq,
    PlusEq,
    MinusEq,
    MultEq,
    DivEq,
    PercEq,
    PrefixIncr,
    PrefixDecr,
    PostfixIncr,
    PostfixDecr,
    Plus,
    Minus,
    Mul,
    Div,
    Perc,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    ExclEq,
    Excl,
    UnaryMinus,
    UnaryPlus,
    GetProperty,
    InitializePropertyFromParameter,
    SuperConstructorCall,
    DelegatingConstructorCall,
    EnumConstructorCall,
}

impl fmt::Display for IrOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IrOrigin::SyntheticBlock => "SYNTHETIC_BLOCK",
            IrOrigin::Destructuring => "DESTRUCTURING_DECLARATION",
            IrOrigin::ComponentN(n) => return write!(f, "COMPONENT_{}", n),
            IrOrigin::SafeCall => "SAFE_CALL",
            IrOrigin::Elvis => "ELVIS",
            IrOrigin::If => "IF",
            IrOrigin::When => "WHEN",
            IrOrigin::AndAnd => "ANDAND",
            IrOrigin::OrOr => "OROR",
            IrOrigin::Eq => "EQ",
            IrOrigin::PlusEq => "PLUSEQ",
            IrOrigin::MinusEq => "MINUSEQ",
            IrOrigin::MultEq => "MULTEQ",
            IrOrigin::DivEq => "DIVEQ",
            IrOrigin::PercEq => "PERCEQ",
            IrOrigin::PrefixIncr => "PREFIX_INCR",
            IrOrigin::PrefixDecr => "PREFIX_DECR",
            IrOrigin::PostfixIncr => "POSTFIX_INCR",
            IrOrigin::PostfixDecr => "POSTFIX_DECR",
            IrOrigin::Plus => "PLUS",
            IrOrigin::Minus => "MINUS",
            IrOrigin::Mul => "MUL",
            IrOrigin::Div => "DIV",
            IrOrigin::Perc => "PERC",
            IrOrigin::Lt => "LT",
            IrOrigin::Gt => "GT",
            IrOrigin::LtEq => "LTEQ",
            IrOrigin::GtEq => "GTEQ",
            IrOrigin::EqEq => "EQEQ",
            IrOrigin::ExclEq => "EXCLEQ",
            IrOrigin::Excl => "EXCL",
            IrOrigin::UnaryMinus => "UMINUS",
            IrOrigin::UnaryPlus => "UPLUS",
            IrOrigin::GetProperty => "GET_PROPERTY",
            IrOrigin::InitializePropertyFromParameter => "INITIALIZE_PROPERTY_FROM_PARAMETER",
            IrOrigin::SuperConstructorCall => "SUPER_CONSTRUCTOR_CALL",
            IrOrigin::DelegatingConstructorCall => "DELEGATING_CONSTRUCTOR_CALL",
            IrOrigin::EnumConstructorCall => "ENUM_CONSTRUCTOR_CALL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Boolean(bool),
    Char(char),
    Int(i64),
    Long(i64),
    Double(f64),
    String(String),
}

impl ConstValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstValue::Null => "Null",
            ConstValue::Boolean(_) => "Boolean",
            ConstValue::Char(_) => "Char",
            ConstValue::Int(_) => "Int",
            ConstValue::Long(_) => "Long",
            ConstValue::Double(_) => "Double",
            ConstValue::String(_) => "String",
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Boolean(b) => write!(f, "{}", b),
            ConstValue::Char(c) => write!(f, "'{}'", c),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Long(l) => write!(f, "{}L", l),
            ConstValue::Double(d) => write!(f, "{:?}", d),
            ConstValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Kind-specific payload of a node, children included
#[derive(Debug, Clone, PartialEq)]
pub enum IrKind {
    // Declarations
    Module {
        name: String,
        files: Vec<Option<IrNodeId>>,
    },
    File {
        name: String,
        declarations: Vec<Option<IrNodeId>>,
    },
    Class {
        symbol: SymbolId,
        members: Vec<Option<IrNodeId>>,
    },
    Function {
        symbol: SymbolId,
        kind: FunctionKind,
        /// One slot per value parameter
        defaults: Vec<Option<IrNodeId>>,
        body: Option<IrNodeId>,
    },
    Property {
        symbol: SymbolId,
        initializer: Option<IrNodeId>,
        delegate: Option<IrNodeId>,
    },
    EnumEntry {
        symbol: SymbolId,
        initializer: Option<IrNodeId>,
    },
    LocalVariable {
        variable: ValueRef,
        initializer: Option<IrNodeId>,
    },
    ErrorDeclaration {
        description: String,
    },

    // Expressions
    Block {
        statements: Vec<Option<IrNodeId>>,
        has_result: bool,
        origin: Option<IrOrigin>,
    },
    Call {
        callee: SymbolId,
        dispatch_receiver: Option<IrNodeId>,
        extension_receiver: Option<IrNodeId>,
        /// One slot per value parameter; defaults stay empty
        arguments: Vec<Option<IrNodeId>>,
        origin: Option<IrOrigin>,
        super_qualifier: Option<SymbolId>,
    },
    GetProperty {
        property: SymbolId,
        dispatch_receiver: Option<IrNodeId>,
        extension_receiver: Option<IrNodeId>,
        origin: Option<IrOrigin>,
    },
    SetProperty {
        property: SymbolId,
        dispatch_receiver: Option<IrNodeId>,
        extension_receiver: Option<IrNodeId>,
        value: Option<IrNodeId>,
        origin: Option<IrOrigin>,
    },
    /// Backing field store of a constructor
    SetField {
        property: SymbolId,
        receiver: Option<IrNodeId>,
        value: Option<IrNodeId>,
        origin: Option<IrOrigin>,
    },
    GetVariable {
        variable: ValueRef,
        origin: Option<IrOrigin>,
    },
    SetVariable {
        variable: ValueRef,
        value: Option<IrNodeId>,
        origin: Option<IrOrigin>,
    },
    Const(ConstValue),
    StringConcatenation {
        arguments: Vec<Option<IrNodeId>>,
    },
    ThisReference {
        class: SymbolId,
    },
    SingletonReference {
        symbol: SymbolId,
        kind: SingletonKind,
    },
    ExtensionReceiverReference {
        callable: SymbolId,
    },
    When {
        branches: Vec<Option<IrNodeId>>,
        else_branch: Option<IrNodeId>,
        origin: Option<IrOrigin>,
    },
    Branch {
        condition: Option<IrNodeId>,
        result: Option<IrNodeId>,
    },
    Loop {
        kind: LoopKind,
        label: Option<String>,
        condition: Option<IrNodeId>,
        body: Option<IrNodeId>,
    },
    /// `loop_node` is a reference, not a child
    Break {
        loop_node: IrNodeId,
        label: Option<String>,
    },
    Continue {
        loop_node: IrNodeId,
        label: Option<String>,
    },
    Return {
        target: SymbolId,
        value: Option<IrNodeId>,
    },
    Throw {
        value: Option<IrNodeId>,
    },
    TryCatch {
        try_result: Option<IrNodeId>,
        catches: Vec<Option<IrNodeId>>,
        finally: Option<IrNodeId>,
    },
    Catch {
        parameter: SymbolId,
        result: Option<IrNodeId>,
    },
    TypeOperator {
        operator: TypeOperator,
        type_operand: TypeId,
        argument: Option<IrNodeId>,
    },
    /// Placeholder for a construct lowering does not support
    Error {
        description: String,
    },
}

/// Storage cell a slot maps to
pub(crate) enum SlotCell<'a> {
    Single(&'a mut Option<IrNodeId>),
    /// Fixed-arity list: only existing positions are slots
    Fixed(&'a mut Vec<Option<IrNodeId>>, usize),
    /// Growable list: index `len` appends
    Growable(&'a mut Vec<Option<IrNodeId>>, usize),
}

fn push_list(out: &mut Vec<(Slot, IrNodeId)>, list: &[Option<IrNodeId>], slot: fn(u32) -> Slot) {
    for (i, child) in list.iter().enumerate() {
        if let Some(child) = child {
            out.push((slot(i as u32), *child));
        }
    }
}

fn push_single(out: &mut Vec<(Slot, IrNodeId)>, child: &Option<IrNodeId>, slot: Slot) {
    if let Some(child) = child {
        out.push((slot, *child));
    }
}

impl IrKind {
    /// Occupied slots in their fixed traversal order
    pub fn children(&self) -> Vec<(Slot, IrNodeId)> {
        let mut out = Vec::new();
        match self {
            IrKind::Module { files, .. } => push_list(&mut out, files, Slot::File),
            IrKind::File { declarations, .. } => push_list(&mut out, declarations, Slot::Declaration),
            IrKind::Class { members, .. } => push_list(&mut out, members, Slot::Member),
            IrKind::Function { defaults, body, .. } => {
                push_list(&mut out, defaults, Slot::DefaultValue);
                push_single(&mut out, body, Slot::Body);
            }
            IrKind::Property { initializer, delegate, .. } => {
                push_single(&mut out, initializer, Slot::Initializer);
                push_single(&mut out, delegate, Slot::Delegate);
            }
            IrKind::EnumEntry { initializer, .. } | IrKind::LocalVariable { initializer, .. } => {
                push_single(&mut out, initializer, Slot::Initializer)
            }
            IrKind::Block { statements, .. } => push_list(&mut out, statements, Slot::Statement),
            IrKind::Call {
                dispatch_receiver,
                extension_receiver,
                arguments,
                ..
            } => {
                push_single(&mut out, dispatch_receiver, Slot::DispatchReceiver);
                push_single(&mut out, extension_receiver, Slot::ExtensionReceiver);
                push_list(&mut out, arguments, Slot::Argument);
            }
            IrKind::GetProperty {
                dispatch_receiver,
                extension_receiver,
                ..
            } => {
                push_single(&mut out, dispatch_receiver, Slot::DispatchReceiver);
                push_single(&mut out, extension_receiver, Slot::ExtensionReceiver);
            }
            IrKind::SetProperty {
                dispatch_receiver,
                extension_receiver,
                value,
                ..
            } => {
                push_single(&mut out, dispatch_receiver, Slot::DispatchReceiver);
                push_single(&mut out, extension_receiver, Slot::ExtensionReceiver);
                push_single(&mut out, value, Slot::Value);
            }
            IrKind::SetField { receiver, value, .. } => {
                push_single(&mut out, receiver, Slot::DispatchReceiver);
                push_single(&mut out, value, Slot::Value);
            }
            IrKind::SetVariable { value, .. }
            | IrKind::Return { value, .. }
            | IrKind::Throw { value } => push_single(&mut out, value, Slot::Value),
            IrKind::StringConcatenation { arguments } => {
                push_list(&mut out, arguments, Slot::Argument)
            }
            IrKind::When {
                branches,
                else_branch,
                ..
            } => {
                push_list(&mut out, branches, Slot::Branch);
                push_single(&mut out, else_branch, Slot::Else);
            }
            IrKind::Branch { condition, result } => {
                push_single(&mut out, condition, Slot::Condition);
                push_single(&mut out, result, Slot::Result);
            }
            IrKind::Loop {
                kind: LoopKind::While,
                condition,
                body,
                ..
            } => {
                push_single(&mut out, condition, Slot::Condition);
                push_single(&mut out, body, Slot::Body);
            }
            IrKind::Loop {
                kind: LoopKind::DoWhile,
                condition,
                body,
                ..
            } => {
                push_single(&mut out, body, Slot::Body);
                push_single(&mut out, condition, Slot::Condition);
            }
            IrKind::TryCatch {
                try_result,
                catches,
                finally,
            } => {
                push_single(&mut out, try_result, Slot::Try);
                push_list(&mut out, catches, Slot::Catch);
                push_single(&mut out, finally, Slot::Finally);
            }
            IrKind::Catch { result, .. } => push_single(&mut out, result, Slot::Result),
            IrKind::TypeOperator { argument, .. } => push_single(&mut out, argument, Slot::Operand),
            IrKind::ErrorDeclaration { .. }
            | IrKind::GetVariable { .. }
            | IrKind::Const(_)
            | IrKind::ThisReference { .. }
            | IrKind::SingletonReference { .. }
            | IrKind::ExtensionReceiverReference { .. }
            | IrKind::Break { .. }
            | IrKind::Continue { .. }
            | IrKind::Error { .. } => {}
        }
        out
    }

    /// Storage behind `slot`, or `None` if this kind declares no such slot
    pub(crate) fn slot_cell(&mut self, slot: Slot) -> Option<SlotCell<'_>> {
        use SlotCell::*;

        let cell = match (self, slot) {
            (IrKind::Module { files, .. }, Slot::File(i)) => Growable(files, i as usize),
            (IrKind::File { declarations, .. }, Slot::Declaration(i)) => {
                Growable(declarations, i as usize)
            }
            (IrKind::Class { members, .. }, Slot::Member(i)) => Growable(members, i as usize),
            (IrKind::Function { defaults, .. }, Slot::DefaultValue(i)) => Fixed(defaults, i as usize),
            (IrKind::Function { body, .. }, Slot::Body) => Single(body),
            (IrKind::Property { initializer, .. }, Slot::Initializer)
            | (IrKind::EnumEntry { initializer, .. }, Slot::Initializer)
            | (IrKind::LocalVariable { initializer, .. }, Slot::Initializer) => Single(initializer),
            (IrKind::Property { delegate, .. }, Slot::Delegate) => Single(delegate),
            (IrKind::Block { statements, .. }, Slot::Statement(i)) => Growable(statements, i as usize),
            (IrKind::Call { dispatch_receiver, .. }, Slot::DispatchReceiver)
            | (IrKind::GetProperty { dispatch_receiver, .. }, Slot::DispatchReceiver)
            | (IrKind::SetProperty { dispatch_receiver, .. }, Slot::DispatchReceiver)
            | (IrKind::SetField { receiver: dispatch_receiver, .. }, Slot::DispatchReceiver) => {
                Single(dispatch_receiver)
            }
            (IrKind::Call { extension_receiver, .. }, Slot::ExtensionReceiver)
            | (IrKind::GetProperty { extension_receiver, .. }, Slot::ExtensionReceiver)
            | (IrKind::SetProperty { extension_receiver, .. }, Slot::ExtensionReceiver) => {
                Single(extension_receiver)
            }
            (IrKind::Call { arguments, .. }, Slot::Argument(i)) => Fixed(arguments, i as usize),
            (IrKind::StringConcatenation { arguments }, Slot::Argument(i)) => {
                Growable(arguments, i as usize)
            }
            (IrKind::SetProperty { value, .. }, Slot::Value)
            | (IrKind::SetField { value, .. }, Slot::Value)
            | (IrKind::SetVariable { value, .. }, Slot::Value)
            | (IrKind::Return { value, .. }, Slot::Value)
            | (IrKind::Throw { value }, Slot::Value) => Single(value),
            (IrKind::When { branches, .. }, Slot::Branch(i)) => Growable(branches, i as usize),
            (IrKind::When { else_branch, .. }, Slot::Else) => Single(else_branch),
            (IrKind::Branch { condition, .. }, Slot::Condition)
            | (IrKind::Loop { condition, .. }, Slot::Condition) => Single(condition),
            (IrKind::Branch { result, .. }, Slot::Result)
            | (IrKind::Catch { result, .. }, Slot::Result) => Single(result),
            (IrKind::Loop { body, .. }, Slot::Body) => Single(body),
            (IrKind::TryCatch { try_result, .. }, Slot::Try) => Single(try_result),
            (IrKind::TryCatch { catches, .. }, Slot::Catch(i)) => Growable(catches, i as usize),
            (IrKind::TryCatch { finally, .. }, Slot::Finally) => Single(finally),
            (IrKind::TypeOperator { argument, .. }, Slot::Operand) => Single(argument),
            _ => return None,
        };
        Some(cell)
    }

    /// Slot constructor of the list that [`IrTree::append`](super::IrTree::append) grows
    pub(crate) fn append_slot(&self) -> Option<Slot> {
        let slot = match self {
            IrKind::Module { files, .. } => Slot::File(files.len() as u32),
            IrKind::File { declarations, .. } => Slot::Declaration(declarations.len() as u32),
            IrKind::Class { members, .. } => Slot::Member(members.len() as u32),
            IrKind::Block { statements, .. } => Slot::Statement(statements.len() as u32),
            IrKind::StringConcatenation { arguments } => Slot::Argument(arguments.len() as u32),
            IrKind::When { branches, .. } => Slot::Branch(branches.len() as u32),
            IrKind::TryCatch { catches, .. } => Slot::Catch(catches.len() as u32),
            _ => return None,
        };
        Some(slot)
    }
}

/// One arena entry
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub span: Span,
    /// Absent for declarations and statement-only constructs
    pub ty: Option<TypeId>,
    pub location: TreeLocation,
    pub kind: IrKind,
}
