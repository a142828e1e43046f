//! Node kind tags and their generalization chain
//!
//! Visitors register handlers per [`NodeKind`]. A node without a handler of
//! its own is handled by the nearest generalization that has one:
//!
//! ```text
//! Constructor -> Function -> Declaration -> Element
//! SafeCall -> Block -> Expression -> Element
//! GetVariable -> VariableAccess -> DeclarationReference -> Expression -> Element
//! ```

use super::node::{FunctionKind, IrKind, IrOrigin, LoopKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,

    Declaration,
    Container,
    Module,
    File,
    Class,
    Function,
    Constructor,
    Accessor,
    Property,
    EnumEntry,
    LocalVariable,
    ErrorDeclaration,

    Expression,
    Block,
    SafeCall,
    MemberAccess,
    Call,
    PropertyAccess,
    GetProperty,
    SetProperty,
    SetField,
    DeclarationReference,
    VariableAccess,
    GetVariable,
    SetVariable,
    ThisReference,
    SingletonReference,
    ExtensionReceiverReference,
    Const,
    StringConcatenation,
    When,
    Loop,
    WhileLoop,
    DoWhileLoop,
    Jump,
    Break,
    Continue,
    Return,
    Throw,
    TryCatch,
    TypeOperator,
    Error,

    Branch,
    Catch,
}

impl NodeKind {
    pub const ALL: [NodeKind; 45] = [
        NodeKind::Element,
        NodeKind::Declaration,
        NodeKind::Container,
        NodeKind::Module,
        NodeKind::File,
        NodeKind::Class,
        NodeKind::Function,
        NodeKind::Constructor,
        NodeKind::Accessor,
        NodeKind::Property,
        NodeKind::EnumEntry,
        NodeKind::LocalVariable,
        NodeKind::ErrorDeclaration,
        NodeKind::Expression,
        NodeKind::Block,
        NodeKind::SafeCall,
        NodeKind::MemberAccess,
        NodeKind::Call,
        NodeKind::PropertyAccess,
        NodeKind::GetProperty,
        NodeKind::SetProperty,
        NodeKind::SetField,
        NodeKind::DeclarationReference,
        NodeKind::VariableAccess,
        NodeKind::GetVariable,
        NodeKind::SetVariable,
        NodeKind::ThisReference,
        NodeKind::SingletonReference,
        NodeKind::ExtensionReceiverReference,
        NodeKind::Const,
        NodeKind::StringConcatenation,
        NodeKind::When,
        NodeKind::Loop,
        NodeKind::WhileLoop,
        NodeKind::DoWhileLoop,
        NodeKind::Jump,
        NodeKind::Break,
        NodeKind::Continue,
        NodeKind::Return,
        NodeKind::Throw,
        NodeKind::TryCatch,
        NodeKind::TypeOperator,
        NodeKind::Error,
        NodeKind::Branch,
        NodeKind::Catch,
    ];

    pub const COUNT: usize = NodeKind::Catch as usize + 1;

    /// Dense index for dispatch tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Next more general kind, `None` only for `Element`
    pub fn parent(self) -> Option<NodeKind> {
        use NodeKind::*;

        let parent = match self {
            Element => return None,
            Declaration | Expression | Branch | Catch => Element,
            Container | Function | Property | EnumEntry | LocalVariable | ErrorDeclaration => {
                Declaration
            }
            Module | File | Class => Container,
            Constructor | Accessor => Function,
            Block | MemberAccess | SetField | DeclarationReference | Const
            | StringConcatenation | When | Loop | Jump | Return | Throw | TryCatch
            | TypeOperator | Error => Expression,
            SafeCall => Block,
            Call | PropertyAccess => MemberAccess,
            GetProperty | SetProperty => PropertyAccess,
            VariableAccess | ThisReference | SingletonReference | ExtensionReceiverReference => {
                DeclarationReference
            }
            GetVariable | SetVariable => VariableAccess,
            WhileLoop | DoWhileLoop => Loop,
            Break | Continue => Jump,
        };
        Some(parent)
    }

    /// This kind followed by every generalization up to `Element`
    pub fn chain(self) -> impl Iterator<Item = NodeKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    pub fn is_a(self, general: NodeKind) -> bool {
        self.chain().any(|kind| kind == general)
    }
}

impl IrKind {
    /// Most specific tag of this payload
    pub fn node_kind(&self) -> NodeKind {
        match self {
            IrKind::Module { .. } => NodeKind::Module,
            IrKind::File { .. } => NodeKind::File,
            IrKind::Class { .. } => NodeKind::Class,
            IrKind::Function { kind, .. } => match kind {
                FunctionKind::Function => NodeKind::Function,
                FunctionKind::Constructor => NodeKind::Constructor,
                FunctionKind::Getter | FunctionKind::Setter => NodeKind::Accessor,
            },
            IrKind::Property { .. } => NodeKind::Property,
            IrKind::EnumEntry { .. } => NodeKind::EnumEntry,
            IrKind::LocalVariable { .. } => NodeKind::LocalVariable,
            IrKind::ErrorDeclaration { .. } => NodeKind::ErrorDeclaration,
            IrKind::Block {
                origin: Some(IrOrigin::SafeCall),
                ..
            } => NodeKind::SafeCall,
            IrKind::Block { .. } => NodeKind::Block,
            IrKind::Call { .. } => NodeKind::Call,
            IrKind::GetProperty { .. } => NodeKind::GetProperty,
            IrKind::SetProperty { .. } => NodeKind::SetProperty,
            IrKind::SetField { .. } => NodeKind::SetField,
            IrKind::GetVariable { .. } => NodeKind::GetVariable,
            IrKind::SetVariable { .. } => NodeKind::SetVariable,
            IrKind::Const(_) => NodeKind::Const,
            IrKind::StringConcatenation { .. } => NodeKind::StringConcatenation,
            IrKind::ThisReference { .. } => NodeKind::ThisReference,
            IrKind::SingletonReference { .. } => NodeKind::SingletonReference,
            IrKind::ExtensionReceiverReference { .. } => NodeKind::ExtensionReceiverReference,
            IrKind::When { .. } => NodeKind::When,
            IrKind::Branch { .. } => NodeKind::Branch,
            IrKind::Loop {
                kind: LoopKind::While,
                ..
            } => NodeKind::WhileLoop,
            IrKind::Loop {
                kind: LoopKind::DoWhile,
                ..
            } => NodeKind::DoWhileLoop,
            IrKind::Break { .. } => NodeKind::Break,
            IrKind::Continue { .. } => NodeKind::Continue,
            IrKind::Return { .. } => NodeKind::Return,
            IrKind::Throw { .. } => NodeKind::Throw,
            IrKind::TryCatch { .. } => NodeKind::TryCatch,
            IrKind::Catch { .. } => NodeKind::Catch,
            IrKind::TypeOperator { .. } => NodeKind::TypeOperator,
            IrKind::Error { .. } => NodeKind::Error,
        }
    }
}
