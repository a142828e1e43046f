//! Resolution tables produced by semantic analysis
//!
//! Lowering queries these by syntax node identity and never re-derives
//! anything recorded here.

use kiln_types::TypeId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::span::NodeId;
use crate::symbols::SymbolId;

/// How the resolver classified a receiver
#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    /// Implicit instance of an enclosing class
    ImplicitThis { class: SymbolId, ty: TypeId },
    /// Explicit `this` or `this@Label` written as the receiver
    QualifiedThis {
        class: SymbolId,
        ty: TypeId,
        expression: NodeId,
    },
    /// Arbitrary receiver expression
    Expression { expression: NodeId, ty: TypeId },
    /// Object or companion object value, written or implicit
    Singleton {
        class: SymbolId,
        ty: TypeId,
        expression: Option<NodeId>,
    },
    /// Implicit receiver of an enclosing extension callable
    ExtensionReceiver { callable: SymbolId, ty: TypeId },
    /// A receiver form the resolver produced but lowering has no rule for
    Unknown { description: String },
}

impl Receiver {
    /// Syntax node the receiver was written as, if any
    pub fn expression(&self) -> Option<NodeId> {
        match self {
            Receiver::QualifiedThis { expression, .. } | Receiver::Expression { expression, .. } => {
                Some(*expression)
            }
            Receiver::Singleton { expression, .. } => *expression,
            _ => None,
        }
    }

    pub fn ty(&self) -> Option<TypeId> {
        match self {
            Receiver::ImplicitThis { ty, .. }
            | Receiver::QualifiedThis { ty, .. }
            | Receiver::Expression { ty, .. }
            | Receiver::Singleton { ty, .. }
            | Receiver::ExtensionReceiver { ty, .. } => Some(*ty),
            Receiver::Unknown { .. } => None,
        }
    }
}

/// Argument bound to one value parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValueArgument {
    /// Single argument expression
    Expression(NodeId),
    /// No argument supplied; the parameter's default applies
    Default,
    /// Arguments collected into a vararg parameter
    Vararg(Vec<NodeId>),
}

static DEFAULT_ARGUMENT: ResolvedValueArgument = ResolvedValueArgument::Default;

/// Resolution of one call-shaped node
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub callee: SymbolId,
    pub dispatch_receiver: Option<Receiver>,
    pub extension_receiver: Option<Receiver>,
    /// Indexed by value parameter
    pub value_arguments: Vec<ResolvedValueArgument>,
    /// Parameter index of every supplied argument, in source evaluation order
    pub evaluation_order: Vec<u32>,
    /// Class named by `super<T>` / `super` qualification
    pub super_qualifier: Option<SymbolId>,
}

impl ResolvedCall {
    pub fn new(callee: SymbolId) -> Self {
        Self {
            callee,
            dispatch_receiver: None,
            extension_receiver: None,
            value_arguments: Vec::new(),
            evaluation_order: Vec::new(),
            super_qualifier: None,
        }
    }

    pub fn with_dispatch_receiver(mut self, receiver: Receiver) -> Self {
        self.dispatch_receiver = Some(receiver);
        self
    }

    pub fn with_extension_receiver(mut self, receiver: Receiver) -> Self {
        self.extension_receiver = Some(receiver);
        self
    }

    pub fn with_super_qualifier(mut self, class: SymbolId) -> Self {
        self.super_qualifier = Some(class);
        self
    }

    /// Bind the next source-order argument to parameter `index`
    pub fn with_argument(mut self, index: u32, expression: NodeId) -> Self {
        self.bind(index, ResolvedValueArgument::Expression(expression));
        self.evaluation_order.push(index);
        self
    }

    /// Mark parameter `index` as taking its default value
    pub fn with_default(mut self, index: u32) -> Self {
        self.bind(index, ResolvedValueArgument::Default);
        self
    }

    /// Bind a group of source-order arguments to vararg parameter `index`
    pub fn with_vararg(mut self, index: u32, expressions: Vec<NodeId>) -> Self {
        self.bind(index, ResolvedValueArgument::Vararg(expressions));
        self.evaluation_order.push(index);
        self
    }

    fn bind(&mut self, index: u32, argument: ResolvedValueArgument) {
        let index = index as usize;
        if self.value_arguments.len() <= index {
            self.value_arguments
                .resize(index + 1, ResolvedValueArgument::Default);
        }
        self.value_arguments[index] = argument;
    }

    /// Argument for parameter `index`; parameters past the recorded ones take defaults
    pub fn argument(&self, index: usize) -> &ResolvedValueArgument {
        self.value_arguments
            .get(index)
            .unwrap_or(&DEFAULT_ARGUMENT)
    }
}

/// All resolution results for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    expression_types: FxHashMap<NodeId, TypeId>,
    resolved_calls: FxHashMap<NodeId, ResolvedCall>,
    declarations: FxHashMap<NodeId, SymbolId>,
    used_as_expression: FxHashSet<NodeId>,
    reassignments: FxHashMap<NodeId, bool>,
    label_targets: FxHashMap<NodeId, NodeId>,
    component_calls: FxHashMap<NodeId, ResolvedCall>,
    this_targets: FxHashMap<NodeId, SymbolId>,
    type_references: FxHashMap<NodeId, TypeId>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    pub fn record_type(&mut self, node: NodeId, ty: TypeId) {
        self.expression_types.insert(node, ty);
    }

    pub fn record_call(&mut self, node: NodeId, call: ResolvedCall) {
        self.resolved_calls.insert(node, call);
    }

    /// Symbol declared by a declaration, parameter or catch clause node
    pub fn record_declaration(&mut self, node: NodeId, symbol: SymbolId) {
        self.declarations.insert(node, symbol);
    }

    pub fn record_used_as_expression(&mut self, node: NodeId) {
        self.used_as_expression.insert(node);
    }

    /// Whether a compound assignment stores its operator result back
    pub fn record_reassignment(&mut self, node: NodeId, is_reassignment: bool) {
        self.reassignments.insert(node, is_reassignment);
    }

    /// Target of a labeled `return`, `break` or `continue`
    pub fn record_label_target(&mut self, node: NodeId, target: NodeId) {
        self.label_targets.insert(node, target);
    }

    pub fn record_component_call(&mut self, entry: NodeId, call: ResolvedCall) {
        self.component_calls.insert(entry, call);
    }

    /// Class or extension callable a `this` expression refers to
    pub fn record_this_target(&mut self, node: NodeId, target: SymbolId) {
        self.this_targets.insert(node, target);
    }

    pub fn record_type_reference(&mut self, node: NodeId, ty: TypeId) {
        self.type_references.insert(node, ty);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn expression_type(&self, node: NodeId) -> Option<TypeId> {
        self.expression_types.get(&node).copied()
    }

    pub fn resolved_call(&self, node: NodeId) -> Option<&ResolvedCall> {
        self.resolved_calls.get(&node)
    }

    pub fn declaration(&self, node: NodeId) -> Option<SymbolId> {
        self.declarations.get(&node).copied()
    }

    pub fn is_used_as_expression(&self, node: NodeId) -> bool {
        self.used_as_expression.contains(&node)
    }

    pub fn is_reassignment(&self, node: NodeId) -> Option<bool> {
        self.reassignments.get(&node).copied()
    }

    pub fn label_target(&self, node: NodeId) -> Option<NodeId> {
        self.label_targets.get(&node).copied()
    }

    pub fn component_call(&self, entry: NodeId) -> Option<&ResolvedCall> {
        self.component_calls.get(&entry)
    }

    pub fn this_target(&self, node: NodeId) -> Option<SymbolId> {
        self.this_targets.get(&node).copied()
    }

    pub fn type_reference(&self, node: NodeId) -> Option<TypeId> {
        self.type_references.get(&node).copied()
    }
}
