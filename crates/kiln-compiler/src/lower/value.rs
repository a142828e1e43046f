//! Values that lowering reads more than once

use kiln_ast::{NodeId, Span, SymbolKind, SymbolTable};
use kiln_types::TypeId;
use rustc_hash::FxHashMap;

use crate::error::{CompileError, CompileResult};
use crate::ir::{IrKind, IrNodeId, IrTree, TemporaryId, ValueRef};

/// A lowered value that can be loaded where it is needed
#[derive(Debug, Clone)]
pub(crate) enum IrValue {
    /// Stable reference; the first load hands out the node itself, later
    /// loads hand out copies
    Rematerializable { node: IrNodeId, used: bool },
    /// Value bound to a lowering temporary
    Temporary {
        temp: TemporaryId,
        ty: Option<TypeId>,
        span: Span,
    },
    /// Already lowered expression usable exactly once
    Once(Option<IrNodeId>),
}

impl IrValue {
    pub(crate) fn rematerializable(node: IrNodeId) -> Self {
        IrValue::Rematerializable { node, used: false }
    }

    pub(crate) fn once(node: IrNodeId) -> Self {
        IrValue::Once(Some(node))
    }

    /// A detached node producing the value
    pub(crate) fn load(&mut self, tree: &mut IrTree) -> CompileResult<IrNodeId> {
        match self {
            IrValue::Rematerializable { node, used } => {
                if !*used {
                    *used = true;
                    return Ok(*node);
                }
                let template = tree.node(*node);
                let (span, ty, kind) = (template.span, template.ty, template.kind.clone());
                Ok(tree.add(span, ty, kind))
            }
            IrValue::Temporary { temp, ty, span } => Ok(tree.add(
                *span,
                *ty,
                IrKind::GetVariable {
                    variable: ValueRef::Temporary(*temp),
                    origin: None,
                },
            )),
            IrValue::Once(node) => node
                .take()
                .ok_or_else(|| CompileError::internal("single-use value loaded twice")),
        }
    }
}

/// Pre-lowered values standing in for AST expressions during call lowering
#[derive(Debug, Default)]
pub(crate) struct CallValues {
    values: FxHashMap<NodeId, IrValue>,
}

impl CallValues {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, expression: NodeId, value: IrValue) -> Self {
        self.insert(expression, value);
        self
    }

    pub(crate) fn insert(&mut self, expression: NodeId, value: IrValue) {
        self.values.insert(expression, value);
    }

    pub(crate) fn get_mut(&mut self, expression: NodeId) -> Option<&mut IrValue> {
        self.values.get_mut(&expression)
    }
}

/// Re-reading the node yields the same value with no side effect
///
/// Holds for reads of immutable locals, parameters and temporaries, and for
/// `this`, extension receiver and singleton references. Constants are
/// deliberately excluded.
pub(crate) fn is_rematerializable(tree: &IrTree, symbols: &SymbolTable, node: IrNodeId) -> bool {
    match tree.kind(node) {
        IrKind::GetVariable {
            variable: ValueRef::Temporary(_),
            ..
        } => true,
        IrKind::GetVariable {
            variable: ValueRef::Symbol(symbol),
            ..
        } => matches!(
            symbols.get(*symbol).map(|s| &s.kind),
            Some(SymbolKind::Variable(info)) | Some(SymbolKind::ValueParameter(info)) if !info.mutable
        ),
        IrKind::ThisReference { .. }
        | IrKind::ExtensionReceiverReference { .. }
        | IrKind::SingletonReference { .. } => true,
        _ => false,
    }
}
