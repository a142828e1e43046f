//! AST to IR lowering
//!
//! Converts the resolved AST into the IR tree. Every construct is lowered
//! bottom-up into detached nodes that the caller attaches where they belong.
//! Per-body state (loop table, temporary counter, return owner) travels in a
//! [`BodyContext`] passed down explicitly.

mod assign;
mod call;
mod control_flow;
mod decl;
mod expr;
mod stmt;
mod value;

use kiln_ast::{AstIndex, BindingContext, NodeId, Span, SymbolId, SymbolTable};
use kiln_types::{TypeContext, TypeId};
use log::{trace, warn};
use rustc_hash::FxHashMap;

use crate::error::{CompileError, CompileResult};
use crate::ir::{ConstValue, IrKind, IrNodeId, IrOrigin, IrTree, Slot, ValueRef};

pub(crate) use value::{CallValues, IrValue};

/// A construct that was lowered to a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub span: Span,
    pub description: String,
}

/// State private to the lowering of one callable or initializer body
pub(crate) struct BodyContext {
    /// Target of unlabeled `return`
    owner: SymbolId,
    /// Loop nodes keyed by their AST loop, registered before the body is lowered
    loops: FxHashMap<NodeId, IrNodeId>,
    loop_stack: Vec<NodeId>,
    next_temporary: u32,
}

impl BodyContext {
    pub(crate) fn new(owner: SymbolId) -> Self {
        Self {
            owner,
            loops: FxHashMap::default(),
            loop_stack: Vec::new(),
            next_temporary: 0,
        }
    }
}

pub(crate) struct Lowerer<'a> {
    index: &'a AstIndex<'a>,
    bindings: &'a BindingContext,
    symbols: &'a SymbolTable,
    types: &'a mut TypeContext,
    tree: &'a mut IrTree,
    unsupported: Vec<Unsupported>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(
        index: &'a AstIndex<'a>,
        bindings: &'a BindingContext,
        symbols: &'a SymbolTable,
        types: &'a mut TypeContext,
        tree: &'a mut IrTree,
    ) -> Self {
        Self {
            index,
            bindings,
            symbols,
            types,
            tree,
            unsupported: Vec::new(),
        }
    }

    pub(crate) fn into_unsupported(self) -> Vec<Unsupported> {
        self.unsupported
    }

    // ========================================================================
    // Node construction helpers
    // ========================================================================

    fn add(&mut self, span: Span, ty: Option<TypeId>, kind: IrKind) -> IrNodeId {
        self.tree.add(span, ty, kind)
    }

    fn attach(&mut self, node: IrNodeId, parent: IrNodeId, slot: Slot) -> CompileResult<()> {
        self.tree.attach(node, parent, slot)?;
        Ok(())
    }

    fn append(&mut self, parent: IrNodeId, node: IrNodeId) -> CompileResult<()> {
        self.tree.append(parent, node)?;
        Ok(())
    }

    fn attach_opt(&mut self, node: Option<IrNodeId>, parent: IrNodeId, slot: Slot) -> CompileResult<()> {
        if let Some(node) = node {
            self.attach(node, parent, slot)?;
        }
        Ok(())
    }

    fn block(&mut self, span: Span, ty: Option<TypeId>, has_result: bool, origin: Option<IrOrigin>) -> IrNodeId {
        self.add(
            span,
            ty,
            IrKind::Block {
                statements: Vec::new(),
                has_result,
                origin,
            },
        )
    }

    fn constant(&mut self, span: Span, value: ConstValue) -> IrNodeId {
        let ty = match &value {
            ConstValue::Null => self.types.null_type(),
            ConstValue::Boolean(_) => self.types.boolean_type(),
            ConstValue::String(_) => self.types.string_type(),
            ConstValue::Int(_) => self.types.int_type(),
            ConstValue::Long(_) => self.types.builtin(kiln_types::BuiltinType::Long),
            ConstValue::Double(_) => self.types.builtin(kiln_types::BuiltinType::Double),
            ConstValue::Char(_) => self.types.builtin(kiln_types::BuiltinType::Char),
        };
        self.add(span, Some(ty), IrKind::Const(value))
    }

    /// `EQEQ(left, right)`
    fn equals(&mut self, span: Span, left: IrNodeId, right: IrNodeId, origin: IrOrigin) -> CompileResult<IrNodeId> {
        let call = self.add(
            span,
            Some(self.types.boolean_type()),
            IrKind::Call {
                callee: self.symbols.builtins().equals,
                dispatch_receiver: None,
                extension_receiver: None,
                arguments: vec![None, None],
                origin: Some(origin),
                super_qualifier: None,
            },
        );
        self.attach(left, call, Slot::Argument(0))?;
        self.attach(right, call, Slot::Argument(1))?;
        Ok(call)
    }

    /// Detach the only statement of a block, or keep the block if it has several
    fn unwrap_single(&mut self, block: IrNodeId) -> CompileResult<IrNodeId> {
        let children = self.tree.children(block);
        if let [(_, only)] = children.as_slice() {
            let only = *only;
            self.tree.detach(only)?;
            return Ok(only);
        }
        Ok(block)
    }

    // ========================================================================
    // Resolution lookups
    // ========================================================================

    fn declared_symbol(&self, node: NodeId) -> CompileResult<SymbolId> {
        self.bindings
            .declaration(node)
            .ok_or_else(|| CompileError::missing("declared symbol", node))
    }

    fn expression_type(&self, node: NodeId) -> Option<TypeId> {
        self.bindings.expression_type(node)
    }

    /// Recorded type, falling back to `Unit` for statement-like constructs
    fn type_or_unit(&self, node: NodeId) -> TypeId {
        self.expression_type(node)
            .unwrap_or_else(|| self.types.unit_type())
    }

    fn symbol_type(&self, symbol: SymbolId) -> Option<TypeId> {
        self.symbols.get(symbol).and_then(|s| s.value_type())
    }

    // ========================================================================
    // Temporaries and placeholders
    // ========================================================================

    /// Bind `node` to a fresh temporary declared in `block`
    fn temporary(&mut self, body: &mut BodyContext, block: IrNodeId, node: IrNodeId, hint: &str) -> CompileResult<IrValue> {
        let ty = self.tree.ty(node);
        let span = self.tree.span(node);
        let name = format!("tmp{}_{}", body.next_temporary, hint);
        body.next_temporary += 1;
        trace!("introducing temporary {} for {}", name, node);

        let temp = self.tree.add_temporary(name, ty);
        let decl = self.add(
            span,
            None,
            IrKind::LocalVariable {
                variable: ValueRef::Temporary(temp),
                initializer: None,
            },
        );
        self.attach(node, decl, Slot::Initializer)?;
        self.append(block, decl)?;
        Ok(IrValue::Temporary { temp, ty, span })
    }

    /// Make `node` reusable: stable references are kept as they are, anything
    /// else is bound to a temporary in `block`
    fn materialize(&mut self, body: &mut BodyContext, block: IrNodeId, node: IrNodeId, hint: &str) -> CompileResult<IrValue> {
        if value::is_rematerializable(self.tree, self.symbols, node) {
            return Ok(IrValue::rematerializable(node));
        }
        self.temporary(body, block, node, hint)
    }

    /// Error placeholder for a construct lowering does not handle
    fn unsupported(&mut self, span: Span, ty: Option<TypeId>, description: impl Into<String>) -> IrNodeId {
        let description = description.into();
        warn!("unsupported construct at {}: {}", span, description);
        self.unsupported.push(Unsupported {
            span,
            description: description.clone(),
        });
        self.add(span, ty, IrKind::Error { description })
    }

    fn unsupported_declaration(&mut self, span: Span, description: impl Into<String>) -> IrNodeId {
        let description = description.into();
        warn!("unsupported declaration at {}: {}", span, description);
        self.unsupported.push(Unsupported {
            span,
            description: description.clone(),
        });
        self.add(span, None, IrKind::ErrorDeclaration { description })
    }
}
