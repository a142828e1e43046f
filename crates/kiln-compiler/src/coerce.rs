//! Implicit coercion insertion
//!
//! Walks a finished tree and wraps every expression whose type does not fit
//! the type expected at its position:
//!
//! 1. A platform type that admits null where null is not accepted gets an
//!    `IMPLICIT_NOTNULL` narrowing to its non-null variant.
//! 2. If the non-null type is still not a subtype of the expectation, an
//!    `IMPLICIT_CAST` to the expected type is added on top.
//!
//! Children are processed before their parent. Coercion nodes have exactly
//! the type they were checked against, so a second run finds nothing to do.

use kiln_ast::{SymbolId, SymbolTable};
use kiln_types::{SubtypingContext, TypeContext, TypeId};
use log::debug;

use crate::error::CompileResult;
use crate::ir::{
    Dispatcher, DispatcherBuilder, IrKind, IrNodeId, IrTree, NodeKind, Slot, TreeView,
    TypeOperator, ValueRef,
};

struct Coercer<'a> {
    tree: &'a mut IrTree,
    symbols: &'a SymbolTable,
    types: &'a TypeContext,
    inserted: usize,
}

impl TreeView for Coercer<'_> {
    fn tree(&self) -> &IrTree {
        self.tree
    }
}

type CoercionDispatcher<'a> = Dispatcher<Coercer<'a>, CompileResult<()>>;

/// Insert coercions under `root`, returning how many nodes were added
pub fn insert_implicit_casts(
    tree: &mut IrTree,
    symbols: &SymbolTable,
    types: &TypeContext,
    root: IrNodeId,
) -> CompileResult<usize> {
    let dispatcher = DispatcherBuilder::new(visit_element)
        .on(NodeKind::Function, visit_function)
        .on(NodeKind::Property, visit_property)
        .on(NodeKind::LocalVariable, visit_local_variable)
        .on(NodeKind::Block, visit_block)
        .on(NodeKind::Call, visit_call)
        .on(NodeKind::PropertyAccess, visit_property_access)
        .on(NodeKind::SetField, visit_set_field)
        .on(NodeKind::SetVariable, visit_set_variable)
        .on(NodeKind::When, visit_when)
        .on(NodeKind::Loop, visit_loop)
        .on(NodeKind::Return, visit_return)
        .on(NodeKind::Throw, visit_throw)
        .on(NodeKind::TryCatch, visit_try)
        .build();

    let mut coercer = Coercer {
        tree,
        symbols,
        types,
        inserted: 0,
    };
    dispatcher.visit(&mut coercer, root)?;
    debug!("inserted {} implicit coercion(s)", coercer.inserted);
    Ok(coercer.inserted)
}

impl Coercer<'_> {
    /// Coerce the node at `slot` of `parent` to `expected`
    fn coerce(&mut self, parent: IrNodeId, slot: Slot, expected: Option<TypeId>) -> CompileResult<()> {
        let Some(expected) = expected else {
            return Ok(());
        };
        if self.types.is_error(expected) || self.types.is_unit(expected) {
            return Ok(());
        }
        let Some(node) = self.tree.child(parent, slot) else {
            return Ok(());
        };
        let Some(actual) = self.tree.ty(node) else {
            return Ok(());
        };
        if self.types.is_error(actual) {
            return Ok(());
        }

        let mut current = actual;
        if self.types.is_nullability_flexible(actual)
            && self.types.is_nullable(actual)
            && !self.types.is_nullable(expected)
        {
            current = self.types.make_not_nullable(actual);
            self.wrap(parent, slot, TypeOperator::ImplicitNotNull, current)?;
        }

        let subtyping = SubtypingContext::new(self.types);
        let stripped = self.types.make_not_nullable(current);
        if !subtyping.is_subtype(stripped, expected) {
            self.wrap(parent, slot, TypeOperator::ImplicitCast, expected)?;
        }
        Ok(())
    }

    /// Replace the occupant of `slot` with a coercion node holding it
    fn wrap(&mut self, parent: IrNodeId, slot: Slot, operator: TypeOperator, ty: TypeId) -> CompileResult<()> {
        let Some(node) = self.tree.child(parent, slot) else {
            return Ok(());
        };
        let span = self.tree.span(node);
        let coercion = self.tree.add(
            span,
            Some(ty),
            IrKind::TypeOperator {
                operator,
                type_operand: ty,
                argument: None,
            },
        );
        self.tree.replace_child(parent, slot, coercion)?;
        self.tree.attach(node, coercion, Slot::Operand)?;
        self.inserted += 1;
        Ok(())
    }

    fn return_type(&self, callable: SymbolId) -> Option<TypeId> {
        self.symbols.get(callable).and_then(|s| s.value_type())
    }

    fn variable_type(&self, variable: ValueRef) -> Option<TypeId> {
        match variable {
            ValueRef::Symbol(symbol) => self.symbols.get(symbol).and_then(|s| s.value_type()),
            ValueRef::Temporary(temp) => self.tree.temporary(temp).and_then(|t| t.ty),
        }
    }

    fn boolean(&self) -> Option<TypeId> {
        Some(self.types.boolean_type())
    }
}

fn visit_element<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)
}

fn visit_function<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let IrKind::Function { symbol, defaults, .. } = v.tree.kind(node) else {
        return Ok(());
    };
    let arity = defaults.len();
    let parameters: Vec<TypeId> = v
        .symbols
        .get(*symbol)
        .and_then(|s| s.as_callable())
        .map(|sig| sig.parameters.iter().map(|p| p.ty).collect())
        .unwrap_or_default();
    for index in 0..arity {
        v.coerce(node, Slot::DefaultValue(index as u32), parameters.get(index).copied())?;
    }
    Ok(())
}

fn visit_property<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    if let IrKind::Property { symbol, .. } = v.tree.kind(node) {
        let expected = v.symbols.get(*symbol).and_then(|s| s.value_type());
        v.coerce(node, Slot::Initializer, expected)?;
    }
    Ok(())
}

fn visit_local_variable<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    if let IrKind::LocalVariable { variable, .. } = v.tree.kind(node) {
        let expected = v.variable_type(*variable);
        v.coerce(node, Slot::Initializer, expected)?;
    }
    Ok(())
}

fn visit_block<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let IrKind::Block { has_result: true, .. } = v.tree.kind(node) else {
        return Ok(());
    };
    let last = v.tree.children(node).last().map(|(slot, _)| *slot);
    if let Some(slot) = last {
        let expected = v.tree.ty(node);
        v.coerce(node, slot, expected)?;
    }
    Ok(())
}

fn visit_call<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let IrKind::Call { callee, arguments, .. } = v.tree.kind(node) else {
        return Ok(());
    };
    let arity = arguments.len();
    let Some(signature) = v.symbols.get(*callee).and_then(|s| s.as_callable()) else {
        return Ok(());
    };
    let dispatch = signature.dispatch_receiver;
    let extension = signature.extension_receiver;
    let parameters: Vec<TypeId> = signature.parameters.iter().map(|p| p.ty).collect();

    v.coerce(node, Slot::DispatchReceiver, dispatch)?;
    v.coerce(node, Slot::ExtensionReceiver, extension)?;
    for index in 0..arity {
        v.coerce(node, Slot::Argument(index as u32), parameters.get(index).copied())?;
    }
    Ok(())
}

fn visit_property_access<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let (property, has_value) = match v.tree.kind(node) {
        IrKind::GetProperty { property, .. } => (*property, false),
        IrKind::SetProperty { property, .. } => (*property, true),
        _ => return Ok(()),
    };
    let Some(signature) = v.symbols.get(property).and_then(|s| s.as_property()) else {
        return Ok(());
    };
    let (dispatch, extension, ty) = (signature.dispatch_receiver, signature.extension_receiver, signature.ty);

    v.coerce(node, Slot::DispatchReceiver, dispatch)?;
    v.coerce(node, Slot::ExtensionReceiver, extension)?;
    if has_value {
        v.coerce(node, Slot::Value, Some(ty))?;
    }
    Ok(())
}

fn visit_set_field<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    if let IrKind::SetField { property, .. } = v.tree.kind(node) {
        let expected = v.symbols.get(*property).and_then(|s| s.value_type());
        v.coerce(node, Slot::Value, expected)?;
    }
    Ok(())
}

fn visit_set_variable<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    if let IrKind::SetVariable { variable, .. } = v.tree.kind(node) {
        let expected = v.variable_type(*variable);
        v.coerce(node, Slot::Value, expected)?;
    }
    Ok(())
}

/// Branch conditions against `Boolean`, branch results against the `When` type
fn visit_when<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let expected = v.tree.ty(node);
    let boolean = v.boolean();
    for (slot, child) in v.tree.children(node) {
        match slot {
            Slot::Branch(_) => {
                v.coerce(child, Slot::Condition, boolean)?;
                v.coerce(child, Slot::Result, expected)?;
            }
            Slot::Else => v.coerce(node, Slot::Else, expected)?,
            _ => {}
        }
    }
    Ok(())
}

fn visit_loop<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let boolean = v.boolean();
    v.coerce(node, Slot::Condition, boolean)
}

fn visit_return<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    if let IrKind::Return { target, .. } = v.tree.kind(node) {
        let expected = v.return_type(*target);
        v.coerce(node, Slot::Value, expected)?;
    }
    Ok(())
}

fn visit_throw<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let throwable = Some(v.types.throwable_type());
    v.coerce(node, Slot::Value, throwable)
}

fn visit_try<'a>(d: &CoercionDispatcher<'a>, v: &mut Coercer<'a>, node: IrNodeId) -> CompileResult<()> {
    d.try_visit_children(v, node)?;
    let expected = v.tree.ty(node);
    for (slot, child) in v.tree.children(node) {
        match slot {
            Slot::Try => v.coerce(node, Slot::Try, expected)?,
            Slot::Catch(_) => v.coerce(child, Slot::Result, expected)?,
            _ => {}
        }
    }
    Ok(())
}
