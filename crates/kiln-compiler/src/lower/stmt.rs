//! Block and statement lowering

use kiln_ast::ast::{Block, DestructuringDecl, Statement, VariableDecl};

use super::call::CallSite;
use super::{BodyContext, CallValues, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IrKind, IrNodeId, IrOrigin, Slot, ValueRef};

impl<'a> Lowerer<'a> {
    /// Lower a block; it yields its last statement only when used as an expression
    pub(crate) fn lower_block(&mut self, body: &mut BodyContext, block: &'a Block) -> CompileResult<IrNodeId> {
        let has_result = self.bindings.is_used_as_expression(block.id);
        let ty = if has_result {
            self.expression_type(block.id)
        } else {
            Some(self.types.unit_type())
        };
        let node = self.block(block.span, ty, has_result, None);
        self.lower_statements(body, node, &block.statements)?;

        if has_result && ty.is_none() {
            let last = self.tree.children(node).last().map(|(_, child)| *child);
            let ty = last.and_then(|last| self.tree.ty(last));
            self.tree.set_ty(node, ty);
        }
        Ok(node)
    }

    /// Lower statements in order, appending them to `block`
    pub(crate) fn lower_statements(&mut self, body: &mut BodyContext, block: IrNodeId, statements: &'a [Statement]) -> CompileResult<()> {
        for statement in statements {
            match statement {
                Statement::Expression(expr) => {
                    let node = self.lower_expr(body, expr)?;
                    self.append(block, node)?;
                }
                Statement::Variable(decl) => {
                    let node = self.lower_variable(body, decl)?;
                    self.append(block, node)?;
                }
                Statement::Destructuring(decl) => {
                    let node = self.lower_destructuring(body, decl)?;
                    self.append(block, node)?;
                }
                Statement::Declaration(decl) => {
                    for node in self.lower_declaration(decl)? {
                        self.append(block, node)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lower_variable(&mut self, body: &mut BodyContext, decl: &'a VariableDecl) -> CompileResult<IrNodeId> {
        if decl.delegate.is_some() {
            let description = format!("local delegated variable '{}'", decl.name);
            return Ok(self.unsupported(decl.span, None, description));
        }

        let symbol = self.declared_symbol(decl.id)?;
        let initializer = match &decl.initializer {
            Some(init) => Some(self.lower_expr(body, init)?),
            None => None,
        };
        let node = self.add(
            decl.span,
            None,
            IrKind::LocalVariable {
                variable: ValueRef::Symbol(symbol),
                initializer: None,
            },
        );
        self.attach_opt(initializer, node, Slot::Initializer)?;
        Ok(node)
    }

    /// `val (a, b) = e` as `{ val tmp = e; val a = tmp.component1(); val b = tmp.component2() }`
    fn lower_destructuring(&mut self, body: &mut BodyContext, decl: &'a DestructuringDecl) -> CompileResult<IrNodeId> {
        let unit = self.types.unit_type();
        let block = self.block(decl.span, Some(unit), false, Some(IrOrigin::Destructuring));

        let container = self.lower_expr(body, &decl.initializer)?;
        let value = self.materialize(body, block, container, "container")?;
        let mut values = CallValues::new().with(decl.initializer.id, value);

        for (index, entry) in decl.entries.iter().enumerate() {
            if entry.is_skipped() {
                continue;
            }
            let call = self
                .bindings
                .component_call(entry.id)
                .ok_or_else(|| CompileError::missing("component call", entry.id))?;
            let variable = self.declared_symbol(entry.id)?;

            let origin = IrOrigin::ComponentN(index as u32 + 1);
            let site = CallSite::new(entry.id, entry.span).with_origin(origin);
            let component = self.generate_call(body, site, call, &mut values)?;

            let node = self.add(
                entry.span,
                None,
                IrKind::LocalVariable {
                    variable: ValueRef::Symbol(variable),
                    initializer: None,
                },
            );
            self.attach(component, node, Slot::Initializer)?;
            self.append(block, node)?;
        }
        Ok(block)
    }
}
