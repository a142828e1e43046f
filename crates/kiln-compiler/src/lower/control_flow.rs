//! Control flow lowering
//!
//! `if`, `when`, `&&`, `||`, `?:` and `?.` all become `When` nodes; loops
//! register themselves in the body's loop table before their body is lowered
//! so that jumps inside can refer to them.

use kiln_ast::ast::{BinaryExpr, BinaryOp, Expr, IfExpr, LoopExpr, QualifiedExpr, ReturnExpr, TryExpr, WhenExpr};
use kiln_ast::Span;
use kiln_types::TypeId;
use log::trace;

use super::call::CallSite;
use super::{BodyContext, CallValues, IrValue, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{ConstValue, IrKind, IrNodeId, IrOrigin, LoopKind, Slot};

impl<'a> Lowerer<'a> {
    fn when_node(&mut self, span: Span, ty: Option<TypeId>, origin: Option<IrOrigin>) -> IrNodeId {
        self.add(
            span,
            ty,
            IrKind::When {
                branches: Vec::new(),
                else_branch: None,
                origin,
            },
        )
    }

    /// Append `condition -> result` to a `When`
    fn add_branch(&mut self, when: IrNodeId, span: Span, condition: IrNodeId, result: IrNodeId) -> CompileResult<()> {
        let branch = self.add(
            span,
            None,
            IrKind::Branch {
                condition: None,
                result: None,
            },
        );
        self.attach(condition, branch, Slot::Condition)?;
        self.attach(result, branch, Slot::Result)?;
        self.append(when, branch)
    }

    /// `left || right` as a `When`
    fn or_else(&mut self, span: Span, left: IrNodeId, right: IrNodeId) -> CompileResult<IrNodeId> {
        let boolean = self.types.boolean_type();
        let when = self.when_node(span, Some(boolean), Some(IrOrigin::OrOr));
        let truth = self.constant(span, ConstValue::Boolean(true));
        self.add_branch(when, span, left, truth)?;
        self.attach(right, when, Slot::Else)?;
        Ok(when)
    }

    /// `value == null` against a reusable value
    fn null_check(&mut self, span: Span, value: &mut IrValue) -> CompileResult<IrNodeId> {
        let loaded = value.load(self.tree)?;
        let null = self.constant(span, ConstValue::Null);
        self.equals(span, loaded, null, IrOrigin::EqEq)
    }

    pub(crate) fn lower_if(&mut self, body: &mut BodyContext, expr: &'a Expr, if_expr: &'a IfExpr) -> CompileResult<IrNodeId> {
        let ty = self.type_or_unit(expr.id);
        let when = self.when_node(expr.span, Some(ty), Some(IrOrigin::If));

        let condition = self.lower_expr(body, &if_expr.condition)?;
        let then = self.lower_expr(body, &if_expr.then_branch)?;
        self.add_branch(when, expr.span, condition, then)?;

        if let Some(else_branch) = &if_expr.else_branch {
            let otherwise = self.lower_expr(body, else_branch)?;
            self.attach(otherwise, when, Slot::Else)?;
        }
        Ok(when)
    }

    pub(crate) fn lower_when(&mut self, body: &mut BodyContext, expr: &'a Expr, when_expr: &'a WhenExpr) -> CompileResult<IrNodeId> {
        let ty = self.type_or_unit(expr.id);
        let when = self.when_node(expr.span, Some(ty), Some(IrOrigin::When));

        let mut wrapper = None;
        let mut subject = None;
        if let Some(subject_expr) = &when_expr.subject {
            let block = self.block(expr.span, Some(ty), true, Some(IrOrigin::When));
            let lowered = self.lower_expr(body, subject_expr)?;
            subject = Some(self.temporary(body, block, lowered, "subject")?);
            wrapper = Some(block);
        }

        for entry in &when_expr.entries {
            let mut condition: Option<IrNodeId> = None;
            for test in &entry.conditions {
                let value = self.lower_expr(body, test)?;
                let test_node = match subject.as_mut() {
                    Some(subject) => {
                        let loaded = subject.load(self.tree)?;
                        self.equals(test.span, loaded, value, IrOrigin::EqEq)?
                    }
                    None => value,
                };
                condition = Some(match condition {
                    Some(previous) => self.or_else(entry.span, previous, test_node)?,
                    None => test_node,
                });
            }
            let condition = match condition {
                Some(condition) => condition,
                None => self.constant(entry.span, ConstValue::Boolean(true)),
            };
            let result = self.lower_expr(body, &entry.body)?;
            self.add_branch(when, entry.span, condition, result)?;
        }

        if let Some(else_branch) = &when_expr.else_branch {
            let otherwise = self.lower_expr(body, else_branch)?;
            self.attach(otherwise, when, Slot::Else)?;
        }

        match wrapper {
            Some(block) => {
                self.append(block, when)?;
                Ok(block)
            }
            None => Ok(when),
        }
    }

    pub(crate) fn lower_logical(&mut self, body: &mut BodyContext, expr: &'a Expr, binary: &'a BinaryExpr) -> CompileResult<IrNodeId> {
        let left = self.lower_expr(body, &binary.left)?;
        let right = self.lower_expr(body, &binary.right)?;
        if binary.op == BinaryOp::Or {
            return self.or_else(expr.span, left, right);
        }

        let boolean = self.types.boolean_type();
        let when = self.when_node(expr.span, Some(boolean), Some(IrOrigin::AndAnd));
        self.add_branch(when, expr.span, left, right)?;
        let falsity = self.constant(expr.span, ConstValue::Boolean(false));
        self.attach(falsity, when, Slot::Else)?;
        Ok(when)
    }

    /// `{ val tmp = left; when { tmp == null -> right; else -> tmp } }`
    pub(crate) fn lower_elvis(&mut self, body: &mut BodyContext, expr: &'a Expr, binary: &'a BinaryExpr) -> CompileResult<IrNodeId> {
        let left = self.lower_expr(body, &binary.left)?;
        let recorded = self.expression_type(expr.id);
        let block = self.block(expr.span, recorded, true, Some(IrOrigin::Elvis));
        let mut value = self.temporary(body, block, left, "elvis_lhs")?;

        let right = self.lower_expr(body, &binary.right)?;
        let ty = recorded.or_else(|| self.tree.ty(right));
        self.tree.set_ty(block, ty);

        let when = self.when_node(expr.span, ty, Some(IrOrigin::Elvis));
        let check = self.null_check(expr.span, &mut value)?;
        self.add_branch(when, expr.span, check, right)?;
        let otherwise = value.load(self.tree)?;
        self.attach(otherwise, when, Slot::Else)?;
        self.append(block, when)?;
        Ok(block)
    }

    /// `a?.f()` as `{ val tmp = a; when { tmp == null -> null; else -> tmp.f() } }`
    pub(crate) fn lower_safe_call(&mut self, body: &mut BodyContext, expr: &'a Expr, qualified: &'a QualifiedExpr) -> CompileResult<IrNodeId> {
        let call = self.resolved_call(expr.id)?;
        let result_ty = match self.symbols.get(call.callee).and_then(|s| s.value_type()) {
            Some(ty) => self.types.make_nullable(ty),
            None => self.types.error_type(),
        };
        let ty = self.expression_type(expr.id).unwrap_or(result_ty);

        let block = self.block(expr.span, Some(ty), true, Some(IrOrigin::SafeCall));
        let receiver = self.lower_expr(body, &qualified.receiver)?;
        let mut value = self.temporary(body, block, receiver, "safe_receiver")?;

        let when = self.when_node(expr.span, Some(ty), Some(IrOrigin::SafeCall));
        let check = self.null_check(expr.span, &mut value)?;
        let null = self.constant(expr.span, ConstValue::Null);
        self.add_branch(when, expr.span, check, null)?;

        let mut values = CallValues::new().with(qualified.receiver.id, value);
        let site = CallSite::new(expr.id, expr.span).untyped();
        let selected = self.generate_call(body, site, call, &mut values)?;
        self.attach(selected, when, Slot::Else)?;
        self.append(block, when)?;
        Ok(block)
    }

    pub(crate) fn lower_loop(&mut self, body: &mut BodyContext, expr: &'a Expr, loop_expr: &'a LoopExpr, kind: LoopKind) -> CompileResult<IrNodeId> {
        let unit = self.types.unit_type();
        let node = self.add(
            expr.span,
            Some(unit),
            IrKind::Loop {
                kind,
                label: loop_expr.label.clone(),
                condition: None,
                body: None,
            },
        );
        body.loops.insert(expr.id, node);
        body.loop_stack.push(expr.id);

        let lowered = self.lower_loop_parts(body, loop_expr, kind);
        body.loop_stack.pop();
        let (condition, loop_body) = lowered?;

        self.attach(condition, node, Slot::Condition)?;
        self.attach(loop_body, node, Slot::Body)?;
        Ok(node)
    }

    /// Condition and body, lowered in evaluation order
    fn lower_loop_parts(&mut self, body: &mut BodyContext, loop_expr: &'a LoopExpr, kind: LoopKind) -> CompileResult<(IrNodeId, IrNodeId)> {
        match kind {
            LoopKind::While => {
                let condition = self.lower_expr(body, &loop_expr.condition)?;
                let loop_body = self.lower_expr(body, &loop_expr.body)?;
                Ok((condition, loop_body))
            }
            LoopKind::DoWhile => {
                let loop_body = self.lower_expr(body, &loop_expr.body)?;
                let condition = self.lower_expr(body, &loop_expr.condition)?;
                Ok((condition, loop_body))
            }
        }
    }

    pub(crate) fn lower_jump(&mut self, body: &mut BodyContext, expr: &'a Expr, label: Option<&str>, is_break: bool) -> CompileResult<IrNodeId> {
        let target = match label {
            Some(_) => self
                .bindings
                .label_target(expr.id)
                .ok_or_else(|| CompileError::missing("label target", expr.id))?,
            None => *body
                .loop_stack
                .last()
                .ok_or(CompileError::UnknownLoop { node: expr.id })?,
        };
        let loop_node = *body
            .loops
            .get(&target)
            .ok_or(CompileError::UnknownLoop { node: expr.id })?;
        trace!("{} at {} targets {}", if is_break { "break" } else { "continue" }, expr.span, loop_node);

        let label = label.map(str::to_string);
        let kind = if is_break {
            IrKind::Break { loop_node, label }
        } else {
            IrKind::Continue { loop_node, label }
        };
        Ok(self.add(expr.span, Some(self.types.nothing_type()), kind))
    }

    pub(crate) fn lower_return(&mut self, body: &mut BodyContext, expr: &'a Expr, ret: &'a ReturnExpr) -> CompileResult<IrNodeId> {
        let target = match &ret.label {
            Some(_) => {
                let node = self
                    .bindings
                    .label_target(expr.id)
                    .ok_or_else(|| CompileError::missing("label target", expr.id))?;
                self.declared_symbol(node)?
            }
            None => body.owner,
        };
        let value = match &ret.value {
            Some(value) => Some(self.lower_expr(body, value)?),
            None => None,
        };
        let node = self.add(
            expr.span,
            Some(self.types.nothing_type()),
            IrKind::Return {
                target,
                value: None,
            },
        );
        self.attach_opt(value, node, Slot::Value)?;
        Ok(node)
    }

    pub(crate) fn lower_throw(&mut self, body: &mut BodyContext, expr: &'a Expr, value: &'a Expr) -> CompileResult<IrNodeId> {
        let value = self.lower_expr(body, value)?;
        let node = self.add(
            expr.span,
            Some(self.types.nothing_type()),
            IrKind::Throw { value: None },
        );
        self.attach(value, node, Slot::Value)?;
        Ok(node)
    }

    pub(crate) fn lower_try(&mut self, body: &mut BodyContext, expr: &'a Expr, try_expr: &'a TryExpr) -> CompileResult<IrNodeId> {
        let ty = self.type_or_unit(expr.id);
        let node = self.add(
            expr.span,
            Some(ty),
            IrKind::TryCatch {
                try_result: None,
                catches: Vec::new(),
                finally: None,
            },
        );

        let try_result = self.lower_block(body, &try_expr.body)?;
        self.attach(try_result, node, Slot::Try)?;

        for clause in &try_expr.catches {
            let parameter = self.declared_symbol(clause.parameter.id)?;
            let catch = self.add(
                clause.span,
                None,
                IrKind::Catch {
                    parameter,
                    result: None,
                },
            );
            let result = self.lower_block(body, &clause.body)?;
            self.attach(result, catch, Slot::Result)?;
            self.append(node, catch)?;
        }

        if let Some(finally) = &try_expr.finally {
            let lowered = self.lower_block(body, finally)?;
            self.attach(lowered, node, Slot::Finally)?;
        }
        Ok(node)
    }
}
