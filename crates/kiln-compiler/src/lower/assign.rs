//! Assignment lowering
//!
//! The left-hand side becomes an [`LValue`] whose receivers are evaluated
//! once; compound assignments and increments then load and store through it.

use kiln_ast::ast::{AssignExpr, AssignOp, Expr, ExprKind, UnaryExpr, UnaryOp};
use kiln_ast::{Receiver, Span, SymbolId, SymbolKind};
use kiln_types::TypeId;

use super::call::CallSite;
use super::{BodyContext, CallValues, IrValue, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IrKind, IrNodeId, IrOrigin, Slot, ValueRef};

/// Assignable reference with its receivers already evaluated
pub(crate) enum LValue {
    Variable {
        variable: ValueRef,
        ty: Option<TypeId>,
        span: Span,
    },
    Property {
        property: SymbolId,
        ty: Option<TypeId>,
        span: Span,
        dispatch: Option<IrValue>,
        extension: Option<IrValue>,
    },
}

fn compound_origin(op: AssignOp) -> IrOrigin {
    match op {
        AssignOp::Assign => IrOrigin::Eq,
        AssignOp::AddAssign => IrOrigin::PlusEq,
        AssignOp::SubtractAssign => IrOrigin::MinusEq,
        AssignOp::MultiplyAssign => IrOrigin::MultEq,
        AssignOp::DivideAssign => IrOrigin::DivEq,
        AssignOp::RemainderAssign => IrOrigin::PercEq,
    }
}

fn increment_origin(op: UnaryOp) -> IrOrigin {
    match op {
        UnaryOp::PrefixDecrement => IrOrigin::PrefixDecr,
        UnaryOp::PostfixIncrement => IrOrigin::PostfixIncr,
        UnaryOp::PostfixDecrement => IrOrigin::PostfixDecr,
        _ => IrOrigin::PrefixIncr,
    }
}

impl<'a> Lowerer<'a> {
    /// Evaluate the receivers of an assignment target
    ///
    /// With a `block`, receivers that are not stable references are bound to
    /// temporaries there so the reference can be loaded and stored more than
    /// once. Returns `None` for targets that are not assignable references.
    fn lower_lvalue(&mut self, body: &mut BodyContext, target: &'a Expr, block: Option<IrNodeId>) -> CompileResult<Option<LValue>> {
        let target = target.deparenthesize();
        match &target.kind {
            ExprKind::Name(_) => {}
            ExprKind::Qualified(qualified) if !qualified.safe => {}
            _ => return Ok(None),
        }

        let call = self.resolved_call(target.id)?;
        let symbol = self
            .symbols
            .get(call.callee)
            .ok_or_else(|| CompileError::missing("assigned symbol", target.id))?;
        let recorded = self.expression_type(target.id);

        let lvalue = match &symbol.kind {
            SymbolKind::Variable(info) | SymbolKind::ValueParameter(info) => LValue::Variable {
                variable: ValueRef::Symbol(call.callee),
                ty: recorded.or(Some(info.ty)),
                span: target.span,
            },
            SymbolKind::Property(sig) => {
                let mut values = CallValues::new();
                let dispatch = self.lvalue_receiver(body, call.dispatch_receiver.as_ref(), &mut values, target.span, block, "this")?;
                let extension = self.lvalue_receiver(body, call.extension_receiver.as_ref(), &mut values, target.span, block, "receiver")?;
                LValue::Property {
                    property: call.callee,
                    ty: recorded.or(Some(sig.ty)),
                    span: target.span,
                    dispatch,
                    extension,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(lvalue))
    }

    fn lvalue_receiver(
        &mut self,
        body: &mut BodyContext,
        receiver: Option<&Receiver>,
        values: &mut CallValues,
        span: Span,
        block: Option<IrNodeId>,
        hint: &str,
    ) -> CompileResult<Option<IrValue>> {
        let Some(receiver) = receiver else {
            return Ok(None);
        };
        let node = self.lower_receiver(body, receiver, values, span)?;
        let value = match block {
            Some(block) => self.materialize(body, block, node, hint)?,
            None => IrValue::once(node),
        };
        Ok(Some(value))
    }

    fn load_lvalue(&mut self, lvalue: &mut LValue, origin: IrOrigin) -> CompileResult<IrNodeId> {
        match lvalue {
            LValue::Variable { variable, ty, span } => Ok(self.add(
                *span,
                *ty,
                IrKind::GetVariable {
                    variable: *variable,
                    origin: Some(origin),
                },
            )),
            LValue::Property {
                property,
                ty,
                span,
                dispatch,
                extension,
            } => {
                let node = self.add(
                    *span,
                    *ty,
                    IrKind::GetProperty {
                        property: *property,
                        dispatch_receiver: None,
                        extension_receiver: None,
                        origin: Some(origin),
                    },
                );
                if let Some(value) = dispatch {
                    let receiver = value.load(self.tree)?;
                    self.attach(receiver, node, Slot::DispatchReceiver)?;
                }
                if let Some(value) = extension {
                    let receiver = value.load(self.tree)?;
                    self.attach(receiver, node, Slot::ExtensionReceiver)?;
                }
                Ok(node)
            }
        }
    }

    fn store_lvalue(&mut self, lvalue: &mut LValue, value: IrNodeId, span: Span, origin: IrOrigin) -> CompileResult<IrNodeId> {
        let unit = Some(self.types.unit_type());
        match lvalue {
            LValue::Variable { variable, .. } => {
                let node = self.add(
                    span,
                    unit,
                    IrKind::SetVariable {
                        variable: *variable,
                        value: None,
                        origin: Some(origin),
                    },
                );
                self.attach(value, node, Slot::Value)?;
                Ok(node)
            }
            LValue::Property {
                property,
                dispatch,
                extension,
                ..
            } => {
                let node = self.add(
                    span,
                    unit,
                    IrKind::SetProperty {
                        property: *property,
                        dispatch_receiver: None,
                        extension_receiver: None,
                        value: None,
                        origin: Some(origin),
                    },
                );
                if let Some(receiver) = dispatch {
                    let receiver = receiver.load(self.tree)?;
                    self.attach(receiver, node, Slot::DispatchReceiver)?;
                }
                if let Some(receiver) = extension {
                    let receiver = receiver.load(self.tree)?;
                    self.attach(receiver, node, Slot::ExtensionReceiver)?;
                }
                self.attach(value, node, Slot::Value)?;
                Ok(node)
            }
        }
    }

    pub(crate) fn lower_assign(&mut self, body: &mut BodyContext, expr: &'a Expr, assign: &'a AssignExpr) -> CompileResult<IrNodeId> {
        if assign.op != AssignOp::Assign {
            return self.lower_compound_assign(body, expr, assign);
        }

        let Some(mut lvalue) = self.lower_lvalue(body, &assign.target, None)? else {
            let unit = self.types.unit_type();
            return Ok(self.unsupported(expr.span, Some(unit), "assignment to a non-assignable target"));
        };
        let value = self.lower_expr(body, &assign.value)?;
        self.store_lvalue(&mut lvalue, value, expr.span, IrOrigin::Eq)
    }

    /// `x op= y`: either `x = x.op(y)` or `x.opAssign(y)`, as the resolver decided
    fn lower_compound_assign(&mut self, body: &mut BodyContext, expr: &'a Expr, assign: &'a AssignExpr) -> CompileResult<IrNodeId> {
        let origin = compound_origin(assign.op);
        let reassignment = self
            .bindings
            .is_reassignment(expr.id)
            .ok_or_else(|| CompileError::missing("reassignment flag", expr.id))?;
        let call = self.resolved_call(expr.id)?;

        let unit = self.types.unit_type();
        let block = self.block(expr.span, Some(unit), false, Some(origin));
        let Some(mut lvalue) = self.lower_lvalue(body, &assign.target, Some(block))? else {
            return Ok(self.unsupported(expr.span, Some(unit), "compound assignment to a non-assignable target"));
        };

        let current = self.load_lvalue(&mut lvalue, origin)?;
        let mut values = CallValues::new().with(assign.target.id, IrValue::once(current));
        let site = CallSite::new(expr.id, expr.span).with_origin(origin).untyped();
        let operator_call = self.generate_call(body, site, call, &mut values)?;

        let statement = if reassignment {
            self.store_lvalue(&mut lvalue, operator_call, expr.span, origin)?
        } else {
            operator_call
        };
        self.append(block, statement)?;
        self.unwrap_single(block)
    }

    /// `++x` is `{ val tmp = x.inc(); x = tmp; tmp }`, `x++` is `{ val tmp = x; x = tmp.inc(); tmp }`
    pub(crate) fn lower_increment(&mut self, body: &mut BodyContext, expr: &'a Expr, unary: &'a UnaryExpr) -> CompileResult<IrNodeId> {
        let origin = increment_origin(unary.op);
        let call = self.resolved_call(expr.id)?;
        let recorded = self.expression_type(expr.id);

        let block = self.block(expr.span, recorded, true, Some(origin));
        let Some(mut lvalue) = self.lower_lvalue(body, &unary.operand, Some(block))? else {
            return Ok(self.unsupported(expr.span, recorded, "increment of a non-assignable target"));
        };
        let current = self.load_lvalue(&mut lvalue, origin)?;
        let site = CallSite::new(expr.id, expr.span).with_origin(origin).untyped();

        let mut result = match unary.op {
            UnaryOp::PrefixIncrement | UnaryOp::PrefixDecrement => {
                let mut values = CallValues::new().with(unary.operand.id, IrValue::once(current));
                let updated = self.generate_call(body, site, call, &mut values)?;
                let mut temp = self.temporary(body, block, updated, "prefix")?;
                let stored = temp.load(self.tree)?;
                let store = self.store_lvalue(&mut lvalue, stored, expr.span, origin)?;
                self.append(block, store)?;
                temp
            }
            _ => {
                let temp = self.temporary(body, block, current, "postfix")?;
                let mut values = CallValues::new().with(unary.operand.id, temp.clone());
                let updated = self.generate_call(body, site, call, &mut values)?;
                let store = self.store_lvalue(&mut lvalue, updated, expr.span, origin)?;
                self.append(block, store)?;
                temp
            }
        };

        let value = result.load(self.tree)?;
        if recorded.is_none() {
            let ty = self.tree.ty(value);
            self.tree.set_ty(block, ty);
        }
        self.append(block, value)?;
        Ok(block)
    }
}
