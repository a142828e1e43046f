//! Expression lowering

use kiln_ast::ast::{
    BinaryExpr, BinaryOp, CastExpr, Expr, ExprKind, Literal, TemplateEntry,
    TypeCheckExpr, UnaryExpr, UnaryOp,
};
use kiln_ast::SymbolKind;

use super::call::CallSite;
use super::{BodyContext, CallValues, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{ConstValue, IrKind, IrNodeId, IrOrigin, LoopKind, SingletonKind, Slot, TypeOperator, ValueRef};

fn binary_origin(op: BinaryOp) -> Option<IrOrigin> {
    let origin = match op {
        BinaryOp::Add => IrOrigin::Plus,
        BinaryOp::Subtract => IrOrigin::Minus,
        BinaryOp::Multiply => IrOrigin::Mul,
        BinaryOp::Divide => IrOrigin::Div,
        BinaryOp::Remainder => IrOrigin::Perc,
        BinaryOp::Less => IrOrigin::Lt,
        BinaryOp::Greater => IrOrigin::Gt,
        BinaryOp::LessEqual => IrOrigin::LtEq,
        BinaryOp::GreaterEqual => IrOrigin::GtEq,
        BinaryOp::Equal => IrOrigin::EqEq,
        BinaryOp::NotEqual => IrOrigin::ExclEq,
        BinaryOp::And | BinaryOp::Or | BinaryOp::Elvis => return None,
    };
    Some(origin)
}

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_expr(&mut self, body: &mut BodyContext, expr: &'a Expr) -> CompileResult<IrNodeId> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(self.lower_literal(expr, literal)),
            ExprKind::StringTemplate(entries) => self.lower_string_template(body, expr, entries),
            ExprKind::Name(_) => self.lower_name(body, expr),
            ExprKind::Call(_) => {
                let call = self.resolved_call(expr.id)?;
                self.generate_call(body, CallSite::new(expr.id, expr.span), call, &mut CallValues::new())
            }
            ExprKind::Qualified(qualified) if qualified.safe => self.lower_safe_call(body, expr, qualified),
            ExprKind::Qualified(_) => {
                let call = self.resolved_call(expr.id)?;
                self.generate_call(body, CallSite::new(expr.id, expr.span), call, &mut CallValues::new())
            }
            ExprKind::This(_) => self.lower_this(expr),
            ExprKind::Binary(binary) => self.lower_binary(body, expr, binary),
            ExprKind::Unary(unary) => self.lower_unary(body, expr, unary),
            ExprKind::Assign(assign) => self.lower_assign(body, expr, assign),
            ExprKind::Block(block) => self.lower_block(body, block),
            ExprKind::If(if_expr) => self.lower_if(body, expr, if_expr),
            ExprKind::When(when) => self.lower_when(body, expr, when),
            ExprKind::While(loop_expr) => self.lower_loop(body, expr, loop_expr, LoopKind::While),
            ExprKind::DoWhile(loop_expr) => self.lower_loop(body, expr, loop_expr, LoopKind::DoWhile),
            ExprKind::Break(label) => self.lower_jump(body, expr, label.as_deref(), true),
            ExprKind::Continue(label) => self.lower_jump(body, expr, label.as_deref(), false),
            ExprKind::Return(ret) => self.lower_return(body, expr, ret),
            ExprKind::Throw(value) => self.lower_throw(body, expr, value),
            ExprKind::Try(try_expr) => self.lower_try(body, expr, try_expr),
            ExprKind::TypeCheck(check) => self.lower_type_check(body, expr, check),
            ExprKind::Cast(cast) => self.lower_cast(body, expr, cast),
            ExprKind::Parenthesized(inner) => self.lower_expr(body, inner),
            ExprKind::Lambda(_) => {
                let ty = self.expression_type(expr.id);
                Ok(self.unsupported(expr.span, ty, "lambda expression"))
            }
            ExprKind::CallableReference(name) => {
                let ty = self.expression_type(expr.id);
                Ok(self.unsupported(expr.span, ty, format!("callable reference '::{}'", name)))
            }
            ExprKind::Index(_) => {
                let ty = self.expression_type(expr.id);
                Ok(self.unsupported(expr.span, ty, "indexed access"))
            }
            ExprKind::ClassLiteral(target) => {
                let ty = self.expression_type(expr.id);
                Ok(self.unsupported(expr.span, ty, format!("class literal '{}::class'", target.name)))
            }
        }
    }

    fn lower_literal(&mut self, expr: &Expr, literal: &Literal) -> IrNodeId {
        let value = match literal {
            Literal::Null => ConstValue::Null,
            Literal::Boolean(b) => ConstValue::Boolean(*b),
            Literal::Int(i) => ConstValue::Int(*i),
            Literal::Long(l) => ConstValue::Long(*l),
            Literal::Double(d) => ConstValue::Double(*d),
            Literal::Char(c) => ConstValue::Char(*c),
            Literal::String(s) => ConstValue::String(s.clone()),
        };
        let node = self.constant(expr.span, value);
        if let Some(ty) = self.expression_type(expr.id) {
            self.tree.set_ty(node, Some(ty));
        }
        node
    }

    fn lower_string_template(
        &mut self,
        body: &mut BodyContext,
        expr: &'a Expr,
        entries: &'a [TemplateEntry],
    ) -> CompileResult<IrNodeId> {
        match entries {
            [] => return Ok(self.constant(expr.span, ConstValue::String(String::new()))),
            [TemplateEntry::Text { value, .. }] => {
                return Ok(self.constant(expr.span, ConstValue::String(value.clone())))
            }
            _ => {}
        }

        let node = self.add(
            expr.span,
            Some(self.types.string_type()),
            IrKind::StringConcatenation {
                arguments: Vec::new(),
            },
        );
        for entry in entries {
            let argument = match entry {
                TemplateEntry::Text { span, value } => {
                    self.constant(*span, ConstValue::String(value.clone()))
                }
                TemplateEntry::Expression(e) => self.lower_expr(body, e)?,
            };
            self.append(node, argument)?;
        }
        Ok(node)
    }

    fn lower_name(&mut self, body: &mut BodyContext, expr: &'a Expr) -> CompileResult<IrNodeId> {
        let call = self.resolved_call(expr.id)?;
        let symbol = self
            .symbols
            .get(call.callee)
            .ok_or_else(|| CompileError::missing("referenced symbol", expr.id))?;
        let recorded = self.expression_type(expr.id);

        let node = match &symbol.kind {
            SymbolKind::Variable(info) | SymbolKind::ValueParameter(info) => self.add(
                expr.span,
                recorded.or(Some(info.ty)),
                IrKind::GetVariable {
                    variable: ValueRef::Symbol(call.callee),
                    origin: None,
                },
            ),
            SymbolKind::Property(_) => {
                return self.generate_call(body, CallSite::new(expr.id, expr.span), call, &mut CallValues::new())
            }
            SymbolKind::Class(info) if self.is_singleton_class(call.callee) => self.add(
                expr.span,
                recorded.or(Some(info.ty)),
                IrKind::SingletonReference {
                    symbol: call.callee,
                    kind: SingletonKind::Object,
                },
            ),
            SymbolKind::EnumEntry(info) => self.add(
                expr.span,
                recorded.or(Some(info.ty)),
                IrKind::SingletonReference {
                    symbol: call.callee,
                    kind: SingletonKind::EnumEntry,
                },
            ),
            _ => {
                let description = format!("reference to {} '{}'", symbol.describe(), symbol.name);
                self.unsupported(expr.span, recorded, description)
            }
        };
        Ok(node)
    }

    fn lower_this(&mut self, expr: &Expr) -> CompileResult<IrNodeId> {
        let target = self
            .bindings
            .this_target(expr.id)
            .ok_or_else(|| CompileError::missing("this target", expr.id))?;
        let symbol = self
            .symbols
            .get(target)
            .ok_or_else(|| CompileError::missing("this target", expr.id))?;
        let recorded = self.expression_type(expr.id);

        let node = match &symbol.kind {
            SymbolKind::Class(info) => self.add(
                expr.span,
                recorded.or(Some(info.ty)),
                IrKind::ThisReference { class: target },
            ),
            SymbolKind::Function(sig) if sig.extension_receiver.is_some() => self.add(
                expr.span,
                recorded.or(sig.extension_receiver),
                IrKind::ExtensionReceiverReference { callable: target },
            ),
            SymbolKind::Property(sig) if sig.extension_receiver.is_some() => self.add(
                expr.span,
                recorded.or(sig.extension_receiver),
                IrKind::ExtensionReceiverReference { callable: target },
            ),
            _ => {
                let description = format!("'this' of {} '{}'", symbol.describe(), symbol.name);
                self.unsupported(expr.span, recorded, description)
            }
        };
        Ok(node)
    }

    fn lower_binary(&mut self, body: &mut BodyContext, expr: &'a Expr, binary: &'a BinaryExpr) -> CompileResult<IrNodeId> {
        let origin = match binary.op {
            BinaryOp::And | BinaryOp::Or => return self.lower_logical(body, expr, binary),
            BinaryOp::Elvis => return self.lower_elvis(body, expr, binary),
            op => binary_origin(op),
        };

        let call = self.resolved_call(expr.id)?;
        let mut site = CallSite::new(expr.id, expr.span);
        if let Some(origin) = origin {
            site = site.with_origin(origin);
        }
        let node = self.generate_call(body, site, call, &mut CallValues::new())?;
        if binary.op != BinaryOp::NotEqual {
            return Ok(node);
        }

        let boolean = self.types.boolean_type();
        let negation = self.add(
            expr.span,
            Some(boolean),
            IrKind::Call {
                callee: self.symbols.builtins().not,
                dispatch_receiver: None,
                extension_receiver: None,
                arguments: Vec::new(),
                origin: Some(IrOrigin::ExclEq),
                super_qualifier: None,
            },
        );
        self.attach(node, negation, Slot::DispatchReceiver)?;
        Ok(negation)
    }

    fn lower_unary(&mut self, body: &mut BodyContext, expr: &'a Expr, unary: &'a UnaryExpr) -> CompileResult<IrNodeId> {
        let origin = match unary.op {
            UnaryOp::Minus => IrOrigin::UnaryMinus,
            UnaryOp::Plus => IrOrigin::UnaryPlus,
            UnaryOp::Not => IrOrigin::Excl,
            UnaryOp::NotNullAssert => return self.lower_not_null(body, expr, unary),
            UnaryOp::PrefixIncrement
            | UnaryOp::PrefixDecrement
            | UnaryOp::PostfixIncrement
            | UnaryOp::PostfixDecrement => return self.lower_increment(body, expr, unary),
        };
        let call = self.resolved_call(expr.id)?;
        self.generate_call(
            body,
            CallSite::new(expr.id, expr.span).with_origin(origin),
            call,
            &mut CallValues::new(),
        )
    }

    fn lower_not_null(&mut self, body: &mut BodyContext, expr: &'a Expr, unary: &'a UnaryExpr) -> CompileResult<IrNodeId> {
        let operand = self.lower_expr(body, &unary.operand)?;
        let operand_ty = self.tree.ty(operand);
        let ty = self
            .expression_type(expr.id)
            .or_else(|| operand_ty.map(|ty| self.types.make_not_nullable(ty)));
        let type_operand = match ty {
            Some(ty) => ty,
            None => self.types.error_type(),
        };
        let node = self.add(
            expr.span,
            ty,
            IrKind::TypeOperator {
                operator: TypeOperator::NotNull,
                type_operand,
                argument: None,
            },
        );
        self.attach(operand, node, Slot::Operand)?;
        Ok(node)
    }

    fn lower_type_check(&mut self, body: &mut BodyContext, expr: &'a Expr, check: &'a TypeCheckExpr) -> CompileResult<IrNodeId> {
        let type_operand = self
            .bindings
            .type_reference(check.target.id)
            .ok_or_else(|| CompileError::missing("type reference", check.target.id))?;
        let operator = if check.negated {
            TypeOperator::NotInstanceOf
        } else {
            TypeOperator::InstanceOf
        };
        let argument = self.lower_expr(body, &check.expr)?;
        let node = self.add(
            expr.span,
            Some(self.types.boolean_type()),
            IrKind::TypeOperator {
                operator,
                type_operand,
                argument: None,
            },
        );
        self.attach(argument, node, Slot::Operand)?;
        Ok(node)
    }

    fn lower_cast(&mut self, body: &mut BodyContext, expr: &'a Expr, cast: &'a CastExpr) -> CompileResult<IrNodeId> {
        let type_operand = self
            .bindings
            .type_reference(cast.target.id)
            .ok_or_else(|| CompileError::missing("type reference", cast.target.id))?;
        let (operator, ty) = if cast.safe {
            let nullable = self.types.make_nullable(type_operand);
            (TypeOperator::SafeCast, nullable)
        } else {
            (TypeOperator::Cast, type_operand)
        };
        let ty = self.expression_type(expr.id).unwrap_or(ty);

        let argument = self.lower_expr(body, &cast.expr)?;
        let node = self.add(
            expr.span,
            Some(ty),
            IrKind::TypeOperator {
                operator,
                type_operand,
                argument: None,
            },
        );
        self.attach(argument, node, Slot::Operand)?;
        Ok(node)
    }
}
