//! Call, property access and receiver lowering

use kiln_ast::{NodeId, Receiver, ResolvedCall, ResolvedValueArgument, Span, SymbolKind};
use kiln_types::TypeId;
use log::trace;

use super::{BodyContext, CallValues, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IrKind, IrNodeId, IrOrigin, SingletonKind, Slot};

/// Where a call-shaped node comes from
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSite {
    pub(crate) node: NodeId,
    pub(crate) span: Span,
    pub(crate) origin: Option<IrOrigin>,
    /// Take the result type from the node's recorded type rather than the callee
    pub(crate) typed: bool,
}

impl CallSite {
    pub(crate) fn new(node: NodeId, span: Span) -> Self {
        Self {
            node,
            span,
            origin: None,
            typed: true,
        }
    }

    pub(crate) fn with_origin(mut self, origin: IrOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The node's recorded type belongs to an enclosing construct
    pub(crate) fn untyped(mut self) -> Self {
        self.typed = false;
        self
    }
}

/// Source evaluation order must differ from parameter order for temporaries to be needed
fn needs_reordering(call: &ResolvedCall) -> bool {
    call.evaluation_order.windows(2).any(|pair| pair[0] > pair[1])
}

impl<'a> Lowerer<'a> {
    /// Resolved call of a call-shaped node
    pub(crate) fn resolved_call(&self, node: NodeId) -> CompileResult<&'a ResolvedCall> {
        self.bindings
            .resolved_call(node)
            .ok_or_else(|| CompileError::missing("resolved call", node))
    }

    /// Lower a resolved call into a call, property read or placeholder
    ///
    /// `values` supplies already lowered values for AST expressions the
    /// resolution refers to; everything else is lowered from the AST.
    pub(crate) fn generate_call(
        &mut self,
        body: &mut BodyContext,
        site: CallSite,
        call: &ResolvedCall,
        values: &mut CallValues,
    ) -> CompileResult<IrNodeId> {
        let symbol = self
            .symbols
            .get(call.callee)
            .ok_or_else(|| CompileError::missing("callee symbol", site.node))?;

        let recorded = if site.typed {
            self.expression_type(site.node)
        } else {
            None
        };
        match &symbol.kind {
            SymbolKind::Function(sig) | SymbolKind::Constructor(sig) => {
                let ty = recorded.or(Some(sig.return_type));
                let arity = sig.parameters.len();
                self.generate_function_call(body, site, call, values, ty, arity)
            }
            SymbolKind::Property(sig) => {
                let ty = recorded.or(Some(sig.ty));
                self.generate_property_get(body, site, call, values, ty)
            }
            _ => {
                let ty = recorded;
                let description = format!(
                    "call of {} '{}' through the invoke convention",
                    symbol.describe(),
                    symbol.name
                );
                Ok(self.unsupported(site.span, ty, description))
            }
        }
    }

    fn generate_function_call(
        &mut self,
        body: &mut BodyContext,
        site: CallSite,
        call: &ResolvedCall,
        values: &mut CallValues,
        ty: Option<TypeId>,
        arity: usize,
    ) -> CompileResult<IrNodeId> {
        let mut seen = vec![false; arity];
        for &index in &call.evaluation_order {
            match seen.get_mut(index as usize) {
                Some(flag) if !*flag => *flag = true,
                Some(_) => {
                    return Err(CompileError::DuplicateParameterIndex {
                        callee: call.callee,
                        index,
                    })
                }
                None => {
                    return Err(CompileError::NoSuchParameter {
                        callee: call.callee,
                        index,
                        arity,
                    })
                }
            }
        }

        let node = self.add(
            site.span,
            ty,
            IrKind::Call {
                callee: call.callee,
                dispatch_receiver: None,
                extension_receiver: None,
                arguments: vec![None; arity],
                origin: site.origin,
                super_qualifier: call.super_qualifier,
            },
        );

        if !needs_reordering(call) {
            self.attach_receivers(body, node, call, values)?;
            for index in 0..call.value_arguments.len() {
                if let Some(argument) = self.lower_argument(body, call, index, values)? {
                    self.attach(argument, node, Slot::Argument(index as u32))?;
                }
            }
            return Ok(node);
        }

        trace!(
            "reordering arguments of {} at {}: evaluation order {:?}",
            self.symbols.name(call.callee),
            site.span,
            call.evaluation_order
        );
        let used_as_expression = self.bindings.is_used_as_expression(site.node);
        let block = self.block(site.span, ty, used_as_expression, Some(IrOrigin::SyntheticBlock));

        // receivers first, dispatch before extension
        let mut dispatch = None;
        if let Some(receiver) = &call.dispatch_receiver {
            let lowered = self.lower_receiver(body, receiver, values, site.span)?;
            dispatch = Some(self.materialize(body, block, lowered, "this")?);
        }
        let mut extension = None;
        if let Some(receiver) = &call.extension_receiver {
            let lowered = self.lower_receiver(body, receiver, values, site.span)?;
            extension = Some(self.materialize(body, block, lowered, "receiver")?);
        }

        let parameter_names: Vec<String> = self
            .symbols
            .get(call.callee)
            .and_then(|s| s.as_callable())
            .map(|sig| sig.parameters.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default();
        let mut arguments = vec![None; call.value_arguments.len()];
        for &index in &call.evaluation_order {
            let index = index as usize;
            if let Some(lowered) = self.lower_argument(body, call, index, values)? {
                let hint = parameter_names
                    .get(index)
                    .map(String::as_str)
                    .unwrap_or("arg");
                arguments[index] = Some(self.materialize(body, block, lowered, hint)?);
            }
        }

        if let Some(mut value) = dispatch {
            let receiver = value.load(self.tree)?;
            self.attach(receiver, node, Slot::DispatchReceiver)?;
        }
        if let Some(mut value) = extension {
            let receiver = value.load(self.tree)?;
            self.attach(receiver, node, Slot::ExtensionReceiver)?;
        }
        for (index, value) in arguments.iter_mut().enumerate() {
            if let Some(value) = value {
                let argument = value.load(self.tree)?;
                self.attach(argument, node, Slot::Argument(index as u32))?;
            }
        }
        self.append(block, node)?;
        Ok(block)
    }

    fn generate_property_get(
        &mut self,
        body: &mut BodyContext,
        site: CallSite,
        call: &ResolvedCall,
        values: &mut CallValues,
        ty: Option<TypeId>,
    ) -> CompileResult<IrNodeId> {
        let node = self.add(
            site.span,
            ty,
            IrKind::GetProperty {
                property: call.callee,
                dispatch_receiver: None,
                extension_receiver: None,
                origin: site.origin,
            },
        );
        self.attach_receivers(body, node, call, values)?;
        Ok(node)
    }

    /// Lower both receivers of `call` straight into `node`
    pub(crate) fn attach_receivers(
        &mut self,
        body: &mut BodyContext,
        node: IrNodeId,
        call: &ResolvedCall,
        values: &mut CallValues,
    ) -> CompileResult<()> {
        let span = self.tree.span(node);
        if let Some(receiver) = &call.dispatch_receiver {
            let lowered = self.lower_receiver(body, receiver, values, span)?;
            self.attach(lowered, node, Slot::DispatchReceiver)?;
        }
        if let Some(receiver) = &call.extension_receiver {
            let lowered = self.lower_receiver(body, receiver, values, span)?;
            self.attach(lowered, node, Slot::ExtensionReceiver)?;
        }
        Ok(())
    }

    /// Lowered argument for parameter `index`; `None` when the default applies
    fn lower_argument(
        &mut self,
        body: &mut BodyContext,
        call: &ResolvedCall,
        index: usize,
        values: &mut CallValues,
    ) -> CompileResult<Option<IrNodeId>> {
        match call.argument(index) {
            ResolvedValueArgument::Default => Ok(None),
            ResolvedValueArgument::Expression(expression) => {
                Ok(Some(self.lower_referenced(body, *expression, values)?))
            }
            ResolvedValueArgument::Vararg(expressions) => {
                let span = expressions
                    .iter()
                    .filter_map(|e| self.index.span(*e))
                    .reduce(|a, b| a.merge(b))
                    .unwrap_or_default();
                Ok(Some(self.unsupported(span, None, "vararg argument")))
            }
        }
    }

    /// Lower an expression the resolution refers to by node identity
    pub(crate) fn lower_referenced(
        &mut self,
        body: &mut BodyContext,
        expression: NodeId,
        values: &mut CallValues,
    ) -> CompileResult<IrNodeId> {
        if let Some(value) = values.get_mut(expression) {
            return value.load(self.tree);
        }
        let expr = self
            .index
            .expr(expression)
            .ok_or_else(|| CompileError::missing("syntax node", expression))?;
        self.lower_expr(body, expr)
    }

    /// Map a classified receiver to its IR node
    pub(crate) fn lower_receiver(
        &mut self,
        body: &mut BodyContext,
        receiver: &Receiver,
        values: &mut CallValues,
        span: Span,
    ) -> CompileResult<IrNodeId> {
        let node = match receiver {
            Receiver::ImplicitThis { class, ty } => {
                self.add(span, Some(*ty), IrKind::ThisReference { class: *class })
            }
            Receiver::QualifiedThis {
                class,
                ty,
                expression,
            } => {
                let span = self.index.span(*expression).unwrap_or(span);
                self.add(span, Some(*ty), IrKind::ThisReference { class: *class })
            }
            Receiver::Expression { expression, .. } => {
                self.lower_referenced(body, *expression, values)?
            }
            Receiver::Singleton {
                class,
                ty,
                expression,
            } => {
                if let Some(value) = expression.and_then(|e| values.get_mut(e)) {
                    return value.load(self.tree);
                }
                let span = expression
                    .and_then(|e| self.index.span(e))
                    .unwrap_or(span);
                let kind = self.singleton_kind(*class);
                self.add(
                    span,
                    Some(*ty),
                    IrKind::SingletonReference {
                        symbol: *class,
                        kind,
                    },
                )
            }
            Receiver::ExtensionReceiver { callable, ty } => self.add(
                span,
                Some(*ty),
                IrKind::ExtensionReceiverReference {
                    callable: *callable,
                },
            ),
            Receiver::Unknown { description } => {
                return Err(CompileError::UnsupportedReceiver {
                    description: description.clone(),
                })
            }
        };
        Ok(node)
    }

    pub(crate) fn singleton_kind(&self, symbol: kiln_ast::SymbolId) -> SingletonKind {
        match self.symbols.get(symbol).map(|s| &s.kind) {
            Some(SymbolKind::EnumEntry(_)) => SingletonKind::EnumEntry,
            _ => SingletonKind::Object,
        }
    }

    /// Whether a class symbol names an object or companion object
    pub(crate) fn is_singleton_class(&self, symbol: kiln_ast::SymbolId) -> bool {
        self.symbols
            .get(symbol)
            .and_then(|s| s.as_class())
            .map_or(false, |info| info.kind.is_singleton())
    }
}
