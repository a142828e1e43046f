//! Module and declaration lowering

use kiln_ast::ast::{
    Accessor, ClassDecl, ClassMember, Declaration, File, FunctionBody, FunctionDecl, Module,
    Parameter, PropertyDecl, SecondaryConstructor, Statement,
};
use kiln_ast::{Span, SymbolId};
use log::debug;

use super::call::CallSite;
use super::{BodyContext, CallValues, Lowerer};
use crate::error::CompileResult;
use crate::ir::{FunctionKind, IrKind, IrNodeId, IrOrigin, Slot, ValueRef};

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_module(&mut self, module: &'a Module, name: Option<&str>) -> CompileResult<IrNodeId> {
        let name = name.unwrap_or(&module.name).to_string();
        let span = module
            .files
            .iter()
            .map(|f| f.span)
            .reduce(|a, b| a.merge(b))
            .unwrap_or_default();
        let node = self.add(
            span,
            None,
            IrKind::Module {
                name,
                files: Vec::new(),
            },
        );
        for file in &module.files {
            let lowered = self.lower_file(file)?;
            self.append(node, lowered)?;
        }
        Ok(node)
    }

    fn lower_file(&mut self, file: &'a File) -> CompileResult<IrNodeId> {
        debug!("lowering file {}", file.name);
        let node = self.add(
            file.span,
            None,
            IrKind::File {
                name: file.name.clone(),
                declarations: Vec::new(),
            },
        );
        for decl in &file.declarations {
            for lowered in self.lower_declaration(decl)? {
                self.append(node, lowered)?;
            }
        }
        Ok(node)
    }

    /// Lower one declaration; a property is followed by its accessors
    pub(crate) fn lower_declaration(&mut self, decl: &'a Declaration) -> CompileResult<Vec<IrNodeId>> {
        match decl {
            Declaration::Function(function) => Ok(vec![self.lower_function(function)?]),
            Declaration::Property(property) => self.lower_property(property),
            Declaration::Class(class) => Ok(vec![self.lower_class(class)?]),
            Declaration::TypeAlias(alias) => {
                let description = format!("type alias '{}'", alias.name);
                Ok(vec![self.unsupported_declaration(alias.span, description)])
            }
        }
    }

    fn function_node(&mut self, span: Span, symbol: SymbolId, kind: FunctionKind, arity: usize) -> IrNodeId {
        self.add(
            span,
            None,
            IrKind::Function {
                symbol,
                kind,
                defaults: vec![None; arity],
                body: None,
            },
        )
    }

    fn lower_defaults(
        &mut self,
        body: &mut BodyContext,
        function: IrNodeId,
        parameters: impl Iterator<Item = &'a Parameter>,
    ) -> CompileResult<()> {
        for (index, parameter) in parameters.enumerate() {
            if let Some(default) = &parameter.default_value {
                let lowered = self.lower_expr(body, default)?;
                self.attach(lowered, function, Slot::DefaultValue(index as u32))?;
            }
        }
        Ok(())
    }

    fn lower_function(&mut self, decl: &'a FunctionDecl) -> CompileResult<IrNodeId> {
        let symbol = self.declared_symbol(decl.id)?;
        debug!("lowering function {}", self.symbols.name(symbol));

        let node = self.function_node(decl.span, symbol, FunctionKind::Function, decl.parameters.len());
        let mut body = BodyContext::new(symbol);
        self.lower_defaults(&mut body, node, decl.parameters.iter())?;
        if let Some(function_body) = &decl.body {
            let lowered = self.lower_function_body(&mut body, function_body)?;
            self.attach(lowered, node, Slot::Body)?;
        }
        Ok(node)
    }

    /// Block bodies keep their statements; `= e` becomes `{ return e }`
    /// unless `e` never completes
    fn lower_function_body(&mut self, body: &mut BodyContext, function_body: &'a FunctionBody) -> CompileResult<IrNodeId> {
        let unit = self.types.unit_type();
        match function_body {
            FunctionBody::Block(block) => {
                let node = self.block(block.span, Some(unit), false, None);
                self.lower_statements(body, node, &block.statements)?;
                Ok(node)
            }
            FunctionBody::Expression(expr) => {
                let node = self.block(expr.span, Some(unit), false, None);
                let value = self.lower_expr(body, expr)?;
                let never_completes = self
                    .tree
                    .ty(value)
                    .map_or(false, |ty| self.types.is_nothing(ty));
                let statement = if never_completes {
                    value
                } else {
                    let ret = self.add(
                        expr.span,
                        Some(self.types.nothing_type()),
                        IrKind::Return {
                            target: body.owner,
                            value: None,
                        },
                    );
                    self.attach(value, ret, Slot::Value)?;
                    ret
                };
                self.append(node, statement)?;
                Ok(node)
            }
        }
    }

    fn lower_property(&mut self, decl: &'a PropertyDecl) -> CompileResult<Vec<IrNodeId>> {
        let symbol = self.declared_symbol(decl.id)?;
        debug!("lowering property {}", self.symbols.name(symbol));

        let node = self.add(
            decl.span,
            None,
            IrKind::Property {
                symbol,
                initializer: None,
                delegate: None,
            },
        );
        let mut body = BodyContext::new(symbol);
        if let Some(init) = &decl.initializer {
            let lowered = self.lower_expr(&mut body, init)?;
            self.attach(lowered, node, Slot::Initializer)?;
        }
        if let Some(delegate) = &decl.delegate {
            let lowered = self.lower_expr(&mut body, delegate)?;
            self.attach(lowered, node, Slot::Delegate)?;
        }

        let mut nodes = vec![node];
        if let Some(getter) = &decl.getter {
            nodes.push(self.lower_accessor(getter, FunctionKind::Getter)?);
        }
        if let Some(setter) = &decl.setter {
            nodes.push(self.lower_accessor(setter, FunctionKind::Setter)?);
        }
        Ok(nodes)
    }

    fn lower_accessor(&mut self, accessor: &'a Accessor, kind: FunctionKind) -> CompileResult<IrNodeId> {
        let symbol = self.declared_symbol(accessor.id)?;
        let arity = self
            .symbols
            .get(symbol)
            .and_then(|s| s.as_callable())
            .map_or(0, |sig| sig.parameters.len());
        let node = self.function_node(accessor.span, symbol, kind, arity);

        let mut body = BodyContext::new(symbol);
        let lowered = self.lower_function_body(&mut body, &accessor.body)?;
        self.attach(lowered, node, Slot::Body)?;
        Ok(node)
    }

    fn lower_class(&mut self, decl: &'a ClassDecl) -> CompileResult<IrNodeId> {
        let symbol = self.declared_symbol(decl.id)?;
        debug!("lowering class {}", self.symbols.name(symbol));

        let node = self.add(
            decl.span,
            None,
            IrKind::Class {
                symbol,
                members: Vec::new(),
            },
        );

        let initializers: Vec<&'a [Statement]> = decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Initializer(block) => Some(block.statements.as_slice()),
                _ => None,
            })
            .collect();

        if decl.primary_constructor.is_some() {
            for lowered in self.lower_primary_constructor(decl, symbol, &initializers)? {
                self.append(node, lowered)?;
            }
        }

        for entry in &decl.enum_entries {
            let entry_symbol = self.declared_symbol(entry.id)?;
            let lowered = self.add(
                entry.span,
                None,
                IrKind::EnumEntry {
                    symbol: entry_symbol,
                    initializer: None,
                },
            );
            if let Some(call) = self.bindings.resolved_call(entry.id) {
                let mut body = BodyContext::new(entry_symbol);
                let site = CallSite::new(entry.id, entry.span).with_origin(IrOrigin::EnumConstructorCall);
                let init = self.generate_call(&mut body, site, call, &mut CallValues::new())?;
                self.attach(init, lowered, Slot::Initializer)?;
            }
            self.append(node, lowered)?;
        }

        // without a primary constructor, initializers run in every secondary one
        let secondary_initializers = if decl.primary_constructor.is_some() {
            &initializers[..0]
        } else {
            &initializers[..]
        };
        for member in &decl.members {
            let lowered = match member {
                ClassMember::Function(function) => vec![self.lower_function(function)?],
                ClassMember::Property(property) => self.lower_property(property)?,
                ClassMember::Class(class) => vec![self.lower_class(class)?],
                ClassMember::SecondaryConstructor(ctor) => {
                    vec![self.lower_secondary_constructor(ctor, secondary_initializers)?]
                }
                ClassMember::Initializer(_) => continue,
                ClassMember::TypeAlias(alias) => {
                    let description = format!("type alias '{}'", alias.name);
                    vec![self.unsupported_declaration(alias.span, description)]
                }
            };
            for member_node in lowered {
                self.append(node, member_node)?;
            }
        }
        Ok(node)
    }

    /// The constructor followed by the properties its parameters declare
    fn lower_primary_constructor(
        &mut self,
        decl: &'a ClassDecl,
        class: SymbolId,
        initializers: &[&'a [Statement]],
    ) -> CompileResult<Vec<IrNodeId>> {
        let Some(primary) = &decl.primary_constructor else {
            return Ok(Vec::new());
        };
        let symbol = self.declared_symbol(primary.id)?;
        debug!("lowering primary constructor of {}", self.symbols.name(class));

        let node = self.function_node(primary.span, symbol, FunctionKind::Constructor, primary.parameters.len());
        let mut body = BodyContext::new(symbol);
        self.lower_defaults(&mut body, node, primary.parameters.iter().map(|p| &p.parameter))?;

        let unit = self.types.unit_type();
        let block = self.block(primary.span, Some(unit), false, None);
        if let Some(super_call) = &decl.super_call {
            let call = self.resolved_call(super_call.id)?;
            let site = CallSite::new(super_call.id, super_call.span).with_origin(IrOrigin::SuperConstructorCall);
            let lowered = self.generate_call(&mut body, site, call, &mut CallValues::new())?;
            self.append(block, lowered)?;
        }

        let this_ty = self.symbol_type(class);
        let mut properties = Vec::new();
        for parameter in &primary.parameters {
            let Some(property_node) = parameter.property else {
                continue;
            };
            let property = self.declared_symbol(property_node)?;
            let value = self.declared_symbol(parameter.parameter.id)?;
            let span = parameter.parameter.span;

            let receiver = self.add(span, this_ty, IrKind::ThisReference { class });
            let read = self.parameter_read(span, value);
            let store = self.add(
                span,
                Some(unit),
                IrKind::SetField {
                    property,
                    receiver: None,
                    value: None,
                    origin: Some(IrOrigin::InitializePropertyFromParameter),
                },
            );
            self.attach(receiver, store, Slot::DispatchReceiver)?;
            self.attach(read, store, Slot::Value)?;
            self.append(block, store)?;

            let declared = self.add(
                span,
                None,
                IrKind::Property {
                    symbol: property,
                    initializer: None,
                    delegate: None,
                },
            );
            let init = self.parameter_read(span, value);
            self.attach(init, declared, Slot::Initializer)?;
            properties.push(declared);
        }

        for &statements in initializers {
            self.lower_statements(&mut body, block, statements)?;
        }
        self.attach(block, node, Slot::Body)?;

        let mut nodes = vec![node];
        nodes.extend(properties);
        Ok(nodes)
    }

    fn parameter_read(&mut self, span: Span, parameter: SymbolId) -> IrNodeId {
        let ty = self.symbol_type(parameter);
        self.add(
            span,
            ty,
            IrKind::GetVariable {
                variable: ValueRef::Symbol(parameter),
                origin: Some(IrOrigin::InitializePropertyFromParameter),
            },
        )
    }

    fn lower_secondary_constructor(
        &mut self,
        ctor: &'a SecondaryConstructor,
        initializers: &[&'a [Statement]],
    ) -> CompileResult<IrNodeId> {
        let symbol = self.declared_symbol(ctor.id)?;
        debug!("lowering secondary constructor {}", self.symbols.name(symbol));

        let node = self.function_node(ctor.span, symbol, FunctionKind::Constructor, ctor.parameters.len());
        let mut body = BodyContext::new(symbol);
        self.lower_defaults(&mut body, node, ctor.parameters.iter())?;

        let unit = self.types.unit_type();
        let block = self.block(ctor.span, Some(unit), false, None);
        if let Some(delegation) = &ctor.delegation {
            let call = self.resolved_call(delegation.id)?;
            let site = CallSite::new(delegation.id, delegation.span).with_origin(IrOrigin::DelegatingConstructorCall);
            let lowered = self.generate_call(&mut body, site, call, &mut CallValues::new())?;
            self.append(block, lowered)?;
        }
        for &statements in initializers {
            self.lower_statements(&mut body, block, statements)?;
        }
        if let Some(ctor_body) = &ctor.body {
            self.lower_statements(&mut body, block, &ctor_body.statements)?;
        }
        self.attach(block, node, Slot::Body)?;
        Ok(node)
    }
}
