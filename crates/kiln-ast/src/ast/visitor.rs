//! Syntax tree visitor
//!
//! Each visit method has a default implementation that calls the matching
//! walk function, so a visitor overrides only the nodes it is interested in.
//! The `'ast` lifetime lets visitors keep references into the tree.
//!
//! # Example
//!
//! ```rust
//! use kiln_ast::ast::*;
//!
//! struct CountNames {
//!     count: usize,
//! }
//!
//! impl<'ast> Visitor<'ast> for CountNames {
//!     fn visit_expr(&mut self, expr: &'ast Expr) {
//!         if let ExprKind::Name(_) = expr.kind {
//!             self.count += 1;
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```

use super::*;

pub trait Visitor<'ast>: Sized {
    // Declarations
    fn visit_module(&mut self, module: &'ast Module) {
        walk_module(self, module);
    }

    fn visit_file(&mut self, file: &'ast File) {
        walk_file(self, file);
    }

    fn visit_declaration(&mut self, decl: &'ast Declaration) {
        walk_declaration(self, decl);
    }

    fn visit_function(&mut self, decl: &'ast FunctionDecl) {
        walk_function(self, decl);
    }

    fn visit_parameter(&mut self, param: &'ast Parameter) {
        walk_parameter(self, param);
    }

    fn visit_function_body(&mut self, body: &'ast FunctionBody) {
        walk_function_body(self, body);
    }

    fn visit_property(&mut self, decl: &'ast PropertyDecl) {
        walk_property(self, decl);
    }

    fn visit_class(&mut self, decl: &'ast ClassDecl) {
        walk_class(self, decl);
    }

    fn visit_class_member(&mut self, member: &'ast ClassMember) {
        walk_class_member(self, member);
    }

    // Statements and expressions
    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_statement(&mut self, stmt: &'ast Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_arguments(&mut self, args: &'ast [Argument]) {
        for arg in args {
            self.visit_expr(&arg.value);
        }
    }
}

// ============================================================================
// Walk functions
// ============================================================================

pub fn walk_module<'ast, V: Visitor<'ast>>(visitor: &mut V, module: &'ast Module) {
    for file in &module.files {
        visitor.visit_file(file);
    }
}

pub fn walk_file<'ast, V: Visitor<'ast>>(visitor: &mut V, file: &'ast File) {
    for decl in &file.declarations {
        visitor.visit_declaration(decl);
    }
}

pub fn walk_declaration<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast Declaration) {
    match decl {
        Declaration::Function(f) => visitor.visit_function(f),
        Declaration::Property(p) => visitor.visit_property(p),
        Declaration::Class(c) => visitor.visit_class(c),
        Declaration::TypeAlias(_) => {}
    }
}

pub fn walk_function<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast FunctionDecl) {
    for param in &decl.parameters {
        visitor.visit_parameter(param);
    }
    if let Some(body) = &decl.body {
        visitor.visit_function_body(body);
    }
}

pub fn walk_parameter<'ast, V: Visitor<'ast>>(visitor: &mut V, param: &'ast Parameter) {
    if let Some(default) = &param.default_value {
        visitor.visit_expr(default);
    }
}

pub fn walk_function_body<'ast, V: Visitor<'ast>>(visitor: &mut V, body: &'ast FunctionBody) {
    match body {
        FunctionBody::Block(block) => visitor.visit_block(block),
        FunctionBody::Expression(expr) => visitor.visit_expr(expr),
    }
}

pub fn walk_property<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast PropertyDecl) {
    if let Some(init) = &decl.initializer {
        visitor.visit_expr(init);
    }
    if let Some(delegate) = &decl.delegate {
        visitor.visit_expr(delegate);
    }
    for accessor in decl.getter.iter().chain(decl.setter.iter()) {
        visitor.visit_function_body(&accessor.body);
    }
}

pub fn walk_class<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast ClassDecl) {
    if let Some(ctor) = &decl.primary_constructor {
        for param in &ctor.parameters {
            visitor.visit_parameter(&param.parameter);
        }
    }
    if let Some(super_call) = &decl.super_call {
        visitor.visit_arguments(&super_call.arguments);
    }
    for entry in &decl.enum_entries {
        visitor.visit_arguments(&entry.arguments);
    }
    for member in &decl.members {
        visitor.visit_class_member(member);
    }
}

pub fn walk_class_member<'ast, V: Visitor<'ast>>(visitor: &mut V, member: &'ast ClassMember) {
    match member {
        ClassMember::Function(f) => visitor.visit_function(f),
        ClassMember::Property(p) => visitor.visit_property(p),
        ClassMember::Class(c) => visitor.visit_class(c),
        ClassMember::SecondaryConstructor(ctor) => {
            for param in &ctor.parameters {
                visitor.visit_parameter(param);
            }
            if let Some(delegation) = &ctor.delegation {
                visitor.visit_arguments(&delegation.arguments);
            }
            if let Some(body) = &ctor.body {
                visitor.visit_block(body);
            }
        }
        ClassMember::Initializer(block) => visitor.visit_block(block),
        ClassMember::TypeAlias(_) => {}
    }
}

pub fn walk_block<'ast, V: Visitor<'ast>>(visitor: &mut V, block: &'ast Block) {
    for stmt in &block.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Statement) {
    match stmt {
        Statement::Expression(expr) => visitor.visit_expr(expr),
        Statement::Variable(decl) => {
            if let Some(init) = &decl.initializer {
                visitor.visit_expr(init);
            }
            if let Some(delegate) = &decl.delegate {
                visitor.visit_expr(delegate);
            }
        }
        Statement::Destructuring(decl) => visitor.visit_expr(&decl.initializer),
        Statement::Declaration(decl) => visitor.visit_declaration(decl),
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::Name(_)
        | ExprKind::This(_)
        | ExprKind::Break(_)
        | ExprKind::Continue(_)
        | ExprKind::CallableReference(_)
        | ExprKind::ClassLiteral(_) => {}
        ExprKind::StringTemplate(entries) => {
            for entry in entries {
                if let TemplateEntry::Expression(e) = entry {
                    visitor.visit_expr(e);
                }
            }
        }
        ExprKind::Call(call) => visitor.visit_arguments(&call.arguments),
        ExprKind::Qualified(q) => {
            visitor.visit_expr(&q.receiver);
            visitor.visit_expr(&q.selector);
        }
        ExprKind::Binary(b) => {
            visitor.visit_expr(&b.left);
            visitor.visit_expr(&b.right);
        }
        ExprKind::Unary(u) => visitor.visit_expr(&u.operand),
        ExprKind::Assign(a) => {
            visitor.visit_expr(&a.target);
            visitor.visit_expr(&a.value);
        }
        ExprKind::Block(block) | ExprKind::Lambda(block) => visitor.visit_block(block),
        ExprKind::If(i) => {
            visitor.visit_expr(&i.condition);
            visitor.visit_expr(&i.then_branch);
            if let Some(else_branch) = &i.else_branch {
                visitor.visit_expr(else_branch);
            }
        }
        ExprKind::When(w) => {
            if let Some(subject) = &w.subject {
                visitor.visit_expr(subject);
            }
            for entry in &w.entries {
                for condition in &entry.conditions {
                    visitor.visit_expr(condition);
                }
                visitor.visit_expr(&entry.body);
            }
            if let Some(else_branch) = &w.else_branch {
                visitor.visit_expr(else_branch);
            }
        }
        ExprKind::While(l) | ExprKind::DoWhile(l) => {
            visitor.visit_expr(&l.condition);
            visitor.visit_expr(&l.body);
        }
        ExprKind::Return(r) => {
            if let Some(value) = &r.value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::Throw(e) | ExprKind::Parenthesized(e) => visitor.visit_expr(e),
        ExprKind::Try(t) => {
            visitor.visit_block(&t.body);
            for catch in &t.catches {
                visitor.visit_block(&catch.body);
            }
            if let Some(finally) = &t.finally {
                visitor.visit_block(finally);
            }
        }
        ExprKind::TypeCheck(t) => visitor.visit_expr(&t.expr),
        ExprKind::Cast(c) => visitor.visit_expr(&c.expr),
        ExprKind::Index(i) => {
            visitor.visit_expr(&i.receiver);
            for index in &i.indices {
                visitor.visit_expr(index);
            }
        }
    }
}
