//! Construction helpers for syntax trees
//!
//! Front ends and tests build trees through [`AstBuilder`], which hands out
//! fresh node ids and consecutive, non-overlapping spans.

use crate::ast::*;

#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: u32,
    offset: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn span(&mut self) -> Span {
        let span = Span::new(self.offset, self.offset + 1);
        self.offset += 2;
        span
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = self.id();
        let span = self.span();
        Expr::new(id, span, kind)
    }

    // Literals and names

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::String(value.to_string())))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Boolean(value)))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Null))
    }

    pub fn name(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Name(name.to_string()))
    }

    pub fn this(&mut self) -> Expr {
        self.expr(ExprKind::This(None))
    }

    // Calls

    pub fn arg(value: Expr) -> Argument {
        Argument { name: None, value }
    }

    pub fn named_arg(name: &str, value: Expr) -> Argument {
        Argument {
            name: Some(name.to_string()),
            value,
        }
    }

    pub fn call(&mut self, callee: &str, arguments: Vec<Argument>) -> Expr {
        self.expr(ExprKind::Call(CallExpr {
            callee: callee.to_string(),
            arguments,
        }))
    }

    pub fn qualified(&mut self, receiver: Expr, selector: Expr) -> Expr {
        self.expr(ExprKind::Qualified(QualifiedExpr {
            receiver: Box::new(receiver),
            selector: Box::new(selector),
            safe: false,
        }))
    }

    pub fn safe_qualified(&mut self, receiver: Expr, selector: Expr) -> Expr {
        self.expr(ExprKind::Qualified(QualifiedExpr {
            receiver: Box::new(receiver),
            selector: Box::new(selector),
            safe: true,
        }))
    }

    // Operators

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
        }))
    }

    pub fn assign(&mut self, op: AssignOp, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign(AssignExpr {
            op,
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    // Control flow

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.id(),
            span: self.span(),
            statements,
        }
    }

    pub fn block_expr(&mut self, statements: Vec<Statement>) -> Expr {
        let block = self.block(statements);
        Expr::new(block.id, block.span, ExprKind::Block(block))
    }

    pub fn if_expr(&mut self, condition: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Expr {
        self.expr(ExprKind::If(IfExpr {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }))
    }

    pub fn while_loop(&mut self, label: Option<&str>, condition: Expr, body: Expr) -> Expr {
        self.expr(ExprKind::While(LoopExpr {
            label: label.map(str::to_string),
            condition: Box::new(condition),
            body: Box::new(body),
        }))
    }

    pub fn do_while_loop(&mut self, label: Option<&str>, condition: Expr, body: Expr) -> Expr {
        self.expr(ExprKind::DoWhile(LoopExpr {
            label: label.map(str::to_string),
            condition: Box::new(condition),
            body: Box::new(body),
        }))
    }

    pub fn ret(&mut self, label: Option<&str>, value: Option<Expr>) -> Expr {
        self.expr(ExprKind::Return(ReturnExpr {
            label: label.map(str::to_string),
            value: value.map(Box::new),
        }))
    }

    // Declarations

    pub fn variable(&mut self, name: &str, mutable: bool, initializer: Option<Expr>) -> VariableDecl {
        VariableDecl {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            mutable,
            initializer,
            delegate: None,
        }
    }

    pub fn destructuring(&mut self, names: &[&str], initializer: Expr) -> DestructuringDecl {
        let entries = names
            .iter()
            .map(|name| DestructuringEntry {
                id: self.id(),
                span: self.span(),
                name: name.to_string(),
            })
            .collect();
        DestructuringDecl {
            id: self.id(),
            span: self.span(),
            entries,
            initializer,
        }
    }

    pub fn parameter(&mut self, name: &str, default_value: Option<Expr>) -> Parameter {
        Parameter {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            default_value,
        }
    }

    pub fn function(&mut self, name: &str, parameters: Vec<Parameter>, body: Option<FunctionBody>) -> FunctionDecl {
        FunctionDecl {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            parameters,
            body,
        }
    }

    pub fn property(&mut self, name: &str, initializer: Option<Expr>) -> PropertyDecl {
        PropertyDecl {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            initializer,
            delegate: None,
            getter: None,
            setter: None,
        }
    }

    pub fn class(&mut self, name: &str, members: Vec<ClassMember>) -> ClassDecl {
        ClassDecl {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            primary_constructor: None,
            super_call: None,
            enum_entries: Vec::new(),
            members,
        }
    }

    pub fn file(&mut self, name: &str, declarations: Vec<Declaration>) -> File {
        File {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
            declarations,
        }
    }

    pub fn module(name: &str, files: Vec<File>) -> Module {
        Module {
            name: name.to_string(),
            files,
        }
    }
}
