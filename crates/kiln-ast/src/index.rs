//! Lookup of expressions by node identity
//!
//! Resolution records refer to argument and receiver expressions by
//! [`NodeId`]; the index maps those ids back to the syntax they name.

use rustc_hash::FxHashMap;

use crate::ast::{walk_expr, Expr, Module, Visitor};
use crate::span::{NodeId, Span};

#[derive(Debug, Default)]
pub struct AstIndex<'ast> {
    exprs: FxHashMap<NodeId, &'ast Expr>,
}

impl<'ast> AstIndex<'ast> {
    pub fn build(module: &'ast Module) -> Self {
        let mut index = AstIndex::default();
        index.visit_module(module);
        index
    }

    pub fn expr(&self, id: NodeId) -> Option<&'ast Expr> {
        self.exprs.get(&id).copied()
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.expr(id).map(|e| e.span)
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl<'ast> Visitor<'ast> for AstIndex<'ast> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        self.exprs.insert(expr.id, expr);
        walk_expr(self, expr);
    }
}
