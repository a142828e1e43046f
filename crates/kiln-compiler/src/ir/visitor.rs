//! Dispatch-table visitor
//!
//! A [`Dispatcher`] maps every concrete [`NodeKind`] to a handler, picked as
//! the nearest registered kind along [`NodeKind::chain`]. Visitors register
//! only the kinds they care about and leave the rest to the generalizations:
//!
//! ```ignore
//! let dispatcher = DispatcherBuilder::new(visit_element)
//!     .on(NodeKind::Function, visit_function) // also Constructor and Accessor
//!     .on(NodeKind::Call, visit_call)
//!     .build();
//! dispatcher.visit(&mut state, root);
//! ```

use rustc_hash::FxHashMap;

use super::{IrNodeId, IrTree, NodeKind};

/// Visitor state that can see the tree being walked
pub trait TreeView {
    fn tree(&self) -> &IrTree;
}

impl TreeView for IrTree {
    fn tree(&self) -> &IrTree {
        self
    }
}

/// Handler for one node; receives the dispatcher so it can recurse
pub type Handler<V, R> = fn(&Dispatcher<V, R>, &mut V, IrNodeId) -> R;

pub struct DispatcherBuilder<V, R> {
    handlers: FxHashMap<NodeKind, Handler<V, R>>,
    fallback: Handler<V, R>,
}

impl<V: TreeView, R> DispatcherBuilder<V, R> {
    /// `fallback` handles kinds with no registered generalization at all
    pub fn new(fallback: Handler<V, R>) -> Self {
        Self {
            handlers: FxHashMap::default(),
            fallback,
        }
    }

    pub fn on(mut self, kind: NodeKind, handler: Handler<V, R>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn build(self) -> Dispatcher<V, R> {
        let table = NodeKind::ALL
            .iter()
            .map(|kind| {
                kind.chain()
                    .find_map(|general| self.handlers.get(&general).map(|h| (Some(general), *h)))
                    .unwrap_or((None, self.fallback))
            })
            .collect();
        Dispatcher { table }
    }
}

pub struct Dispatcher<V, R> {
    /// Indexed by `NodeKind::index`; the kind is the one that registered the handler
    table: Vec<(Option<NodeKind>, Handler<V, R>)>,
}

impl<V: TreeView, R> Dispatcher<V, R> {
    pub fn visit(&self, visitor: &mut V, node: IrNodeId) -> R {
        let kind = visitor.tree().node_kind(node);
        let (_, handler) = self.table[kind.index()];
        handler(self, visitor, node)
    }

    /// Registered kind whose handler serves `kind`, `None` for the fallback
    pub fn handled_as(&self, kind: NodeKind) -> Option<NodeKind> {
        self.table[kind.index()].0
    }
}

impl<V: TreeView> Dispatcher<V, ()> {
    /// Visit the direct children of `node` in slot order
    pub fn visit_children(&self, visitor: &mut V, node: IrNodeId) {
        for (_, child) in visitor.tree().children(node) {
            self.visit(visitor, child);
        }
    }
}

impl<V: TreeView, E> Dispatcher<V, Result<(), E>> {
    /// Visit the direct children of `node` in slot order, stopping at the first error
    pub fn try_visit_children(&self, visitor: &mut V, node: IrNodeId) -> Result<(), E> {
        for (_, child) in visitor.tree().children(node) {
            self.visit(visitor, child)?;
        }
        Ok(())
    }
}
