//! Tree-shaped intermediate representation
//!
//! Lowering builds an [`IrTree`] of [`IrNode`]s. Nodes are created detached
//! and attached into their parent's [`Slot`] as lowering proceeds; the tree
//! rejects any mutation that would leave a node with two parents or a stale
//! parent link.

mod dump;
mod kind;
mod node;
mod slot;
mod tree;
mod visitor;

pub use dump::dump;
pub use kind::NodeKind;
pub use node::{
    ConstValue, FunctionKind, IrKind, IrNode, IrNodeId, IrOrigin, LoopKind, SingletonKind,
    Temporary, TemporaryId, TreeLocation, TypeOperator, ValueRef,
};
pub use slot::Slot;
pub use tree::IrTree;
pub use visitor::{Dispatcher, DispatcherBuilder, Handler, TreeView};
