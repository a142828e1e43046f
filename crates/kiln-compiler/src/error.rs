//! Compilation errors

use kiln_ast::{NodeId, SymbolId};
use thiserror::Error;

use crate::ir::{IrNodeId, Slot};

pub type CompileResult<T> = Result<T, CompileError>;

/// Violation of the tree ownership discipline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {node} is already attached to {parent} at {slot}")]
    AlreadyAttached {
        node: IrNodeId,
        parent: IrNodeId,
        slot: Slot,
    },

    #[error("node {node} is not attached")]
    NotAttached { node: IrNodeId },

    #[error("node {parent} has no slot {slot}")]
    NoSuchSlot { parent: IrNodeId, slot: Slot },

    #[error("slot {slot} of {parent} already holds {occupant}")]
    SlotOccupied {
        parent: IrNodeId,
        slot: Slot,
        occupant: IrNodeId,
    },

    #[error("replacement node {node} is still attached to {parent} at {slot}")]
    NotDetached {
        node: IrNodeId,
        parent: IrNodeId,
        slot: Slot,
    },

    #[error("attaching {node} under {parent} would make it its own ancestor")]
    Cycle { node: IrNodeId, parent: IrNodeId },

    #[error("node {node} records parent {recorded:?} but was reached from {actual} at {slot}")]
    BrokenParentLink {
        node: IrNodeId,
        recorded: Option<(IrNodeId, Slot)>,
        actual: IrNodeId,
        slot: Slot,
    },

    #[error("node {node} is reachable twice")]
    Shared { node: IrNodeId },

    #[error("unknown node {node}")]
    UnknownNode { node: IrNodeId },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Missing resolution: no {what} recorded for node {node}")]
    MissingResolution { what: &'static str, node: NodeId },

    #[error("Unsupported receiver: {description}")]
    UnsupportedReceiver { description: String },

    #[error("Parameter {index} of {callee} is bound by more than one argument")]
    DuplicateParameterIndex { callee: SymbolId, index: u32 },

    #[error("Argument bound to parameter {index} of {callee}, which takes {arity}")]
    NoSuchParameter {
        callee: SymbolId,
        index: u32,
        arity: usize,
    },

    #[error("Jump {node} has no enclosing loop")]
    UnknownLoop { node: NodeId },

    #[error("Tree invariant violated: {0}")]
    Tree(#[from] TreeError),

    #[error("Module is incomplete: {count} unsupported construct(s) were lowered to placeholders")]
    Incomplete { count: usize },

    #[error("Invalid compiler options: {message}")]
    InvalidOptions { message: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub(crate) fn missing(what: &'static str, node: NodeId) -> Self {
        CompileError::MissingResolution { what, node }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }
}
