//! Arena-backed IR tree
//!
//! Nodes live in one arena and are addressed by [`IrNodeId`]. Each node
//! records its parent and slot; every mutation below keeps that record and
//! the parent's slot storage in agreement, and reports a [`TreeError`]
//! instead of leaving either side dangling.

use kiln_ast::Span;
use kiln_types::TypeId;
use rustc_hash::FxHashSet;

use super::node::{IrKind, IrNode, IrNodeId, SlotCell, Temporary, TemporaryId, TreeLocation};
use super::slot::Slot;
use super::NodeKind;
use crate::error::TreeError;

#[derive(Debug, Clone, Default)]
pub struct IrTree {
    nodes: Vec<IrNode>,
    temporaries: Vec<Temporary>,
}

impl IrTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn add(&mut self, span: Span, ty: Option<TypeId>, kind: IrKind) -> IrNodeId {
        let id = IrNodeId(self.nodes.len() as u32);
        self.nodes.push(IrNode {
            span,
            ty,
            location: TreeLocation::Detached,
            kind,
        });
        id
    }

    pub fn get(&self, id: IrNodeId) -> Option<&IrNode> {
        self.nodes.get(id.0 as usize)
    }

    /// # Panics
    ///
    /// Panics if `id` was not created by this tree.
    pub fn node(&self, id: IrNodeId) -> &IrNode {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: IrNodeId) -> &IrKind {
        &self.node(id).kind
    }

    pub fn node_kind(&self, id: IrNodeId) -> NodeKind {
        self.kind(id).node_kind()
    }

    pub fn span(&self, id: IrNodeId) -> Span {
        self.node(id).span
    }

    pub fn ty(&self, id: IrNodeId) -> Option<TypeId> {
        self.node(id).ty
    }

    pub fn set_ty(&mut self, id: IrNodeId, ty: Option<TypeId>) {
        self.nodes[id.0 as usize].ty = ty;
    }

    pub fn location(&self, id: IrNodeId) -> TreeLocation {
        self.node(id).location
    }

    pub fn parent(&self, id: IrNodeId) -> Option<IrNodeId> {
        match self.location(id) {
            TreeLocation::Attached { parent, .. } => Some(parent),
            TreeLocation::Detached => None,
        }
    }

    /// Occupied slots of `id` in traversal order
    pub fn children(&self, id: IrNodeId) -> Vec<(Slot, IrNodeId)> {
        self.kind(id).children()
    }

    /// Node held at `slot`, absent if the slot is empty or undeclared
    pub fn child(&self, parent: IrNodeId, slot: Slot) -> Option<IrNodeId> {
        self.children(parent)
            .into_iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, child)| child)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, id: IrNodeId) -> Result<(), TreeError> {
        if self.get(id).is_none() {
            return Err(TreeError::UnknownNode { node: id });
        }
        Ok(())
    }

    fn check_detached(&self, node: IrNodeId) -> Result<(), TreeError> {
        match self.location(node) {
            TreeLocation::Detached => Ok(()),
            TreeLocation::Attached { parent, slot } => {
                Err(TreeError::AlreadyAttached { node, parent, slot })
            }
        }
    }

    fn check_no_cycle(&self, node: IrNodeId, parent: IrNodeId) -> Result<(), TreeError> {
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == node {
                return Err(TreeError::Cycle { node, parent });
            }
            current = self.parent(ancestor);
        }
        Ok(())
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    /// Attach a detached node into an empty slot
    ///
    /// For growable list slots the index may equal the current length, which
    /// appends.
    pub fn attach(&mut self, node: IrNodeId, parent: IrNodeId, slot: Slot) -> Result<(), TreeError> {
        self.check(node)?;
        self.check(parent)?;
        self.check_detached(node)?;
        self.check_no_cycle(node, parent)?;

        let cell = self.nodes[parent.0 as usize]
            .kind
            .slot_cell(slot)
            .ok_or(TreeError::NoSuchSlot { parent, slot })?;
        match cell {
            SlotCell::Single(target) => {
                if let Some(occupant) = *target {
                    return Err(TreeError::SlotOccupied { parent, slot, occupant });
                }
                *target = Some(node);
            }
            SlotCell::Fixed(list, index) | SlotCell::Growable(list, index) if index < list.len() => {
                if let Some(occupant) = list[index] {
                    return Err(TreeError::SlotOccupied { parent, slot, occupant });
                }
                list[index] = Some(node);
            }
            SlotCell::Growable(list, index) if index == list.len() => list.push(Some(node)),
            SlotCell::Fixed(..) | SlotCell::Growable(..) => {
                return Err(TreeError::NoSuchSlot { parent, slot });
            }
        }

        self.nodes[node.0 as usize].location = TreeLocation::Attached { parent, slot };
        Ok(())
    }

    /// Append to the node's list slot (statements, files, members, branches, ...)
    pub fn append(&mut self, parent: IrNodeId, node: IrNodeId) -> Result<Slot, TreeError> {
        self.check(parent)?;
        let slot = self.kind(parent).append_slot().ok_or(TreeError::NoSuchSlot {
            parent,
            slot: Slot::Statement(0),
        })?;
        self.attach(node, parent, slot)?;
        Ok(slot)
    }

    /// Remove an attached node from its slot, leaving the slot empty
    pub fn detach(&mut self, node: IrNodeId) -> Result<(IrNodeId, Slot), TreeError> {
        self.check(node)?;
        let (parent, slot) = match self.location(node) {
            TreeLocation::Attached { parent, slot } => (parent, slot),
            TreeLocation::Detached => return Err(TreeError::NotAttached { node }),
        };

        let cell = self.nodes[parent.0 as usize]
            .kind
            .slot_cell(slot)
            .ok_or(TreeError::NoSuchSlot { parent, slot })?;
        let target = match cell {
            SlotCell::Single(target) => target,
            SlotCell::Fixed(list, index) | SlotCell::Growable(list, index) => list
                .get_mut(index)
                .ok_or(TreeError::NoSuchSlot { parent, slot })?,
        };
        if *target != Some(node) {
            return Err(TreeError::BrokenParentLink {
                node,
                recorded: Some((parent, slot)),
                actual: parent,
                slot,
            });
        }
        *target = None;

        self.nodes[node.0 as usize].location = TreeLocation::Detached;
        Ok((parent, slot))
    }

    /// Put `node` into `slot`, detaching any previous occupant
    ///
    /// The slot must exist; for list slots that means an index below the
    /// current length. Returns the previous occupant, now detached.
    pub fn replace_child(
        &mut self,
        parent: IrNodeId,
        slot: Slot,
        node: IrNodeId,
    ) -> Result<Option<IrNodeId>, TreeError> {
        self.check(node)?;
        self.check(parent)?;
        if let TreeLocation::Attached {
            parent: owner,
            slot: owner_slot,
        } = self.location(node)
        {
            return Err(TreeError::NotDetached {
                node,
                parent: owner,
                slot: owner_slot,
            });
        }
        self.check_no_cycle(node, parent)?;

        let cell = self.nodes[parent.0 as usize]
            .kind
            .slot_cell(slot)
            .ok_or(TreeError::NoSuchSlot { parent, slot })?;
        let target = match cell {
            SlotCell::Single(target) => target,
            SlotCell::Fixed(list, index) | SlotCell::Growable(list, index) => list
                .get_mut(index)
                .ok_or(TreeError::NoSuchSlot { parent, slot })?,
        };
        let old = target.replace(node);

        if let Some(old) = old {
            self.nodes[old.0 as usize].location = TreeLocation::Detached;
        }
        self.nodes[node.0 as usize].location = TreeLocation::Attached { parent, slot };
        Ok(old)
    }

    // ========================================================================
    // Temporaries
    // ========================================================================

    pub fn add_temporary(&mut self, name: String, ty: Option<TypeId>) -> TemporaryId {
        let id = TemporaryId(self.temporaries.len() as u32);
        self.temporaries.push(Temporary { name, ty });
        id
    }

    pub fn temporary(&self, id: TemporaryId) -> Option<&Temporary> {
        self.temporaries.get(id.0 as usize)
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Check parent links of everything reachable from `root`
    ///
    /// Every reached node must record exactly the parent and slot it was
    /// reached through, no node may be reached twice, and the root itself
    /// must be detached.
    pub fn verify(&self, root: IrNodeId) -> Result<(), TreeError> {
        self.check(root)?;
        if let TreeLocation::Attached { parent, slot } = self.location(root) {
            return Err(TreeError::AlreadyAttached { node: root, parent, slot });
        }

        let mut seen = FxHashSet::default();
        seen.insert(root);
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            for (slot, child) in self.children(parent) {
                self.check(child)?;
                if !seen.insert(child) {
                    return Err(TreeError::Shared { node: child });
                }
                let expected = TreeLocation::Attached { parent, slot };
                let location = self.location(child);
                if location != expected {
                    let recorded = match location {
                        TreeLocation::Attached { parent, slot } => Some((parent, slot)),
                        TreeLocation::Detached => None,
                    };
                    return Err(TreeError::BrokenParentLink {
                        node: child,
                        recorded,
                        actual: parent,
                        slot,
                    });
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Every node reachable from `root`, root first, in traversal order
    pub fn descendants(&self, root: IrNodeId) -> Vec<IrNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev().map(|(_, child)| child));
        }
        out
    }
}
