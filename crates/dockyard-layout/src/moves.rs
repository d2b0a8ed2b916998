//! User-directed moves.
//!
//! A move docks the mover, reparents it according to a [`MoveRelation`],
//! collapses the container it left and, for documents that left a tab
//! group, wraps them back into a tab group of their own.

use dockyard_core::geometry::Edge;

use crate::error::DockError;
use crate::events::DockEvent;
use crate::floating::FloatingHost;
use crate::node::{DockNode, DockState, NodeId, NodeKind, Orientation, SizeWeight};
use crate::panels::DockPanels;

/// Where the mover goes relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveRelation {
    BeforeTarget,
    AfterTarget,
    /// Replace the target with a stack holding both; the edge picks the
    /// orientation and the mover's side.
    NewStack(Edge),
    FirstInNewTab,
    LastInNewTab,
    /// Into an empty stack or tab group.
    Child,
}

impl MoveRelation {
    /// Every relation, in menu order.
    pub const ALL: [Self; 9] = [
        Self::BeforeTarget,
        Self::AfterTarget,
        Self::FirstInNewTab,
        Self::LastInNewTab,
        Self::NewStack(Edge::Left),
        Self::NewStack(Edge::Right),
        Self::NewStack(Edge::Top),
        Self::NewStack(Edge::Bottom),
        Self::Child,
    ];

    #[must_use]
    pub const fn is_beside(self) -> bool {
        matches!(self, Self::BeforeTarget | Self::AfterTarget)
    }

    const fn is_new_tab(self) -> bool {
        matches!(self, Self::FirstInNewTab | Self::LastInNewTab)
    }
}

impl DockPanels {
    fn in_tab(&self, node: NodeId) -> bool {
        self.tree
            .parent(node)
            .and_then(|parent| self.tree.node(parent))
            .is_some_and(DockNode::is_tab_group)
    }

    /// A document leaf or a tab group of documents.
    fn is_documents_node(&self, node: &DockNode) -> bool {
        node.is_document()
            || (node.is_tab_group()
                && node
                    .children()
                    .first()
                    .and_then(|child| self.tree.node(*child))
                    .is_some_and(DockNode::is_document))
    }

    /// Whether `move_node(mover, target, relation)` would change the layout.
    #[must_use]
    pub fn can_move(&self, mover: NodeId, target: NodeId, relation: MoveRelation) -> bool {
        let (Some(mover_node), Some(target_node)) = (self.tree.node(mover), self.tree.node(target))
        else {
            return false;
        };
        if mover == target || mover_node.parent().is_none() || self.tree.is_ancestor(mover, target) {
            return false;
        }
        let same_docness = mover_node.is_leaf()
            && target_node.is_leaf()
            && mover_node.is_document() == target_node.is_document();
        let target_in_tab = self.in_tab(target);
        if target_in_tab {
            if !relation.is_beside() || !same_docness {
                return false;
            }
        } else if mover_node.is_document()
            && self.in_tab(mover)
            && mover_node.parent() != Some(target)
            && !self.is_documents_node(target_node)
        {
            return false;
        }

        match relation {
            MoveRelation::BeforeTarget => {
                target_node.parent().is_some() && self.tree.previous(target) != Some(mover)
            }
            MoveRelation::AfterTarget => {
                target_node.parent().is_some() && self.tree.next(target) != Some(mover)
            }
            MoveRelation::NewStack(_) => target_node.parent().is_some(),
            MoveRelation::FirstInNewTab | MoveRelation::LastInNewTab => {
                target_node.parent().is_some() && same_docness
            }
            MoveRelation::Child => {
                target_node.children().is_empty()
                    && (target_node.is_stack() || (target_node.is_tab_group() && mover_node.is_leaf()))
            }
        }
    }

    /// Every (target, relation) pair `mover` can be moved to.
    #[must_use]
    pub fn move_targets(&self, mover: NodeId) -> Vec<(NodeId, MoveRelation)> {
        self.tree
            .subtree(self.tree.root())
            .into_iter()
            .flat_map(|target| MoveRelation::ALL.map(|relation| (target, relation)))
            .filter(|(target, relation)| self.can_move(mover, *target, *relation))
            .collect()
    }

    /// Move `mover` relative to `target`.
    ///
    /// Returns `Ok(false)` without touching anything when the move is not
    /// allowed or would not change the layout. On error nothing changes.
    pub fn move_node(
        &mut self,
        mover: NodeId,
        target: NodeId,
        relation: MoveRelation,
        host: &mut dyn FloatingHost,
    ) -> Result<bool, DockError> {
        if !self.can_move(mover, target, relation) {
            return Ok(false);
        }
        let tree = self.tree.clone();
        let events = self.events.clone();
        let result = self.apply_move(mover, target, relation, host);
        if let Err(err) = &result {
            tracing::warn!(mover = %mover, target = %target, ?relation, error = %err, "move rolled back");
            self.tree = tree;
            self.events = events;
        }
        result.map(|()| true)
    }

    fn apply_move(
        &mut self,
        mover: NodeId,
        target: NodeId,
        relation: MoveRelation,
        host: &mut dyn FloatingHost,
    ) -> Result<(), DockError> {
        let old_parent = self.tree.get(mover)?.parent();
        let after = relation == MoveRelation::AfterTarget;
        let reorder = relation.is_beside()
            && old_parent.is_some()
            && self.tree.parent(target) == old_parent
            && self.in_tab(mover);

        if reorder {
            self.apply_dock_state(mover, DockState::DOCKED, host)?;
        } else {
            self.dock_for_move(mover, host)?;
        }
        if !relation.is_beside() && !self.tree.get(target)?.state().is_docked() {
            self.apply_dock_state(target, DockState::DOCKED, host)?;
        }

        if reorder {
            let from = self.tree.get(mover)?.index();
            let to = self.tree.get(target)?.index();
            let to = if to > from { to - 1 } else { to };
            self.tree.reorder(mover, to + usize::from(after))?;
            tracing::debug!(mover = %mover, target = %target, ?relation, "tab reordered");
            return Ok(());
        }

        let old_parent = self.tree.detach(mover)?;
        let old_parent_is_tab = self.tree.get(old_parent)?.is_tab_group();
        let old_caption = self.tree.caption_at(old_parent);

        match relation {
            MoveRelation::NewStack(edge) => {
                let target_size = self.tree.get(target)?.size();
                let _ = self
                    .tree
                    .wrap_in(target, NodeKind::stack(Orientation::for_edge(edge)))?;
                self.tree.add_sibling(target, mover, edge.is_far())?;
                self.tree.get_mut(mover)?.size = target_size;
            }
            MoveRelation::FirstInNewTab | MoveRelation::LastInNewTab => {
                let caption = self.tree.get(target)?.own_caption_at();
                let group = self.tree.wrap_in(target, NodeKind::tab_group())?;
                self.tree.get_mut(group)?.caption_at = caption;
                let target_record = self.tree.get_mut(target)?;
                target_record.size = None;
                target_record.caption_at = None;
                self.tree
                    .add_sibling(target, mover, relation == MoveRelation::LastInNewTab)?;
                self.tree.get_mut(mover)?.size = None;
                let index = self.tree.get(mover)?.index();
                self.tree.set_selected(group, index)?;
            }
            MoveRelation::Child => {
                self.tree.add_child(target, mover, true)?;
                let target_record = self.tree.get(target)?;
                if target_record.is_tab_group() {
                    self.tree.set_selected(target, 0)?;
                    self.tree.get_mut(mover)?.size = None;
                } else {
                    let record = self.tree.get_mut(mover)?;
                    if !(record.is_toolbar() && record.size.is_some_and(SizeWeight::is_auto)) {
                        record.size = Some(SizeWeight::Proportional(self.config.moved_weight));
                    }
                }
            }
            MoveRelation::BeforeTarget | MoveRelation::AfterTarget => {
                self.tree.add_sibling(target, mover, after)?;
                self.size_beside(mover, target)?;
            }
        }
        self.tree.get_mut(mover)?.splitter = None;

        let outcome = self.tree.collapse_upward(old_parent)?;
        self.absorb_collapse(&outcome, host);

        if !relation.is_new_tab()
            && relation != MoveRelation::Child
            && old_parent_is_tab
            && self.tree.get(mover)?.is_document()
            && !self.in_tab(mover)
        {
            let group = self.tree.wrap_in(mover, NodeKind::tab_group())?;
            self.tree.get_mut(group)?.caption_at = Some(old_caption);
            self.tree.get_mut(mover)?.size = None;
        }

        self.reveal_in_group(mover, host)?;

        let new_parent = self.tree.parent(mover);
        if new_parent != Some(old_parent) {
            self.events.push(DockEvent::ParentChanged { node: mover });
        }
        tracing::debug!(mover = %mover, target = %target, ?relation, "node moved");
        Ok(())
    }

    /// Show the hidden tab group a docked tab landed in and select the tab.
    fn reveal_in_group(&mut self, node: NodeId, host: &mut dyn FloatingHost) -> Result<(), DockError> {
        let Some(group) = self.tree.parent(node) else {
            return Ok(());
        };
        let record = self.tree.get(group)?;
        if !record.is_tab_group() || !record.state().is_hidden() {
            return Ok(());
        }
        let shown = record.state() - DockState::HIDDEN;
        self.apply_dock_state(group, shown, host)?;
        let index = self.tree.get(node)?.index();
        self.tree.set_selected(group, index)?;
        self.events.push(DockEvent::TabSelected { node });
        Ok(())
    }
}
