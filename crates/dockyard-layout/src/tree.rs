//! Node arena with navigation and structural mutation primitives.
//!
//! Nodes live in a `BTreeMap` keyed by [`NodeId`]; each record owns its
//! ordered child list and holds a non-owning parent handle. Every insert or
//! removal renumbers the affected sibling list so indices stay contiguous,
//! keeps a tab group's selection on the node it pointed at, and invalidates
//! the group's header memo.
//!
//! # Collapse
//!
//! A non-root stack or tab group never persists with fewer than two
//! children. [`DockTree::collapse_upward`] removes empty containers and
//! promotes a single remaining child into its parent's slot, carrying the
//! size weight, splitter and (for tab groups) caption edge over. Two shapes
//! are exempt: a tab group whose only child is a document (the document
//! well), and the root, which may hold zero or one non-stack child.

use std::collections::{BTreeMap, BTreeSet};

use dockyard_core::geometry::Edge;

use crate::error::TreeError;
use crate::node::{DockNode, DockState, LeafKind, NodeId, NodeKind, Orientation};

/// Nodes removed and root replacement produced by a collapse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollapseOutcome {
    /// Records of removed containers, in removal order.
    pub removed: Vec<DockNode>,
    /// Set when the root stack was replaced by its only stack child.
    pub new_root: Option<NodeId>,
    /// Records, as they were before the reset, of nodes promoted to root
    /// while hidden or floating. The new root is always docked.
    pub grounded: Vec<DockNode>,
}

impl CollapseOutcome {
    fn absorb(&mut self, other: Self) {
        self.removed.extend(other.removed);
        self.grounded.extend(other.grounded);
        if other.new_root.is_some() {
            self.new_root = other.new_root;
        }
    }

    /// Whether the collapse changed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.new_root.is_none() && self.grounded.is_empty()
    }
}

/// Arena of dock nodes under one root stack.
#[derive(Debug, Clone, PartialEq)]
pub struct DockTree {
    root: NodeId,
    next_id: NodeId,
    nodes: BTreeMap<NodeId, DockNode>,
}

impl DockTree {
    /// Build a tree holding only an empty root stack.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        let root = NodeId::MIN;
        let mut nodes = BTreeMap::new();
        nodes.insert(root, DockNode::new(root, NodeKind::stack(orientation)));
        Self {
            root,
            next_id: root.checked_next().unwrap_or(root),
            nodes,
        }
    }

    /// Root stack ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Lookup a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DockNode> {
        self.nodes.get(&id)
    }

    /// Iterate nodes in ID order, including detached ones.
    pub fn nodes(&self) -> impl Iterator<Item = &DockNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&DockNode, TreeError> {
        self.nodes
            .get(&id)
            .ok_or(TreeError::MissingNode { node_id: id })
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut DockNode, TreeError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TreeError::MissingNode { node_id: id })
    }

    // ---- navigation ----

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Children of `id`; empty for leaves and unknown IDs.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// Sibling index, `None` for the root and detached nodes.
    #[must_use]
    pub fn index(&self, id: NodeId) -> Option<usize> {
        self.nodes
            .get(&id)
            .filter(|node| node.parent.is_some())
            .map(|node| node.index)
    }

    #[must_use]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    #[must_use]
    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?.checked_sub(1)?;
        self.children(parent).get(index).copied()
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Descendants of `id` in pre-order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = self.subtree(id);
        if !out.is_empty() {
            let _ = out.remove(0);
        }
        out
    }

    /// `id` followed by its descendants in pre-order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            out.push(node_id);
            stack.extend(self.children(node_id).iter().rev().copied());
        }
        out
    }

    /// Depth below the root (the root is level 0).
    #[must_use]
    pub fn level(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// True when `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Whether the node is attached under the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    // ---- derived attributes ----

    /// Effective caption edge. Leaves in a tab group use the group's edge.
    #[must_use]
    pub fn caption_at(&self, id: NodeId) -> Edge {
        let Some(node) = self.nodes.get(&id) else {
            return Edge::default();
        };
        if node.is_leaf()
            && let Some(parent) = node.parent.and_then(|parent| self.nodes.get(&parent))
            && parent.is_tab_group()
        {
            return parent.caption_at.unwrap_or_default();
        }
        node.caption_at.unwrap_or_default()
    }

    /// Splitter size before `id`, or `None` for first children and non-stack parents.
    #[must_use]
    pub fn splitter_size(&self, id: NodeId, default: u16) -> Option<u16> {
        let node = self.nodes.get(&id)?;
        let parent = self.nodes.get(&node.parent?)?;
        if node.index == 0 || !parent.is_stack() {
            return None;
        }
        Some(node.splitter.unwrap_or(default))
    }

    /// Selected child of a tab group.
    #[must_use]
    pub fn selected_tab(&self, group: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(&group)?;
        let tab = node.tab_group()?;
        node.children.get(tab.selected).copied()
    }

    /// Whether `id` is a tab group whose only child is a document.
    #[must_use]
    pub fn is_document_well(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| {
            node.is_tab_group()
                && node.children.len() == 1
                && node
                    .children
                    .first()
                    .and_then(|child| self.nodes.get(child))
                    .is_some_and(DockNode::is_document)
        })
    }

    /// Whether the node breaks the collapse invariant.
    #[must_use]
    pub fn is_collapsible(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if node.is_leaf() {
            return false;
        }
        match node.parent {
            Some(_) => node.children.len() < 2 && !self.is_document_well(id),
            None => {
                node.children.len() == 1
                    && node
                        .children
                        .first()
                        .and_then(|child| self.nodes.get(child))
                        .is_some_and(DockNode::is_stack)
            }
        }
    }

    // ---- mutation ----

    /// Allocate a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeId, TreeError> {
        let id = self.allocate_node_id()?;
        let previous = self.nodes.insert(id, DockNode::new(id, kind));
        debug_assert!(previous.is_none(), "node id {id} allocated twice");
        Ok(id)
    }

    fn allocate_node_id(&mut self) -> Result<NodeId, TreeError> {
        let current = self.next_id;
        self.next_id = current.checked_next()?;
        Ok(current)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut DockNode> {
        self.nodes.get_mut(&id)
    }

    /// Insert a detached node as the first or last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: NodeId, first: bool) -> Result<(), TreeError> {
        let position = if first { 0 } else { usize::MAX };
        self.insert_at(parent, position, node)
    }

    /// Insert a detached node right before or after `anchor`.
    pub fn add_sibling(&mut self, anchor: NodeId, node: NodeId, after: bool) -> Result<(), TreeError> {
        let record = self.get(anchor)?;
        let parent = record
            .parent
            .ok_or(TreeError::NoParent { node_id: anchor })?;
        let position = record.index + usize::from(after);
        self.insert_at(parent, position, node)
    }

    fn check_insertable(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        let record = self.get(node)?;
        let parent_record = self.get(parent)?;
        if node == parent || node == self.root || self.is_ancestor(node, parent) {
            return Err(TreeError::AncestorConflict {
                ancestor: node,
                descendant: parent,
            });
        }
        if let Some(existing) = record.parent {
            return Err(TreeError::StillAttached {
                node_id: node,
                parent: existing,
            });
        }
        match &parent_record.kind {
            NodeKind::Leaf(_) => Err(TreeError::NotContainer { node_id: parent }),
            NodeKind::TabGroup(_) if !record.is_leaf() => Err(TreeError::TabChildNotLeaf {
                tab: parent,
                child: node,
            }),
            NodeKind::TabGroup(_) | NodeKind::Stack(_) => Ok(()),
        }
    }

    fn insert_at(&mut self, parent: NodeId, position: usize, node: NodeId) -> Result<(), TreeError> {
        self.check_insertable(parent, node)?;
        let parent_record = self.get_mut(parent)?;
        let position = position.min(parent_record.children.len());
        parent_record.children.insert(position, node);
        let len = parent_record.children.len();
        if let NodeKind::TabGroup(tab) = &mut parent_record.kind {
            if len == 1 {
                tab.selected = 0;
            } else if position <= tab.selected {
                tab.selected += 1;
            }
            tab.header.invalidate();
        }
        self.get_mut(node)?.parent = Some(parent);
        self.renumber(parent)
    }

    /// Detach `node` from its parent without destroying it.
    ///
    /// Returns the former parent.
    pub fn detach(&mut self, node: NodeId) -> Result<NodeId, TreeError> {
        let record = self.get(node)?;
        let parent = record.parent.ok_or(TreeError::NoParent { node_id: node })?;
        let position = record.index;
        let parent_record = self.get_mut(parent)?;
        if parent_record.children.get(position) != Some(&node) {
            return Err(TreeError::IndexMismatch {
                node_id: node,
                expected: parent_record
                    .children
                    .iter()
                    .position(|child| *child == node)
                    .unwrap_or(usize::MAX),
                actual: position,
            });
        }
        let _ = parent_record.children.remove(position);
        let len = parent_record.children.len();
        if let NodeKind::TabGroup(tab) = &mut parent_record.kind {
            if position < tab.selected {
                tab.selected -= 1;
            } else if position == tab.selected {
                tab.selected = tab.selected.min(len.saturating_sub(1));
            }
            tab.header.invalidate();
        }
        let record = self.get_mut(node)?;
        record.parent = None;
        record.index = 0;
        self.renumber(parent)?;
        Ok(parent)
    }

    /// Detach `node` if attached and drop it with its whole subtree.
    ///
    /// Returns the removed records in pre-order. The vacated parent is not
    /// collapsed; see [`Self::collapse_upward`].
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<Vec<DockNode>, TreeError> {
        if self.get(node)?.parent.is_some() {
            let _ = self.detach(node)?;
        } else if node == self.root {
            return Err(TreeError::NoParent { node_id: node });
        }
        let ids = self.subtree(node);
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.nodes.remove(&id) {
                removed.push(record);
            }
        }
        Ok(removed)
    }

    /// Put detached `new` into the slot `old` occupies; `old` becomes detached.
    ///
    /// Replacing the root requires `new` to be a stack.
    pub fn replace_in_slot(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        let new_record = self.get(new)?;
        if new == old || new == self.root {
            return Err(TreeError::AncestorConflict {
                ancestor: new,
                descendant: old,
            });
        }
        if let Some(parent) = new_record.parent {
            return Err(TreeError::StillAttached {
                node_id: new,
                parent,
            });
        }
        let new_is_leaf = new_record.is_leaf();
        let new_is_stack = new_record.is_stack();
        let old_record = self.get(old)?;
        let Some(parent) = old_record.parent else {
            if old != self.root {
                return Err(TreeError::NoParent { node_id: old });
            }
            if !new_is_stack {
                return Err(TreeError::RootNotStack { root: new });
            }
            self.root = new;
            return Ok(());
        };
        let position = old_record.index;
        let parent_record = self.get_mut(parent)?;
        if let NodeKind::TabGroup(tab) = &mut parent_record.kind {
            if !new_is_leaf {
                return Err(TreeError::TabChildNotLeaf {
                    tab: parent,
                    child: new,
                });
            }
            tab.header.invalidate();
        }
        let slot = parent_record
            .children
            .get_mut(position)
            .ok_or(TreeError::MissingChild { parent, child: old })?;
        *slot = new;
        let new_record = self.get_mut(new)?;
        new_record.parent = Some(parent);
        new_record.index = position;
        let old_record = self.get_mut(old)?;
        old_record.parent = None;
        old_record.index = 0;
        Ok(())
    }

    /// Wrap `target` in a new container occupying its slot.
    ///
    /// The container copies the target's size weight and takes over its
    /// splitter; `target` becomes the container's first child.
    pub fn wrap_in(&mut self, target: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        let record = self.get(target)?;
        let size = record.size;
        let splitter = record.splitter;
        let container = self.create_node(kind)?;
        if let Err(err) = self.replace_in_slot(target, container) {
            let _ = self.nodes.remove(&container);
            return Err(err);
        }
        let container_record = self.get_mut(container)?;
        container_record.size = size;
        container_record.splitter = splitter;
        self.get_mut(target)?.splitter = None;
        self.add_child(container, target, true)?;
        Ok(container)
    }

    /// Move `node` to `new_index` among its current siblings.
    pub fn reorder(&mut self, node: NodeId, new_index: usize) -> Result<(), TreeError> {
        let record = self.get(node)?;
        let parent = record.parent.ok_or(TreeError::NoParent { node_id: node })?;
        let position = record.index;
        let selected = self.selected_tab(parent);
        let parent_record = self.get_mut(parent)?;
        if parent_record.children.get(position) != Some(&node) {
            return Err(TreeError::MissingChild {
                parent,
                child: node,
            });
        }
        let _ = parent_record.children.remove(position);
        let new_index = new_index.min(parent_record.children.len());
        parent_record.children.insert(new_index, node);
        let selected_index = selected
            .and_then(|selected| parent_record.children.iter().position(|c| *c == selected));
        if let NodeKind::TabGroup(tab) = &mut parent_record.kind {
            if let Some(selected_index) = selected_index {
                tab.selected = selected_index;
            }
            tab.header.invalidate();
        }
        self.renumber(parent)
    }

    /// Select the tab at `index` of `group`.
    pub(crate) fn set_selected(&mut self, group: NodeId, index: usize) -> Result<(), TreeError> {
        let record = self.get_mut(group)?;
        let len = record.children.len();
        let tab = record
            .tab_group_mut()
            .ok_or(TreeError::NotContainer { node_id: group })?;
        if index >= len {
            return Err(TreeError::SelectionOutOfRange {
                node_id: group,
                selected: index,
                len,
            });
        }
        tab.selected = index;
        Ok(())
    }

    fn renumber(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let children = self.get(parent)?.children.clone();
        for (index, child) in children.into_iter().enumerate() {
            self.get_mut(child)?.index = index;
        }
        Ok(())
    }

    // ---- collapse ----

    /// Collapse degenerate containers starting at `start` and walking up.
    pub fn collapse_upward(&mut self, start: NodeId) -> Result<CollapseOutcome, TreeError> {
        let mut outcome = CollapseOutcome::default();
        let mut current = Some(start);
        while let Some(id) = current.take() {
            let Some(record) = self.nodes.get(&id) else {
                break;
            };
            if record.is_leaf() || !self.is_collapsible(id) {
                break;
            }
            let parent = record.parent;
            match (record.children.len(), parent) {
                (0, Some(parent)) => {
                    outcome.removed.extend(self.remove_subtree(id)?);
                    current = Some(parent);
                }
                (_, Some(_)) => {
                    let _ = self.promote_only_child(id)?;
                    if let Some(removed) = self.nodes.remove(&id) {
                        outcome.removed.push(removed);
                    }
                }
                (_, None) => {
                    let child = self.promote_only_child(id)?;
                    let child_record = self.get_mut(child)?;
                    child_record.size = None;
                    child_record.splitter = None;
                    if !child_record.state.is_docked() || child_record.surface.is_some() {
                        outcome.grounded.push(child_record.clone());
                        child_record.state = DockState::DOCKED;
                        child_record.surface = None;
                    }
                    if let Some(removed) = self.nodes.remove(&id) {
                        outcome.removed.push(removed);
                    }
                    outcome.new_root = Some(child);
                    current = Some(child);
                }
            }
        }
        Ok(outcome)
    }

    fn promote_only_child(&mut self, container: NodeId) -> Result<NodeId, TreeError> {
        let record = self.get(container)?;
        let child = record
            .children
            .first()
            .copied()
            .ok_or(TreeError::DegenerateContainer {
                node_id: container,
                children: 0,
            })?;
        let size = record.size;
        let splitter = record.splitter;
        let caption = if record.is_tab_group() {
            record.caption_at
        } else {
            None
        };
        let _ = self.detach(child)?;
        self.replace_in_slot(container, child)?;
        let child_record = self.get_mut(child)?;
        child_record.size = size;
        child_record.splitter = splitter;
        if caption.is_some() {
            child_record.caption_at = caption;
        }
        Ok(child)
    }

    /// Collapse every degenerate container, deepest first.
    pub fn normalize(&mut self) -> Result<CollapseOutcome, TreeError> {
        let mut outcome = CollapseOutcome::default();
        let mut order = self.subtree(self.root);
        order.reverse();
        for id in order {
            if self.nodes.get(&id).is_some_and(|node| !node.is_leaf()) {
                outcome.absorb(self.collapse_upward(id)?);
            }
        }
        Ok(outcome)
    }

    // ---- validation ----

    /// Check every structural invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or(TreeError::MissingRoot { root: self.root })?;
        if let Some(parent) = root.parent {
            return Err(TreeError::RootHasParent {
                root: self.root,
                parent,
            });
        }
        if !root.is_stack() {
            return Err(TreeError::RootNotStack { root: self.root });
        }

        let mut visited = BTreeSet::new();
        let mut names: BTreeSet<(LeafKind, &str)> = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            if !visited.insert(id) {
                return Err(TreeError::AncestorConflict {
                    ancestor: id,
                    descendant: id,
                });
            }
            if let Some(identity) = node.identity()
                && !names.insert(identity)
            {
                return Err(TreeError::DuplicateName {
                    kind: identity.0,
                    name: identity.1.to_string(),
                });
            }
            if self.is_collapsible(id) {
                return Err(TreeError::DegenerateContainer {
                    node_id: id,
                    children: node.children.len(),
                });
            }
            if let Some(tab) = node.tab_group() {
                let len = node.children.len();
                if (len > 0 && tab.selected >= len) || (len == 0 && tab.selected != 0) {
                    return Err(TreeError::SelectionOutOfRange {
                        node_id: id,
                        selected: tab.selected,
                        len,
                    });
                }
            }
            for (index, child) in node.children.iter().copied().enumerate() {
                let record = self
                    .nodes
                    .get(&child)
                    .ok_or(TreeError::MissingChild { parent: id, child })?;
                if record.parent != Some(id) {
                    return Err(TreeError::ParentMismatch {
                        node_id: child,
                        expected: Some(id),
                        actual: record.parent,
                    });
                }
                if record.index != index {
                    return Err(TreeError::IndexMismatch {
                        node_id: child,
                        expected: index,
                        actual: record.index,
                    });
                }
                if node.is_tab_group() && !record.is_leaf() {
                    return Err(TreeError::TabChildNotLeaf { tab: id, child });
                }
                if node.is_leaf() {
                    return Err(TreeError::NotContainer { node_id: id });
                }
                stack.push(child);
            }
        }

        if visited.len() != self.nodes.len()
            && let Some(node_id) = self.nodes.keys().find(|id| !visited.contains(id))
        {
            return Err(TreeError::UnreachableNode { node_id: *node_id });
        }
        Ok(())
    }
}
