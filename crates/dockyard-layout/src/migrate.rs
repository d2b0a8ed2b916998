//! Reconcile a saved layout with a newer default layout.
//!
//! Panels and toolbars are identified by `(kind, name)`; documents never
//! take part. Nodes missing from the default are removed (unless they were
//! added by an extension) and nodes new in the default are inserted next to
//! the node they sit beside in the default layout. Migration never fails on
//! content; it only reports notes describing what changed.

use std::collections::BTreeSet;
use std::fmt;

use crate::config::DockConfig;
use crate::error::TreeError;
use crate::node::{DockNode, LeafKind, NodeId, NodeKind, SizeWeight};
use crate::tree::DockTree;

/// One change applied by [`migrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationNote {
    pub kind: LeafKind,
    pub name: String,
    pub change: MigrationChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationChange {
    /// No longer part of the default layout.
    Removed,
    /// New in the default layout.
    Added { placement: Placement, hidden: bool },
}

/// Where an added node ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    NextTo { kind: LeafKind, name: String },
    RootEnd,
}

impl fmt::Display for MigrationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            MigrationChange::Removed => {
                write!(f, "{} {:?} has been removed in this version", self.kind, self.name)
            }
            MigrationChange::Added { placement, hidden } => {
                write!(f, "new {} {:?} ", self.kind, self.name)?;
                match placement {
                    Placement::NextTo { kind, name } => {
                        // Documents are presented to users as panels.
                        let kind = match kind {
                            LeafKind::Document => LeafKind::Panel,
                            other => *other,
                        };
                        write!(f, "placed next to the {name:?} {kind}")?;
                    }
                    Placement::RootEnd => f.write_str("placed at the end of the window")?,
                }
                if *hidden {
                    f.write_str("; it is hidden")?;
                }
                Ok(())
            }
        }
    }
}

type Identity = (LeafKind, String);

fn identities(tree: &DockTree) -> Vec<(Identity, NodeId)> {
    tree.subtree(tree.root())
        .into_iter()
        .filter_map(|id| {
            let node = tree.node(id)?;
            let (kind, name) = node.identity()?;
            Some(((kind, name.to_string()), id))
        })
        .collect()
}

/// First attached leaf of `kind` named `name`, documents included.
fn find_leaf(tree: &DockTree, kind: LeafKind, name: &str) -> Option<NodeId> {
    tree.subtree(tree.root()).into_iter().find(|id| {
        tree.node(*id)
            .and_then(DockNode::leaf)
            .is_some_and(|leaf| leaf.kind == kind && leaf.name == name)
    })
}

/// Apply the default layout `new` onto the saved layout `old`.
pub fn migrate(
    old: &mut DockTree,
    new: &DockTree,
    config: &DockConfig,
) -> Result<Vec<MigrationNote>, TreeError> {
    let old_ids = identities(old);
    let new_ids = identities(new);
    let old_set: BTreeSet<&Identity> = old_ids.iter().map(|(identity, _)| identity).collect();
    let new_set: BTreeSet<&Identity> = new_ids.iter().map(|(identity, _)| identity).collect();

    let removed: Vec<(Identity, NodeId)> = old_ids
        .iter()
        .filter(|(identity, _)| !new_set.contains(identity))
        .filter(|(_, id)| {
            !old.node(*id)
                .and_then(DockNode::leaf)
                .is_some_and(|leaf| leaf.extension)
        })
        .cloned()
        .collect();
    let added: Vec<(Identity, NodeId)> = new_ids
        .iter()
        .filter(|(identity, _)| !old_set.contains(identity))
        .cloned()
        .collect();

    let mut notes = Vec::with_capacity(removed.len() + added.len());

    for ((kind, name), id) in removed {
        let Some(parent) = old.parent(id) else {
            continue;
        };
        let dropped = old.remove_subtree(id)?;
        let collapsed = old.collapse_upward(parent)?;
        tracing::debug!(
            node = %id,
            dropped = dropped.len(),
            collapsed = collapsed.removed.len(),
            "retired node removed"
        );
        let note = MigrationNote {
            kind,
            name,
            change: MigrationChange::Removed,
        };
        tracing::info!(%note, "layout migration");
        notes.push(note);
    }

    for ((kind, name), added_id) in added {
        let placement = insert_added(old, new, added_id, config)?;
        let hidden = new.node(added_id).is_some_and(|node| node.state().is_hidden());
        let note = MigrationNote {
            kind,
            name,
            change: MigrationChange::Added { placement, hidden },
        };
        tracing::info!(%note, "layout migration");
        notes.push(note);
    }

    Ok(notes)
}

/// Default-tree anchor of `id`: nearest preceding leaf sibling (insert
/// after it), else the nearest following one (insert before it).
fn default_anchor(new: &DockTree, id: NodeId) -> Option<(NodeId, bool)> {
    let parent = new.parent(id)?;
    let siblings = new.children(parent);
    let index = new.index(id)?;
    let is_leaf = |sibling: &&NodeId| new.node(**sibling).is_some_and(DockNode::is_leaf);
    if let Some(before) = siblings[..index].iter().rev().find(is_leaf) {
        return Some((*before, true));
    }
    siblings
        .get(index + 1..)
        .and_then(|rest| rest.iter().find(is_leaf))
        .map(|after| (*after, false))
}

fn copy_leaf(old: &mut DockTree, source: &DockNode) -> Result<NodeId, TreeError> {
    let id = old.create_node(source.kind().clone())?;
    let node = old.get_mut(id)?;
    node.state = source.state();
    node.window_style = source.window_style();
    node.caption_at = source.own_caption_at();
    node.float_geometry = source.float_geometry().map(str::to_string);
    node.splitter = source.splitter();
    Ok(id)
}

fn insert_added(
    old: &mut DockTree,
    new: &DockTree,
    added_id: NodeId,
    config: &DockConfig,
) -> Result<Placement, TreeError> {
    let source = new.get(added_id)?;
    let anchor = default_anchor(new, added_id).and_then(|(by_default, after)| {
        let leaf = new.node(by_default)?.leaf()?;
        let by = find_leaf(old, leaf.kind, &leaf.name)?;
        Some((by_default, by, after, leaf.kind, leaf.name.clone()))
    });
    let id = copy_leaf(old, source)?;

    let Some((by_default, by, after, anchor_kind, anchor_name)) = anchor else {
        old.get_mut(id)?.size = Some(SizeWeight::Proportional(config.default_weight));
        let root = old.root();
        old.add_child(root, id, false)?;
        return Ok(Placement::RootEnd);
    };

    let default_parent = new.get(source.parent().ok_or(TreeError::NoParent { node_id: added_id })?)?;
    let by_parent_id = old.parent(by).ok_or(TreeError::NoParent { node_id: by })?;
    let by_parent = old.get(by_parent_id)?;
    let by_in_tab = by_parent.is_tab_group();
    let by_orientation = by_parent.orientation();
    let in_tab = default_parent.is_tab_group();

    if in_tab && !by_in_tab {
        let caption = old.get(by)?.own_caption_at();
        let group = old.wrap_in(by, NodeKind::tab_group())?;
        old.get_mut(group)?.caption_at = caption;
        old.get_mut(by)?.size = None;
        old.add_sibling(by, id, after)?;
    } else if let (Some(default_orientation), Some(by_orientation)) =
        (default_parent.orientation(), by_orientation)
        && default_orientation != by_orientation
        && default_parent.children().len() == 2
    {
        let default_size = default_parent.size();
        let default_splitter = default_parent.splitter();
        let stack = old.wrap_in(by, NodeKind::stack(default_orientation))?;
        let stack_node = old.get_mut(stack)?;
        stack_node.size = default_size;
        if default_splitter.is_some() {
            stack_node.splitter = default_splitter;
        }
        old.get_mut(by)?.size = new.get(by_default)?.size();
        old.get_mut(id)?.size = source.size();
        old.add_sibling(by, id, after)?;
    } else {
        old.get_mut(id)?.size = if by_in_tab {
            None
        } else {
            Some(SizeWeight::Proportional(config.default_weight))
        };
        old.add_sibling(by, id, after)?;
    }

    Ok(Placement::NextTo {
        kind: anchor_kind,
        name: anchor_name,
    })
}
