//! Dock state machine: hide, show, float and dock.
//!
//! A state change may cascade. Hiding the last visible tab hides its group;
//! showing a tab of a hidden group shows the group. Hiding keeps the
//! floating bit so the node floats again when shown.

use crate::error::{DockError, TreeError};
use crate::events::DockEvent;
use crate::floating::FloatingHost;
use crate::node::{DockState, NodeId};
use crate::panels::DockPanels;

impl DockPanels {
    /// Change the dock state of `node`.
    ///
    /// Either the whole change (cascades included) applies or nothing does.
    pub fn set_dock_state(
        &mut self,
        node: NodeId,
        state: DockState,
        host: &mut dyn FloatingHost,
    ) -> Result<(), DockError> {
        let tree = self.tree.clone();
        let events = self.events.clone();
        let result = self.apply_dock_state(node, state, host);
        if let Err(err) = &result {
            tracing::warn!(node = %node, ?state, error = %err, "dock state change rolled back");
            self.tree = tree;
            self.events = events;
        }
        result
    }

    /// Show a hidden node, floating it again if it was floating.
    pub fn show(&mut self, node: NodeId, host: &mut dyn FloatingHost) -> Result<(), DockError> {
        let state = self.tree.get(node)?.state() - DockState::HIDDEN;
        self.set_dock_state(node, state, host)
    }

    pub(crate) fn apply_dock_state(
        &mut self,
        node: NodeId,
        state: DockState,
        host: &mut dyn FloatingHost,
    ) -> Result<(), DockError> {
        let record = self.tree.get(node)?;
        let old = record.state();
        let parent = record.parent();
        let mut new = state;
        if new.is_hidden() && old.contains(DockState::FLOATING) {
            new |= DockState::FLOATING;
        }

        if new == old {
            if new.is_docked()
                && let Some(parent) = parent
                && self.tree.get(parent)?.state().is_hidden()
            {
                let shown = self.tree.get(parent)?.state() - DockState::HIDDEN;
                self.apply_dock_state(parent, shown, host)?;
            }
            return Ok(());
        }
        let Some(parent) = parent else {
            return Err(TreeError::NoParent { node_id: node }.into());
        };
        let parent_record = self.tree.get(parent)?;
        let in_tab = parent_record.is_tab_group();
        let parent_hidden = parent_record.state().is_hidden();

        if new.is_visibly_floating() {
            self.open_surface(node, false, host)?;
        } else if new.is_docked() && in_tab && parent_hidden {
            let shown = self.tree.get(parent)?.state() - DockState::HIDDEN;
            self.apply_dock_state(parent, shown, host)?;
        }

        self.tree.get_mut(node)?.state = new;
        if old.is_visibly_floating() {
            self.close_surface(node, host);
        }

        if in_tab {
            if new.is_docked() {
                let index = self.tree.get(node)?.index();
                self.tree.set_selected(parent, index)?;
                self.events.push(DockEvent::TabSelected { node });
            } else if old.is_docked() {
                self.hide_tab(parent, node, host)?;
            }
        }

        self.raise_state_events(node, old, new);
        tracing::debug!(node = %node, ?old, ?new, "dock state changed");
        Ok(())
    }

    /// `node` just left the visible tabs of `group`.
    fn hide_tab(
        &mut self,
        group: NodeId,
        node: NodeId,
        host: &mut dyn FloatingHost,
    ) -> Result<(), DockError> {
        let visible: Vec<NodeId> = self
            .tree
            .children(group)
            .iter()
            .copied()
            .filter(|child| {
                *child == node
                    || self
                        .tree
                        .node(*child)
                        .is_some_and(|record| record.state().is_docked())
            })
            .collect();
        if visible.len() > 1 {
            if self.tree.selected_tab(group) == Some(node)
                && let Some(at) = visible.iter().position(|child| *child == node)
            {
                let next = if at + 1 < visible.len() {
                    visible[at + 1]
                } else {
                    visible[at - 1]
                };
                let index = self.tree.get(next)?.index();
                self.tree.set_selected(group, index)?;
                self.events.push(DockEvent::TabSelected { node: next });
            }
            return Ok(());
        }
        let group_state = self.tree.get(group)?.state();
        if !self.tree.get(node)?.is_document() && !group_state.is_hidden() {
            self.apply_dock_state(group, group_state | DockState::HIDDEN, host)?;
        }
        Ok(())
    }

    /// Dock a node about to be moved: close its surface, clear its bits.
    ///
    /// Unlike [`Self::set_dock_state`] nothing cascades to the parent.
    pub(crate) fn dock_for_move(&mut self, node: NodeId, host: &mut dyn FloatingHost) -> Result<(), DockError> {
        let old = self.tree.get(node)?.state();
        if old.is_docked() {
            return Ok(());
        }
        self.close_surface(node, host);
        self.tree.get_mut(node)?.state = DockState::DOCKED;
        self.raise_state_events(node, old, DockState::DOCKED);
        Ok(())
    }

    pub(crate) fn raise_state_events(&mut self, node: NodeId, old: DockState, new: DockState) {
        if old.is_hidden() != new.is_hidden() {
            self.events.push(DockEvent::VisibilityChanged {
                node,
                was_hidden: old.is_hidden(),
            });
        }
        let was_floating = old.contains(DockState::FLOATING);
        let is_floating = new.contains(DockState::FLOATING);
        if was_floating != is_floating {
            self.events.push(DockEvent::FloatingChanged { node, is_floating });
        }
    }
}
