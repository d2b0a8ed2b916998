//! Floating surfaces owned by the host.
//!
//! The engine never creates windows. When a node becomes visibly floating it
//! asks the [`FloatingHost`] for a surface and hands over a
//! [`FloatingToken`]. The token is single-use: a surface the host destroys on
//! its own is reported back through [`DockPanels::release_surface`], and a
//! token from an earlier surface of the same node is ignored.

use dockyard_core::geometry::Rect;

use crate::error::{DockError, SurfaceError};
use crate::node::{DockState, NodeId, WindowStyle};
use crate::panels::DockPanels;

/// Proof of one granted surface. Deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct FloatingToken {
    node: NodeId,
    generation: u64,
}

impl FloatingToken {
    pub(crate) const fn new(node: NodeId, generation: u64) -> Self {
        Self { node, generation }
    }

    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the host hands back when a surface goes away.
#[derive(Debug, PartialEq, Eq)]
pub struct SurfaceRelease {
    pub token: FloatingToken,
    /// Serialized placement to restore next time, if the host tracks one.
    pub geometry: Option<String>,
}

/// Parameters for opening a floating surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    pub node: NodeId,
    /// Name of the leaf (or first contained leaf) for the window title.
    pub title: String,
    /// Initial rectangle; `None` when `saved_geometry` should be restored.
    pub rect: Option<Rect>,
    pub saved_geometry: Option<String>,
    pub window_style: WindowStyle,
    /// The node is a stack or tab group, not a single leaf.
    pub is_container: bool,
    /// Open without taking focus (restoring floats at startup).
    pub no_activate: bool,
}

/// Host side of floating surfaces.
pub trait FloatingHost {
    /// Create a surface. On error the node stays docked.
    fn open_surface(&mut self, request: SurfaceRequest, token: FloatingToken) -> Result<(), SurfaceError>;

    /// Destroy the surface of `node`, returning its token and placement.
    fn close_surface(&mut self, node: NodeId) -> Option<SurfaceRelease>;

    /// Apply changed window-style bits to a live surface.
    fn restyle_surface(&mut self, _node: NodeId, _style: WindowStyle) {}
}

impl DockPanels {
    /// Build the request for floating `node` and allocate its token.
    pub(crate) fn surface_request(
        &mut self,
        node: NodeId,
        no_activate: bool,
    ) -> Result<(SurfaceRequest, FloatingToken), DockError> {
        let record = self.tree.get(node)?;
        let saved_geometry = record.float_geometry().map(str::to_string);
        let rect = if saved_geometry.is_some() {
            None
        } else {
            let tab_rect = record
                .parent()
                .and_then(|parent| self.tree.node(parent))
                .filter(|parent| parent.is_tab_group())
                .and_then(|parent| parent.last_rect());
            let fallback = &self.config.floating;
            Some(
                tab_rect
                    .or(record.last_rect())
                    .unwrap_or_else(|| Rect::from_size(fallback.fallback_width, fallback.fallback_height)),
            )
        };
        let request = SurfaceRequest {
            node,
            title: self.display_name(node),
            rect,
            saved_geometry,
            window_style: record.window_style(),
            is_container: !record.is_leaf(),
            no_activate,
        };
        self.surface_generation += 1;
        Ok((request, FloatingToken::new(node, self.surface_generation)))
    }

    /// Ask the host for a surface and remember the granted generation.
    pub(crate) fn open_surface(
        &mut self,
        node: NodeId,
        no_activate: bool,
        host: &mut dyn FloatingHost,
    ) -> Result<(), DockError> {
        let (request, token) = self.surface_request(node, no_activate)?;
        let generation = token.generation();
        host.open_surface(request, token)?;
        self.tree.get_mut(node)?.surface = Some(generation);
        tracing::debug!(node = %node, generation, "floating surface opened");
        Ok(())
    }

    /// Close the live surface of `node`, keeping the placement it reports.
    pub(crate) fn close_surface(&mut self, node: NodeId, host: &mut dyn FloatingHost) {
        let Some(record) = self.tree.node_mut(node) else {
            return;
        };
        let Some(generation) = record.surface.take() else {
            return;
        };
        if let Some(release) = host.close_surface(node)
            && release.token.node == node
            && release.token.generation == generation
            && release.geometry.is_some()
        {
            record.float_geometry = release.geometry;
        }
        tracing::debug!(node = %node, generation, "floating surface closed");
    }

    /// The host destroyed a surface on its own (user closed the window).
    ///
    /// Returns `false` for a stale or unknown token. A node that was visibly
    /// floating is docked back.
    pub fn release_surface(
        &mut self,
        token: FloatingToken,
        geometry: Option<String>,
        host: &mut dyn FloatingHost,
    ) -> Result<bool, DockError> {
        let node = token.node;
        let Some(record) = self.tree.node_mut(node) else {
            return Ok(false);
        };
        if record.surface != Some(token.generation) {
            tracing::debug!(node = %node, generation = token.generation, "stale surface release ignored");
            return Ok(false);
        }
        record.surface = None;
        if geometry.is_some() {
            record.float_geometry = geometry;
        }
        if record.state() == DockState::FLOATING {
            self.apply_dock_state(node, DockState::DOCKED, host)?;
        }
        Ok(true)
    }

    /// Open surfaces for every attached node saved as visibly floating.
    ///
    /// A node whose surface cannot be opened is docked instead.
    pub fn open_floating_surfaces(&mut self, host: &mut dyn FloatingHost) -> Result<usize, DockError> {
        let floating: Vec<NodeId> = self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|id| {
                self.tree
                    .node(*id)
                    .is_some_and(|node| node.state().is_visibly_floating() && !node.has_surface())
            })
            .collect();
        let mut opened = 0;
        for node in floating {
            match self.open_surface(node, true, host) {
                Ok(()) => opened += 1,
                Err(DockError::Surface(err)) => {
                    tracing::warn!(node = %node, error = %err, "cannot restore floating surface, docking");
                    let previous = self.tree.get(node)?.state();
                    self.tree.get_mut(node)?.state = DockState::DOCKED;
                    self.raise_state_events(node, previous, DockState::DOCKED);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(opened)
    }
}
