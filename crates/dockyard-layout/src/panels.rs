//! The dock engine: one tree plus the caches and queues the host talks to.
//!
//! # Lifecycle
//!
//! 1. [`DockPanels::load`] (or [`DockPanels::load_files`]) reads the default
//!    layout and, if present, the user's customized layout. The customized
//!    layout is migrated against the default; if it cannot be used the
//!    default is loaded instead and the session is marked unsaved.
//! 2. The host attaches content with [`DockPanels::set_content`], drains the
//!    queued [`DockEvent::RootChanged`] and opens surfaces for floating nodes
//!    with [`DockPanels::open_floating_surfaces`].
//! 3. Gestures go through the dock state machine and the move engine.
//! 4. [`DockPanels::save`] writes the layout back when it changed.

use std::path::{Path, PathBuf};

use dockyard_core::geometry::{Edge, Rect};
use rustc_hash::FxHashMap;

use crate::config::DockConfig;
use crate::document::LayoutDocument;
use crate::error::{DockError, DocumentError, LoadError, SaveError, TreeError};
use crate::events::{DockEvent, EventQueue};
use crate::floating::FloatingHost;
use crate::migrate::{MigrationNote, migrate};
use crate::node::{ContentId, DockNode, DockState, LeafKind, LeafNode, NodeId, NodeKind, SizeWeight, WindowStyle};
use crate::tabs::{HeaderOrientation, TextMeasure};
use crate::tree::{CollapseOutcome, DockTree};

/// Docking layout engine.
#[derive(Debug)]
pub struct DockPanels {
    pub(crate) tree: DockTree,
    pub(crate) config: DockConfig,
    leaves: FxHashMap<String, NodeId>,
    user_documents: FxHashMap<String, NodeId>,
    contents: FxHashMap<ContentId, NodeId>,
    pub(crate) events: EventQueue,
    save_path: Option<PathBuf>,
    saved_text: Option<String>,
    pub(crate) surface_generation: u64,
    migration_notes: Vec<MigrationNote>,
}

/// Parse, build and normalize a layout document.
fn build_tree(text: &str) -> Result<DockTree, DocumentError> {
    let document = LayoutDocument::from_json_str(text)?;
    let mut tree = DockTree::from_document(&document)?;
    let _ = tree.normalize()?;
    tree.validate()?;
    Ok(tree)
}

fn load_customized(
    text: &str,
    default: &DockTree,
    config: &DockConfig,
) -> Result<(DockTree, Vec<MigrationNote>), DocumentError> {
    let document = LayoutDocument::from_json_str(text)?;
    let mut tree = DockTree::from_document(&document)?;
    let _ = tree.normalize()?;
    let notes = migrate(&mut tree, default, config)?;
    let _ = tree.normalize()?;
    tree.validate()?;
    Ok((tree, notes))
}

impl DockPanels {
    /// Load from in-memory documents.
    ///
    /// A malformed `default` is fatal. A malformed `customized` is logged and
    /// replaced by the default.
    pub fn load(
        default: &str,
        customized: Option<&str>,
        config: DockConfig,
    ) -> Result<Self, LoadError> {
        let default_tree = build_tree(default).map_err(LoadError::Default)?;
        let (tree, notes, saved_text) = match customized {
            Some(text) => match load_customized(text, &default_tree, &config) {
                Ok((tree, notes)) => (tree, notes, Some(text.to_string())),
                Err(err) => {
                    tracing::warn!(error = %err, "customized layout is unusable, using the default layout");
                    (default_tree, Vec::new(), None)
                }
            },
            None => (default_tree, Vec::new(), None),
        };
        let mut panels = Self {
            tree,
            config,
            leaves: FxHashMap::default(),
            user_documents: FxHashMap::default(),
            contents: FxHashMap::default(),
            events: EventQueue::default(),
            save_path: None,
            saved_text,
            surface_generation: 0,
            migration_notes: notes,
        };
        panels.rebuild_indexes();
        let root = panels.tree.root();
        panels.events.push(DockEvent::RootChanged { root });
        tracing::debug!(nodes = panels.tree.len(), %root, "layout loaded");
        Ok(panels)
    }

    /// Load from files. `customized` is also where [`Self::save`] writes.
    ///
    /// A missing or unreadable customized file falls back to the default.
    pub fn load_files(
        default: impl AsRef<Path>,
        customized: Option<PathBuf>,
        config: DockConfig,
    ) -> Result<Self, LoadError> {
        let default = default.as_ref();
        let default_text =
            std::fs::read_to_string(default).map_err(|source| LoadError::DefaultIo {
                path: default.to_path_buf(),
                source,
            })?;
        let customized_text = customized.as_deref().and_then(|path| {
            match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cannot read customized layout");
                    None
                }
            }
        });
        let mut panels = Self::load(&default_text, customized_text.as_deref(), config)?;
        panels.save_path = customized;
        Ok(panels)
    }

    /// Set (or clear) the file [`Self::save`] writes to.
    pub fn set_save_path(&mut self, path: Option<PathBuf>) {
        self.save_path = path;
    }

    #[must_use]
    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    /// Encode the current layout. Pure.
    pub fn to_document_string(&self) -> Result<String, DocumentError> {
        self.tree.to_document().to_json_string()
    }

    /// Write the layout if it differs from what was last read or written.
    ///
    /// Returns whether the file was written; `Ok(false)` without a save path.
    pub fn save(&mut self) -> Result<bool, SaveError> {
        let Some(path) = self.save_path.clone() else {
            return Ok(false);
        };
        let text = self.to_document_string()?;
        if self.saved_text.is_none() {
            self.saved_text = std::fs::read_to_string(&path).ok();
        }
        if self.saved_text.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }
        let io_error = |source| SaveError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(io_error)?;
        }
        std::fs::write(&path, &text).map_err(io_error)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "layout saved");
        self.saved_text = Some(text);
        Ok(true)
    }

    // ---- accessors ----

    #[must_use]
    pub fn tree(&self) -> &DockTree {
        &self.tree
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    #[must_use]
    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    /// Notes produced by migrating the customized layout at load.
    #[must_use]
    pub fn migration_notes(&self) -> &[MigrationNote] {
        &self.migration_notes
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<DockEvent> {
        self.events.drain()
    }

    /// Panel, toolbar or layout document by name.
    #[must_use]
    pub fn leaf(&self, name: &str) -> Option<NodeId> {
        self.leaves.get(name).copied()
    }

    /// Document added at runtime by name.
    #[must_use]
    pub fn user_document(&self, name: &str) -> Option<NodeId> {
        self.user_documents.get(name).copied()
    }

    #[must_use]
    pub fn leaf_by_content(&self, content: ContentId) -> Option<NodeId> {
        self.contents.get(&content).copied()
    }

    /// Attach (or detach with `None`) host content to a leaf.
    pub fn set_content(&mut self, node: NodeId, content: Option<ContentId>) -> Result<(), DockError> {
        let leaf = self
            .tree
            .get_mut(node)?
            .leaf_mut()
            .ok_or(DockError::NotLeaf { node_id: node })?;
        let previous = std::mem::replace(&mut leaf.content, content);
        if let Some(previous) = previous {
            let _ = self.contents.remove(&previous);
        }
        if let Some(content) = content
            && let Some(stale) = self.contents.insert(content, node)
            && stale != node
            && let Some(stale_leaf) = self.tree.node_mut(stale).and_then(DockNode::leaf_mut)
        {
            stale_leaf.content = None;
        }
        Ok(())
    }

    /// Splitter drawn before `node` in its stack, if any.
    #[must_use]
    pub fn splitter_size(&self, node: NodeId) -> Option<u16> {
        self.tree.splitter_size(node, self.config.splitter_size)
    }

    /// Record the last on-screen rectangle of a node.
    pub fn set_node_rect(&mut self, node: NodeId, rect: Rect) -> Result<(), DockError> {
        self.tree.get_mut(node)?.last_rect = Some(rect);
        Ok(())
    }

    // ---- structure ----

    fn rebuild_indexes(&mut self) {
        self.leaves.clear();
        self.user_documents.clear();
        self.contents.clear();
        for id in self.tree.subtree(self.tree.root()) {
            let Some(leaf) = self.tree.node(id).and_then(DockNode::leaf) else {
                continue;
            };
            if leaf.user_document {
                let _ = self.user_documents.insert(leaf.name.clone(), id);
            } else if leaf.is_document() {
                let _ = self.leaves.entry(leaf.name.clone()).or_insert(id);
            } else {
                let _ = self.leaves.insert(leaf.name.clone(), id);
            }
            if let Some(content) = leaf.content {
                let _ = self.contents.insert(content, id);
            }
        }
    }

    /// Give `node` the weight it gets when placed beside `target` in a stack.
    pub(crate) fn size_beside(&mut self, node: NodeId, target: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.tree.parent(node) else {
            return Ok(());
        };
        if !self.tree.get(parent)?.is_stack() {
            self.tree.get_mut(node)?.size = None;
            return Ok(());
        }
        let moved = Some(SizeWeight::Proportional(self.config.moved_weight));
        let record = self.tree.get_mut(node)?;
        let keeps_auto = record.size.is_some_and(SizeWeight::is_auto) && record.is_toolbar();
        if !keeps_auto {
            record.size = moved;
        }
        if self.tree.children(parent).len() == 2 {
            self.tree.get_mut(target)?.size = moved;
        }
        Ok(())
    }

    /// Close surfaces of removed records and announce a replaced root.
    pub(crate) fn absorb_collapse(&mut self, outcome: &CollapseOutcome, host: &mut dyn FloatingHost) {
        for removed in &outcome.removed {
            if removed.has_surface() {
                let _ = host.close_surface(removed.id());
            }
        }
        for grounded in &outcome.grounded {
            if grounded.has_surface() {
                let _ = host.close_surface(grounded.id());
            }
            self.raise_state_events(grounded.id(), grounded.state(), DockState::DOCKED);
        }
        if let Some(root) = outcome.new_root {
            tracing::debug!(%root, "root replaced");
            self.events.push(DockEvent::RootChanged { root });
        }
    }

    /// Add a leaf beside `anchor`.
    ///
    /// Documents are user documents with their own name index; panels and
    /// toolbars must have a unique name.
    pub fn add_leaf(
        &mut self,
        anchor: NodeId,
        after: bool,
        kind: LeafKind,
        name: &str,
        closable: bool,
        extension: bool,
    ) -> Result<NodeId, DockError> {
        if name.trim().is_empty() {
            return Err(DockError::EmptyName);
        }
        let taken = match kind {
            LeafKind::Document => self.user_documents.contains_key(name),
            LeafKind::Panel | LeafKind::Toolbar => self.leaves.contains_key(name),
        };
        if taken {
            return Err(DockError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        if self.tree.parent(anchor).is_none() {
            let _ = self.tree.get(anchor)?;
            return Err(TreeError::NoParent { node_id: anchor }.into());
        }

        let mut payload = LeafNode::new(kind, name)
            .closable(closable)
            .extension(extension);
        payload.user_document = kind == LeafKind::Document;
        let id = self.tree.create_node(NodeKind::Leaf(payload))?;
        if let Err(err) = self.tree.add_sibling(anchor, id, after) {
            let discarded = self.tree.remove_subtree(id);
            debug_assert!(discarded.is_ok(), "detached leaf {id} could not be dropped");
            return Err(err.into());
        }
        self.size_beside(id, anchor)?;
        if kind == LeafKind::Document {
            let _ = self.user_documents.insert(name.to_string(), id);
        } else {
            let _ = self.leaves.insert(name.to_string(), id);
        }
        tracing::debug!(%kind, name, node = %id, anchor = %anchor, after, "leaf added");
        Ok(id)
    }

    /// Add an extension panel or toolbar.
    ///
    /// Without an anchor it goes after the root's last child.
    pub fn add_extension(
        &mut self,
        kind: LeafKind,
        name: &str,
        anchor: Option<NodeId>,
        after: bool,
    ) -> Result<NodeId, DockError> {
        if kind == LeafKind::Document {
            return Err(DockError::InvalidExtensionKind { kind });
        }
        if let Some(anchor) = anchor {
            return self.add_leaf(anchor, after, kind, name, false, true);
        }
        let root = self.tree.root();
        let id = match self.tree.last_child(root) {
            Some(last) => self.add_leaf(last, true, kind, name, false, true)?,
            None => {
                if name.trim().is_empty() {
                    return Err(DockError::EmptyName);
                }
                if self.leaves.contains_key(name) {
                    return Err(DockError::DuplicateName {
                        kind,
                        name: name.to_string(),
                    });
                }
                let payload = LeafNode::new(kind, name).extension(true);
                let id = self.tree.create_node(NodeKind::Leaf(payload))?;
                self.tree.add_child(root, id, false)?;
                self.tree.get_mut(id)?.size =
                    Some(SizeWeight::Proportional(self.config.moved_weight));
                let _ = self.leaves.insert(name.to_string(), id);
                id
            }
        };
        tracing::info!(%kind, name, "added extension at the end of the window; move it to a better place");
        Ok(id)
    }

    /// Remove a node and its subtree permanently.
    pub fn delete(&mut self, node: NodeId, host: &mut dyn FloatingHost) -> Result<(), DockError> {
        if node == self.tree.root() {
            return Err(DockError::CannotDeleteRoot);
        }
        let parent = self
            .tree
            .parent(node)
            .ok_or(TreeError::NoParent { node_id: node })?;
        let was_selected = self.tree.selected_tab(parent) == Some(node);
        let removed = self.tree.remove_subtree(node)?;
        for record in &removed {
            if record.has_surface() {
                let _ = host.close_surface(record.id());
            }
        }
        let outcome = self.tree.collapse_upward(parent)?;
        self.absorb_collapse(&outcome, host);
        if was_selected && let Some(next) = self.tree.selected_tab(parent) {
            self.events.push(DockEvent::TabSelected { node: next });
        }
        self.rebuild_indexes();
        tracing::debug!(node = %node, removed = removed.len(), "node deleted");
        Ok(())
    }

    /// User close gesture: delete closable leaves, hide everything else.
    ///
    /// Returns `true` when the node was deleted.
    pub fn close(&mut self, node: NodeId, host: &mut dyn FloatingHost) -> Result<bool, DockError> {
        let closable = self
            .tree
            .get(node)?
            .leaf()
            .is_some_and(|leaf| leaf.closable);
        if closable {
            self.delete(node, host)?;
        } else {
            self.set_dock_state(node, DockState::HIDDEN, host)?;
        }
        Ok(closable)
    }

    /// Select a docked tab. Returns whether the selection changed.
    pub fn select_tab(&mut self, node: NodeId) -> Result<bool, DockError> {
        let record = self.tree.get(node)?;
        let Some(group) = record.parent() else {
            return Ok(false);
        };
        let index = record.index();
        if !record.state().is_docked()
            || !self.tree.get(group)?.is_tab_group()
            || self.tree.selected_tab(group) == Some(node)
        {
            return Ok(false);
        }
        self.tree.set_selected(group, index)?;
        self.events.push(DockEvent::TabSelected { node });
        Ok(true)
    }

    /// Set the caption edge. A tab forwards to its group.
    pub fn set_caption_at(&mut self, node: NodeId, edge: Edge) -> Result<(), DockError> {
        let record = self.tree.get(node)?;
        let target = match record.parent() {
            Some(parent) if record.is_leaf() && self.tree.get(parent)?.is_tab_group() => parent,
            _ => node,
        };
        let target_record = self.tree.get_mut(target)?;
        target_record.caption_at = Some(edge);
        if let Some(tab) = target_record.tab_group_mut() {
            tab.header.invalidate();
        }
        Ok(())
    }

    /// Flip window-style bits, restyling a live surface.
    pub fn toggle_window_style(
        &mut self,
        node: NodeId,
        style: WindowStyle,
        host: &mut dyn FloatingHost,
    ) -> Result<WindowStyle, DockError> {
        let record = self.tree.get_mut(node)?;
        record.window_style.toggle(style);
        let updated = record.window_style;
        if record.has_surface() {
            host.restyle_surface(node, updated);
        }
        Ok(updated)
    }

    /// Header orientation for a tab group of the given extent.
    pub fn update_tab_header(
        &mut self,
        group: NodeId,
        extent: u32,
        measurer: &dyn TextMeasure,
    ) -> Result<HeaderOrientation, DockError> {
        Ok(self
            .tree
            .update_tab_header(group, extent, measurer, &self.config.header)?)
    }

    /// Header orientation for a tab group, measured along its caption edge
    /// in the last rectangle the host reported. `None` before any report.
    pub fn refresh_tab_header(
        &mut self,
        group: NodeId,
        measurer: &dyn TextMeasure,
    ) -> Result<Option<HeaderOrientation>, DockError> {
        let Some(rect) = self.tree.get(group)?.last_rect() else {
            return Ok(None);
        };
        let extent = rect.extent_along(self.tree.caption_at(group));
        self.update_tab_header(group, extent, measurer).map(Some)
    }

    /// Hidden nodes a "Show" menu offers: toolbars first, then by name.
    #[must_use]
    pub fn hidden_nodes(&self) -> Vec<NodeId> {
        let mut hidden: Vec<NodeId> = self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|id| {
                let Some(node) = self.tree.node(*id) else {
                    return false;
                };
                if node.is_stack() || !node.state().is_hidden() {
                    return false;
                }
                !(node.is_tab_group()
                    && node.children().iter().all(|child| {
                        self.tree
                            .node(*child)
                            .is_some_and(|child| child.state().is_hidden())
                    }))
            })
            .collect();
        hidden.sort_by_cached_key(|id| {
            let toolbar = self.tree.node(*id).is_some_and(DockNode::is_toolbar);
            (!toolbar, self.display_name(*id).to_lowercase())
        });
        hidden
    }

    /// Name shown for a node: its own for leaves, a contained leaf's otherwise.
    #[must_use]
    pub fn display_name(&self, node: NodeId) -> String {
        let selected = self.tree.selected_tab(node);
        selected
            .into_iter()
            .chain(self.tree.subtree(node))
            .find_map(|id| self.tree.node(id).and_then(DockNode::leaf))
            .map(|leaf| leaf.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floating::{FloatingToken, SurfaceRelease, SurfaceRequest};
    use crate::error::SurfaceError;

    #[derive(Default)]
    struct NoSurfaces {
        closed: Vec<NodeId>,
    }

    impl FloatingHost for NoSurfaces {
        fn open_surface(&mut self, _request: SurfaceRequest, _token: FloatingToken) -> Result<(), SurfaceError> {
            Err(SurfaceError::new("headless"))
        }

        fn close_surface(&mut self, node: NodeId) -> Option<SurfaceRelease> {
            self.closed.push(node);
            None
        }
    }

    const DEFAULT: &str = r#"{"root": {"kind": "stack", "o": "v", "children": [
        {"kind": "toolbar", "name": "File", "z": "auto"},
        {"kind": "stack", "o": "h", "children": [
            {"kind": "panel", "name": "Files", "z": "200"},
            {"kind": "tab", "children": [
                {"kind": "document", "name": "documents"}
            ]},
            {"kind": "tab", "captionAt": "left", "children": [
                {"kind": "panel", "name": "Output", "closable": true},
                {"kind": "panel", "name": "Find"}
            ]}
        ]}
    ]}}"#;

    fn panels() -> DockPanels {
        DockPanels::load(DEFAULT, None, DockConfig::default()).expect("load")
    }

    #[test]
    fn load_indexes_leaves_and_queues_root() {
        let mut panels = panels();
        assert!(panels.leaf("Files").is_some());
        assert!(panels.leaf("documents").is_some());
        assert_eq!(panels.leaf("Nope"), None);
        assert_eq!(
            panels.drain_events(),
            vec![DockEvent::RootChanged { root: panels.root() }]
        );
        assert!(panels.tree().validate().is_ok());
    }

    #[test]
    fn bad_customized_layout_falls_back() {
        let panels =
            DockPanels::load(DEFAULT, Some("{ broken"), DockConfig::default()).expect("load");
        assert!(panels.leaf("Output").is_some());
        assert!(panels.migration_notes().is_empty());
    }

    #[test]
    fn bad_default_layout_is_fatal() {
        assert!(matches!(
            DockPanels::load("[]", None, DockConfig::default()),
            Err(LoadError::Default(DocumentError::Json(_)))
        ));
    }

    #[test]
    fn content_lookup_follows_reassignment() {
        let mut panels = panels();
        let files = panels.leaf("Files").expect("files");
        let find = panels.leaf("Find").expect("find");
        panels.set_content(files, Some(ContentId(7))).expect("attach");
        assert_eq!(panels.leaf_by_content(ContentId(7)), Some(files));
        panels.set_content(find, Some(ContentId(7))).expect("move content");
        assert_eq!(panels.leaf_by_content(ContentId(7)), Some(find));
        assert!(panels.tree().node(files).and_then(DockNode::leaf).is_some_and(|l| l.content.is_none()));
        let group = panels.tree().parent(find).expect("group");
        assert_eq!(
            panels.set_content(group, None),
            Err(DockError::NotLeaf { node_id: group })
        );
    }

    #[test]
    fn add_leaf_rejects_bad_names() {
        let mut panels = panels();
        let files = panels.leaf("Files").expect("files");
        assert_eq!(
            panels.add_leaf(files, true, LeafKind::Panel, "", false, false),
            Err(DockError::EmptyName)
        );
        assert!(matches!(
            panels.add_leaf(files, true, LeafKind::Panel, "Find", false, false),
            Err(DockError::DuplicateName { .. })
        ));
        let root = panels.root();
        assert_eq!(
            panels.add_leaf(root, true, LeafKind::Panel, "New", false, false),
            Err(DockError::Tree(TreeError::NoParent { node_id: root }))
        );
    }

    #[test]
    fn user_documents_have_their_own_index() {
        let mut panels = panels();
        let well_doc = panels.leaf("documents").expect("documents");
        let doc = panels
            .add_leaf(well_doc, true, LeafKind::Document, "Files", true, false)
            .expect("user doc");
        assert_eq!(panels.user_document("Files"), Some(doc));
        assert_ne!(panels.leaf("Files"), Some(doc));
        assert_eq!(panels.tree().node(doc).and_then(DockNode::size), None);
        assert!(matches!(
            panels.add_leaf(well_doc, true, LeafKind::Document, "Files", true, false),
            Err(DockError::DuplicateName { kind: LeafKind::Document, .. })
        ));
    }

    #[test]
    fn leaf_beside_stack_sibling_gets_moved_weight() {
        let mut panels = panels();
        let files = panels.leaf("Files").expect("files");
        let id = panels
            .add_leaf(files, false, LeafKind::Panel, "Outline", false, false)
            .expect("add");
        assert_eq!(panels.tree().next(id), Some(files));
        assert_eq!(
            panels.tree().node(id).and_then(DockNode::size),
            Some(SizeWeight::Proportional(100.0))
        );
        // More than two children, so the anchor keeps its own weight.
        assert_eq!(
            panels.tree().node(files).and_then(DockNode::size),
            Some(SizeWeight::Fixed(200.0))
        );
        assert_eq!(panels.splitter_size(id), None);
        assert_eq!(panels.splitter_size(files), Some(4));
    }

    #[test]
    fn extension_without_anchor_goes_to_root_end() {
        let mut panels = panels();
        let id = panels
            .add_extension(LeafKind::Toolbar, "Macros", None, false)
            .expect("extension");
        assert_eq!(panels.tree().last_child(panels.root()), Some(id));
        assert!(panels.tree().node(id).and_then(DockNode::leaf).is_some_and(|l| l.extension));
        assert_eq!(panels.leaf("Macros"), Some(id));
        assert_eq!(
            panels.add_extension(LeafKind::Document, "x", None, false),
            Err(DockError::InvalidExtensionKind { kind: LeafKind::Document })
        );
    }

    #[test]
    fn delete_collapses_and_updates_indexes() {
        let mut panels = panels();
        let mut host = NoSurfaces::default();
        let output = panels.leaf("Output").expect("output");
        let find = panels.leaf("Find").expect("find");
        let group = panels.tree().parent(output).expect("group");

        assert!(panels.close(output, &mut host).expect("close"));
        assert_eq!(panels.leaf("Output"), None);
        assert!(!panels.tree().contains(group));
        assert_eq!(panels.tree().caption_at(find), Edge::Left);
        assert!(panels.tree().validate().is_ok());

        let root = panels.root();
        assert_eq!(panels.delete(root, &mut host), Err(DockError::CannotDeleteRoot));
    }

    #[test]
    fn deleting_selected_tab_announces_new_selection() {
        let mut panels = panels();
        let mut host = NoSurfaces::default();
        let output = panels.leaf("Output").expect("output");
        let find = panels.leaf("Find").expect("find");
        let group = panels.tree().parent(output).expect("group");
        let tasks = panels
            .add_leaf(find, true, LeafKind::Panel, "Tasks", true, false)
            .expect("add");
        assert_eq!(panels.tree().selected_tab(group), Some(output));
        let _ = panels.drain_events();

        panels.delete(output, &mut host).expect("delete");
        let selected = panels.tree().selected_tab(group).expect("selected");
        assert!(selected == find || selected == tasks);
        assert_eq!(panels.drain_events(), vec![DockEvent::TabSelected { node: selected }]);

        panels.delete(tasks, &mut host).expect("delete unselected");
        assert!(panels.drain_events().is_empty());
    }

    #[test]
    fn floating_stack_docks_when_it_becomes_root() {
        #[derive(Default)]
        struct Granting {
            closed: Vec<NodeId>,
        }

        impl FloatingHost for Granting {
            fn open_surface(&mut self, _request: SurfaceRequest, _token: FloatingToken) -> Result<(), SurfaceError> {
                Ok(())
            }

            fn close_surface(&mut self, node: NodeId) -> Option<SurfaceRelease> {
                self.closed.push(node);
                None
            }
        }

        let layout = r#"{"root": {"kind": "stack", "o": "h", "children": [
            {"kind": "stack", "o": "v", "children": [
                {"kind": "panel", "name": "A"},
                {"kind": "panel", "name": "B"}
            ]},
            {"kind": "panel", "name": "C", "closable": true}
        ]}}"#;
        let mut panels = DockPanels::load(layout, None, DockConfig::default()).expect("load");
        let mut host = Granting::default();
        let a = panels.leaf("A").expect("a");
        let column = panels.tree().parent(a).expect("column");
        panels
            .set_dock_state(column, DockState::FLOATING, &mut host)
            .expect("float");
        let _ = panels.drain_events();

        let c = panels.leaf("C").expect("c");
        assert!(panels.close(c, &mut host).expect("close"));
        assert_eq!(panels.root(), column);
        let root = panels.tree().node(column).expect("root");
        assert_eq!(root.state(), DockState::DOCKED);
        assert!(!root.has_surface());
        assert_eq!(host.closed, vec![column]);
        assert_eq!(
            panels.drain_events(),
            vec![
                DockEvent::FloatingChanged {
                    node: column,
                    is_floating: false
                },
                DockEvent::RootChanged { root: column },
            ]
        );
        assert!(panels.tree().validate().is_ok());
    }

    #[test]
    fn tab_header_follows_reported_rect() {
        let mut panels = panels();
        let find = panels.leaf("Find").expect("find");
        let group = panels.tree().parent(find).expect("group");
        let measure = |text: &str| text.len() as f64 * 10.0;
        assert_eq!(panels.refresh_tab_header(group, &measure), Ok(None));

        // Captions on the left edge are laid out along the height.
        panels.set_node_rect(group, Rect::new(0, 0, 400, 120)).expect("rect");
        assert_eq!(
            panels.refresh_tab_header(group, &measure),
            Ok(Some(HeaderOrientation::Vertical))
        );
        panels.set_node_rect(group, Rect::new(0, 0, 100, 300)).expect("rect");
        assert_eq!(
            panels.refresh_tab_header(group, &measure),
            Ok(Some(HeaderOrientation::Horizontal))
        );
    }

    #[test]
    fn close_hides_non_closable() {
        let mut panels = panels();
        let mut host = NoSurfaces::default();
        let files = panels.leaf("Files").expect("files");
        assert!(!panels.close(files, &mut host).expect("close"));
        assert!(panels.tree().node(files).is_some_and(|n| n.state().is_hidden()));
        assert_eq!(panels.hidden_nodes(), vec![files]);
    }

    #[test]
    fn caption_of_tab_forwards_to_group() {
        let mut panels = panels();
        let find = panels.leaf("Find").expect("find");
        let group = panels.tree().parent(find).expect("group");
        panels.set_caption_at(find, Edge::Bottom).expect("caption");
        assert_eq!(panels.tree().node(group).and_then(DockNode::own_caption_at), Some(Edge::Bottom));
        assert_eq!(panels.tree().node(find).and_then(DockNode::own_caption_at), None);
    }

    #[test]
    fn select_tab_raises_event_once() {
        let mut panels = panels();
        let find = panels.leaf("Find").expect("find");
        let _ = panels.drain_events();
        assert!(panels.select_tab(find).expect("select"));
        assert!(!panels.select_tab(find).expect("reselect"));
        assert_eq!(panels.drain_events(), vec![DockEvent::TabSelected { node: find }]);
    }

    #[test]
    fn window_style_toggles() {
        let mut panels = panels();
        let mut host = NoSurfaces::default();
        let files = panels.leaf("Files").expect("files");
        let style = panels
            .toggle_window_style(files, WindowStyle::TOPMOST, &mut host)
            .expect("toggle");
        assert_eq!(style, WindowStyle::TOPMOST);
        let style = panels
            .toggle_window_style(files, WindowStyle::TOPMOST | WindowStyle::UNOWNED, &mut host)
            .expect("toggle");
        assert_eq!(style, WindowStyle::UNOWNED);
    }

    #[test]
    fn save_without_path_is_a_no_op() {
        let mut panels = panels();
        assert!(!panels.save().expect("save"));
        assert!(panels.to_document_string().expect("encode").contains("\"Files\""));
    }
}
