//! Error types for tree mutation, persistence and engine operations.

use std::path::PathBuf;

use crate::node::{LeafKind, NodeId};

/// Structural failures of the node arena.
///
/// These indicate a caller bug or a corrupt document, never a routine user
/// gesture; rejected gestures are reported through `bool` returns instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node id 0 is invalid")]
    ZeroNodeId,
    #[error("node id overflow after {current}")]
    NodeIdOverflow { current: NodeId },
    #[error("node {node_id} not found")]
    MissingNode { node_id: NodeId },
    #[error("node {node_id} is a leaf and cannot hold children")]
    NotContainer { node_id: NodeId },
    #[error("tab group {tab} can only hold leaves, got {child}")]
    TabChildNotLeaf { tab: NodeId, child: NodeId },
    #[error("node {node_id} has no parent")]
    NoParent { node_id: NodeId },
    #[error("node {node_id} is still attached to {parent}")]
    StillAttached { node_id: NodeId, parent: NodeId },
    #[error("operation would create cycle: node {ancestor} is an ancestor of {descendant}")]
    AncestorConflict {
        ancestor: NodeId,
        descendant: NodeId,
    },
    #[error("root node {root} not found")]
    MissingRoot { root: NodeId },
    #[error("root node {root} must not have parent {parent}")]
    RootHasParent { root: NodeId, parent: NodeId },
    #[error("root node {root} must be a stack")]
    RootNotStack { root: NodeId },
    #[error("node {parent} references missing child {child}")]
    MissingChild { parent: NodeId, child: NodeId },
    #[error("node {node_id} parent mismatch: expected {expected:?}, got {actual:?}")]
    ParentMismatch {
        node_id: NodeId,
        expected: Option<NodeId>,
        actual: Option<NodeId>,
    },
    #[error("node {node_id} index mismatch: expected {expected}, got {actual}")]
    IndexMismatch {
        node_id: NodeId,
        expected: usize,
        actual: usize,
    },
    #[error("container {node_id} has {children} children and should have been collapsed")]
    DegenerateContainer { node_id: NodeId, children: usize },
    #[error("tab group {node_id} selects {selected} but has {len} tabs")]
    SelectionOutOfRange {
        node_id: NodeId,
        selected: usize,
        len: usize,
    },
    #[error("node {node_id} is unreachable from root")]
    UnreachableNode { node_id: NodeId },
    #[error("duplicate {kind} name {name:?}")]
    DuplicateName { kind: LeafKind, name: String },
}

/// Failures while decoding or encoding a layout document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("layout document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported layout schema version {version} (expected {expected})")]
    UnsupportedSchemaVersion { version: u16, expected: u16 },
    #[error("layout root must be a stack element")]
    RootNotStack,
    #[error("tab element may only contain panels, toolbars or documents")]
    TabChildNotLeaf,
    #[error("{kind} element has an empty name")]
    EmptyName { kind: LeafKind },
    #[error("invalid size weight {0:?}")]
    InvalidWeight(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Error returned by a floating-surface collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("floating surface request failed: {message}")]
pub struct SurfaceError {
    pub message: String,
}

impl SurfaceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures of engine-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DockError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("node {node_id} is not a leaf")]
    NotLeaf { node_id: NodeId },
    #[error("leaf name must not be empty")]
    EmptyName,
    #[error("a {kind} named {name:?} already exists")]
    DuplicateName { kind: LeafKind, name: String },
    #[error("extensions must be panels or toolbars, got {kind}")]
    InvalidExtensionKind { kind: LeafKind },
    #[error("the root stack cannot be deleted")]
    CannotDeleteRoot,
}

/// Failures while loading the layout at startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read default layout {path}: {source}")]
    DefaultIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("default layout is unusable: {0}")]
    Default(#[source] DocumentError),
}

/// Failures while persisting the customized layout.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to encode layout: {0}")]
    Encode(#[from] DocumentError),
    #[error("failed to write layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
