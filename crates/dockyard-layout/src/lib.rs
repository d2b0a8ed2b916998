#![forbid(unsafe_code)]

//! Docking panel layout engine.
//!
//! A window is a tree of nodes under one root [`Stack`](node::NodeKind::Stack):
//! stacks split space along an axis, tab groups show one leaf at a time, and
//! leaves (panels, toolbars, documents) carry host content. [`DockPanels`]
//! owns the tree and exposes the operations a host needs:
//!
//! - load a default layout plus a customized one, migrating the latter
//!   ([`migrate()`]) when the default gained or lost panels;
//! - hide, show, float and dock nodes ([`DockPanels::set_dock_state`]);
//! - move nodes by relation ([`DockPanels::move_node`]);
//! - save the layout when it changed ([`DockPanels::save`]).
//!
//! Floating windows belong to the host, reached through
//! [`FloatingHost`](floating::FloatingHost). Notifications are queued as
//! [`DockEvent`](events::DockEvent)s and drained by the host.

pub mod config;
mod dock;
pub mod document;
pub mod error;
pub mod events;
pub mod floating;
pub mod migrate;
pub mod moves;
pub mod node;
pub mod panels;
pub mod tabs;
pub mod tree;

pub use config::{ConfigError, DockConfig, FloatingConfig, HeaderConfig};
pub use document::{LAYOUT_SCHEMA_VERSION, LayoutDocument, LayoutElement};
pub use error::{DockError, DocumentError, LoadError, SaveError, SurfaceError, TreeError};
pub use events::DockEvent;
pub use floating::{FloatingHost, FloatingToken, SurfaceRelease, SurfaceRequest};
pub use migrate::{MigrationChange, MigrationNote, Placement, migrate};
pub use moves::MoveRelation;
pub use node::{
    ContentId, DockNode, DockState, LeafKind, LeafNode, NodeId, NodeKind, Orientation, SizeWeight,
    WindowStyle,
};
pub use panels::DockPanels;
pub use tabs::{HeaderOrientation, TextMeasure};
pub use tree::{CollapseOutcome, DockTree};

pub use dockyard_core::geometry::{Edge, Rect};
