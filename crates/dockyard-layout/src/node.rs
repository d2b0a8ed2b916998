//! Node model for the dock tree.
//!
//! A node is one of three kinds:
//!
//! - [`NodeKind::Stack`] arranges its children along one axis, separated by
//!   splitters, each child sized by a [`SizeWeight`].
//! - [`NodeKind::TabGroup`] shows exactly one of its leaf children at a time.
//! - [`NodeKind::Leaf`] carries host content: a panel, a toolbar or a document.
//!
//! Every node carries dock-state and window-style bits, an optional caption
//! edge, an optional size weight and splitter size (meaningful inside a
//! stack), and an opaque geometry blob remembered from its last floating
//! surface.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use dockyard_core::geometry::{Edge, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, TreeError};
use crate::tabs::HeaderMemo;

/// Stable handle of a node in the arena.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a new node ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, TreeError> {
        if raw == 0 {
            return Err(TreeError::ZeroNodeId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, TreeError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(TreeError::NodeIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Dock state bits. The empty set means docked.
    ///
    /// `HIDDEN` and `FLOATING` are independent: a floating node that gets
    /// hidden keeps its floating bit so un-hiding floats it again.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DockState: u8 {
        const HIDDEN = 1;
        const FLOATING = 2;
    }
}

impl DockState {
    /// Docked: neither hidden nor floating.
    pub const DOCKED: Self = Self::empty();

    #[inline]
    #[must_use]
    pub fn is_docked(self) -> bool {
        self.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    /// True only while a floating surface should be on screen.
    #[inline]
    #[must_use]
    pub fn is_visibly_floating(self) -> bool {
        self == Self::FLOATING
    }
}

bitflags! {
    /// Style bits applied to a node's floating surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowStyle: u8 {
        const TOPMOST = 1;
        const UNOWNED = 2;
    }
}

/// Axis along which a stack lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Children side by side, left to right.
    #[default]
    #[serde(rename = "h")]
    Horizontal,
    /// Children top to bottom.
    #[serde(rename = "v")]
    Vertical,
}

impl Orientation {
    /// Orientation of a new stack created to dock something at `edge`.
    #[must_use]
    pub const fn for_edge(edge: Edge) -> Self {
        if edge.is_vertical() {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

/// Size of a child along its parent stack's axis.
///
/// Persisted as `"50*"` (proportional), `"120"` (fixed) or `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeWeight {
    /// Share of the space left after fixed and auto siblings.
    Proportional(f64),
    /// Exact extent in pixels.
    Fixed(f64),
    /// Sized to content (used by toolbars).
    Auto,
}

impl SizeWeight {
    #[must_use]
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for SizeWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportional(value) => write!(f, "{value}*"),
            Self::Fixed(value) => write!(f, "{value}"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for SizeWeight {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let invalid = || DocumentError::InvalidWeight(s.to_string());
        let (number, proportional) = match trimmed.strip_suffix('*') {
            Some("") => ("1", true),
            Some(number) => (number, true),
            None => (trimmed, false),
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        Ok(if proportional {
            Self::Proportional(value)
        } else {
            Self::Fixed(value)
        })
    }
}

impl TryFrom<String> for SizeWeight {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SizeWeight> for String {
    fn from(value: SizeWeight) -> Self {
        value.to_string()
    }
}

/// Kind of content a leaf carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    Panel,
    Toolbar,
    Document,
}

impl LeafKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panel => "panel",
            Self::Toolbar => "toolbar",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque host-owned content identity attached to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub u64);

/// Stack payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackNode {
    pub orientation: Orientation,
}

/// Tab group payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabGroupNode {
    /// Index of the selected tab.
    pub selected: usize,
    pub(crate) header: HeaderMemo,
}

/// Leaf payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub kind: LeafKind,
    /// Identity key across layout versions.
    pub name: String,
    pub closable: bool,
    /// Added at runtime by an extension; never auto-removed by migration.
    pub extension: bool,
    /// Document added by the host after load; indexed separately by name.
    pub user_document: bool,
    pub content: Option<ContentId>,
}

impl LeafNode {
    #[must_use]
    pub fn new(kind: LeafKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            closable: false,
            extension: false,
            user_document: false,
            content: None,
        }
    }

    #[must_use]
    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    #[must_use]
    pub fn extension(mut self, extension: bool) -> Self {
        self.extension = extension;
        self
    }

    #[must_use]
    pub const fn is_document(&self) -> bool {
        matches!(self.kind, LeafKind::Document)
    }
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Stack(StackNode),
    TabGroup(TabGroupNode),
    Leaf(LeafNode),
}

impl NodeKind {
    #[must_use]
    pub fn stack(orientation: Orientation) -> Self {
        Self::Stack(StackNode { orientation })
    }

    #[must_use]
    pub fn tab_group() -> Self {
        Self::TabGroup(TabGroupNode::default())
    }

    #[must_use]
    pub fn leaf(kind: LeafKind, name: impl Into<String>) -> Self {
        Self::Leaf(LeafNode::new(kind, name))
    }
}

/// One node record in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct DockNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index: usize,
    pub(crate) kind: NodeKind,
    pub(crate) state: DockState,
    pub(crate) window_style: WindowStyle,
    pub(crate) caption_at: Option<Edge>,
    pub(crate) size: Option<SizeWeight>,
    pub(crate) splitter: Option<u16>,
    pub(crate) float_geometry: Option<String>,
    /// Last on-screen rectangle reported by the host.
    pub(crate) last_rect: Option<Rect>,
    /// Generation of the live floating surface, if one was granted.
    pub(crate) surface: Option<u64>,
}

impl DockNode {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            index: 0,
            kind,
            state: DockState::DOCKED,
            window_style: WindowStyle::empty(),
            caption_at: None,
            size: None,
            splitter: None,
            float_geometry: None,
            last_rect: None,
            surface: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 0-based position among siblings.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub const fn state(&self) -> DockState {
        self.state
    }

    #[must_use]
    pub const fn window_style(&self) -> WindowStyle {
        self.window_style
    }

    /// Caption edge stored on this node (leaves in a tab group use the group's).
    #[must_use]
    pub const fn own_caption_at(&self) -> Option<Edge> {
        self.caption_at
    }

    #[must_use]
    pub const fn size(&self) -> Option<SizeWeight> {
        self.size
    }

    #[must_use]
    pub const fn splitter(&self) -> Option<u16> {
        self.splitter
    }

    #[must_use]
    pub fn float_geometry(&self) -> Option<&str> {
        self.float_geometry.as_deref()
    }

    #[must_use]
    pub const fn last_rect(&self) -> Option<Rect> {
        self.last_rect
    }

    #[must_use]
    pub const fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    #[must_use]
    pub const fn is_stack(&self) -> bool {
        matches!(self.kind, NodeKind::Stack(_))
    }

    #[must_use]
    pub const fn is_tab_group(&self) -> bool {
        matches!(self.kind, NodeKind::TabGroup(_))
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    #[must_use]
    pub const fn leaf(&self) -> Option<&LeafNode> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Stack(_) | NodeKind::TabGroup(_) => None,
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Stack(_) | NodeKind::TabGroup(_) => None,
        }
    }

    #[must_use]
    pub const fn tab_group(&self) -> Option<&TabGroupNode> {
        match &self.kind {
            NodeKind::TabGroup(tab) => Some(tab),
            NodeKind::Stack(_) | NodeKind::Leaf(_) => None,
        }
    }

    pub(crate) fn tab_group_mut(&mut self) -> Option<&mut TabGroupNode> {
        match &mut self.kind {
            NodeKind::TabGroup(tab) => Some(tab),
            NodeKind::Stack(_) | NodeKind::Leaf(_) => None,
        }
    }

    #[must_use]
    pub const fn orientation(&self) -> Option<Orientation> {
        match &self.kind {
            NodeKind::Stack(stack) => Some(stack.orientation),
            NodeKind::TabGroup(_) | NodeKind::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn is_document(&self) -> bool {
        self.leaf().is_some_and(LeafNode::is_document)
    }

    #[must_use]
    pub fn is_toolbar(&self) -> bool {
        self.leaf().is_some_and(|leaf| leaf.kind == LeafKind::Toolbar)
    }

    /// Panel/toolbar identity used by migration. Documents have none.
    #[must_use]
    pub fn identity(&self) -> Option<(LeafKind, &str)> {
        self.leaf()
            .filter(|leaf| !leaf.is_document())
            .map(|leaf| (leaf.kind, leaf.name.as_str()))
    }
}
