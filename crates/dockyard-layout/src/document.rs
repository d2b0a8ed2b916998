//! Persisted layout document.
//!
//! A layout is a JSON tree of elements tagged by `kind` under one root
//! stack:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "root": {
//!     "kind": "stack", "o": "h",
//!     "children": [
//!       { "kind": "panel", "name": "Files", "z": "200" },
//!       { "kind": "tab", "z": "50*", "captionAt": "left", "active": 1,
//!         "children": [
//!           { "kind": "panel", "name": "Output" },
//!           { "kind": "panel", "name": "Find", "state": 1 }
//!         ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Attributes at their default value are omitted on write. Documents added
//! by the host at runtime are not persisted.

use dockyard_core::geometry::Edge;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::node::{DockState, LeafKind, LeafNode, NodeId, NodeKind, Orientation, SizeWeight, WindowStyle};
use crate::tree::DockTree;

/// Current layout schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

fn default_schema_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Top-level persisted layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub root: LayoutElement,
}

/// One element of the layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutElement {
    Stack(StackElement),
    Tab(TabElement),
    Panel(LeafElement),
    Toolbar(LeafElement),
    Document(LeafElement),
}

/// Attributes shared by every element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementAttrs {
    /// Size weight inside the parent stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<SizeWeight>,
    /// Splitter size before this element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u16>,
    /// Dock state bits: 1 hidden, 2 floating.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub state: u8,
    /// Window style bits: 1 topmost, 2 unowned.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ws: u8,
    /// Opaque floating geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float: Option<String>,
    #[serde(default, rename = "captionAt", skip_serializing_if = "Option::is_none")]
    pub caption_at: Option<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackElement {
    #[serde(flatten)]
    pub attrs: ElementAttrs,
    #[serde(default)]
    pub o: Orientation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabElement {
    #[serde(flatten)]
    pub attrs: ElementAttrs,
    /// Selected tab index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafElement {
    #[serde(flatten)]
    pub attrs: ElementAttrs,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closable: bool,
    /// Added by an extension; exempt from automatic removal.
    #[serde(default, skip_serializing_if = "is_false")]
    pub ext: bool,
}

impl LayoutElement {
    #[must_use]
    pub const fn attrs(&self) -> &ElementAttrs {
        match self {
            Self::Stack(stack) => &stack.attrs,
            Self::Tab(tab) => &tab.attrs,
            Self::Panel(leaf) | Self::Toolbar(leaf) | Self::Document(leaf) => &leaf.attrs,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[LayoutElement] {
        match self {
            Self::Stack(stack) => &stack.children,
            Self::Tab(tab) => &tab.children,
            Self::Panel(_) | Self::Toolbar(_) | Self::Document(_) => &[],
        }
    }

    /// Leaf kind and payload, `None` for containers.
    #[must_use]
    pub const fn leaf(&self) -> Option<(LeafKind, &LeafElement)> {
        match self {
            Self::Panel(leaf) => Some((LeafKind::Panel, leaf)),
            Self::Toolbar(leaf) => Some((LeafKind::Toolbar, leaf)),
            Self::Document(leaf) => Some((LeafKind::Document, leaf)),
            Self::Stack(_) | Self::Tab(_) => None,
        }
    }
}

impl LayoutDocument {
    /// Parse a document and check its schema version.
    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_str(s)?;
        if document.schema_version != LAYOUT_SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedSchemaVersion {
                version: document.schema_version,
                expected: LAYOUT_SCHEMA_VERSION,
            });
        }
        Ok(document)
    }

    /// Pretty-printed JSON, newline terminated.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

impl DockTree {
    /// Build a tree from a parsed document.
    ///
    /// The result is not normalized; degenerate containers in the document
    /// are kept until [`DockTree::normalize`] runs.
    pub fn from_document(document: &LayoutDocument) -> Result<Self, DocumentError> {
        let LayoutElement::Stack(root) = &document.root else {
            return Err(DocumentError::RootNotStack);
        };
        let mut tree = Self::new(root.o);
        let root_id = tree.root();
        apply_attrs(&mut tree, root_id, &root.attrs)?;
        for child in &root.children {
            let child_id = build_element(&mut tree, child)?;
            tree.add_child(root_id, child_id, false)?;
        }
        Ok(tree)
    }

    /// Encode the tree as a document.
    #[must_use]
    pub fn to_document(&self) -> LayoutDocument {
        let root = encode_node(self, self.root()).unwrap_or_else(|| {
            LayoutElement::Stack(StackElement::default())
        });
        LayoutDocument {
            schema_version: LAYOUT_SCHEMA_VERSION,
            root,
        }
    }
}

fn build_element(tree: &mut DockTree, element: &LayoutElement) -> Result<NodeId, DocumentError> {
    let id = match element {
        LayoutElement::Stack(stack) => {
            let id = tree.create_node(NodeKind::stack(stack.o))?;
            for child in &stack.children {
                let child_id = build_element(tree, child)?;
                tree.add_child(id, child_id, false)?;
            }
            id
        }
        LayoutElement::Tab(tab) => {
            let id = tree.create_node(NodeKind::tab_group())?;
            for child in &tab.children {
                if child.leaf().is_none() {
                    return Err(DocumentError::TabChildNotLeaf);
                }
                let child_id = build_element(tree, child)?;
                tree.add_child(id, child_id, false)?;
            }
            let len = tab.children.len();
            let selected = tab.active.filter(|active| *active < len).unwrap_or(0);
            if len > 0 {
                tree.set_selected(id, selected)?;
            }
            id
        }
        LayoutElement::Panel(_) | LayoutElement::Toolbar(_) | LayoutElement::Document(_) => {
            let Some((kind, leaf)) = element.leaf() else {
                return Err(DocumentError::TabChildNotLeaf);
            };
            if leaf.name.trim().is_empty() {
                return Err(DocumentError::EmptyName { kind });
            }
            let payload = LeafNode::new(kind, leaf.name.clone())
                .closable(leaf.closable)
                .extension(leaf.ext);
            tree.create_node(NodeKind::Leaf(payload))?
        }
    };
    apply_attrs(tree, id, element.attrs())?;
    Ok(id)
}

fn apply_attrs(tree: &mut DockTree, id: NodeId, attrs: &ElementAttrs) -> Result<(), DocumentError> {
    let node = tree.get_mut(id)?;
    node.size = attrs.z;
    node.splitter = attrs.s;
    node.state = DockState::from_bits_truncate(attrs.state);
    node.window_style = WindowStyle::from_bits_truncate(attrs.ws);
    node.float_geometry = attrs.float.clone();
    node.caption_at = attrs.caption_at;
    Ok(())
}

fn encode_node(tree: &DockTree, id: NodeId) -> Option<LayoutElement> {
    let node = tree.node(id)?;
    let attrs = ElementAttrs {
        z: node.size(),
        s: node.splitter(),
        state: node.state().bits(),
        ws: node.window_style().bits(),
        float: node.float_geometry().map(str::to_string),
        caption_at: node.own_caption_at(),
    };
    let children = || -> Vec<LayoutElement> {
        node.children()
            .iter()
            .filter_map(|child| encode_node(tree, *child))
            .collect()
    };
    let element = match node.kind() {
        NodeKind::Stack(stack) => LayoutElement::Stack(StackElement {
            attrs,
            o: stack.orientation,
            children: children(),
        }),
        NodeKind::TabGroup(tab) => {
            let kept = children();
            // Selection is re-based when runtime documents are skipped.
            let selected = tree
                .selected_tab(id)
                .and_then(|selected| {
                    node.children()
                        .iter()
                        .filter(|child| !is_runtime_document(tree, **child))
                        .position(|child| *child == selected)
                })
                .unwrap_or(tab.selected.min(kept.len().saturating_sub(1)));
            LayoutElement::Tab(TabElement {
                attrs,
                active: (selected > 0).then_some(selected),
                children: kept,
            })
        }
        NodeKind::Leaf(leaf) => {
            if leaf.user_document {
                return None;
            }
            let element = LeafElement {
                attrs,
                name: leaf.name.clone(),
                closable: leaf.closable,
                ext: leaf.extension,
            };
            match leaf.kind {
                LeafKind::Panel => LayoutElement::Panel(element),
                LeafKind::Toolbar => LayoutElement::Toolbar(element),
                LeafKind::Document => LayoutElement::Document(element),
            }
        }
    };
    Some(element)
}

fn is_runtime_document(tree: &DockTree, id: NodeId) -> bool {
    tree.node(id)
        .and_then(|node| node.leaf())
        .is_some_and(|leaf| leaf.user_document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "schema_version": 1,
  "root": {
    "kind": "stack",
    "o": "v",
    "children": [
      { "kind": "toolbar", "name": "File", "z": "auto" },
      {
        "kind": "stack",
        "z": "50*",
        "s": 6,
        "o": "h",
        "children": [
          { "kind": "panel", "name": "Files", "z": "200", "closable": true },
          {
            "kind": "tab",
            "captionAt": "left",
            "active": 1,
            "children": [
              { "kind": "panel", "name": "Output", "state": 3, "float": "10,10,300,200" },
              { "kind": "panel", "name": "Find", "ws": 1, "ext": true }
            ]
          }
        ]
      }
    ]
  }
}"#;

    #[test]
    fn parses_attributes() {
        let document = LayoutDocument::from_json_str(SAMPLE).expect("parse");
        let tree = DockTree::from_document(&document).expect("build");
        assert!(tree.validate().is_ok());

        let root = tree.root();
        assert_eq!(tree.node(root).and_then(|n| n.orientation()), Some(Orientation::Vertical));
        let toolbar = tree.first_child(root).expect("toolbar");
        assert_eq!(tree.node(toolbar).and_then(|n| n.size()), Some(SizeWeight::Auto));
        assert!(tree.node(toolbar).is_some_and(|n| n.is_toolbar()));

        let inner = tree.last_child(root).expect("inner stack");
        assert_eq!(tree.node(inner).and_then(|n| n.splitter()), Some(6));
        let group = tree.last_child(inner).expect("tab");
        let find = tree.last_child(group).expect("find");
        assert_eq!(tree.selected_tab(group), Some(find));
        assert_eq!(tree.caption_at(find), Edge::Left);

        let output = tree.first_child(group).expect("output");
        let node = tree.node(output).expect("output node");
        assert_eq!(node.state(), DockState::HIDDEN | DockState::FLOATING);
        assert_eq!(node.float_geometry(), Some("10,10,300,200"));
        let find_node = tree.node(find).expect("find node");
        assert_eq!(find_node.window_style(), WindowStyle::TOPMOST);
        assert!(find_node.leaf().is_some_and(|leaf| leaf.extension));
    }

    #[test]
    fn round_trip_is_stable() {
        let document = LayoutDocument::from_json_str(SAMPLE).expect("parse");
        let tree = DockTree::from_document(&document).expect("build");
        assert_eq!(tree.to_document(), document);

        let text = tree.to_document().to_json_string().expect("encode");
        let again = DockTree::from_document(&LayoutDocument::from_json_str(&text).expect("reparse"))
            .expect("rebuild");
        assert_eq!(again.to_document().to_json_string().expect("encode"), text);
    }

    #[test]
    fn default_attributes_are_omitted() {
        let tree = DockTree::new(Orientation::Horizontal);
        let text = tree.to_document().to_json_string().expect("encode");
        assert!(!text.contains("state"));
        assert!(!text.contains("children"));
        assert!(text.contains("\"o\": \"h\""));
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(
            LayoutDocument::from_json_str(r#"{"schema_version": 9, "root": {"kind": "stack"}}"#),
            Err(DocumentError::UnsupportedSchemaVersion { version: 9, .. })
        ));
        assert!(matches!(
            LayoutDocument::from_json_str("{ not json"),
            Err(DocumentError::Json(_))
        ));

        let panel_root = LayoutDocument::from_json_str(r#"{"root": {"kind": "panel", "name": "a"}}"#)
            .expect("parse");
        assert!(matches!(
            DockTree::from_document(&panel_root),
            Err(DocumentError::RootNotStack)
        ));

        let nested = LayoutDocument::from_json_str(
            r#"{"root": {"kind": "stack", "children": [
                {"kind": "tab", "children": [{"kind": "stack"}]}
            ]}}"#,
        )
        .expect("parse");
        assert!(matches!(
            DockTree::from_document(&nested),
            Err(DocumentError::TabChildNotLeaf)
        ));

        let unnamed = LayoutDocument::from_json_str(
            r#"{"root": {"kind": "stack", "children": [{"kind": "toolbar", "name": " "}]}}"#,
        )
        .expect("parse");
        assert!(matches!(
            DockTree::from_document(&unnamed),
            Err(DocumentError::EmptyName { kind: LeafKind::Toolbar })
        ));

        assert!(LayoutDocument::from_json_str(
            r#"{"root": {"kind": "stack", "children": [{"kind": "panel", "name": "a", "z": "wide"}]}}"#
        )
        .is_err());
    }

    #[test]
    fn runtime_documents_are_not_persisted() {
        let document = LayoutDocument::from_json_str(
            r#"{"root": {"kind": "stack", "children": [
                {"kind": "panel", "name": "a"},
                {"kind": "tab", "children": [{"kind": "document", "name": "documents"}]}
            ]}}"#,
        )
        .expect("parse");
        let mut tree = DockTree::from_document(&document).expect("build");
        let well = tree.last_child(tree.root()).expect("well");
        let mut payload = LeafNode::new(LeafKind::Document, "notes.txt");
        payload.user_document = true;
        let doc = tree.create_node(NodeKind::Leaf(payload)).expect("doc");
        tree.add_child(well, doc, false).expect("attach");
        tree.set_selected(well, 1).expect("select");

        assert_eq!(tree.to_document(), document);
    }
}
