//! Property/fuzz-style invariants for dock operations.
//!
//! Random streams of moves, dock-state changes, deletions and additions run
//! against the public `DockPanels` API. After every step the tree must
//! validate (no degenerate containers, contiguous indices, consistent parent
//! links, selections in range) and its encoded document must rebuild to
//! the same text.

use dockyard_layout::{
    DockConfig, DockNode, DockPanels, DockState, DockTree, FloatingHost, FloatingToken, LayoutDocument,
    LeafKind, MoveRelation, NodeId, SurfaceError, SurfaceRelease, SurfaceRequest,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }
}

/// Host that grants every surface and never reports geometry.
#[derive(Default)]
struct GrantAll {
    live: Vec<FloatingToken>,
}

impl FloatingHost for GrantAll {
    fn open_surface(&mut self, _request: SurfaceRequest, token: FloatingToken) -> Result<(), SurfaceError> {
        self.live.push(token);
        Ok(())
    }

    fn close_surface(&mut self, node: NodeId) -> Option<SurfaceRelease> {
        let at = self.live.iter().position(|token| token.node() == node)?;
        Some(SurfaceRelease {
            token: self.live.remove(at),
            geometry: None,
        })
    }
}

const DEFAULT: &str = r#"{"root": {"kind": "stack", "o": "v", "children": [
    {"kind": "toolbar", "name": "File", "z": "auto"},
    {"kind": "toolbar", "name": "Edit", "z": "auto"},
    {"kind": "stack", "o": "h", "children": [
        {"kind": "panel", "name": "Files", "z": "25*"},
        {"kind": "tab", "children": [{"kind": "document", "name": "documents"}]},
        {"kind": "stack", "o": "v", "z": "30*", "children": [
            {"kind": "panel", "name": "Outline"},
            {"kind": "panel", "name": "Info", "closable": true}
        ]}
    ]},
    {"kind": "tab", "captionAt": "left", "children": [
        {"kind": "panel", "name": "Output"},
        {"kind": "panel", "name": "Find"},
        {"kind": "panel", "name": "Tasks", "closable": true},
        {"kind": "panel", "name": "Recent"}
    ]}
]}}"#;

fn non_root_nodes(panels: &DockPanels) -> Vec<NodeId> {
    panels.tree().descendants(panels.root())
}

fn assert_indices_contiguous(tree: &DockTree) {
    for node in tree.nodes() {
        for (expected, child) in node.children().iter().enumerate() {
            assert_eq!(tree.index(*child), Some(expected));
        }
    }
}

fn assert_surfaces_match_state(panels: &DockPanels, host: &GrantAll) {
    for node in panels.tree().nodes() {
        let attached = panels.tree().is_attached(node.id());
        if attached && node.state().is_visibly_floating() {
            assert!(node.has_surface(), "floating node {} has no surface", node.id());
        } else {
            assert!(!node.has_surface(), "node {} keeps a surface", node.id());
        }
    }
    assert!(host.live.len() <= panels.tree().len());
}

fn random_state(rng: &mut Lcg) -> DockState {
    match rng.choose_index(4) {
        0 => DockState::DOCKED,
        1 => DockState::HIDDEN,
        2 => DockState::FLOATING,
        _ => DockState::HIDDEN | DockState::FLOATING,
    }
}

fn step(panels: &mut DockPanels, host: &mut GrantAll, rng: &mut Lcg, fresh: &mut u32) {
    let nodes = non_root_nodes(panels);
    if nodes.is_empty() {
        return;
    }
    let node = nodes[rng.choose_index(nodes.len())];
    match rng.choose_index(6) {
        0 | 1 => {
            let targets = panels.move_targets(node);
            if targets.is_empty() {
                return;
            }
            let (target, relation) = targets[rng.choose_index(targets.len())];
            assert!(panels.move_node(node, target, relation, host).expect("move"));
        }
        2 | 3 => {
            let state = random_state(rng);
            panels.set_dock_state(node, state, host).expect("dock state");
        }
        4 => {
            if rng.choose_bool() {
                let _ = panels.close(node, host).expect("close");
            } else if panels.tree().node(node).is_some_and(DockNode::is_leaf) {
                *fresh += 1;
                let name = format!("Panel{fresh}");
                let _ = panels
                    .add_leaf(node, rng.choose_bool(), LeafKind::Panel, &name, true, false)
                    .expect("add");
            }
        }
        _ => {
            let _ = panels.select_tab(node).expect("select");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_preserve_tree_invariants(seed in any::<u64>(), steps in 1usize..40) {
        let mut panels = DockPanels::load(DEFAULT, None, DockConfig::default()).expect("load");
        let mut host = GrantAll::default();
        let mut rng = Lcg::new(seed);
        let mut fresh = 0;
        for _ in 0..steps {
            step(&mut panels, &mut host, &mut rng, &mut fresh);
            prop_assert!(panels.tree().validate().is_ok(), "{:?}", panels.tree().validate());
            assert_indices_contiguous(panels.tree());
            assert_surfaces_match_state(&panels, &host);
        }

        let saved = panels.to_document_string().expect("encode");
        let document = LayoutDocument::from_json_str(&saved).expect("parse");
        let rebuilt = DockTree::from_document(&document).expect("build");
        prop_assert!(rebuilt.validate().is_ok());
        prop_assert_eq!(rebuilt.to_document().to_json_string().expect("encode"), saved);
    }

    #[test]
    fn adjacent_before_moves_never_change_the_tree(seed in any::<u64>()) {
        let mut panels = DockPanels::load(DEFAULT, None, DockConfig::default()).expect("load");
        let mut host = GrantAll::default();
        let mut rng = Lcg::new(seed);
        let nodes = non_root_nodes(&panels);
        let target = nodes[rng.choose_index(nodes.len())];
        if let Some(previous) = panels.tree().previous(target) {
            let before = panels.tree().clone();
            prop_assert!(!panels.move_node(previous, target, MoveRelation::BeforeTarget, &mut host).expect("move"));
            prop_assert_eq!(panels.tree(), &before);
        }
    }
}
