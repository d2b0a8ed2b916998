//! Tab header orientation policy.
//!
//! Tab groups captioned at the top or bottom always use horizontal headers.
//! For left/right captions the header runs along the vertical axis; when the
//! summed caption widths no longer fit the available extent the header
//! switches to rotated (vertical) text. The decision is memoized per group
//! and recomputed when the extent, the caption edge or the membership
//! changes.

use dockyard_core::geometry::Edge;

use crate::config::HeaderConfig;
use crate::error::TreeError;
use crate::node::{NodeId, NodeKind};
use crate::tree::DockTree;

/// Measures rendered caption widths.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f64,
{
    fn measure(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Header text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeaderOrientation {
    #[default]
    Horizontal,
    /// Rotated captions stacked along the vertical axis.
    Vertical,
}

/// Memoized header decision stored on a tab group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMemo {
    orientation: HeaderOrientation,
    extent: Option<u32>,
    caption: Edge,
    dirty: bool,
}

impl Default for HeaderMemo {
    fn default() -> Self {
        Self {
            orientation: HeaderOrientation::Horizontal,
            extent: None,
            caption: Edge::default(),
            dirty: true,
        }
    }
}

impl HeaderMemo {
    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Last computed orientation.
    #[must_use]
    pub const fn orientation(&self) -> HeaderOrientation {
        self.orientation
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn is_fresh(&self, extent: u32, caption: Edge) -> bool {
        !self.dirty && self.extent == Some(extent) && self.caption == caption
    }
}

/// Total header length: margin plus every caption width and its padding.
pub fn header_length<'a>(
    captions: impl IntoIterator<Item = &'a str>,
    measurer: &dyn TextMeasure,
    config: &HeaderConfig,
) -> f64 {
    captions
        .into_iter()
        .map(|caption| measurer.measure(caption) + config.item_padding)
        .sum::<f64>()
        + config.margin
}

/// Pick the header orientation for a group captioned at `caption`.
#[must_use]
pub fn choose_orientation(
    caption: Edge,
    total: f64,
    extent: f64,
    config: &HeaderConfig,
) -> HeaderOrientation {
    if caption.is_vertical() && total > extent - config.tolerance {
        HeaderOrientation::Vertical
    } else {
        HeaderOrientation::Horizontal
    }
}

impl DockTree {
    /// Recompute (or reuse) the header orientation of a tab group.
    ///
    /// `extent` is the group's length along the caption edge.
    pub fn update_tab_header(
        &mut self,
        group: NodeId,
        extent: u32,
        measurer: &dyn TextMeasure,
        config: &HeaderConfig,
    ) -> Result<HeaderOrientation, TreeError> {
        let caption = self.caption_at(group);
        let node = self.get(group)?;
        let NodeKind::TabGroup(tab) = node.kind() else {
            return Err(TreeError::NotContainer { node_id: group });
        };
        if tab.header.is_fresh(extent, caption) {
            return Ok(tab.header.orientation);
        }
        let names: Vec<String> = node
            .children()
            .iter()
            .filter_map(|child| self.node(*child))
            .filter_map(|child| child.leaf().map(|leaf| leaf.name.clone()))
            .collect();
        let total = header_length(names.iter().map(String::as_str), measurer, config);
        let orientation = choose_orientation(caption, total, f64::from(extent), config);
        if let Some(tab) = self.get_mut(group)?.tab_group_mut() {
            tab.header = HeaderMemo {
                orientation,
                extent: Some(extent),
                caption,
                dirty: false,
            };
        }
        tracing::debug!(group = %group, ?orientation, total, extent, "tab header updated");
        Ok(orientation)
    }

    /// Memoized header orientation of a tab group, if it was ever computed.
    #[must_use]
    pub fn tab_header(&self, group: NodeId) -> Option<HeaderOrientation> {
        let tab = self.node(group)?.tab_group()?;
        tab.header.extent.map(|_| tab.header.orientation)
    }
}
