#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A rectangle in screen coordinates.
///
/// Origin at top-left; coordinates may be negative on multi-display setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Extent along an edge's axis.
    ///
    /// Left/Right edges run vertically, so their extent is the height.
    #[inline]
    pub const fn extent_along(&self, edge: Edge) -> u32 {
        if edge.is_vertical() {
            self.height
        } else {
            self.width
        }
    }
}

/// One edge of a rectangle.
///
/// Used for caption placement and for the side a node is docked at when a new
/// stack is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    #[default]
    Top,
    Right,
    Bottom,
}

impl Edge {
    /// True for Left and Right, whose captions run along the vertical axis.
    #[inline]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }

    /// True for Right and Bottom, the "far" side of an axis.
    #[inline]
    pub const fn is_far(self) -> bool {
        matches!(self, Edge::Right | Edge::Bottom)
    }
}
