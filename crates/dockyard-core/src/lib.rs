#![forbid(unsafe_code)]

//! Core primitives for dockyard.
//!
//! # Role in dockyard
//! `dockyard-core` holds the small value types shared between the layout
//! engine (`dockyard-layout`) and host adapters: screen rectangles reported by
//! the renderer and the [`Edge`](geometry::Edge) used for caption placement
//! and docking sides.

pub mod geometry;

pub use geometry::{Edge, Rect};
