#![forbid(unsafe_code)]

//! `sirenia` is the core of a tree/graph diagram editor without any drawing.
//!
//! The graph model and its serializer are always available at the crate root. Geometry and layout
//! live behind the default `layout` feature.
//!
//! # Features
//!
//! - `layout`: enable tree geometry, layout, expand/collapse, decorators and edge curves
//!   (`sirenia::layout`, `sirenia::geom`)

pub use sirenia_graph::*;

#[cfg(feature = "layout")]
pub use sirenia_geom as geom;

#[cfg(feature = "layout")]
pub mod layout {
    pub use sirenia_layout::decorator::cloud_path;
    pub use sirenia_layout::expand::{is_expanded, set_expanded, toggle_at, update_visibility};
    pub use sirenia_layout::*;
}
