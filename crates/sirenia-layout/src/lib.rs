#![forbid(unsafe_code)]

//! Tree geometry and layout for `sirenia-graph`.
//!
//! Geometry lives next to the graph, not inside it: a [`TreeGeometry`] maps element ids to boxes,
//! visibility and connectors. Operations that may notify listeners take the [`Graph`] the
//! listeners observe.
//!
//! [`Graph`]: sirenia_graph::Graph

pub mod decorator;
pub mod edge;
pub mod error;
pub mod expand;
pub mod geometry;
pub mod layout;
pub mod options;
pub mod state;

pub use decorator::{CloudDecorator, Decoration, Decorators, MarginDecorator, NodeDecorator};
pub use edge::{EdgeMode, EdgeStyle, curve_between, edge_curve, edge_hit};
pub use error::{Error, Result};
pub use geometry::{GeometryListener, TreeGeometry};
pub use layout::{Layout, TreeLayout};
pub use options::{
    GeometryOptions, LayoutOptions, LimitPolicy, MAX_COLLISION_ATTEMPTS,
    MAX_CONVERGENCE_ITERATIONS,
};
pub use state::{Connector, Movable, VisualState};
