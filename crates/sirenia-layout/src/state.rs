//! Per-element geometry state.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use sirenia_geom::{Point, Rect};
use sirenia_graph::NodeId;

/// Attachment point of a parent-child relation, stored on the parent's state and keyed by the
/// child. Offsets are relative to the parent's box origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub parent: NodeId,
    pub x_offset: f64,
    pub y_offset: f64,
    pub expanded: bool,
}

impl Connector {
    pub fn new(parent: NodeId) -> Self {
        Self {
            parent,
            x_offset: 0.0,
            y_offset: 0.0,
            expanded: false,
        }
    }

    pub fn offset(&self) -> Point {
        sirenia_geom::point(self.x_offset, self.y_offset)
    }
}

/// Anything [`TreeGeometry::move_element`](crate::TreeGeometry::move_element) can relocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movable {
    Node(NodeId),
    /// The connector stored on `parent` for the child `target`.
    Connector { parent: NodeId, target: NodeId },
}

impl From<NodeId> for Movable {
    fn from(node: NodeId) -> Self {
        Movable::Node(node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualState {
    /// `None` until the element has been measured or placed.
    pub bounding_box: Option<Rect>,
    pub visible: bool,
    pub connectors: IndexMap<NodeId, Connector, FxBuildHasher>,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            bounding_box: None,
            visible: true,
            connectors: IndexMap::default(),
        }
    }
}

impl VisualState {
    /// The connector closest to `point` (relative to the box origin) that lies within
    /// `snap_radius` on both axes, with the child it leads to.
    pub fn connector_at(&self, point: Point, snap_radius: f64) -> Option<(NodeId, &Connector)> {
        let mut best: Option<(NodeId, &Connector)> = None;
        let mut best_dx = f64::MAX;
        let mut best_dy = f64::MAX;
        for (target, c) in &self.connectors {
            let dx = (c.x_offset - point.x).abs();
            let dy = (c.y_offset - point.y).abs();
            if dx < snap_radius && dx < best_dx && dy < snap_radius && dy < best_dy {
                best = Some((*target, c));
                best_dx = dx;
                best_dy = dy;
            }
        }
        best
    }

    /// The connector of `owner` towards `target`, created at the box origin if missing.
    pub fn connector(&mut self, owner: NodeId, target: NodeId) -> &mut Connector {
        self.connectors
            .entry(target)
            .or_insert_with(|| Connector::new(owner))
    }
}
