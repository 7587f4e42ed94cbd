//! Horizontal tree layout.
//!
//! Children are placed in a column to the right of their parent, `gap_x` away from the parent's
//! right edge. Each visible child gets a vertical slot as tall as its laid-out subtree; slots are
//! stacked `gap_y` apart and the stack is centred on the parent box. A child box is centred in its
//! slot, which keeps a subtree centred on its own root at every level.

use crate::error::Result;
use crate::geometry::TreeGeometry;
use crate::options::LayoutOptions;
use crate::state::Connector;
use sirenia_geom::Rect;
use sirenia_graph::{Graph, NodeId};

pub trait Layout {
    /// Positions the subtree below `node`, whose own box stays where it is.
    fn place_children(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeLayout {
    options: LayoutOptions,
}

impl TreeLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Extent of the laid-out subtree of `node`: its own box grown by the widest child subtree
    /// (plus `gap_x`) and as tall as the stacked visible child subtrees, if that is taller.
    ///
    /// Only the size is meaningful; the origin is the origin of the node box. `None` if `node` has
    /// no box.
    pub fn recalculate_subtree(
        &self,
        geo: &TreeGeometry,
        graph: &Graph,
        node: NodeId,
    ) -> Option<Rect> {
        let mut r = geo.bounds(node)?;
        let mut height = 0.0;
        let mut width: f64 = 0.0;
        for c in graph.children(node) {
            if !geo.is_visible(c) {
                continue;
            }
            let Some(sub) = self.recalculate_subtree(geo, graph, c) else {
                continue;
            };
            height += sub.height() + self.options.gap_y;
            width = width.max(sub.width());
        }
        if height > 0.0 {
            height -= self.options.gap_y;
        }
        if height > r.height() {
            r.size.height = height;
        }
        if width > 0.0 {
            r.size.width += self.options.gap_x + width;
        }
        Some(r)
    }

    fn layout_children(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()> {
        let Some(r) = geo.bounds(node) else {
            return Ok(());
        };
        let children: Vec<NodeId> = graph.children(node).collect();

        let slots: Vec<(NodeId, Rect, f64)> = children
            .iter()
            .filter(|c| geo.is_visible(**c))
            .filter_map(|c| {
                let b = geo.bounds(*c)?;
                let sub = self.recalculate_subtree(geo, graph, *c)?;
                Some((*c, b, sub.height()))
            })
            .collect();

        let stack_height = if slots.is_empty() {
            0.0
        } else {
            slots.iter().map(|(_, _, h)| h).sum::<f64>()
                + self.options.gap_y * (slots.len() - 1) as f64
        };

        let x = r.max_x() + self.options.gap_x;
        let mut y = r.min_y() + (r.height() - stack_height) / 2.0;
        for (c, b, slot) in slots {
            let top = y + (slot - b.height()) / 2.0;
            let placed = sirenia_geom::rect(x, top, b.width(), b.height());
            geo.set_bounds(graph, c, placed)?;
            self.layout_children(geo, graph, c)?;
            y += slot + self.options.gap_y;
        }

        let state = geo.visual_state_mut(node);
        for c in children {
            state.connectors.entry(c).or_insert(Connector {
                parent: node,
                x_offset: r.width(),
                y_offset: r.height() / 2.0,
                expanded: false,
            });
        }
        Ok(())
    }
}

impl Layout for TreeLayout {
    fn place_children(&self, geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()> {
        if geo.bounds(node).is_none() {
            return Ok(());
        }
        tracing::trace!(%node, "placing children");
        geo.batch(graph, |geo| self.layout_children(geo, graph, node))
    }
}
