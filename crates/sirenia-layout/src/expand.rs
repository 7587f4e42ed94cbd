//! Expand and collapse of subtrees.
//!
//! Whether the child of an edge is shown is stored in the `expanded` flag of the connector the
//! edge's source holds for its target. Expanding shows the children of the source and lays them
//! out; collapsing hides every tree descendant of the source and collapses their connectors too.

use crate::error::Result;
use crate::geometry::TreeGeometry;
use crate::layout::Layout;
use crate::state::Connector;
use sirenia_geom::Point;
use sirenia_graph::{EdgeId, Graph, NodeId};

pub fn is_expanded(geo: &TreeGeometry, graph: &Graph, edge: EdgeId) -> bool {
    let Some((source, target)) = endpoints(graph, edge) else {
        return false;
    };
    geo.visual_state(source)
        .and_then(|s| s.connectors.get(&target))
        .is_some_and(|c| c.expanded)
}

fn endpoints(graph: &Graph, edge: EdgeId) -> Option<(NodeId, NodeId)> {
    let e = graph.edge(edge)?;
    Some((e.source()?, e.target()?))
}

/// Expands or collapses `edge`. Returns `false` without touching anything if the edge is already
/// in the requested state or lacks an endpoint.
pub fn set_expanded(
    geo: &mut TreeGeometry,
    graph: &Graph,
    layout: &dyn Layout,
    edge: EdgeId,
    expand: bool,
) -> Result<bool> {
    let Some((source, target)) = endpoints(graph, edge) else {
        return Ok(false);
    };
    let anchor = geo.bounds(source).map(|b| (b.width(), b.height() / 2.0));
    let connector = geo
        .visual_state_mut(source)
        .connectors
        .entry(target)
        .or_insert_with(|| {
            let mut c = Connector::new(source);
            if let Some((x, y)) = anchor {
                c.x_offset = x;
                c.y_offset = y;
            }
            c
        });
    if connector.expanded == expand {
        return Ok(false);
    }
    connector.expanded = expand;

    geo.batch(graph, |geo| {
        if expand {
            let children: Vec<NodeId> = graph.children(source).collect();
            for c in children {
                geo.set_visibility(graph, c, true)?;
            }
            layout.place_children(geo, graph, source)
        } else {
            for n in graph.tree_descendants(source) {
                geo.set_visibility(graph, n, false)?;
                for c in geo.visual_state_mut(n).connectors.values_mut() {
                    c.expanded = false;
                }
            }
            Ok(())
        }
    })?;
    Ok(true)
}

/// A node is visible if it has no incoming edge or at least one expanded incoming edge.
pub fn update_visibility(geo: &mut TreeGeometry, graph: &Graph, node: NodeId) -> Result<()> {
    let mut incoming = graph.incoming(node).map(|e| e.id()).peekable();
    let visible = incoming.peek().is_none() || incoming.any(|e| is_expanded(geo, graph, e));
    geo.set_visibility(graph, node, visible)
}

/// Toggles the connector of `node` under `point` (graph coordinates) within `snap_radius`.
///
/// Every outgoing edge whose connector sits at the same offset is switched together, so stacked
/// connectors act as one. Returns the child of the hit connector.
pub fn toggle_at(
    geo: &mut TreeGeometry,
    graph: &Graph,
    layout: &dyn Layout,
    node: NodeId,
    point: Point,
    snap_radius: f64,
) -> Result<Option<NodeId>> {
    let Some(origin) = geo.bounds(node).map(|b| b.origin) else {
        return Ok(None);
    };
    let Some(state) = geo.visual_state(node) else {
        return Ok(None);
    };
    let local = sirenia_geom::point(point.x - origin.x, point.y - origin.y);
    let Some((hit, connector)) = state.connector_at(local, snap_radius) else {
        return Ok(None);
    };
    let expand = !connector.expanded;
    let offset = connector.offset();

    let edges: Vec<EdgeId> = graph
        .outgoing(node, true)
        .filter(|e| {
            e.target()
                .and_then(|t| state.connectors.get(&t))
                .is_some_and(|c| c.offset() == offset)
        })
        .map(|e| e.id())
        .collect();

    geo.batch(graph, |geo| {
        for e in edges {
            set_expanded(geo, graph, layout, e, expand)?;
        }
        Ok(())
    })?;
    Ok(Some(hit))
}
