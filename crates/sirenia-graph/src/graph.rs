//! The graph arena.
//!
//! Nodes and edges live in the [`Graph`] and are addressed by their ids. Edges refer to their
//! endpoints by [`NodeId`], so cyclic graphs never form ownership cycles and elements can be
//! removed deterministically.
//!
//! Tree navigation follows non-cyclic edges only: the children of a node are the targets of its
//! non-cyclic outgoing edges, which keeps every tree walk finite.

use crate::attribute::{AttrValue, Attribute, AttributeRegistry};
use crate::element::{Edge, EdgeId, ElementId, GraphElement, Node, NodeId};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Structural change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    RootChanged { root: Option<NodeId> },
    EdgeAdded { edge: EdgeId },
    EdgeRemoved { edge: EdgeId },
}

pub trait GraphListener {
    fn graph_changed(&self, event: &GraphEvent);
}

pub struct Graph {
    registry: Arc<AttributeRegistry>,
    root: Option<NodeId>,
    nodes: IndexMap<NodeId, Node, FxBuildHasher>,
    edges: IndexMap<EdgeId, Edge, FxBuildHasher>,
    listeners: Vec<Rc<dyn GraphListener>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(Arc::new(AttributeRegistry::new()))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Graph {
    pub fn new(registry: Arc<AttributeRegistry>) -> Self {
        Self {
            registry,
            root: None,
            nodes: IndexMap::default(),
            edges: IndexMap::default(),
            listeners: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<AttributeRegistry> {
        &self.registry
    }

    /// Shorthand for `self.registry().attribute(name)`.
    pub fn attribute(&self, name: &str) -> Attribute {
        self.registry.attribute(name)
    }

    pub fn add_listener(&mut self, listener: Rc<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Rc<dyn GraphListener>) {
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    fn fire(&self, event: GraphEvent) {
        for l in &self.listeners {
            l.graph_changed(&event);
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Sets the root node; listeners are only notified on an actual change.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        if self.root != root {
            self.root = root;
            self.fire(GraphEvent::RootChanged { root });
        }
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId::fresh();
        self.nodes.insert(id, Node::new(id));
        id
    }

    /// Adds a node with a single attribute set, a common case for labelled trees.
    pub fn add_node_with(&mut self, attribute: Attribute, value: impl Into<AttrValue>) -> NodeId {
        let id = self.add_node();
        if let Some(n) = self.nodes.get_mut(&id) {
            n.set_attribute(attribute, value);
        }
        id
    }

    /// Removes a node together with all its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let incident = self.nodes.get(&id)?.edges.clone();
        for e in incident {
            self.remove_edge(e);
        }
        let node = self.nodes.shift_remove(&id);
        if self.root == Some(id) {
            self.set_root(None);
        }
        node
    }

    /// The node with element id `id`, if it is a node of this graph.
    pub fn node_id(&self, id: ElementId) -> Option<NodeId> {
        let id = NodeId::from_element(id);
        self.nodes.contains_key(&id).then_some(id)
    }

    /// The edge with element id `id`, if it is an edge of this graph.
    pub fn edge_id(&self, id: ElementId) -> Option<EdgeId> {
        let id = EdgeId::from_element(id);
        self.edges.contains_key(&id).then_some(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Mutable access to an edge's attributes. Endpoints are changed through the graph.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn require_node(&self, id: Option<NodeId>) -> Result<()> {
        match id {
            Some(id) if !self.nodes.contains_key(&id) => Err(Error::UnknownNode { id }),
            _ => Ok(()),
        }
    }

    /// Creates the edge `parent -> child` and registers it with both endpoints.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<EdgeId> {
        self.require_node(Some(parent))?;
        self.require_node(Some(child))?;

        let id = EdgeId::fresh();
        self.edges.insert(id, Edge::new(id));
        self.assign_endpoints(id, Some(parent), Some(child));
        self.fire(GraphEvent::EdgeAdded { edge: id });
        Ok(id)
    }

    /// Unregisters the edge from both endpoints and drops it.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&id)?;
        for n in [edge.source, edge.target].into_iter().flatten() {
            if let Some(node) = self.nodes.get_mut(&n) {
                node.unlink(id);
            }
        }
        self.fire(GraphEvent::EdgeRemoved { edge: id });
        Some(edge)
    }

    pub fn set_edge_source(&mut self, edge: EdgeId, source: Option<NodeId>) -> Result<()> {
        let target = self.edges.get(&edge).ok_or(Error::UnknownEdge { id: edge })?.target;
        self.set_edge_endpoints(edge, source, target)
    }

    pub fn set_edge_target(&mut self, edge: EdgeId, target: Option<NodeId>) -> Result<()> {
        let source = self.edges.get(&edge).ok_or(Error::UnknownEdge { id: edge })?.source;
        self.set_edge_endpoints(edge, source, target)
    }

    /// Re-points an edge. Incident lists of old and new endpoints are kept in sync and the cyclic
    /// flag is recomputed.
    pub fn set_edge_endpoints(
        &mut self,
        edge: EdgeId,
        source: Option<NodeId>,
        target: Option<NodeId>,
    ) -> Result<()> {
        if !self.edges.contains_key(&edge) {
            return Err(Error::UnknownEdge { id: edge });
        }
        self.require_node(source)?;
        self.require_node(target)?;
        self.assign_endpoints(edge, source, target);
        Ok(())
    }

    fn assign_endpoints(&mut self, edge: EdgeId, source: Option<NodeId>, target: Option<NodeId>) {
        let Some((old_source, old_target)) = self.edges.get(&edge).map(|e| (e.source, e.target))
        else {
            return;
        };
        for old in [old_source, old_target].into_iter().flatten() {
            if Some(old) != source && Some(old) != target {
                if let Some(n) = self.nodes.get_mut(&old) {
                    n.unlink(edge);
                }
            }
        }
        for new in [source, target].into_iter().flatten() {
            if let Some(n) = self.nodes.get_mut(&new) {
                n.link(edge);
            }
        }
        self.set_endpoints_unlinked(edge, source, target);
    }

    /// Sets endpoints and the cyclic flag without touching incident lists.
    ///
    /// Used while deserializing, where incident lists are rebuilt from the stream in their
    /// original order.
    pub(crate) fn set_endpoints_unlinked(
        &mut self,
        edge: EdgeId,
        source: Option<NodeId>,
        target: Option<NodeId>,
    ) {
        let cyclic = self.is_cyclic(source, target);
        if let Some(e) = self.edges.get_mut(&edge) {
            e.source = source;
            e.target = target;
            e.cyclic = cyclic;
        }
    }

    pub(crate) fn insert_detached_edge(&mut self) -> EdgeId {
        let id = EdgeId::fresh();
        self.edges.insert(id, Edge::new(id));
        id
    }

    pub(crate) fn link_incident(&mut self, node: NodeId, edge: EdgeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.link(edge);
        }
    }

    /// Recomputes the cyclic flag of `order` as if the edges had been connected one after another
    /// in that order. Edges not yet replayed do not count as tree edges.
    pub(crate) fn replay_cyclic(&mut self, order: &[EdgeId]) {
        for id in order {
            if let Some(e) = self.edges.get_mut(id) {
                e.cyclic = true;
            }
        }
        for id in order {
            let Some((source, target)) = self.edges.get(id).map(|e| (e.source, e.target)) else {
                continue;
            };
            let cyclic = self.is_cyclic(source, target);
            if let Some(e) = self.edges.get_mut(id) {
                e.cyclic = cyclic;
            }
        }
    }

    /// Whether an edge `source -> target` would close a cycle: `target` is `source` itself or one
    /// of its ancestors.
    pub fn is_cyclic(&self, source: Option<NodeId>, target: Option<NodeId>) -> bool {
        match (source, target) {
            (_, None) => false,
            (s, Some(t)) if s == Some(t) => true,
            (Some(s), Some(t)) => self.is_ancestor(t, s),
            (None, Some(_)) => false,
        }
    }

    /// `true` if `node` is reachable from `ancestor` via child edges. A node is not its own
    /// ancestor.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        if ancestor == node {
            return false;
        }
        let mut visited: HashSet<NodeId> = HashSet::default();
        let mut stack: Vec<NodeId> = vec![ancestor];
        while let Some(v) = stack.pop() {
            if !visited.insert(v) {
                continue;
            }
            for c in self.children(v) {
                if c == node {
                    return true;
                }
                stack.push(c);
            }
        }
        false
    }

    fn incident(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.nodes
            .get(&node)
            .into_iter()
            .flat_map(|n| n.edges.iter())
            .filter_map(|e| self.edges.get(e))
    }

    /// Edges pointing at `node` from another node.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.incident(node)
            .filter(move |e| e.target == Some(node) && e.source != Some(node))
    }

    /// Edges leaving `node` towards another node; cyclic ones only if `include_cyclic`.
    pub fn outgoing(&self, node: NodeId, include_cyclic: bool) -> impl Iterator<Item = &Edge> {
        self.incident(node).filter(move |e| {
            e.source == Some(node) && e.target != Some(node) && (include_cyclic || !e.cyclic)
        })
    }

    /// Targets of the non-cyclic outgoing edges.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.outgoing(node, false).filter_map(|e| e.target)
    }

    /// Sources of the incoming edges.
    pub fn parents(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.incoming(node).filter_map(|e| e.source)
    }

    /// `node` followed by all its tree descendants in pre-order. Shared descendants are listed
    /// once.
    pub fn tree_nodes(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::default();
        self.collect_tree(node, &mut visited, &mut out);
        out
    }

    /// Tree descendants of `node` in pre-order, without `node` itself.
    pub fn tree_descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::default();
        visited.insert(node);
        for c in self.children(node) {
            self.collect_tree(c, &mut visited, &mut out);
        }
        out
    }

    fn collect_tree(&self, node: NodeId, visited: &mut HashSet<NodeId>, out: &mut Vec<NodeId>) {
        if !visited.insert(node) {
            return;
        }
        out.push(node);
        for c in self.children(node) {
            self.collect_tree(c, visited, out);
        }
    }

    /// Pre-order walk. Descends into a node only while `pred` accepts it; returns `false` as soon
    /// as the predicate rejects a node.
    pub fn walk_tree<F>(&self, node: NodeId, pred: &mut F) -> bool
    where
        F: FnMut(NodeId) -> bool,
    {
        if !pred(node) {
            return false;
        }
        let children: Vec<NodeId> = self.children(node).collect();
        children.into_iter().all(|c| self.walk_tree(c, pred))
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root.and_then(|r| self.nodes.get(&r)) {
            Some(root) => write!(f, "{root}"),
            None => f.write_str("null"),
        }
    }
}
