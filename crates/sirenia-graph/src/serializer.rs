//! Cycle-safe graph serialization over a [`GraphWriter`]/[`GraphReader`] field stream.
//!
//! Every element is written as a record `start, id, (attribute, value)*, null, children…, end`.
//! An element already written in the current pass is written as its id only, which is how cyclic
//! graphs terminate. Nodes list their incident edges, edges list source and target.

use crate::attribute::{Attribute, AttributeRegistry, Attributes};
use crate::element::{EdgeId, ElementId, GraphElement, NodeId};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::stream::{GraphReader, GraphWriter};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializerOptions {
    /// Write attribute ordinals instead of names. Only safe when both sides register attribute
    /// names in the same order.
    pub use_attribute_ordinals: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            use_attribute_ordinals: true,
        }
    }
}

impl SerializerOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy)]
enum ReadElement {
    Node(NodeId),
    Edge(EdgeId),
}

/// Serializer for one graph at a time. Reusable after [`reset`](Self::reset), which `write` and
/// `read` call themselves.
#[derive(Debug)]
pub struct GraphSerializer {
    registry: Arc<AttributeRegistry>,
    options: SerializerOptions,
    written: HashSet<ElementId>,
    read: HashMap<i64, ReadElement>,
    /// Edges in the order their records were opened.
    read_edges: Vec<EdgeId>,
}

fn stream_id(id: ElementId) -> i64 {
    i64::try_from(id.get()).unwrap_or(i64::MAX)
}

impl GraphSerializer {
    pub fn new(registry: Arc<AttributeRegistry>) -> Self {
        Self::with_options(registry, SerializerOptions::default())
    }

    pub fn with_options(registry: Arc<AttributeRegistry>, options: SerializerOptions) -> Self {
        Self {
            registry,
            options,
            written: HashSet::default(),
            read: HashMap::default(),
            read_edges: Vec::new(),
        }
    }

    pub fn options(&self) -> SerializerOptions {
        self.options
    }

    /// Forgets written and read elements.
    pub fn reset(&mut self) {
        self.written.clear();
        self.read.clear();
        self.read_edges.clear();
    }

    pub fn set_use_attribute_ordinals(&mut self, use_ordinals: bool) {
        self.options.use_attribute_ordinals = use_ordinals;
    }

    /// Writes the graph rooted at its root node into `field`.
    pub fn write<W: GraphWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        graph: &Graph,
        field: u32,
    ) -> Result<()> {
        self.reset();
        self.write_node(writer, graph, graph.root(), field)
    }

    /// Writes `node` and, recursively, its incident edges into `field`.
    pub fn write_node<W: GraphWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        graph: &Graph,
        node: Option<NodeId>,
        field: u32,
    ) -> Result<()> {
        let Some(id) = node else {
            return writer.write_null(field);
        };
        let n = graph.node(id).ok_or(Error::UnknownNode { id })?;
        if !self.write_element(writer, n.element_id(), n.attributes(), field)? {
            return Ok(());
        }
        let edges = n.edges().to_vec();
        for (i, e) in edges.into_iter().enumerate() {
            self.write_edge(writer, graph, Some(e), field_offset(field, i + 1))?;
        }
        writer.end_element()
    }

    /// Writes `edge` and, recursively, its source and target into `field`.
    pub fn write_edge<W: GraphWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        graph: &Graph,
        edge: Option<EdgeId>,
        field: u32,
    ) -> Result<()> {
        let Some(id) = edge else {
            return writer.write_null(field);
        };
        let e = graph.edge(id).ok_or(Error::UnknownEdge { id })?;
        let (source, target) = (e.source(), e.target());
        if !self.write_element(writer, e.element_id(), e.attributes(), field)? {
            return Ok(());
        }
        self.write_node(writer, graph, source, field_offset(field, 1))?;
        self.write_node(writer, graph, target, field_offset(field, 2))?;
        writer.end_element()
    }

    /// Writes a back-reference and returns `false`, or opens the record, writes id and attributes
    /// and returns `true`. The caller closes the record.
    fn write_element<W: GraphWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        id: ElementId,
        attributes: &Attributes,
        field: u32,
    ) -> Result<bool> {
        if !self.written.insert(id) {
            tracing::trace!(%id, "writing back-reference");
            writer.write_int(field, stream_id(id))?;
            return Ok(false);
        }

        writer.start_element(field)?;
        let mut f = 1u32;
        writer.write_int(f, stream_id(id))?;
        f += 1;
        for (attribute, value) in attributes.iter() {
            if self.options.use_attribute_ordinals {
                writer.write_int(f, i64::from(attribute.ordinal()))?;
            } else {
                writer.write_string(f, attribute.name())?;
            }
            f += 1;
            writer.write_object(f, value, false)?;
            f += 1;
        }
        writer.write_null(f)?;
        Ok(true)
    }

    /// Reads a graph from the next field. A null field yields `None`.
    ///
    /// On error the partially read graph is dropped.
    pub fn read<R: GraphReader + ?Sized>(&mut self, reader: &mut R) -> Result<Option<Graph>> {
        self.reset();
        if reader.is_field_null()? {
            reader.skip()?;
            return Ok(None);
        }
        let mut graph = Graph::new(self.registry.clone());
        let root = self.read_node(reader, &mut graph)?;
        graph.set_root(root);
        self.reconcile_cyclic(&mut graph);
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph read"
        );
        Ok(Some(graph))
    }

    /// Reads a node record or back-reference into `graph`.
    pub fn read_node<R: GraphReader + ?Sized>(
        &mut self,
        reader: &mut R,
        graph: &mut Graph,
    ) -> Result<Option<NodeId>> {
        if reader.is_field_null()? {
            reader.skip()?;
            return Ok(None);
        }
        if reader.is_field_numeric()? {
            let id = reader.read_number()?;
            return match self.read.get(&id) {
                Some(ReadElement::Node(n)) => Ok(Some(*n)),
                Some(ReadElement::Edge(_)) => Err(Error::ReferenceKind {
                    id,
                    expected: "node",
                }),
                None => Err(Error::UnknownReference { id }),
            };
        }

        reader.start_object()?;
        let stream = reader.read_number()?;
        let node = graph.add_node();
        self.read.insert(stream, ReadElement::Node(node));
        let attributes = self.read_attributes(reader)?;
        if let Some(n) = graph.node_mut(node) {
            n.attributes = attributes;
        }
        while reader.has_next_field()? {
            if let Some(edge) = self.read_edge(reader, graph)? {
                graph.link_incident(node, edge);
            }
        }
        reader.end_object()?;
        Ok(Some(node))
    }

    /// Reads an edge record or back-reference into `graph`.
    pub fn read_edge<R: GraphReader + ?Sized>(
        &mut self,
        reader: &mut R,
        graph: &mut Graph,
    ) -> Result<Option<EdgeId>> {
        if reader.is_field_null()? {
            reader.skip()?;
            return Ok(None);
        }
        if reader.is_field_numeric()? {
            let id = reader.read_number()?;
            return match self.read.get(&id) {
                Some(ReadElement::Edge(e)) => Ok(Some(*e)),
                Some(ReadElement::Node(_)) => Err(Error::ReferenceKind {
                    id,
                    expected: "edge",
                }),
                None => Err(Error::UnknownReference { id }),
            };
        }

        reader.start_object()?;
        let stream = reader.read_number()?;
        let edge = graph.insert_detached_edge();
        self.read.insert(stream, ReadElement::Edge(edge));
        self.read_edges.push(edge);
        let attributes = self.read_attributes(reader)?;
        if let Some(e) = graph.edge_mut(edge) {
            e.attributes = attributes;
        }
        let source = self.read_node(reader, graph)?;
        let target = self.read_node(reader, graph)?;
        reader.end_object()?;

        // Incident lists are rebuilt by the node records, which list every edge in order.
        graph.set_endpoints_unlinked(edge, source, target);
        Ok(Some(edge))
    }

    /// Reads `(attribute, value)` pairs up to and including the null sentinel.
    fn read_attributes<R: GraphReader + ?Sized>(&mut self, reader: &mut R) -> Result<Attributes> {
        let mut attributes = Attributes::default();
        while reader.has_next_field()? {
            if reader.is_field_null()? {
                reader.skip()?;
                break;
            }
            let attribute = self.read_attribute_key(reader)?;
            let value = reader.read_object()?;
            attributes.set(attribute, Some(value));
        }
        Ok(attributes)
    }

    fn read_attribute_key<R: GraphReader + ?Sized>(&mut self, reader: &mut R) -> Result<Attribute> {
        if reader.is_field_numeric()? {
            let ordinal = reader.read_number()?;
            u32::try_from(ordinal)
                .ok()
                .and_then(|o| self.registry.by_ordinal(o))
                .ok_or(Error::UnknownAttributeOrdinal { ordinal })
        } else {
            let name = reader.read_string()?;
            self.registry.try_attribute(&name)
        }
    }

    /// Replays the edges in record order, which is the depth-first order the writer walked the
    /// tree in. Creation order is not used: an edge may have been re-pointed long after it was
    /// created.
    fn reconcile_cyclic(&mut self, graph: &mut Graph) {
        let order = std::mem::take(&mut self.read_edges);
        graph.replay_cyclic(&order);
    }
}

fn field_offset(field: u32, offset: usize) -> u32 {
    field.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX))
}
