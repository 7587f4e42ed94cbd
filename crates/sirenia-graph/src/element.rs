//! Graph elements: ids, nodes and edges.

use crate::attribute::{AttrValue, Attribute, Attributes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique element id, assigned monotonically at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! element_id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(ElementId);

        impl $name {
            pub fn element(self) -> ElementId {
                self.0
            }
        }

        impl From<$name> for ElementId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

element_id_newtype!(NodeId);
element_id_newtype!(EdgeId);

impl NodeId {
    pub(crate) fn fresh() -> Self {
        Self(ElementId::next())
    }

    pub(crate) fn from_element(id: ElementId) -> Self {
        Self(id)
    }
}

impl EdgeId {
    pub(crate) fn fresh() -> Self {
        Self(ElementId::next())
    }

    pub(crate) fn from_element(id: ElementId) -> Self {
        Self(id)
    }
}

/// Common surface of nodes and edges.
pub trait GraphElement {
    fn element_id(&self) -> ElementId;
    fn attributes(&self) -> &Attributes;
    fn attributes_mut(&mut self) -> &mut Attributes;

    fn attribute(&self, attribute: &Attribute) -> Option<&AttrValue> {
        self.attributes().get(attribute)
    }

    fn set_attribute(&mut self, attribute: Attribute, value: impl Into<AttrValue>) {
        self.attributes_mut().set(attribute, Some(value.into()));
    }

    fn remove_attribute(&mut self, attribute: &Attribute) -> Option<AttrValue> {
        self.attributes_mut().set(attribute.clone(), None)
    }
}

/// A node. Holds its incident edges (incoming and outgoing) in insertion order.
///
/// Equality compares attributes only; ids and edges are ignored.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) attributes: Attributes,
    pub(crate) edges: Vec<EdgeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            attributes: Attributes::default(),
            edges: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Incident edges, both directions.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub(crate) fn link(&mut self, edge: EdgeId) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn unlink(&mut self, edge: EdgeId) {
        self.edges.retain(|e| *e != edge);
    }
}

impl GraphElement for Node {
    fn element_id(&self) -> ElementId {
        self.id.element()
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {}:{}", self.id, self.attributes)
    }
}

/// A directed edge. Endpoints are node ids and do not own the nodes.
///
/// `cyclic` is derived from the endpoints and recomputed by the owning [`Graph`](crate::Graph)
/// whenever source or target change.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) attributes: Attributes,
    pub(crate) source: Option<NodeId>,
    pub(crate) target: Option<NodeId>,
    pub(crate) cyclic: bool,
}

impl Edge {
    pub(crate) fn new(id: EdgeId) -> Self {
        Self {
            id,
            attributes: Attributes::default(),
            source: None,
            target: None,
            cyclic: false,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// `true` if the target is the source itself or one of its ancestors.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }
}

impl GraphElement for Edge {
    fn element_id(&self) -> ElementId {
        self.id.element()
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge {}:{}{{", self.id, self.attributes)?;
        match self.source {
            Some(s) => write!(f, "{s}")?,
            None => f.write_str("null")?,
        }
        f.write_str("->")?;
        match self.target {
            Some(t) => write!(f, "{t}")?,
            None => f.write_str("null")?,
        }
        f.write_str("}")
    }
}
