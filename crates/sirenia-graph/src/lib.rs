#![forbid(unsafe_code)]

//! Directed graph model for tree-like diagrams.
//!
//! A [`Graph`] owns its nodes and edges and addresses them by id. Edges that close a cycle (their
//! target is the source or one of its ancestors) are flagged as cyclic and excluded from tree
//! navigation. [`GraphSerializer`] writes and reads graphs, including cyclic ones, over an abstract
//! field stream ([`GraphWriter`]/[`GraphReader`]).

pub mod attribute;
pub mod element;
pub mod error;
pub mod graph;
pub mod serializer;
pub mod stream;

pub use attribute::{AttrValue, Attribute, AttributeRegistry, Attributes};
pub use element::{Edge, EdgeId, ElementId, GraphElement, Node, NodeId};
pub use error::{Error, Result};
pub use graph::{Graph, GraphEvent, GraphListener};
pub use serializer::{GraphSerializer, SerializerOptions};
pub use stream::{GraphReader, GraphWriter, Token, TokenReader, TokenWriter};
