use crate::{EdgeId, NodeId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("token stream JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of token stream")]
    UnexpectedEnd,

    #[error("back-reference to unknown element id {id}")]
    UnknownReference { id: i64 },

    #[error("back-reference {id} does not resolve to a {expected}")]
    ReferenceKind { id: i64, expected: &'static str },

    #[error("unknown attribute ordinal: {ordinal}")]
    UnknownAttributeOrdinal { ordinal: i64 },

    #[error("no attribute ordinal left to register {name:?}")]
    AttributeLimit { name: String },

    #[error("unknown node: {id}")]
    UnknownNode { id: NodeId },

    #[error("unknown edge: {id}")]
    UnknownEdge { id: EdgeId },
}
