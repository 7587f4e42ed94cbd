use sirenia_graph::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("geometry did not settle after {iterations} flushes ({pending} listeners pending)")]
    ConvergenceExceeded { iterations: usize, pending: usize },

    #[error("node {node} still overlaps another node after {attempts} nudges")]
    CollisionUnresolved { node: NodeId, attempts: usize },

    #[error("options JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] sirenia_graph::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
