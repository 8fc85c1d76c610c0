//! Graph-layer error types.

use bomgraph_core::CategoryParseError;
use thiserror::Error;

/// Error type for graph projection operations.
///
/// `Connectivity`, `Query` and `Relational` abort the current batch and
/// leave the projection lagging until the next sync. `MissingEndpoint` and
/// `InvalidCategory` are per-row conditions reported inside a
/// [`crate::SyncReport`] without stopping the rest of the batch.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("graph store unreachable: {0}")]
    Connectivity(#[source] neo4rs::Error),

    #[error("graph query failed: {0}")]
    Query(#[source] neo4rs::Error),

    #[error("graph row decode failed: {0}")]
    Decode(String),

    #[error("missing endpoint for {0}")]
    MissingEndpoint(String),

    #[error(transparent)]
    InvalidCategory(#[from] CategoryParseError),

    #[error("relational read failed: {0}")]
    Relational(#[from] bomgraph_db::DbError),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
