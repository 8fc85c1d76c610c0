//! # bomgraph graph layer
//!
//! Neo4j projection of the relational manufacturing model.
//!
//! Propagates relational mutations into dataset-scoped nodes and edges,
//! reconciles usage edges against the effective BOM, and can re-derive a
//! whole dataset from relational state.

pub mod client;
pub mod error;
pub mod ident;
pub mod schema;
pub mod sync;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use error::{GraphError, GraphResult};
pub use sync::{RowFailure, SyncDriver, SyncReport};
