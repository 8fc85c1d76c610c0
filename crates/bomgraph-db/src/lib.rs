//! bomgraph relational layer.
//!
//! SQLite-backed system of record for processes, parts, structural links and
//! composition rows. The graph projection is derived from the tables here;
//! nothing in this crate talks to the graph store.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{DbError, DbPool, DbResult};
