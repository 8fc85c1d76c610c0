//! bomgraph core library
//!
//! Domain types shared by the relational layer, the graph projection
//! and the CLI.

pub mod category;
pub mod error;
pub mod model;

pub use category::ProcessCategory;
pub use error::CategoryParseError;
pub use model::{BomRow, CompositionRow, PartRow, ProcessRow, StructuralLinkRow, normalize_role};
