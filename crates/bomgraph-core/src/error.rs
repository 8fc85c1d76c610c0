//! Centralized error types for the core domain model.

use thiserror::Error;

/// A process category value outside the closed set.
///
/// Carries the offending text so callers can report it per row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized process category '{0}' (expected 'MainProcess' or 'SubProcess')")]
pub struct CategoryParseError(pub String);
