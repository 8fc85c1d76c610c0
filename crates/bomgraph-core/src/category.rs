//! Process classification.
//!
//! A process is either a main process or a sub-process. The set is closed:
//! the relational store enforces it with a CHECK constraint and the sync
//! layer re-validates before writing labels, so an unknown value can never
//! reach the graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CategoryParseError;

/// Classification of a process, mirrored as a node sublabel in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessCategory {
    MainProcess,
    SubProcess,
}

impl ProcessCategory {
    /// All valid categories.
    pub const ALL: [ProcessCategory; 2] = [ProcessCategory::MainProcess, ProcessCategory::SubProcess];

    /// Canonical string form, identical to the relational column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessCategory::MainProcess => "MainProcess",
            ProcessCategory::SubProcess => "SubProcess",
        }
    }

    /// Graph sublabel carried by a process node of this category.
    pub fn sublabel(&self) -> &'static str {
        self.as_str()
    }

    /// The mutually exclusive sublabel that must be removed when this one
    /// is set.
    pub fn other_sublabel(&self) -> &'static str {
        match self {
            ProcessCategory::MainProcess => ProcessCategory::SubProcess.sublabel(),
            ProcessCategory::SubProcess => ProcessCategory::MainProcess.sublabel(),
        }
    }
}

impl fmt::Display for ProcessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MainProcess" => Ok(ProcessCategory::MainProcess),
            "SubProcess" => Ok(ProcessCategory::SubProcess),
            other => Err(CategoryParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_categories() {
        assert_eq!("MainProcess".parse::<ProcessCategory>().unwrap(), ProcessCategory::MainProcess);
        assert_eq!("SubProcess".parse::<ProcessCategory>().unwrap(), ProcessCategory::SubProcess);
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let err = "Prozess".parse::<ProcessCategory>().unwrap_err();
        assert_eq!(err, CategoryParseError("Prozess".to_string()));
        assert!(err.to_string().contains("Prozess"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("mainprocess".parse::<ProcessCategory>().is_err());
        assert!("".parse::<ProcessCategory>().is_err());
    }

    #[test]
    fn test_sublabels_are_mutually_exclusive() {
        for category in ProcessCategory::ALL {
            assert_ne!(category.sublabel(), category.other_sublabel());
        }
        assert_eq!(
            ProcessCategory::MainProcess.other_sublabel(),
            ProcessCategory::SubProcess.sublabel()
        );
    }

    #[test]
    fn test_round_trip_through_string_form() {
        for category in ProcessCategory::ALL {
            assert_eq!(category.as_str().parse::<ProcessCategory>().unwrap(), category);
        }
    }
}
