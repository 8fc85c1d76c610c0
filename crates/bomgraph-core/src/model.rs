//! Sync-facing row types.
//!
//! These are the minimal shapes the sync engine consumes after a relational
//! mutation: whatever performs the relational write hands the changed rows
//! over in this form. The `category` field stays a raw string here; the sync
//! layer parses it against the closed set and reports bad values per row.

use serde::{Deserialize, Serialize};

/// A process row as read from the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub id: i64,
    pub name: String,
    pub category: String,
}

/// A part row as read from the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub part_type: String,
    #[serde(default)]
    pub manufacturer: String,
}

/// A structural decomposition link between a main process and one of its
/// sub-processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralLinkRow {
    pub parent_id: i64,
    pub child_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// One effective-BOM line of a process. Identity within a process is
/// `(part_id, role)`; the empty role is a distinct slot, not a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomRow {
    pub part_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub role: String,
}

/// A composition row including its owning process, as delivered in a
/// mutation batch that may touch several processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRow {
    pub process_id: i64,
    pub part_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub role: String,
}

impl CompositionRow {
    /// Drop the process id, keeping the per-process BOM line.
    pub fn bom_row(&self) -> BomRow {
        BomRow {
            part_id: self.part_id,
            quantity: self.quantity,
            role: self.role.clone(),
        }
    }
}

fn default_quantity() -> i64 {
    1
}

/// Normalize an optional role to its storage form: absent or blank roles
/// collapse to the empty string, which is its own identity slot.
pub fn normalize_role(role: Option<&str>) -> String {
    match role {
        Some(r) if !r.trim().is_empty() => r.trim().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_role_absent() {
        assert_eq!(normalize_role(None), "");
        assert_eq!(normalize_role(Some("")), "");
        assert_eq!(normalize_role(Some("   ")), "");
    }

    #[test]
    fn test_normalize_role_trims() {
        assert_eq!(normalize_role(Some(" main ")), "main");
        assert_eq!(normalize_role(Some("backup")), "backup");
    }

    #[test]
    fn test_bom_row_from_composition() {
        let row = CompositionRow {
            process_id: 7,
            part_id: 42,
            quantity: 3,
            role: "main".to_string(),
        };
        let bom = row.bom_row();
        assert_eq!(bom.part_id, 42);
        assert_eq!(bom.quantity, 3);
        assert_eq!(bom.role, "main");
    }

    #[test]
    fn test_bom_row_defaults_from_json() {
        let bom: BomRow = serde_json::from_str(r#"{"part_id": 5}"#).unwrap();
        assert_eq!(bom.quantity, 1);
        assert_eq!(bom.role, "");
    }
}
