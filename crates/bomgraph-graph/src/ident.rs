//! Graph identity derivation.

/// Graph-side identity for a relational primary key.
///
/// Pure and total: the same relational id always yields the same string,
/// and distinct ids yield distinct strings. Node identity in the graph is
/// the pair of this value and the `dataset` property.
pub fn graph_id(id: i64) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(graph_id(42), graph_id(42));
        assert_eq!(graph_id(42), "42");
    }

    #[test]
    fn test_distinct_ids_stay_distinct() {
        assert_ne!(graph_id(1), graph_id(10));
        assert_ne!(graph_id(-1), graph_id(1));
    }
}
