//! Id-indexed record pools.
//!
//! A [`Pool`] holds every candidate parent record for one resolution
//! domain (entities, reagents, recipes, ...), indexed by the value of a
//! caller-chosen id field. Frozen after construction and safe to share
//! across threads.

use serde_json::Value;
use std::collections::HashMap;

/// Errors raised while building a [`Pool`].
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Two records carry the same value in the id field.
    #[error("duplicate record id '{id}' in field '{id_field}'")]
    DuplicateId { id: String, id_field: String },
}

/// An immutable collection of prototype records indexed by id.
///
/// Records lacking a string value in the id field are admitted -- they
/// can still be resolved as targets -- but are not indexed and can never
/// be found as parents.
#[derive(Debug)]
pub struct Pool {
    records: Vec<Value>,
    by_id: HashMap<String, usize>,
    id_field: String,
}

impl Pool {
    /// Build a pool over `records`, indexing by `id_field`.
    ///
    /// A duplicate id is a fatal [`PoolError::DuplicateId`]; the pool
    /// invariant is at most one record per id.
    pub fn new(records: Vec<Value>, id_field: &str) -> Result<Self, PoolError> {
        let mut by_id = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let Some(id) = record.get(id_field).and_then(Value::as_str) else {
                continue;
            };
            if by_id.insert(id.to_string(), index).is_some() {
                return Err(PoolError::DuplicateId {
                    id: id.to_string(),
                    id_field: id_field.to_string(),
                });
            }
        }

        Ok(Self {
            records,
            by_id,
            id_field: id_field.to_string(),
        })
    }

    /// Look up a record by its id-field value.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.by_id.get(id).map(|&index| &self.records[index])
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// The name of the field this pool indexes by.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// All records, indexed and unindexed, in insertion order.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Number of records in the pool (including unindexed ones).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_by_id() {
        let pool = Pool::new(
            vec![json!({"id": "a", "v": 1}), json!({"id": "b", "v": 2})],
            "id",
        )
        .unwrap();

        assert_eq!(pool.get("a").unwrap()["v"], json!(1));
        assert_eq!(pool.get("b").unwrap()["v"], json!(2));
        assert!(pool.get("c").is_none());
        assert!(pool.contains("a"));
        assert!(!pool.contains("c"));
    }

    #[test]
    fn custom_id_field() {
        let pool = Pool::new(vec![json!({"name": "widget"})], "name").unwrap();
        assert!(pool.contains("widget"));
        assert_eq!(pool.id_field(), "name");
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let result = Pool::new(vec![json!({"id": "a"}), json!({"id": "a"})], "id");
        assert!(matches!(
            result,
            Err(PoolError::DuplicateId { ref id, .. }) if id == "a"
        ));
    }

    #[test]
    fn records_without_id_are_kept_but_unindexed() {
        let pool = Pool::new(
            vec![json!({"id": "a"}), json!({"v": 1}), json!({"id": 5})],
            "id",
        )
        .unwrap();

        // All three records survive, only the string id is indexed.
        assert_eq!(pool.len(), 3);
        assert!(pool.contains("a"));
        assert!(!pool.contains("5"));
    }

    #[test]
    fn empty_pool() {
        let pool = Pool::new(vec![], "id").unwrap();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
        assert!(pool.get("anything").is_none());
    }

    #[test]
    fn duplicate_error_names_field_and_id() {
        let err = Pool::new(vec![json!({"id": "x"}), json!({"id": "x"})], "id").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("'x'"), "got: {msg}");
        assert!(msg.contains("'id'"), "got: {msg}");
    }
}
