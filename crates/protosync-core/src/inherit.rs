//! Recursive multi-parent inheritance resolution.
//!
//! A record names its parents in a caller-chosen field, either as one id
//! string or an ordered list of id strings. [`resolve`] walks that chain
//! depth-first: every parent is resolved fully before being folded into
//! an accumulator with [`crate::merge::merge`], left to right, so a
//! later-listed parent wins conflicts over an earlier one. The record's
//! own fields are merged last and always win over anything inherited.
//!
//! Two discard sets remove inheritance bookkeeping: fields that must not
//! leak from ancestors into a concrete descendant (an `abstract` marker,
//! the ancestor's own id), and fields dropped from the finished result
//! (the parent link itself).
//!
//! The chain is re-resolved on every visit -- diamond inheritance is
//! handled by repeated resolution and merge order, not memoization. A
//! chain that revisits an id already on the current path is rejected as
//! cyclic instead of recursing forever; acyclic input resolves exactly as
//! if the guard were absent.

use crate::merge::{MergeError, merge, value_kind};
use crate::pool::Pool;
use serde_json::{Map, Value};
use tracing::debug;

/// Errors raised by [`resolve`].
#[derive(Debug, thiserror::Error)]
pub enum InheritError {
    /// The parent field held something other than a string or an array
    /// of strings.
    #[error("invalid parent reference: expected a string or an array of strings, got {found}")]
    InvalidParentReference { found: &'static str },

    /// A record declares parents but has no usable id of its own.
    #[error("record with a parent reference has no id in field '{id_field}'")]
    MissingRecordId { id_field: String },

    /// A named parent does not exist in the pool.
    #[error("unresolved parent reference: '{parent_id}' (referenced by '{doc_id}') not found in pool")]
    UnresolvedParentReference { parent_id: String, doc_id: String },

    /// The parent chain revisits a record already on the current path.
    #[error("cyclic inheritance chain: {}", .path.join(" -> "))]
    CyclicInheritance { path: Vec<String> },

    /// A merge along the chain failed.
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Controls which bookkeeping fields are dropped after merging.
///
/// Both sets apply at the depth they were requested; ancestors further up
/// the chain resolve with defaults, and their bookkeeping is stripped
/// here once the whole ancestry has been folded together.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Removed from the merged ancestors before the record's own fields
    /// are layered on top (e.g. `abstract`, or the ancestor's `id`).
    pub discard_inherited_fields: Vec<String>,
    /// Removed from the final resolved record (e.g. the parent link
    /// itself, once resolution has consumed it).
    pub discard_result_fields: Vec<String>,
}

impl ResolveOptions {
    /// Build options from field-name slices.
    pub fn new(discard_inherited: &[&str], discard_result: &[&str]) -> Self {
        Self {
            discard_inherited_fields: discard_inherited.iter().map(|s| s.to_string()).collect(),
            discard_result_fields: discard_result.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Produce the fully-resolved form of `doc` by folding in all ancestors
/// found in `pool`.
///
/// `parent_field` names the field holding the parent id(s); the id field
/// is the one `pool` indexes by. A record without the parent field is
/// returned unchanged (deep copy). Inputs are never mutated.
pub fn resolve(
    doc: &Value,
    pool: &Pool,
    parent_field: &str,
    opts: &ResolveOptions,
) -> Result<Value, InheritError> {
    let mut path = Vec::new();
    resolve_inner(doc, pool, parent_field, opts, &mut path)
}

fn resolve_inner(
    doc: &Value,
    pool: &Pool,
    parent_field: &str,
    opts: &ResolveOptions,
    path: &mut Vec<String>,
) -> Result<Value, InheritError> {
    // Base case: nothing to inherit.
    let Some(parent_value) = doc.get(parent_field) else {
        return Ok(doc.clone());
    };

    let parent_ids = normalize_parents(parent_value)?;

    let doc_id = doc
        .get(pool.id_field())
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| InheritError::MissingRecordId {
            id_field: pool.id_field().to_string(),
        })?;

    let depth = path.len();
    if depth == 0 {
        debug!(id = doc_id, "resolving inheritance chain");
    } else {
        debug!("|{}- {doc_id}", " ".repeat(depth * 4));
    }

    path.push(doc_id.to_string());

    let mut accumulator = Value::Object(Map::new());
    let ancestor_opts = ResolveOptions::default();
    for parent_id in &parent_ids {
        if path.iter().any(|visited| visited == parent_id) {
            let mut cycle = path.clone();
            cycle.push(parent_id.clone());
            return Err(InheritError::CyclicInheritance { path: cycle });
        }

        let parent =
            pool.get(parent_id)
                .ok_or_else(|| InheritError::UnresolvedParentReference {
                    parent_id: parent_id.clone(),
                    doc_id: doc_id.to_string(),
                })?;

        let resolved = resolve_inner(parent, pool, parent_field, &ancestor_opts, path)?;

        // Later parents win conflicts over earlier ones.
        accumulator = merge(&accumulator, &resolved)?;
    }

    path.pop();

    if let Value::Object(map) = &mut accumulator {
        for field in &opts.discard_inherited_fields {
            map.shift_remove(field);
        }
    }

    // The record's own fields always win over anything inherited.
    let mut result = merge(&accumulator, doc)?;

    if let Value::Object(map) = &mut result {
        for field in &opts.discard_result_fields {
            map.shift_remove(field);
        }
    }

    Ok(result)
}

fn normalize_parents(value: &Value) -> Result<Vec<String>, InheritError> {
    match value {
        Value::String(id) => Ok(vec![id.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(InheritError::InvalidParentReference {
                        found: value_kind(item),
                    })
            })
            .collect(),
        other => Err(InheritError::InvalidParentReference {
            found: value_kind(other),
        }),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pool(records: Vec<Value>) -> Pool {
        Pool::new(records, "id").unwrap()
    }

    fn no_discards() -> ResolveOptions {
        ResolveOptions::default()
    }

    // -----------------------------------------------------------------------
    // Base case
    // -----------------------------------------------------------------------

    #[test]
    fn record_without_parent_returned_unchanged() {
        let doc = json!({"id": "x", "name": "Foo"});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards()).unwrap();
        assert_eq!(result, doc);
    }

    #[test]
    fn record_without_parent_needs_no_id() {
        let doc = json!({"name": "anonymous"});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards()).unwrap();
        assert_eq!(result, doc);
    }

    #[test]
    fn base_case_skips_discard_sets() {
        // Parentless records pass through untouched, discard lists and all.
        let doc = json!({"id": "x", "abstract": true});
        let opts = ResolveOptions::new(&["abstract"], &["abstract"]);
        let result = resolve(&doc, &pool(vec![]), "parent", &opts).unwrap();
        assert_eq!(result, doc);
    }

    // -----------------------------------------------------------------------
    // Single-parent chains
    // -----------------------------------------------------------------------

    #[test]
    fn single_parent_override() {
        let parents = pool(vec![json!({"id": "P", "cost": 10, "tag": "base"})]);
        let doc = json!({"id": "C", "parent": "P", "cost": 20});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["id"], json!("C"));
        assert_eq!(result["tag"], json!("base"));
        assert_eq!(result["cost"], json!(20));
    }

    #[test]
    fn own_id_survives_parent_id() {
        let parents = pool(vec![json!({"id": "P", "v": 1})]);
        let doc = json!({"id": "C", "parent": "P"});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["id"], json!("C"));
        assert_eq!(result["v"], json!(1));
    }

    #[test]
    fn multi_level_chain_carries_root_fields() {
        let parents = pool(vec![
            json!({"id": "A", "root": true}),
            json!({"id": "B", "parent": "A", "mid": 1}),
        ]);
        let doc = json!({"id": "C", "parent": "B"});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["root"], json!(true));
        assert_eq!(result["mid"], json!(1));
        assert_eq!(result["id"], json!("C"));
    }

    #[test]
    fn arrays_accumulate_along_the_chain() {
        let parents = pool(vec![
            json!({"id": "A", "tags": ["a"]}),
            json!({"id": "B", "parent": "A", "tags": ["b"]}),
        ]);
        let doc = json!({"id": "C", "parent": "B", "tags": ["c"]});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["tags"], json!(["a", "b", "c"]));
    }

    #[test]
    fn nested_records_merge_along_the_chain() {
        let parents = pool(vec![json!({"id": "P", "sprite": {"path": "base.png", "layer": 0}})]);
        let doc = json!({"id": "C", "parent": "P", "sprite": {"layer": 2}});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["sprite"], json!({"path": "base.png", "layer": 2}));
    }

    // -----------------------------------------------------------------------
    // Multiple parents
    // -----------------------------------------------------------------------

    #[test]
    fn later_parent_wins_conflicts() {
        let parents = pool(vec![json!({"id": "P1", "v": 1}), json!({"id": "P2", "v": 2})]);
        let doc = json!({"id": "C", "parent": ["P1", "P2"]});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["v"], json!(2));
    }

    #[test]
    fn unique_fields_of_every_parent_survive() {
        let parents = pool(vec![
            json!({"id": "P1", "a": 1}),
            json!({"id": "P2", "b": 2}),
        ]);
        let doc = json!({"id": "C", "parent": ["P1", "P2"]});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["a"], json!(1));
        assert_eq!(result["b"], json!(2));
    }

    #[test]
    fn empty_parent_list_resolves_to_self() {
        let doc = json!({"id": "C", "parent": [], "v": 1});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards()).unwrap();
        assert_eq!(result["v"], json!(1));
    }

    #[test]
    fn diamond_inheritance_resolves() {
        // A is reachable through both B1 and B2; resolved twice, merged
        // left to right, no cycle error.
        let parents = pool(vec![
            json!({"id": "A", "root": 1, "tags": ["a"]}),
            json!({"id": "B1", "parent": "A", "left": true}),
            json!({"id": "B2", "parent": "A", "right": true}),
        ]);
        let doc = json!({"id": "C", "parent": ["B1", "B2"]});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["root"], json!(1));
        assert_eq!(result["left"], json!(true));
        assert_eq!(result["right"], json!(true));
        // The shared ancestor's array arrives once per path.
        assert_eq!(result["tags"], json!(["a", "a"]));
    }

    // -----------------------------------------------------------------------
    // Discard sets
    // -----------------------------------------------------------------------

    #[test]
    fn inherited_only_fields_do_not_leak() {
        let parents = pool(vec![json!({"id": "P", "abstract": true, "v": 1})]);
        let doc = json!({"id": "C", "parent": "P"});
        let opts = ResolveOptions::new(&["abstract", "id"], &[]);

        let result = resolve(&doc, &parents, "parent", &opts).unwrap();
        assert!(result.get("abstract").is_none());
        assert_eq!(result["v"], json!(1));
        // Own id is layered after the discard and survives.
        assert_eq!(result["id"], json!("C"));
    }

    #[test]
    fn own_fields_survive_inherited_discard() {
        // Discarding `abstract` from ancestors must not touch the record's
        // own `abstract` marker.
        let parents = pool(vec![json!({"id": "P", "abstract": true})]);
        let doc = json!({"id": "C", "parent": "P", "abstract": true});
        let opts = ResolveOptions::new(&["abstract"], &[]);

        let result = resolve(&doc, &parents, "parent", &opts).unwrap();
        assert_eq!(result["abstract"], json!(true));
    }

    #[test]
    fn result_fields_are_dropped_after_merge() {
        let parents = pool(vec![json!({"id": "P", "v": 1})]);
        let doc = json!({"id": "C", "parent": "P"});
        let opts = ResolveOptions::new(&[], &["parent"]);

        let result = resolve(&doc, &parents, "parent", &opts).unwrap();
        assert!(result.get("parent").is_none());
        assert_eq!(result["v"], json!(1));
    }

    #[test]
    fn discards_apply_only_at_requested_depth() {
        // The mid-level record's own `abstract` marker flows into the
        // accumulator (ancestors resolve with defaults) and is stripped
        // here, at the depth that asked for it.
        let parents = pool(vec![
            json!({"id": "A", "abstract": true}),
            json!({"id": "B", "parent": "A", "abstract": true, "v": 1}),
        ]);
        let doc = json!({"id": "C", "parent": "B"});
        let opts = ResolveOptions::new(&["abstract"], &["parent"]);

        let result = resolve(&doc, &parents, "parent", &opts).unwrap();
        assert!(result.get("abstract").is_none());
        assert!(result.get("parent").is_none());
        assert_eq!(result["v"], json!(1));
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn missing_parent_is_fatal() {
        let doc = json!({"id": "C", "parent": "ghost"});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::UnresolvedParentReference { ref parent_id, ref doc_id })
                if parent_id == "ghost" && doc_id == "C"
        ));
    }

    #[test]
    fn missing_parent_deep_in_chain_is_fatal() {
        let parents = pool(vec![json!({"id": "B", "parent": "ghost"})]);
        let doc = json!({"id": "C", "parent": "B"});
        let result = resolve(&doc, &parents, "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::UnresolvedParentReference { ref doc_id, .. }) if doc_id == "B"
        ));
    }

    #[test]
    fn missing_id_is_fatal() {
        let parents = pool(vec![json!({"id": "P"})]);
        let doc = json!({"parent": "P"});
        let result = resolve(&doc, &parents, "parent", &no_discards());
        assert!(matches!(result, Err(InheritError::MissingRecordId { .. })));
    }

    #[test]
    fn empty_id_is_fatal() {
        let parents = pool(vec![json!({"id": "P"})]);
        let doc = json!({"id": "", "parent": "P"});
        let result = resolve(&doc, &parents, "parent", &no_discards());
        assert!(matches!(result, Err(InheritError::MissingRecordId { .. })));
    }

    #[test]
    fn null_parent_field_is_fatal() {
        let doc = json!({"id": "C", "parent": null});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::InvalidParentReference { found: "null" })
        ));
    }

    #[test]
    fn numeric_parent_field_is_fatal() {
        let doc = json!({"id": "C", "parent": 5});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::InvalidParentReference { found: "number" })
        ));
    }

    #[test]
    fn mixed_parent_array_is_fatal() {
        let doc = json!({"id": "C", "parent": ["P", 5]});
        let result = resolve(&doc, &pool(vec![]), "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::InvalidParentReference { found: "number" })
        ));
    }

    #[test]
    fn self_parent_is_cyclic() {
        let records = vec![json!({"id": "C", "parent": "C"})];
        let parents = pool(records.clone());
        let result = resolve(&records[0], &parents, "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::CyclicInheritance { ref path }) if path == &["C", "C"]
        ));
    }

    #[test]
    fn two_step_cycle_is_fatal() {
        let records = vec![
            json!({"id": "A", "parent": "B"}),
            json!({"id": "B", "parent": "A"}),
        ];
        let parents = pool(records.clone());
        let result = resolve(&records[0], &parents, "parent", &no_discards());
        assert!(matches!(
            result,
            Err(InheritError::CyclicInheritance { ref path }) if path == &["A", "B", "A"]
        ));
    }

    #[test]
    fn cycle_error_message_shows_chain() {
        let records = vec![json!({"id": "loop", "parent": "loop"})];
        let parents = pool(records.clone());
        let err = resolve(&records[0], &parents, "parent", &no_discards()).unwrap_err();
        assert!(format!("{err}").contains("loop -> loop"));
    }

    // -----------------------------------------------------------------------
    // Inputs stay untouched
    // -----------------------------------------------------------------------

    #[test]
    fn inputs_are_never_mutated() {
        let records = vec![json!({"id": "P", "tags": ["a"]})];
        let parents = pool(records);
        let doc = json!({"id": "C", "parent": "P", "tags": ["b"]});

        let result = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(result["tags"], json!(["a", "b"]));
        assert_eq!(doc["tags"], json!(["b"]));
        assert_eq!(parents.get("P").unwrap()["tags"], json!(["a"]));
    }

    #[test]
    fn repeated_resolution_is_deterministic() {
        let parents = pool(vec![
            json!({"id": "A", "v": 1, "tags": ["a"]}),
            json!({"id": "B", "parent": "A", "v": 2}),
        ]);
        let doc = json!({"id": "C", "parent": "B"});

        let first = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        let second = resolve(&doc, &parents, "parent", &no_discards()).unwrap();
        assert_eq!(first, second);
    }
}
