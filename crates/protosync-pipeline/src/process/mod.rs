//! Stage 3: resolve prototype inheritance and derive the output tables.
//!
//! Per-domain derivations live in submodules; this module wires them
//! together, loads the locale table they share, and owns the small
//! helpers every domain uses.

use crate::error::PipelineError;
use crate::stage;
use crate::workspace::{Workspace, reset_dir};
use protosync_data::LocaleTable;
use serde_json::Value;

pub mod entities;
pub mod items;
pub mod reagents;
pub mod recipes;
pub mod research;

/// Run every derivation into a fresh output tree.
pub fn run(ws: &Workspace) -> Result<(), PipelineError> {
    reset_dir(&ws.output_root())?;

    let locale = load_locale(ws)?;

    let entity_names = entities::process(ws)?;
    let reagent_names = reagents::process(ws, &locale)?;
    items::write_name_maps(ws, &[entity_names, reagent_names])?;

    recipes::process(ws)?;
    research::process(ws, &locale)?;

    Ok(())
}

/// Load the locale table from the imported locale tree, preferring the
/// configured locale's subdirectory when the upstream ships several.
fn load_locale(ws: &Workspace) -> Result<LocaleTable, PipelineError> {
    let data_path = stage::data_path("locale")?;
    let input_rel = data_path
        .input_path
        .ok_or(PipelineError::MissingDataPathField {
            alias: data_path.alias,
            field: "input_path",
        })?;

    let base = ws.input_root().join(input_rel);
    let preferred = base.join(&ws.preferred_locale);
    let dir = if preferred.is_dir() { preferred } else { base };

    Ok(LocaleTable::load_dir(&dir)?)
}

/// One item group's contribution to the combined name maps.
#[derive(Debug, Default)]
pub struct NameContribution {
    /// Item id to display name, in discovery order.
    pub names_by_id: serde_json::Map<String, Value>,
}

/// Whether a record's parent field warrants a resolution call, the way
/// the upstream pipeline gates it: absent, `null`, and empty-string
/// links stand alone.
pub(crate) fn has_parent_link(record: &Value) -> bool {
    match record.get("parent") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Whether a resolved record carries a truthy `abstract` marker.
pub(crate) fn is_abstract(record: &Value) -> bool {
    record
        .get("abstract")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parent_link_detection() {
        assert!(!has_parent_link(&json!({})));
        assert!(!has_parent_link(&json!({"parent": null})));
        assert!(!has_parent_link(&json!({"parent": ""})));
        assert!(has_parent_link(&json!({"parent": "Base"})));
        assert!(has_parent_link(&json!({"parent": ["A", "B"]})));
        // Malformed links still trigger resolution, which rejects them.
        assert!(has_parent_link(&json!({"parent": {"odd": true}})));
    }

    #[test]
    fn abstract_marker_detection() {
        assert!(is_abstract(&json!({"abstract": true})));
        assert!(!is_abstract(&json!({"abstract": false})));
        assert!(!is_abstract(&json!({})));
        assert!(!is_abstract(&json!({"abstract": "yes"})));
    }
}
