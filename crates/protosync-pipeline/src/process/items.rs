//! Combined item name maps.
//!
//! Entities and reagents each contribute id-to-name pairs; this step
//! merges them into one names-by-id table and the reverse
//! ids-by-lowercase-name table the wiki search uses. A key contributed
//! twice across groups is a fatal error; a case-folded name collision in
//! the reverse map keeps the first mapping.

use super::NameContribution;
use crate::error::PipelineError;
use crate::stage;
use crate::workspace::Workspace;
use serde_json::Value;
use tracing::{debug, info};

pub fn write_name_maps(
    ws: &Workspace,
    contributions: &[NameContribution],
) -> Result<(), PipelineError> {
    let mut names_by_id = serde_json::Map::new();
    for contribution in contributions {
        for (id, name) in &contribution.names_by_id {
            if names_by_id.contains_key(id) {
                return Err(PipelineError::DuplicateItemKey { key: id.clone() });
            }
            names_by_id.insert(id.clone(), name.clone());
        }
    }

    stage::write_output(
        ws,
        stage::data_path("items.names-by-ids")?,
        &Value::Object(names_by_id.clone()),
    )?;

    let mut ids_by_name = serde_json::Map::new();
    for (id, name) in &names_by_id {
        let Some(name) = name.as_str() else {
            continue;
        };
        let lowercase = name.to_lowercase();
        if let Some(existing) = ids_by_name.get(&lowercase) {
            debug!(
                name = %lowercase,
                id = %id,
                existing = %existing,
                "name already mapped, keeping first"
            );
            continue;
        }
        ids_by_name.insert(lowercase, Value::String(id.clone()));
    }

    info!(
        names = names_by_id.len(),
        lowercase_names = ids_by_name.len(),
        "wrote item name maps"
    );
    stage::write_output(
        ws,
        stage::data_path("items.ids-by-lowercase-names")?,
        &Value::Object(ids_by_name),
    )?;

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
