//! Reagent prototype processing.
//!
//! Reagents resolve their parent chains against their own pool, lose the
//! abstract bases, get their display strings localized, and contribute
//! the reagent half of the item name maps under `Reagent.`-prefixed ids
//! so they can never collide with entity ids.

use super::{NameContribution, is_abstract};
use crate::error::PipelineError;
use crate::stage;
use crate::workspace::Workspace;
use protosync_core::{Pool, ResolveOptions, resolve};
use protosync_data::LocaleTable;
use protosync_data::schema::Reagent;
use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

pub fn process(ws: &Workspace, locale: &LocaleTable) -> Result<NameContribution, PipelineError> {
    let data_path = stage::data_path("reagents")?;
    let files = stage::converted_files(ws, data_path)?;

    // Shape check up front, with the offending file in the error; the
    // records themselves stay raw for resolution.
    let _: Vec<Reagent> = stage::parse_records(&files, "reagent")?;

    let raw: Vec<Value> = files
        .iter()
        .flat_map(|file| file.records.iter().cloned())
        .collect();

    let pool = Pool::new(raw.clone(), "id")?;
    let opts = ResolveOptions::new(&["abstract", "id"], &["parent"]);

    let resolved = raw
        .par_iter()
        .map(|reagent| resolve(reagent, &pool, "parent", &opts))
        .collect::<Result<Vec<_>, _>>()?;

    let mut kept = Vec::new();
    let mut names_by_id = serde_json::Map::new();
    for mut reagent in resolved {
        if is_abstract(&reagent) {
            continue;
        }

        let id = reagent
            .get("id")
            .and_then(Value::as_str)
            .ok_or(PipelineError::RecordWithoutId)?
            .to_string();

        for field in ["name", "desc"] {
            if reagent.get(field).and_then(Value::as_str).is_none() {
                return Err(PipelineError::MissingReagentText { id, field });
            }
            locale.localize_field(&mut reagent, field)?;
        }
        if reagent.get("physicalDesc").and_then(Value::as_str).is_some() {
            locale.localize_field(&mut reagent, "physicalDesc")?;
        }

        if let Some(name) = reagent.get("name").and_then(Value::as_str) {
            // Prefixed to avoid name-map collisions with entity ids.
            names_by_id.insert(format!("Reagent.{id}"), Value::String(name.to_string()));
        }

        kept.push(reagent);
    }

    info!(reagents = kept.len(), "processed reagents");
    stage::write_output(ws, data_path, &kept)?;

    Ok(NameContribution { names_by_id })
}
