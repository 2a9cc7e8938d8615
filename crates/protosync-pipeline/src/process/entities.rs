//! Entity prototype processing.
//!
//! Gathers every entity group into one resolution pool (groups marked
//! inheritance-only contribute parents but never output), resolves the
//! parent chains, drops abstract survivors, and contributes the entity
//! half of the item name maps.

use super::{NameContribution, has_parent_link, is_abstract};
use crate::error::PipelineError;
use crate::stage;
use crate::workspace::Workspace;
use protosync_core::{Pool, ResolveOptions, resolve};
use protosync_data::schema::prototype_type;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

/// Every entity group alias, with whether it exists only to be
/// inherited from.
const ENTITY_GROUPS: &[(&str, bool)] = &[
    ("entities.objects", false),
    ("entities.clothing", false),
    ("entities.structures", false),
    ("entities.tiles", false),
    ("entities.mobs", false),
    ("entities.body.organs", false),
    ("entities.body.parts", false),
    ("entities.debugging", false),
    ("entities.catalog-fills", false),
    // inheritance-only groups: pool members, never published
    ("entities.foldable", true),
    ("entities.store-presets", true),
    ("entities.inventory-templates", true),
    ("entities.markers", true),
];

pub fn process(ws: &Workspace) -> Result<NameContribution, PipelineError> {
    let mut all = Vec::new();
    let mut concrete = Vec::new();
    let mut group_by_id: HashMap<String, &'static str> = HashMap::new();

    for &(alias, inheritance_only) in ENTITY_GROUPS {
        let data_path = stage::data_path(alias)?;
        let files = stage::converted_files(ws, data_path)?;
        let entities = stage::filter_prototypes(&files, prototype_type::ENTITY);

        stage::write_output(ws, data_path, &entities)?;

        for entity in &entities {
            if let Some(id) = entity.get("id").and_then(Value::as_str) {
                group_by_id.insert(id.to_string(), alias);
            }
        }

        if !inheritance_only {
            concrete.extend(entities.iter().cloned());
        }
        all.extend(entities);
    }

    info!(total = all.len(), concrete = concrete.len(), "gathered entities");
    stage::write_output(ws, stage::data_path("entities.all-raw")?, &all)?;

    // Resolution draws parents from the full list, inheritance-only
    // groups included.
    let pool = Pool::new(all, "id")?;
    let opts = ResolveOptions::new(&["abstract", "id"], &["parent"]);

    let resolved = concrete
        .par_iter()
        .map(|entity| {
            if has_parent_link(entity) {
                resolve(entity, &pool, "parent", &opts)
            } else {
                Ok(entity.clone())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut kept = Vec::with_capacity(resolved.len());
    let mut names_by_id = serde_json::Map::new();
    for entity in resolved {
        if is_abstract(&entity) {
            continue;
        }

        let id = entity
            .get("id")
            .and_then(Value::as_str)
            .ok_or(PipelineError::RecordWithoutId)?
            .to_string();

        match entity.get("name").and_then(Value::as_str) {
            Some(name) => {
                names_by_id.insert(id, Value::String(name.to_string()));
            }
            None => {
                let group = group_by_id.get(&id).copied().unwrap_or("unknown group");
                warn!(id = %id, group, "skipping entity without a name");
            }
        }

        kept.push(entity);
    }

    info!(entities = kept.len(), named = names_by_id.len(), "processed entities");
    stage::write_output(ws, stage::data_path("entities.processed")?, &kept)?;

    Ok(NameContribution { names_by_id })
}
