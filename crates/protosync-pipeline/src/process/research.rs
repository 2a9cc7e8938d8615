//! Research tree processing.
//!
//! Disciplines and technologies parse strictly, get their names
//! localized, and are republished twice each: the parsed arrays, and the
//! derived wiki tables (disciplines keyed by id, techs keyed by id and
//! grouped by discipline) with the redundant key fields removed.

use crate::error::PipelineError;
use crate::stage;
use crate::workspace::Workspace;
use protosync_data::LocaleTable;
use protosync_data::schema::{Discipline, Tech};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

pub fn process(ws: &Workspace, locale: &LocaleTable) -> Result<(), PipelineError> {
    process_disciplines(ws, locale)?;
    process_techs(ws, locale)?;
    Ok(())
}

fn process_disciplines(ws: &Workspace, locale: &LocaleTable) -> Result<(), PipelineError> {
    let data_path = stage::data_path("research.disciplines")?;
    let files = stage::converted_files(ws, data_path)?;

    let mut disciplines: Vec<Discipline> = stage::parse_records(&files, "techDiscipline")?;
    for discipline in &mut disciplines {
        discipline.name = locale.lookup(&discipline.name)?.to_string();
    }
    stage::write_output(ws, data_path, &disciplines)?;

    let mut by_id = serde_json::Map::new();
    for discipline in &disciplines {
        let mut value = encode(discipline)?;
        if let Some(map) = value.as_object_mut() {
            map.shift_remove("type");
            map.shift_remove("id");
        }
        by_id.insert(discipline.id.clone(), value);
    }

    info!(disciplines = by_id.len(), "processed research disciplines");
    stage::write_output(
        ws,
        stage::data_path("research.disciplines.processed")?,
        &Value::Object(by_id),
    )?;
    Ok(())
}

fn process_techs(ws: &Workspace, locale: &LocaleTable) -> Result<(), PipelineError> {
    let data_path = stage::data_path("research.techs")?;
    let files = stage::converted_files(ws, data_path)?;

    let mut techs: Vec<Tech> = stage::parse_records(&files, "technology")?;
    for tech in &mut techs {
        tech.name = locale.lookup(&tech.name)?.to_string();
    }
    stage::write_output(ws, data_path, &techs)?;

    let mut by_discipline: BTreeMap<String, serde_json::Map<String, Value>> = BTreeMap::new();
    for tech in &techs {
        let mut value = encode(tech)?;
        if let Some(map) = value.as_object_mut() {
            map.shift_remove("type");
            map.shift_remove("id");
            map.shift_remove("discipline");
        }
        by_discipline
            .entry(tech.discipline.clone())
            .or_default()
            .insert(tech.id.clone(), value);
    }

    info!(
        disciplines = by_discipline.len(),
        techs = techs.len(),
        "processed research techs"
    );
    stage::write_output(
        ws,
        stage::data_path("research.techs.processed")?,
        &by_discipline,
    )?;
    Ok(())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, PipelineError> {
    serde_json::to_value(value).map_err(|e| PipelineError::Encode {
        detail: e.to_string(),
    })
}
