//! Stage 2: convert imported YAML files to JSON mirrors.
//!
//! Every data path with both an input and a converted location is
//! processed: file paths convert one file, directory paths walk the
//! imported tree and convert every `.yml`/`.yaml` file to a JSON file at
//! the mirrored relative path. Custom-tag handling follows the data
//! path's [`protosync_data::TagPolicy`]. An empty document produces a
//! warning and no output file. The converted tree is wiped and recreated
//! on each run.

use crate::error::PipelineError;
use crate::preset::{self, DataPath, DataPathKind};
use crate::stage;
use crate::workspace::{Workspace, reset_dir};
use protosync_data::yaml_file_to_records;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// What a convert run produced.
#[derive(Debug, Default)]
pub struct ConvertSummary {
    pub data_paths: usize,
    pub files_converted: usize,
    pub records_found: usize,
}

/// Convert every imported YAML file into the converted tree.
pub fn run(ws: &Workspace) -> Result<ConvertSummary, PipelineError> {
    reset_dir(&ws.converted_root())?;

    let mut summary = ConvertSummary::default();
    for data_path in preset::data_paths() {
        let (Some(input_rel), Some(converted_rel)) =
            (data_path.input_path, data_path.converted_path)
        else {
            continue;
        };

        let input_abs = ws.input_root().join(input_rel);
        if !input_abs.exists() {
            return Err(PipelineError::MissingInput {
                alias: data_path.alias,
                path: input_abs,
            });
        }

        let converted_abs = ws.converted_root().join(converted_rel);
        let mut records_found = 0;
        let mut files_converted = 0;

        match data_path.kind {
            DataPathKind::File => {
                if let Some(records) = convert_file(&input_abs, data_path)? {
                    records_found += records.len();
                    stage::write_json(&converted_abs, &records)?;
                }
                files_converted += 1;
            }
            DataPathKind::Dir => {
                // The converted tree exists even when every file inside
                // turns out empty, so later stages can read it.
                std::fs::create_dir_all(&converted_abs)?;

                for entry in WalkDir::new(&input_abs).sort_by_file_name() {
                    let entry = entry.map_err(|source| PipelineError::Walk {
                        dir: input_abs.clone(),
                        source,
                    })?;
                    if !entry.file_type().is_file() || !is_yaml_file(entry.path()) {
                        continue;
                    }

                    if let Some(records) = convert_file(entry.path(), data_path)? {
                        records_found += records.len();

                        let rel = entry
                            .path()
                            .strip_prefix(&input_abs)
                            .unwrap_or_else(|_| entry.path());
                        let dest = converted_abs.join(rel).with_extension("json");
                        stage::write_json(&dest, &records)?;
                    }
                    files_converted += 1;
                }
            }
        }

        if records_found == 0 {
            warn!(alias = data_path.alias, "no entries found");
        } else {
            info!(
                alias = data_path.alias,
                files = files_converted,
                entries = records_found,
                "converted"
            );
        }

        summary.data_paths += 1;
        summary.files_converted += files_converted;
        summary.records_found += records_found;
    }

    Ok(summary)
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn convert_file(
    path: &Path,
    data_path: &DataPath,
) -> Result<Option<Vec<Value>>, PipelineError> {
    let source = std::fs::read_to_string(path)?;
    let records = yaml_file_to_records(&source, data_path.tag_policy).map_err(|source| {
        PipelineError::Convert {
            file: path.to_path_buf(),
            source,
        }
    })?;

    if records.is_none() {
        warn!(file = %path.display(), "empty document, nothing to convert");
    }

    Ok(records)
}

// ===========================================================================
// Tests
// ===========================================================================
