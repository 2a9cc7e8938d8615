//! Shared helpers for stages that read converted records and write
//! output tables.

use crate::error::PipelineError;
use crate::preset::{DataPath, DataPathKind};
use crate::workspace::Workspace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One converted JSON file: where it came from and the records it holds.
pub(crate) struct ConvertedFile {
    pub path: PathBuf,
    pub records: Vec<Value>,
}

/// Look up a data path by alias; stages only ever pass compiled-in
/// aliases, so a miss is a programming error surfaced as a fatal one.
pub(crate) fn data_path(alias: &str) -> Result<&'static DataPath, PipelineError> {
    crate::preset::data_path(alias).ok_or_else(|| PipelineError::UnknownDataPath {
        alias: alias.to_string(),
    })
}

/// Read every converted JSON file of a data path. Each file must hold a
/// list of records.
pub(crate) fn converted_files(
    ws: &Workspace,
    data_path: &DataPath,
) -> Result<Vec<ConvertedFile>, PipelineError> {
    let rel = data_path
        .converted_path
        .ok_or(PipelineError::MissingDataPathField {
            alias: data_path.alias,
            field: "converted_path",
        })?;
    let root = ws.converted_root().join(rel);

    if !root.exists() {
        return Err(PipelineError::MissingConverted {
            alias: data_path.alias,
            path: root,
        });
    }

    let mut paths = Vec::new();
    match data_path.kind {
        DataPathKind::File => paths.push(root),
        DataPathKind::Dir => {
            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = entry.map_err(|source| PipelineError::Walk {
                    dir: root.clone(),
                    source,
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some("json")
                {
                    paths.push(entry.path().to_path_buf());
                }
            }
        }
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&content).map_err(|source| PipelineError::Json {
            file: path.clone(),
            source,
        })?;
        let Value::Array(records) = value else {
            return Err(PipelineError::ConvertedNotAList { file: path });
        };
        files.push(ConvertedFile { path, records });
    }

    Ok(files)
}

/// Flatten the records of the given files, keeping only those whose
/// `type` field names the wanted prototype kind.
pub(crate) fn filter_prototypes(files: &[ConvertedFile], type_name: &str) -> Vec<Value> {
    files
        .iter()
        .flat_map(|file| file.records.iter())
        .filter(|record| protosync_data::schema::is_prototype_of(record, type_name))
        .cloned()
        .collect()
}

/// Deserialize every record of every file into `T`, failing with the
/// offending file on a schema mismatch.
pub(crate) fn parse_records<T: DeserializeOwned>(
    files: &[ConvertedFile],
    kind: &'static str,
) -> Result<Vec<T>, PipelineError> {
    let mut parsed = Vec::new();
    for file in files {
        for record in &file.records {
            let typed: T =
                serde_json::from_value(record.clone()).map_err(|e| PipelineError::Schema {
                    file: file.path.clone(),
                    kind,
                    detail: e.to_string(),
                })?;
            parsed.push(typed);
        }
    }
    Ok(parsed)
}

/// Serialize a value as pretty JSON with the 4-space indent the derived
/// tables have always used, and write it to `path`.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| PipelineError::Json {
            file: path.to_path_buf(),
            source,
        })?;
    buffer.push(b'\n');

    std::fs::write(path, buffer)?;
    Ok(())
}

/// Write a data path's output file into the output tree.
pub(crate) fn write_output<T: Serialize>(
    ws: &Workspace,
    data_path: &DataPath,
    value: &T,
) -> Result<PathBuf, PipelineError> {
    let rel = data_path
        .output_file
        .ok_or(PipelineError::MissingDataPathField {
            alias: data_path.alias,
            field: "output_file",
        })?;
    let path = ws.output_root().join(rel);
    write_json(&path, value)?;
    Ok(path)
}

/// Read a JSON value back from a file.
pub(crate) fn read_json(path: &Path) -> Result<Value, PipelineError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| PipelineError::Json {
        file: path.to_path_buf(),
        source,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
