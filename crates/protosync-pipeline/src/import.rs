//! Stage 1: import configured files out of the upstream checkout.
//!
//! Every data path with an upstream location is validated first (the
//! path must exist and match its file/dir kind), then copied into the
//! input tree preserving relative layout. Directory imports skip files
//! matched by the data path's exclude patterns. The input tree is wiped
//! and recreated on each run.

use crate::error::PipelineError;
use crate::preset::{self, DataPath, DataPathKind};
use crate::workspace::{Workspace, reset_dir};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// What an import run copied.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub data_paths: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
}

/// Validate all importable data paths, then copy them into the input
/// tree.
pub fn run(ws: &Workspace) -> Result<ImportSummary, PipelineError> {
    let importable = validate(ws)?;

    reset_dir(&ws.input_root())?;

    let mut summary = ImportSummary::default();
    for (data_path, upstream_abs, input_rel) in importable {
        let dest = ws.input_root().join(input_rel);
        let (files, bytes) = match data_path.kind {
            DataPathKind::File => copy_file(&upstream_abs, &dest)?,
            DataPathKind::Dir => copy_dir(&upstream_abs, &dest, data_path)?,
        };

        info!(
            alias = data_path.alias,
            files,
            kilobytes = bytes / 1024,
            "imported"
        );

        summary.data_paths += 1;
        summary.files_copied += files;
        summary.bytes_copied += bytes;
    }

    Ok(summary)
}

/// Check every importable data path against the upstream checkout.
fn validate(
    ws: &Workspace,
) -> Result<Vec<(&'static DataPath, PathBuf, &'static str)>, PipelineError> {
    let mut importable = Vec::new();

    for data_path in preset::data_paths() {
        let Some(upstream_rel) = data_path.upstream_path else {
            debug!(alias = data_path.alias, "skipped: no upstream path");
            continue;
        };

        let upstream_abs = ws.upstream_root.join(upstream_rel);
        if !upstream_abs.exists() {
            return Err(PipelineError::MissingUpstreamPath {
                alias: data_path.alias,
                path: upstream_abs,
            });
        }

        match data_path.kind {
            DataPathKind::File if !upstream_abs.is_file() => {
                return Err(PipelineError::UpstreamKindMismatch {
                    alias: data_path.alias,
                    expected: "file",
                    path: upstream_abs,
                });
            }
            DataPathKind::Dir if !upstream_abs.is_dir() => {
                return Err(PipelineError::UpstreamKindMismatch {
                    alias: data_path.alias,
                    expected: "directory",
                    path: upstream_abs,
                });
            }
            _ => {}
        }

        let input_rel = data_path
            .input_path
            .ok_or(PipelineError::MissingDataPathField {
                alias: data_path.alias,
                field: "input_path",
            })?;

        importable.push((data_path, upstream_abs, input_rel));
    }

    Ok(importable)
}

fn copy_file(from: &Path, to: &Path) -> Result<(usize, u64), PipelineError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = std::fs::copy(from, to)?;
    Ok((1, bytes))
}

fn copy_dir(
    from: &Path,
    to: &Path,
    data_path: &DataPath,
) -> Result<(usize, u64), PipelineError> {
    let excludes = build_excludes(data_path.exclude)?;

    let mut files = 0;
    let mut bytes = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|source| PipelineError::Walk {
            dir: from.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(from)
            .unwrap_or_else(|_| entry.path());
        if is_excluded(&excludes, rel) {
            debug!(alias = data_path.alias, file = %rel.display(), "excluded");
            continue;
        }

        let dest = to.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        bytes += std::fs::copy(entry.path(), &dest)?;
        files += 1;
    }

    Ok((files, bytes))
}

fn build_excludes(patterns: &[&str]) -> Result<GlobSet, PipelineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| PipelineError::Glob {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PipelineError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// A file is excluded when the pattern set matches its relative path or
/// any ancestor directory of it, so a bare directory name excludes the
/// whole subtree.
fn is_excluded(excludes: &GlobSet, rel: &Path) -> bool {
    if excludes.is_empty() {
        return false;
    }
    rel.ancestors()
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .any(|ancestor| excludes.is_match(ancestor))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "protosync_import_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // Exclude matching
    // -----------------------------------------------------------------------

    #[test]
    fn exclude_matches_file_names() {
        let excludes = build_excludes(&["categories.yml"]).unwrap();
        assert!(is_excluded(&excludes, Path::new("categories.yml")));
        assert!(!is_excluded(&excludes, Path::new("tools.yml")));
    }

    #[test]
    fn exclude_directory_name_covers_subtree() {
        let excludes = build_excludes(&["Materials"]).unwrap();
        assert!(is_excluded(&excludes, Path::new("Materials/elements.yml")));
        assert!(is_excluded(&excludes, Path::new("Materials/deep/ore.yml")));
        assert!(!is_excluded(&excludes, Path::new("Medicine/pills.yml")));
    }

    #[test]
    fn empty_exclude_set_matches_nothing() {
        let excludes = build_excludes(&[]).unwrap();
        assert!(!is_excluded(&excludes, Path::new("anything.yml")));
    }

    // -----------------------------------------------------------------------
    // Copying
    // -----------------------------------------------------------------------

    #[test]
    fn copy_dir_preserves_layout_and_skips_excluded() {
        let dir = make_test_dir("copy_dir");
        let from = dir.join("from");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::create_dir_all(from.join("Materials")).unwrap();
        fs::write(from.join("a.yml"), "- type: entity\n").unwrap();
        fs::write(from.join("nested/b.yml"), "- type: entity\n").unwrap();
        fs::write(from.join("Materials/skip.yml"), "- type: entity\n").unwrap();

        let data_path = DataPath {
            alias: "test",
            kind: DataPathKind::Dir,
            upstream_path: None,
            exclude: &["Materials"],
            input_path: None,
            converted_path: None,
            tag_policy: protosync_data::TagPolicy::Reject,
            output_file: None,
            wiki_page: None,
        };

        let to = dir.join("to");
        let (files, bytes) = copy_dir(&from, &to, &data_path).unwrap();
        assert_eq!(files, 2);
        assert!(bytes > 0);
        assert!(to.join("a.yml").is_file());
        assert!(to.join("nested/b.yml").is_file());
        assert!(!to.join("Materials").exists());

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn missing_upstream_path_is_fatal() {
        let dir = make_test_dir("validate_missing");
        let ws = Workspace::new(&dir.join("upstream"), &dir.join("work"), "en-US");

        let result = run(&ws);
        assert!(matches!(
            result,
            Err(PipelineError::MissingUpstreamPath { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn kind_mismatch_is_fatal() {
        let dir = make_test_dir("validate_kind");
        let upstream = dir.join("upstream");

        // Satisfy every data path, then break one kind: the locale
        // directory becomes a file.
        for data_path in preset::data_paths() {
            let Some(rel) = data_path.upstream_path else {
                continue;
            };
            let path = upstream.join(rel);
            match data_path.kind {
                DataPathKind::File => {
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, "- type: entity\n").unwrap();
                }
                DataPathKind::Dir => fs::create_dir_all(&path).unwrap(),
            }
        }
        fs::remove_dir_all(upstream.join("Resources/Locale")).unwrap();
        fs::write(upstream.join("Resources/Locale"), "not a dir").unwrap();

        let ws = Workspace::new(&upstream, &dir.join("work"), "en-US");
        let result = run(&ws);
        assert!(matches!(
            result,
            Err(PipelineError::UpstreamKindMismatch { alias: "locale", .. })
        ));

        cleanup(&dir);
    }
}
