//! Stage 4: stage changed wiki payloads.
//!
//! For every data path with both an output file and a wiki page, the
//! produced JSON is compared against the last published copy mirrored
//! under `04-publish/mirror/<page>`. Unchanged pages are skipped;
//! changed (or new) pages are staged under `04-publish/staged/<page>`
//! with an edit summary naming the upstream commit, plus a manifest the
//! external uploader consumes. The uploader refreshes the mirror after a
//! successful edit; staging itself never touches it.
//!
//! Talking to the wiki is deliberately out of scope here.

use crate::error::PipelineError;
use crate::preset;
use crate::stage;
use crate::workspace::{Workspace, reset_dir};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One page whose payload changed since the last publish.
#[derive(Debug, Clone, Serialize)]
pub struct StagedPage {
    /// Wiki page title.
    pub page: String,
    /// Where the payload was staged.
    pub payload: PathBuf,
    /// Edit summary for the upload.
    pub summary: String,
}

/// What a publish run found.
#[derive(Debug, Default)]
pub struct PublishSummary {
    pub staged: Vec<StagedPage>,
    pub unchanged: Vec<String>,
}

/// Compare outputs against the published mirror and stage the changes.
pub fn run(ws: &Workspace, run_url: Option<&str>) -> Result<PublishSummary, PipelineError> {
    let commit = upstream_commit(&ws.upstream_root)?;
    info!(commit = %commit, "upstream checkout");

    let mut edit_summary = format!("AUTOMATED: sync to upstream commit #{commit}");
    if let Some(url) = run_url {
        edit_summary.push_str(&format!(" using action {url}"));
    }

    let staged_root = ws.publish_root().join("staged");
    let mirror_root = ws.publish_root().join("mirror");
    reset_dir(&staged_root)?;
    std::fs::create_dir_all(&mirror_root)?;

    let mut summary = PublishSummary::default();
    for data_path in preset::data_paths() {
        let (Some(output_rel), Some(wiki_page)) = (data_path.output_file, data_path.wiki_page)
        else {
            continue;
        };

        let output_path = ws.output_root().join(output_rel);
        if !output_path.is_file() {
            return Err(PipelineError::MissingOutput {
                alias: data_path.alias,
                path: output_path,
            });
        }
        let new_content = stage::read_json(&output_path)?;

        let mirror_path = mirror_root.join(wiki_page);
        let current_content = if mirror_path.is_file() {
            Some(stage::read_json(&mirror_path)?)
        } else {
            None
        };

        // Semantic comparison; formatting differences don't force edits.
        if current_content.as_ref() == Some(&new_content) {
            info!(page = wiki_page, "no changes to upload");
            summary.unchanged.push(wiki_page.to_string());
            continue;
        }

        let payload = staged_root.join(wiki_page);
        stage::write_json(&payload, &new_content)?;

        info!(page = wiki_page, "staged for upload");
        summary.staged.push(StagedPage {
            page: wiki_page.to_string(),
            payload,
            summary: edit_summary.clone(),
        });
    }

    stage::write_json(&staged_root.join("manifest.json"), &summary.staged)?;
    info!(
        staged = summary.staged.len(),
        unchanged = summary.unchanged.len(),
        "publish staging complete"
    );

    Ok(summary)
}

/// Short commit hash of the upstream checkout's HEAD.
fn upstream_commit(repo: &Path) -> Result<String, PipelineError> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(repo)
        .output()
        .map_err(|e| PipelineError::UpstreamCommit {
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PipelineError::UpstreamCommit {
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
