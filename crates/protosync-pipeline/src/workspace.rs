//! Pipeline configuration and directory layout.
//!
//! The pipeline works out of one directory tree per stage under a
//! configurable work root:
//!
//! ```text
//! <work_root>/01-input      imported upstream files
//! <work_root>/02-converted  YAML converted to JSON
//! <work_root>/03-output     derived tables
//! <work_root>/04-publish    staged wiki payloads + published mirror
//! ```
//!
//! Roots and the preferred locale come from `protosync.toml`.

use crate::error::PipelineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name, discovered in the working directory
/// when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "protosync.toml";

/// On-disk configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the upstream game content checkout.
    pub upstream_root: PathBuf,

    /// Root of the stage trees. Defaults to `work`.
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,

    /// Locale consumed for display strings. Defaults to `en-US`.
    #[serde(default = "default_locale")]
    pub preferred_locale: String,
}

fn default_work_root() -> PathBuf {
    PathBuf::from("work")
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl Config {
    /// Load configuration from an explicit path, or discover
    /// `protosync.toml` in `dir`.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self, PipelineError> {
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Err(PipelineError::Config {
                        detail: format!(
                            "no {CONFIG_FILE_NAME} found in {}; pass --config",
                            dir.display()
                        ),
                    });
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&file)?;
        let config: Config =
            toml::from_str(&content).map_err(|source| PipelineError::ConfigParse {
                file: file.clone(),
                source,
            })?;
        Ok(config)
    }

    /// Build the workspace this configuration describes.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.upstream_root, &self.work_root, &self.preferred_locale)
    }
}

/// Directory layout of one pipeline run.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub upstream_root: PathBuf,
    pub work_root: PathBuf,
    pub preferred_locale: String,
}

impl Workspace {
    pub fn new(upstream_root: &Path, work_root: &Path, preferred_locale: &str) -> Self {
        Self {
            upstream_root: upstream_root.to_path_buf(),
            work_root: work_root.to_path_buf(),
            preferred_locale: preferred_locale.to_string(),
        }
    }

    /// Stage 1 tree: files imported from the upstream checkout.
    pub fn input_root(&self) -> PathBuf {
        self.work_root.join("01-input")
    }

    /// Stage 2 tree: imported YAML converted to JSON.
    pub fn converted_root(&self) -> PathBuf {
        self.work_root.join("02-converted")
    }

    /// Stage 3 tree: derived output tables.
    pub fn output_root(&self) -> PathBuf {
        self.work_root.join("03-output")
    }

    /// Stage 4 tree: staged wiki payloads and the published mirror.
    pub fn publish_root(&self) -> PathBuf {
        self.work_root.join("04-publish")
    }
}

/// Wipe and recreate a stage directory.
pub fn reset_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)
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
            "protosync_workspace_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn config_defaults() {
        let dir = make_test_dir("defaults");
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            "upstream_root = \"/srv/game-content\"\n",
        )
        .unwrap();

        let config = Config::load(None, &dir).unwrap();
        assert_eq!(config.upstream_root, PathBuf::from("/srv/game-content"));
        assert_eq!(config.work_root, PathBuf::from("work"));
        assert_eq!(config.preferred_locale, "en-US");

        cleanup(&dir);
    }

    #[test]
    fn config_explicit_values() {
        let dir = make_test_dir("explicit");
        let file = dir.join("custom.toml");
        fs::write(
            &file,
            "upstream_root = \"/srv/game\"\nwork_root = \"/tmp/sync\"\npreferred_locale = \"ru-RU\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&file), &dir).unwrap();
        assert_eq!(config.work_root, PathBuf::from("/tmp/sync"));
        assert_eq!(config.preferred_locale, "ru-RU");

        cleanup(&dir);
    }

    #[test]
    fn missing_config_is_fatal() {
        let dir = make_test_dir("missing");
        let result = Config::load(None, &dir);
        assert!(matches!(result, Err(PipelineError::Config { .. })));
        cleanup(&dir);
    }

    #[test]
    fn unknown_config_key_is_fatal() {
        let dir = make_test_dir("unknown_key");
        let file = dir.join(CONFIG_FILE_NAME);
        fs::write(&file, "upstream_root = \"x\"\ntypo_key = 1\n").unwrap();

        let result = Config::load(Some(&file), &dir);
        assert!(matches!(result, Err(PipelineError::ConfigParse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn workspace_stage_roots() {
        let ws = Workspace::new(Path::new("/srv/game"), Path::new("/tmp/sync"), "en-US");
        assert_eq!(ws.input_root(), PathBuf::from("/tmp/sync/01-input"));
        assert_eq!(ws.converted_root(), PathBuf::from("/tmp/sync/02-converted"));
        assert_eq!(ws.output_root(), PathBuf::from("/tmp/sync/03-output"));
        assert_eq!(ws.publish_root(), PathBuf::from("/tmp/sync/04-publish"));
    }

    #[test]
    fn reset_dir_wipes_contents() {
        let dir = make_test_dir("reset");
        let stage = dir.join("stage");
        fs::create_dir_all(stage.join("nested")).unwrap();
        fs::write(stage.join("nested/file.txt"), "old").unwrap();

        reset_dir(&stage).unwrap();
        assert!(stage.exists());
        assert!(!stage.join("nested").exists());

        cleanup(&dir);
    }
}
