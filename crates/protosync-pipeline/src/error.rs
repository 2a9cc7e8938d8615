//! Pipeline error type.

use protosync_core::{InheritError, PoolError};
use protosync_data::{ConvertError, LocaleError};
use std::path::PathBuf;

/// Errors raised by the pipeline stages. All are fatal for the current
/// stage; the caller decides whether anything else still runs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage asked for a data-path alias the preset does not define.
    #[error("unknown data path alias '{alias}'")]
    UnknownDataPath { alias: String },

    /// A data path is missing a field the requesting stage needs.
    #[error("data path '{alias}' has no {field} configured")]
    MissingDataPathField {
        alias: &'static str,
        field: &'static str,
    },

    /// A configured upstream path does not exist in the checkout.
    #[error("upstream path for '{alias}' does not exist: {path}")]
    MissingUpstreamPath { alias: &'static str, path: PathBuf },

    /// A configured upstream path is a file where a directory was
    /// expected, or the other way around.
    #[error("upstream path for '{alias}' is not a {expected}: {path}")]
    UpstreamKindMismatch {
        alias: &'static str,
        expected: &'static str,
        path: PathBuf,
    },

    /// The input tree is missing a path the convert stage needs. Run the
    /// import stage first.
    #[error("input path for '{alias}' does not exist: {path}")]
    MissingInput { alias: &'static str, path: PathBuf },

    /// The converted tree is missing a path the process stage needs. Run
    /// the convert stage first.
    #[error("converted path for '{alias}' does not exist: {path}")]
    MissingConverted { alias: &'static str, path: PathBuf },

    /// The output tree is missing a file the publish stage needs. Run
    /// the process stage first.
    #[error("output file for '{alias}' does not exist: {path}")]
    MissingOutput { alias: &'static str, path: PathBuf },

    /// A YAML file failed to convert.
    #[error("failed to convert {file}: {source}")]
    Convert {
        file: PathBuf,
        #[source]
        source: ConvertError,
    },

    /// A JSON file failed to parse or serialize.
    #[error("JSON error in {file}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A converted file does not hold the expected list of records.
    #[error("converted file {file} does not hold a list of records")]
    ConvertedNotAList { file: PathBuf },

    /// A record in a converted file does not match its prototype schema.
    #[error("record in {file} does not match the {kind} schema: {detail}")]
    Schema {
        file: PathBuf,
        kind: &'static str,
        detail: String,
    },

    /// A record no longer matches its schema after inheritance
    /// resolution.
    #[error("resolved {kind} '{id}' no longer matches the schema: {detail}")]
    ResolvedSchema {
        kind: &'static str,
        id: String,
        detail: String,
    },

    /// A value failed to encode for output.
    #[error("failed to encode output: {detail}")]
    Encode { detail: String },

    /// A lathe machine entity without an id.
    #[error("lathe entity without an id in {file}")]
    LatheWithoutId { file: PathBuf },

    /// A concrete recipe with no material costs.
    #[error("recipe '{id}' has no materials")]
    RecipeWithoutMaterials { id: String },

    /// A material cost that is not a number.
    #[error("recipe '{recipe}' material '{material}' is not a number")]
    NonNumericMaterial { recipe: String, material: String },

    /// A recipe belongs to a lathe but matches none of its recipe lists.
    #[error("recipe '{recipe}' belongs to lathe '{lathe}' but has unknown availability")]
    UnknownAvailability { recipe: String, lathe: String },

    /// A record with an unexpected prototype type reached a derivation.
    #[error("unknown recipe type '{found}'")]
    UnknownRecipeType { found: String },

    /// A concrete record without an id survived processing.
    #[error("record without an id survived processing")]
    RecordWithoutId,

    /// Two item groups contributed the same name-map key.
    #[error("duplicate item name-map key '{key}'")]
    DuplicateItemKey { key: String },

    /// A concrete reagent missing a required locale key.
    #[error("reagent '{id}' is missing its {field} locale key")]
    MissingReagentText { id: String, field: &'static str },

    /// The upstream checkout's commit hash could not be read.
    #[error("failed to read upstream commit hash: {detail}")]
    UpstreamCommit { detail: String },

    /// A configuration problem (missing file, bad value).
    #[error("configuration error: {detail}")]
    Config { detail: String },

    /// The configuration file failed to parse.
    #[error("failed to parse {file}: {source}")]
    ConfigParse {
        file: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An exclude pattern in the preset failed to compile.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A directory walk failed.
    #[error("failed to walk {dir}: {source}")]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Inherit(#[from] InheritError),

    #[error(transparent)]
    Locale(#[from] LocaleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
