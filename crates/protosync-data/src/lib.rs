//! On-disk formats for the protosync pipeline.
//!
//! Covers the three data shapes the pipeline touches before and after
//! inheritance resolution:
//!
//! - [`convert`] -- upstream YAML prototype files converted to JSON
//!   records, including passthrough handling for the upstream's custom
//!   `!type:` tags;
//! - [`schema`] -- serde views of the prototype kinds the process stage
//!   reshapes (lathe recipes, categories, reagents, technologies,
//!   disciplines);
//! - [`locale`] -- a key/value table read from the upstream's Fluent
//!   (`.ftl`) locale files, used to localize display strings.

pub mod convert;
pub mod locale;
pub mod schema;

pub use convert::{ConvertError, TagPolicy, YAML_TYPE_KEY, yaml_file_to_records, yaml_to_json};
pub use locale::{LocaleError, LocaleTable};
