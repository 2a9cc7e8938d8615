//! Locale string lookup over the upstream Fluent (`.ftl`) files.
//!
//! Prototype fields like a technology's `name` hold locale keys; the
//! process stage swaps them for display strings. This reader covers the
//! subset of Fluent the upstream locale tree actually uses for plain
//! message values: `key = value` lines, multi-line values on indented
//! continuation lines, `#` comments, and `.attr = ...` attribute lines
//! (attributes end the value and are not looked up). Terms (`-key`) and
//! placeable expansion are out of scope; values are returned literally.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// Errors raised by locale loading and lookup.
#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    /// No message is defined for the requested key.
    #[error("unknown localization key '{key}'")]
    UnknownKey { key: String },

    /// A record field expected to hold a locale key held something else.
    #[error("localization key in field '{field}' is not a string")]
    KeyNotAString { field: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to walk locale directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// An in-memory table of locale messages, keyed by message id.
#[derive(Debug, Default)]
pub struct LocaleTable {
    messages: HashMap<String, String>,
}

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.ftl` file under `dir` (recursively) into one table.
    /// Later files win on duplicate message ids.
    pub fn load_dir(dir: &Path) -> Result<Self, LocaleError> {
        let mut table = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("ftl") {
                continue;
            }
            let source = std::fs::read_to_string(entry.path())?;
            table.add_resource(&source);
        }
        Ok(table)
    }

    /// Parse one FTL source and add its messages to the table.
    pub fn add_resource(&mut self, source: &str) {
        let mut current: Option<(String, String)> = None;

        for line in source.lines() {
            // New message or term definition?
            if let Some((id, value)) = parse_message_line(line) {
                if let Some((done_id, done_value)) = current.take() {
                    self.insert_message(done_id, done_value);
                }
                current = Some((id, value));
                continue;
            }

            let trimmed = line.trim_start();

            // Attribute lines belong to the current message but end its
            // value; comments and blank lines end it too.
            if trimmed.starts_with('.') || trimmed.starts_with('#') || trimmed.is_empty() {
                if let Some((done_id, done_value)) = current.take() {
                    self.insert_message(done_id, done_value);
                }
                continue;
            }

            // Indented continuation of the current value.
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                }
                continue;
            }

            // Anything else is junk between messages; drop the current one.
            if let Some((done_id, done_value)) = current.take() {
                self.insert_message(done_id, done_value);
            }
        }

        if let Some((id, value)) = current {
            self.insert_message(id, value);
        }
    }

    fn insert_message(&mut self, id: String, value: String) {
        // Terms are referenced from other messages only, never looked up
        // by prototypes.
        if id.starts_with('-') {
            return;
        }
        self.messages.insert(id, value);
    }

    /// Look up a message value by key. Unknown keys are fatal.
    pub fn lookup(&self, key: &str) -> Result<&str, LocaleError> {
        self.messages
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| LocaleError::UnknownKey {
                key: key.to_string(),
            })
    }

    /// Whether a message with this key exists.
    pub fn has_message(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Number of messages in the table.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace a record field holding a locale key with its display
    /// string, in place. The field must hold a string key.
    pub fn localize_field(&self, record: &mut Value, field: &str) -> Result<(), LocaleError> {
        let key = record
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| LocaleError::KeyNotAString {
                field: field.to_string(),
            })?;
        let localized = self.lookup(key)?.to_string();
        record[field] = Value::String(localized);
        Ok(())
    }
}

fn parse_message_line(line: &str) -> Option<(String, String)> {
    // Continuations and attributes are indented; a message line starts
    // at column zero with an identifier.
    if line.starts_with(' ') || line.starts_with('\t') {
        return None;
    }

    let (id, value) = line.split_once('=')?;
    let id = id.trim();

    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && id.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '-');
    if !valid {
        return None;
    }

    Some((id.to_string(), value.trim().to_string()))
}

// ===========================================================================
// Tests
// ===========================================================================
