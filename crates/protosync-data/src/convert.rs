//! YAML to JSON conversion for upstream prototype files.
//!
//! Upstream prototype files are YAML sequences of records. Some nested
//! mappings carry custom `!type:Name` tags; how those are handled is
//! controlled by [`TagPolicy`]:
//!
//! - [`TagPolicy::Reject`] -- custom tags are an error (strict files
//!   such as lathe recipes never carry them);
//! - [`TagPolicy::IdKey`] -- the tag name becomes the record's `id`
//!   field (used where downstream consumers address sub-records by id);
//! - [`TagPolicy::TypeKey`] -- the tag name is stored under the
//!   collision-proof marker key [`YAML_TYPE_KEY`].
//!
//! In either passthrough mode the tagged mapping's own fields ride along
//! unchanged; a mapping that already contains the chosen key is a fatal
//! error. A tagged scalar passes its value through with the tag dropped.

use serde_json::Value;
use serde_yaml::value::TaggedValue;

/// Marker key for a record's tag type under [`TagPolicy::TypeKey`].
///
/// Deliberately unlikely to collide with real prototype fields.
pub const YAML_TYPE_KEY: &str = "@@YAML-TYPE@@";

/// How custom `!type:` tags are turned into record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPolicy {
    /// Custom tags are an error.
    Reject,
    /// The tag name becomes the record's `id` field.
    IdKey,
    /// The tag name is stored under [`YAML_TYPE_KEY`].
    TypeKey,
}

impl TagPolicy {
    fn key(self) -> Option<&'static str> {
        match self {
            TagPolicy::Reject => None,
            TagPolicy::IdKey => Some("id"),
            TagPolicy::TypeKey => Some(YAML_TYPE_KEY),
        }
    }
}

/// Errors raised during YAML to JSON conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A custom tag was found under [`TagPolicy::Reject`].
    #[error("unknown YAML tag '{tag}': custom tags are not allowed here")]
    UnknownTag { tag: String },

    /// A custom tag on a value shape the passthrough cannot represent.
    #[error("unsupported YAML tag '{tag}' on a {on}")]
    UnsupportedTag { tag: String, on: &'static str },

    /// A tagged mapping already contains the key reserved for its tag.
    #[error("tagged record already contains reserved key '{key}'")]
    TagKeyCollision { key: &'static str },

    /// A mapping key that is not a scalar.
    #[error("mapping key must be a scalar, got {found}")]
    InvalidKey { found: &'static str },

    /// A YAML number with no JSON representation (NaN or infinity).
    #[error("number {0} cannot be represented in JSON")]
    InvalidNumber(f64),

    /// A prototype file whose top level is not a sequence of records.
    #[error("expected a top-level sequence of records, got {found}")]
    TopLevelNotASequence { found: &'static str },
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

/// Parse one YAML document and convert it to a JSON value.
pub fn yaml_to_json(input: &str, policy: TagPolicy) -> Result<Value, ConvertError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(input)?;
    convert_value(&doc, policy)
}

/// Parse one upstream prototype file into its list of JSON records.
///
/// Returns `Ok(None)` for an empty document (the caller logs and skips
/// it); anything other than a top-level sequence is fatal.
pub fn yaml_file_to_records(
    input: &str,
    policy: TagPolicy,
) -> Result<Option<Vec<Value>>, ConvertError> {
    match yaml_to_json(input, policy)? {
        Value::Null => Ok(None),
        Value::Array(records) => Ok(Some(records)),
        other => Err(ConvertError::TopLevelNotASequence {
            found: json_kind(&other),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn convert_value(value: &serde_yaml::Value, policy: TagPolicy) -> Result<Value, ConvertError> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => convert_number(n),
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| convert_value(item, policy))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(mapping) => convert_mapping(mapping, policy).map(Value::Object),
        serde_yaml::Value::Tagged(tagged) => convert_tagged(tagged, policy),
    }
}

fn convert_number(n: &serde_yaml::Number) -> Result<Value, ConvertError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Number(i.into()))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Number(u.into()))
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or(ConvertError::InvalidNumber(f))
    }
}

fn convert_mapping(
    mapping: &serde_yaml::Mapping,
    policy: TagPolicy,
) -> Result<serde_json::Map<String, Value>, ConvertError> {
    let mut result = serde_json::Map::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s.clone(),
            // YAML permits bare numeric/bool keys; JSON keys are strings.
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => {
                return Err(ConvertError::InvalidKey {
                    found: yaml_kind(other),
                });
            }
        };
        result.insert(key, convert_value(value, policy)?);
    }
    Ok(result)
}

fn convert_tagged(tagged: &TaggedValue, policy: TagPolicy) -> Result<Value, ConvertError> {
    let raw_tag = tagged.tag.to_string();
    let name = raw_tag.trim_start_matches('!');
    let name = name.strip_prefix("type:").unwrap_or(name).to_string();

    let Some(type_key) = policy.key() else {
        return Err(ConvertError::UnknownTag { tag: raw_tag });
    };

    match &tagged.value {
        // An empty tagged body still yields a record carrying its type.
        serde_yaml::Value::Null => {
            let mut record = serde_json::Map::new();
            record.insert(type_key.to_string(), Value::String(name));
            Ok(Value::Object(record))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let fields = convert_mapping(mapping, policy)?;
            if fields.contains_key(type_key) {
                return Err(ConvertError::TagKeyCollision { key: type_key });
            }
            let mut record = serde_json::Map::with_capacity(fields.len() + 1);
            record.insert(type_key.to_string(), Value::String(name));
            record.extend(fields);
            Ok(Value::Object(record))
        }
        // Tagged scalars pass their value through unchanged.
        scalar @ (serde_yaml::Value::Bool(_)
        | serde_yaml::Value::Number(_)
        | serde_yaml::Value::String(_)) => convert_value(scalar, policy),
        other => Err(ConvertError::UnsupportedTag {
            tag: raw_tag,
            on: yaml_kind(other),
        }),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -----------------------------------------------------------------------
    // Plain conversion
    // -----------------------------------------------------------------------

    #[test]
    fn plain_records_convert() {
        let yaml = r#"
- type: entity
  id: BaseItem
  name: base item
  tags:
    - Item
- type: entity
  id: Crowbar
  parent: BaseItem
"#;
        let records = yaml_file_to_records(yaml, TagPolicy::Reject).unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], json!("BaseItem"));
        assert_eq!(records[0]["tags"], json!(["Item"]));
        assert_eq!(records[1]["parent"], json!("BaseItem"));
    }

    #[test]
    fn numbers_and_bools_convert() {
        let value = yaml_to_json("{int: 3, float: 1.5, neg: -7, flag: true}", TagPolicy::Reject)
            .unwrap();
        assert_eq!(value, json!({"int": 3, "float": 1.5, "neg": -7, "flag": true}));
    }

    #[test]
    fn scalar_keys_coerce_to_strings() {
        // Tier prerequisite tables use bare integer keys upstream.
        let value = yaml_to_json("{1: 0.5, 2: 0.8, true: 1}", TagPolicy::Reject).unwrap();
        assert_eq!(value, json!({"1": 0.5, "2": 0.8, "true": 1}));
    }

    #[test]
    fn empty_document_yields_none() {
        assert!(yaml_file_to_records("", TagPolicy::Reject).unwrap().is_none());
        assert!(
            yaml_file_to_records("# only a comment\n", TagPolicy::Reject)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn top_level_mapping_is_fatal() {
        let result = yaml_file_to_records("id: alone\n", TagPolicy::Reject);
        assert!(matches!(
            result,
            Err(ConvertError::TopLevelNotASequence { found: "mapping" })
        ));
    }

    // -----------------------------------------------------------------------
    // Tag passthrough
    // -----------------------------------------------------------------------

    #[test]
    fn tagged_mapping_gets_type_key() {
        let yaml = r#"
- type: entity
  id: Beaker
  shape: !type:PhysShapeAabb
    bounds: "-0.4,-0.4,0.4,0.4"
"#;
        let records = yaml_file_to_records(yaml, TagPolicy::TypeKey).unwrap().unwrap();
        assert_eq!(
            records[0]["shape"],
            json!({YAML_TYPE_KEY: "PhysShapeAabb", "bounds": "-0.4,-0.4,0.4,0.4"})
        );
    }

    #[test]
    fn tagged_mapping_type_key_comes_first() {
        let yaml = "- effect: !type:Heal\n    amount: 5\n";
        let records = yaml_file_to_records(yaml, TagPolicy::IdKey).unwrap().unwrap();
        let effect = records[0]["effect"].as_object().unwrap();
        let keys: Vec<&str> = effect.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "amount"]);
        assert_eq!(effect["id"], json!("Heal"));
    }

    #[test]
    fn tagged_empty_body_yields_bare_record() {
        let value = yaml_to_json("!type:Oxygenate", TagPolicy::TypeKey).unwrap();
        assert_eq!(value, json!({YAML_TYPE_KEY: "Oxygenate"}));
    }

    #[test]
    fn tagged_scalar_passes_value_through() {
        let value = yaml_to_json("damage: !type:Single 5.5", TagPolicy::TypeKey).unwrap();
        assert_eq!(value, json!({"damage": 5.5}));
    }

    #[test]
    fn tag_key_collision_is_fatal() {
        let yaml = "- shape: !type:Box\n    id: conflicting\n";
        let result = yaml_file_to_records(yaml, TagPolicy::IdKey);
        assert!(matches!(
            result,
            Err(ConvertError::TagKeyCollision { key: "id" })
        ));
    }

    #[test]
    fn reject_policy_refuses_custom_tags() {
        let yaml = "- shape: !type:Box\n    width: 1\n";
        let result = yaml_file_to_records(yaml, TagPolicy::Reject);
        assert!(matches!(result, Err(ConvertError::UnknownTag { ref tag }) if tag.contains("Box")));
    }

    #[test]
    fn tagged_sequence_is_fatal() {
        let result = yaml_to_json("items: !type:List [1, 2]", TagPolicy::TypeKey);
        assert!(matches!(
            result,
            Err(ConvertError::UnsupportedTag { on: "sequence", .. })
        ));
    }

    #[test]
    fn nested_tags_inside_sequences_convert() {
        let yaml = r#"
- type: reagent
  id: Medicine
  metabolisms:
    effects:
      - !type:HealthChange
        damage: -2
      - !type:SatiateThirst
"#;
        let records = yaml_file_to_records(yaml, TagPolicy::TypeKey).unwrap().unwrap();
        let effects = records[0]["metabolisms"]["effects"].as_array().unwrap();
        assert_eq!(effects[0][YAML_TYPE_KEY], json!("HealthChange"));
        assert_eq!(effects[0]["damage"], json!(-2));
        assert_eq!(effects[1], json!({YAML_TYPE_KEY: "SatiateThirst"}));
    }

    // -----------------------------------------------------------------------
    // Parse failures
    // -----------------------------------------------------------------------

    #[test]
    fn invalid_yaml_is_fatal() {
        let result = yaml_to_json("{unclosed: [", TagPolicy::Reject);
        assert!(matches!(result, Err(ConvertError::Yaml(_))));
    }
}
