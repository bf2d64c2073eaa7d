//! Tree validation.
//! Checks an input tree, in its JSON shape, against a JSON Schema before it is compiled.

use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Schema for the JSON tree shape: `{tag, value?, attributes?, children?}`.
pub const TREE_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["tag"],
  "additionalProperties": false,
  "properties": {
    "tag": { "type": "string", "minLength": 1 },
    "value": { "type": ["string", "null"] },
    "attributes": {
      "type": "object",
      "propertyNames": { "not": { "enum": ["tag", "children"] } }
    },
    "children": {
      "type": "array",
      "items": { "$ref": "#" }
    }
  }
}"##;

/// Trait for checking a tree document before it is turned into nodes.
pub trait TreeValidator {
    /// # Errors
    /// * `Error::ValidationError` listing every violation found
    fn validate(&self, tree: &serde_json::Value) -> Result<()>;
}

/// Validates trees against a JSON Schema.
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Validator for the built-in tree schema.
    pub fn tree() -> Result<Self> {
        let schema: serde_json::Value = serde_json::from_str(TREE_SCHEMA)
            .map_err(|e| Error::ConfigError(format!("built-in tree schema is invalid: {e}")))?;
        Self::from_schema(&schema)
    }

    pub fn from_schema(schema: &serde_json::Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| Error::ConfigError(format!("invalid schema: {e}")))?;
        Ok(Self { validator })
    }

    /// Reads the schema from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading schema from {}", path.display());
        let content = fs::read_to_string(path).map_err(Error::IoError)?;
        let schema: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("schema '{}' is not valid JSON: {e}", path.display()))
        })?;
        Self::from_schema(&schema)
    }
}

impl TreeValidator for SchemaValidator {
    fn validate(&self, tree: &serde_json::Value) -> Result<()> {
        let errors: Vec<String> = self.validator.iter_errors(tree).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationError(errors.join("; ")))
        }
    }
}
