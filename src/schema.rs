use serde::Serialize;
use serde_json::Value;

use crate::errors::{Error, Result};

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub path_in_instance: String,
    pub message: String,
    pub path_in_schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub errors: Vec<SchemaIssue>,
}

impl SchemaReport {
    pub fn from_issues(errors: Vec<SchemaIssue>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

/// A compiled schema.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, value: &Value) -> SchemaReport;
}

/// Schema validation capability consumed by `to_match_schema`. Register a
/// `MatchSchema` built around another compiler to swap the backend.
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, schema: &Value) -> Result<Box<dyn SchemaValidator>>;
}

/// Default backend on top of the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaCompiler;

struct JsonSchemaValidator(jsonschema::Validator);

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, schema: &Value) -> Result<Box<dyn SchemaValidator>> {
        let validator = jsonschema::validator_for(schema).map_err(|e| Error::Schema(e.to_string()))?;
        Ok(Box::new(JsonSchemaValidator(validator)))
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, value: &Value) -> SchemaReport {
        let issues = self
            .0
            .iter_errors(value)
            .map(|e| SchemaIssue {
                path_in_instance: e.instance_path.to_string(),
                message: e.to_string(),
                path_in_schema: e.schema_path.to_string(),
            })
            .collect();
        SchemaReport::from_issues(issues)
    }
}
