//! Error types for schema resolution

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while turning a schema document into a type graph
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document violates the schema grammar or a resolution rule.
    ///
    /// `json` holds the raw text of the offending node.
    #[error("Invalid schema: {reason} (at {json})")]
    InvalidSchema { reason: String, json: String },
    /// The input text is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SchemaError {
    /// Build an `InvalidSchema` error for the given node.
    pub fn invalid(reason: impl Into<String>, node: &Value) -> Self {
        SchemaError::InvalidSchema {
            reason: reason.into(),
            json: node.to_string(),
        }
    }

    /// Human-readable reason, without the JSON fragment.
    pub fn reason(&self) -> &str {
        match self {
            SchemaError::InvalidSchema { reason, .. } => reason,
            SchemaError::ParseError(message) => message,
        }
    }

    /// Raw JSON of the node that failed, if the error came from resolution.
    pub fn json(&self) -> Option<&str> {
        match self {
            SchemaError::InvalidSchema { json, .. } => Some(json),
            SchemaError::ParseError(_) => None,
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::ParseError(format!("Invalid JSON: {}", err))
    }
}

/// Violations of the Avro naming rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Name is empty or only whitespace
    #[error("name must not be empty")]
    Empty,
    /// A dotted name has an empty segment (`a..b`, `.a`, `a.`)
    #[error("name '{0}' contains an empty segment")]
    EmptySegment(String),
    /// The namespace was given explicitly as the empty string
    #[error("namespace must not be the empty string")]
    EmptyNamespace,
    /// A segment does not match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("'{0}' must start with a letter or underscore and contain only alphanumerics and underscores")]
    InvalidCharacters(String),
    /// A simple name (field, symbol) contains a dot
    #[error("'{0}' must not contain dots")]
    Dotted(String),
}
