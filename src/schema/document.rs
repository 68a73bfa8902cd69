//! The output of one resolution pass.

use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::binding::type_name;
use crate::schema::writer::JsonWriter;
use crate::schema::{AvroSchema, NamedSchema, RecordSchema, SchemaRef, SchemaRegistry};

/// A resolved schema document: the root schema and every named schema it
/// declares.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    root: AvroSchema,
    registry: SchemaRegistry,
}

impl ResolvedDocument {
    pub(crate) fn new(root: AvroSchema, registry: SchemaRegistry) -> Self {
        Self { root, registry }
    }

    /// The schema the document's root node resolved to.
    pub fn root(&self) -> &AvroSchema {
        &self.root
    }

    /// The registry of named schemas.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Named schemas in registration order.
    pub fn named_schemas(&self) -> impl Iterator<Item = (SchemaRef, &NamedSchema)> {
        self.registry.iter()
    }

    /// Look up a named schema by its qualified name.
    pub fn get(&self, full_name: &str) -> Option<&NamedSchema> {
        self.registry.get_by_name(full_name)
    }

    /// Look up a record or error by its qualified name.
    pub fn record(&self, full_name: &str) -> Option<&RecordSchema> {
        self.get(full_name).and_then(NamedSchema::as_record)
    }

    /// Target type name of a schema from this document.
    pub fn type_name(&self, schema: &AvroSchema) -> String {
        type_name(schema, &self.registry)
    }

    /// Project the root schema back to Avro JSON.
    pub fn to_json_value(&self) -> Result<Value, SchemaError> {
        JsonWriter::new(&self.registry).write(&self.root)
    }

    /// Project the root schema back to Avro JSON text.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(self.to_json_value()?.to_string())
    }

    /// Split into the root schema and registry.
    pub fn into_parts(self) -> (AvroSchema, SchemaRegistry) {
        (self.root, self.registry)
    }
}
