//! Per-document registry of named schemas.
//!
//! Every record, error, enum, fixed, protocol and synthesized abstract base
//! seen while resolving one document lives here exactly once. Schemas in the
//! graph refer to entries through [`SchemaRef`] handles, so references never
//! copy a declaration and recursive schemas need no special casing.

use std::collections::HashMap;
use std::ops::Index;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::SchemaError;
use crate::schema::{AvroSchema, NamedSchema, RecordSchema, SchemaName, SchemaRef};

/// Registry of named schemas for a single resolution pass.
///
/// Not shared between documents; each [`SchemaParser`](super::SchemaParser)
/// owns its own.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Entries in registration order
    entries: Vec<NamedSchema>,
    /// Qualified name to entry
    index: HashMap<SchemaName, SchemaRef>,
    /// Abstract bases keyed by owner and field name
    abstract_bases: HashMap<(SchemaName, String), SchemaRef>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named schema.
    ///
    /// # Errors
    /// A name that is already registered is a redeclaration.
    pub fn register(&mut self, schema: NamedSchema, node: &Value) -> Result<SchemaRef, SchemaError> {
        let name = schema.name().clone();
        if self.index.contains_key(&name) {
            return Err(SchemaError::invalid(
                format!("redeclaration of schema '{}'", name),
                node,
            ));
        }

        let id = SchemaRef(self.entries.len());
        debug!(name = %name, index = id.0, "Registered named schema");
        self.entries.push(schema);
        self.index.insert(name, id);
        Ok(id)
    }

    /// Look up a previously registered name.
    pub fn resolve_reference(&self, name: &SchemaName) -> Option<SchemaRef> {
        let found = self.index.get(name).copied();
        trace!(name = %name, found = found.is_some(), "Resolved schema reference");
        found
    }

    /// Look up a fully qualified name.
    pub fn lookup(&self, full_name: &str) -> Option<SchemaRef> {
        SchemaName::parse(full_name)
            .ok()
            .and_then(|name| self.index.get(&name).copied())
    }

    /// Get an entry.
    pub fn get(&self, id: SchemaRef) -> Option<&NamedSchema> {
        self.entries.get(id.0)
    }

    /// Get an entry by fully qualified name.
    pub fn get_by_name(&self, full_name: &str) -> Option<&NamedSchema> {
        self.lookup(full_name).and_then(|id| self.get(id))
    }

    /// The schema value that refers to an entry.
    pub fn schema_of(&self, id: SchemaRef) -> Option<AvroSchema> {
        self.get(id).map(|entry| entry.to_schema(id))
    }

    /// The record payload of a record or error entry.
    pub fn record(&self, id: SchemaRef) -> Option<&RecordSchema> {
        self.get(id).and_then(NamedSchema::as_record)
    }

    /// The qualified name of any schema; unnamed schemas use their keyword.
    pub fn name_of(&self, schema: &AvroSchema) -> SchemaName {
        match schema.schema_ref().and_then(|id| self.get(id)) {
            Some(entry) => entry.name().clone(),
            None => match schema {
                AvroSchema::Logical(l) => SchemaName::new(l.logical_name()),
                other => SchemaName::new(other.kind()),
            },
        }
    }

    /// Iterate over all entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaRef, &NamedSchema)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (SchemaRef(i), entry))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutable access to an entry.
    ///
    /// Records and protocols are registered before their children are
    /// resolved; the parser fills them in through this once they are known.
    pub(crate) fn get_mut(&mut self, id: SchemaRef) -> Option<&mut NamedSchema> {
        self.entries.get_mut(id.0)
    }

    /// Abstract base previously synthesized for an owner's field.
    pub(crate) fn abstract_base(&self, owner: &SchemaName, field: &str) -> Option<SchemaRef> {
        self.abstract_bases
            .get(&(owner.clone(), field.to_string()))
            .copied()
    }

    /// Remember the abstract base synthesized for an owner's field.
    pub(crate) fn memoize_abstract_base(&mut self, owner: SchemaName, field: String, id: SchemaRef) {
        self.abstract_bases.insert((owner, field), id);
    }

    /// Record that a record derives from an abstract base.
    pub(crate) fn add_base(&mut self, record: SchemaRef, base: SchemaRef) {
        if let Some(NamedSchema::Record(r)) = self.entries.get_mut(record.0) {
            if !r.bases.contains(&base) {
                r.bases.push(base);
            }
        }
    }
}

/// # Panics
/// Panics if the handle was not issued by this registry. Use
/// [`SchemaRegistry::get`] for handles of unknown origin.
impl Index<SchemaRef> for SchemaRegistry {
    type Output = NamedSchema;

    fn index(&self, id: SchemaRef) -> &NamedSchema {
        &self.entries[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, FixedSchema};
    use serde_json::json;

    fn record(full_name: &str) -> NamedSchema {
        NamedSchema::Record(RecordSchema::new(
            SchemaName::parse(full_name).unwrap(),
            vec![],
        ))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SchemaRegistry::new();
        let id = registry
            .register(record("com.example.User"), &json!("User"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("com.example.User"), Some(id));
        assert_eq!(registry.lookup("User"), None);
        assert_eq!(registry.schema_of(id), Some(AvroSchema::Record(id)));
        assert_eq!(registry[id].fullname(), "com.example.User");
    }

    #[test]
    fn test_redeclaration_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(record("A"), &json!("A")).unwrap();

        let err = registry.register(record("A"), &json!("A")).unwrap_err();
        assert!(err.reason().contains("redeclaration of schema 'A'"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_order() {
        let mut registry = SchemaRegistry::new();
        registry.register(record("B"), &json!(null)).unwrap();
        registry
            .register(
                NamedSchema::Enum(EnumSchema::new(SchemaName::new("A"), vec!["X".into()])),
                &json!(null),
            )
            .unwrap();
        registry
            .register(
                NamedSchema::Fixed(FixedSchema::new(SchemaName::new("C"), 4)),
                &json!(null),
            )
            .unwrap();

        let names: Vec<String> = registry.iter().map(|(_, e)| e.fullname()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_fill_placeholder() {
        let mut registry = SchemaRegistry::new();
        let id = registry.register(record("Node"), &json!(null)).unwrap();

        if let Some(NamedSchema::Record(r)) = registry.get_mut(id) {
            r.doc = Some("filled".to_string());
        }

        assert_eq!(registry.record(id).unwrap().doc.as_deref(), Some("filled"));
    }

    #[test]
    fn test_add_base_is_idempotent() {
        let mut registry = SchemaRegistry::new();
        let a = registry.register(record("A"), &json!(null)).unwrap();
        let b = registry.register(record("B"), &json!(null)).unwrap();

        registry.add_base(a, b);
        registry.add_base(a, b);
        assert_eq!(registry.record(a).unwrap().bases, vec![b]);
    }

    #[test]
    fn test_name_of_unnamed_schemas() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.name_of(&AvroSchema::Int).full_name(), "int");
        assert_eq!(
            registry
                .name_of(&AvroSchema::Array(Box::new(AvroSchema::Int)))
                .full_name(),
            "array"
        );
    }
}
