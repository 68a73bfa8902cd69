//! JSON projection of resolved schemas.
//!
//! Re-serializes a resolved graph to Avro JSON. Each named schema is written
//! in full the first time it is reached and as a reference afterwards.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::schema::{
    AbstractRecordSchema, AvroSchema, EnumSchema, FieldSchema, FixedSchema, LogicalSchema,
    LogicalTypeName, MessageSchema, NamedSchema, ProtocolSchema, RecordSchema, SchemaName,
    SchemaRef, SchemaRegistry,
};

/// Writes schemas from one registry, remembering what has been written.
#[derive(Debug)]
pub struct JsonWriter<'a> {
    registry: &'a SchemaRegistry,
    written: HashSet<SchemaRef>,
}

impl<'a> JsonWriter<'a> {
    /// Create a writer with an empty written-names set.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            written: HashSet::new(),
        }
    }

    /// Check whether a named schema has already been written in full.
    pub fn is_written(&self, id: SchemaRef) -> bool {
        self.written.contains(&id)
    }

    /// Write a schema at the top level.
    pub fn write(&mut self, schema: &AvroSchema) -> Result<Value, SchemaError> {
        self.write_in(schema, None)
    }

    /// Write a schema nested in the given enclosing namespace.
    ///
    /// # Errors
    /// The boxed union representation has no Avro spelling of its own, and
    /// a handle from another registry cannot be written.
    pub fn write_in(
        &mut self,
        schema: &AvroSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        match schema {
            AvroSchema::Null
            | AvroSchema::Boolean
            | AvroSchema::Int
            | AvroSchema::Long
            | AvroSchema::Float
            | AvroSchema::Double
            | AvroSchema::Bytes
            | AvroSchema::String => Ok(json!(schema.kind())),

            AvroSchema::Record(id)
            | AvroSchema::Error(id)
            | AvroSchema::Enum(id)
            | AvroSchema::Fixed(id)
            | AvroSchema::Protocol(id)
            | AvroSchema::AbstractBase(id) => self.write_named(*id, namespace),

            AvroSchema::Array(items) => Ok(json!({
                "type": "array",
                "items": self.write_in(items, namespace)?
            })),
            AvroSchema::Map(values) => Ok(json!({
                "type": "map",
                "values": self.write_in(values, namespace)?
            })),
            AvroSchema::Union(u) => self.write_branches(&u.branches, namespace),
            AvroSchema::Logical(l) => self.write_logical(l, namespace),
            AvroSchema::Object => Err(SchemaError::invalid(
                "the boxed union representation cannot be written on its own",
                &json!(schema.kind()),
            )),
        }
    }

    fn write_named(&mut self, id: SchemaRef, namespace: Option<&str>) -> Result<Value, SchemaError> {
        let registry = self.registry;
        let entry = registry.get(id).ok_or_else(|| {
            SchemaError::invalid(
                format!("schema handle {} is not registered", id.index()),
                &Value::Null,
            )
        })?;

        // Abstract bases have no declaration; they are spelled as their union.
        if let NamedSchema::AbstractBase(base) = entry {
            return self.write_abstract_base(base, namespace);
        }

        if !self.written.insert(id) {
            return Ok(json!(reference_name(entry.name(), namespace)));
        }

        match entry {
            NamedSchema::Record(r) => self.write_record(r, "record", namespace),
            NamedSchema::Error(r) => self.write_record(r, "error", namespace),
            NamedSchema::Enum(e) => Ok(write_enum(e, namespace)),
            NamedSchema::Fixed(f) => Ok(write_fixed(f, namespace)),
            NamedSchema::Protocol(p) => self.write_protocol(p, namespace),
            NamedSchema::AbstractBase(base) => self.write_abstract_base(base, namespace),
        }
    }

    fn write_branches(
        &mut self,
        branches: &[AvroSchema],
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        branches
            .iter()
            .map(|branch| self.write_in(branch, namespace))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn write_abstract_base(
        &mut self,
        base: &AbstractRecordSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        self.write_branches(&base.derived, namespace)
    }

    fn write_record(
        &mut self,
        record: &RecordSchema,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        let mut obj = header(kind, &record.name, namespace);
        insert_doc_and_aliases(&mut obj, record.doc.as_deref(), &record.aliases);

        let inner = record.name.namespace();
        let fields = record
            .fields
            .iter()
            .map(|f| self.write_field(f, inner))
            .collect::<Result<Vec<_>, _>>()?;
        obj.insert("fields".to_string(), Value::Array(fields));

        extend_properties(&mut obj, &record.properties);
        Ok(Value::Object(obj))
    }

    fn write_field(
        &mut self,
        field: &FieldSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&field.name));
        obj.insert(
            "type".to_string(),
            self.write_in(&field.declared_type, namespace)?,
        );

        if let Some(default) = &field.default {
            obj.insert("default".to_string(), default.clone());
        }

        if let Some(doc) = &field.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        if let Some(order) = field.order {
            obj.insert("order".to_string(), json!(order.as_str()));
        }

        if !field.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&field.aliases));
        }

        extend_properties(&mut obj, &field.properties);
        Ok(Value::Object(obj))
    }

    fn write_logical(
        &mut self,
        logical: &LogicalSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        // A fixed declared with this logical type carries it in its own definition.
        if let AvroSchema::Fixed(id) = *logical.underlying {
            let annotated = self
                .registry
                .get(id)
                .and_then(NamedSchema::as_fixed)
                .and_then(|f| f.logical_type.as_ref());
            if annotated == Some(&logical.logical_type) {
                return self.write_in(&logical.underlying, namespace);
            }
        }

        let mut obj = match self.write_in(&logical.underlying, namespace)? {
            Value::Object(obj) => obj,
            other => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), other);
                obj
            }
        };
        insert_logical(&mut obj, &logical.logical_type);
        Ok(Value::Object(obj))
    }

    fn write_protocol(
        &mut self,
        protocol: &ProtocolSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        let mut obj = Map::new();
        obj.insert("protocol".to_string(), json!(protocol.name.name()));
        if let Some(ns) = protocol.name.namespace().filter(|ns| Some(*ns) != namespace) {
            obj.insert("namespace".to_string(), json!(ns));
        }
        if let Some(doc) = &protocol.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        let inner = protocol.name.namespace();
        let types = protocol
            .types
            .iter()
            .map(|t| self.write_in(t, inner))
            .collect::<Result<Vec<_>, _>>()?;
        obj.insert("types".to_string(), Value::Array(types));

        let mut messages = Map::new();
        for message in &protocol.messages {
            messages.insert(message.name.clone(), self.write_message(message, inner)?);
        }
        obj.insert("messages".to_string(), Value::Object(messages));

        extend_properties(&mut obj, &protocol.properties);
        Ok(Value::Object(obj))
    }

    fn write_message(
        &mut self,
        message: &MessageSchema,
        namespace: Option<&str>,
    ) -> Result<Value, SchemaError> {
        let mut obj = Map::new();
        if let Some(doc) = &message.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        let request = message
            .request
            .iter()
            .map(|f| self.write_field(f, namespace))
            .collect::<Result<Vec<_>, _>>()?;
        obj.insert("request".to_string(), Value::Array(request));
        obj.insert(
            "response".to_string(),
            self.write_in(&message.response, namespace)?,
        );

        // The leading `string` error is implicit.
        let declared_errors = message.errors.get(1..).unwrap_or_default();
        if !declared_errors.is_empty() {
            obj.insert(
                "errors".to_string(),
                self.write_branches(declared_errors, namespace)?,
            );
        }

        if message.one_way {
            obj.insert("one-way".to_string(), json!(true));
        }

        extend_properties(&mut obj, &message.properties);
        Ok(Value::Object(obj))
    }
}

/// The bare name inside its own namespace, else the qualified name.
fn reference_name(name: &SchemaName, namespace: Option<&str>) -> String {
    if name.namespace() == namespace {
        name.name().to_string()
    } else {
        name.full_name()
    }
}

fn header(kind: &str, name: &SchemaName, namespace: Option<&str>) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(kind));
    obj.insert("name".to_string(), json!(name.name()));
    if let Some(ns) = name.namespace().filter(|ns| Some(*ns) != namespace) {
        obj.insert("namespace".to_string(), json!(ns));
    }
    obj
}

fn insert_doc_and_aliases(obj: &mut Map<String, Value>, doc: Option<&str>, aliases: &[String]) {
    if let Some(doc) = doc {
        obj.insert("doc".to_string(), json!(doc));
    }
    if !aliases.is_empty() {
        obj.insert("aliases".to_string(), json!(aliases));
    }
}

fn extend_properties(obj: &mut Map<String, Value>, properties: &Map<String, Value>) {
    for (key, value) in properties {
        obj.insert(key.clone(), value.clone());
    }
}

fn write_enum(schema: &EnumSchema, namespace: Option<&str>) -> Value {
    let mut obj = header("enum", &schema.name, namespace);
    insert_doc_and_aliases(&mut obj, schema.doc.as_deref(), &schema.aliases);
    obj.insert("symbols".to_string(), json!(&schema.symbols));
    if let Some(default) = &schema.default {
        obj.insert("default".to_string(), json!(default));
    }
    extend_properties(&mut obj, &schema.properties);
    Value::Object(obj)
}

fn insert_logical(obj: &mut Map<String, Value>, logical_type: &LogicalTypeName) {
    obj.insert("logicalType".to_string(), json!(logical_type.name()));
    if let LogicalTypeName::Decimal { precision, scale } = *logical_type {
        obj.insert("precision".to_string(), json!(precision));
        if scale > 0 {
            obj.insert("scale".to_string(), json!(scale));
        }
    }
}

fn write_fixed(schema: &FixedSchema, namespace: Option<&str>) -> Value {
    let mut obj = header("fixed", &schema.name, namespace);
    insert_doc_and_aliases(&mut obj, schema.doc.as_deref(), &schema.aliases);
    obj.insert("size".to_string(), json!(schema.size));
    if let Some(logical_type) = &schema.logical_type {
        insert_logical(&mut obj, logical_type);
    }
    extend_properties(&mut obj, &schema.properties);
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve_schema;

    #[test]
    fn test_primitives_write_as_keywords() {
        let registry = SchemaRegistry::new();
        let mut writer = JsonWriter::new(&registry);
        assert_eq!(writer.write(&AvroSchema::Bytes).unwrap(), json!("bytes"));
        assert_eq!(
            writer
                .write(&AvroSchema::Map(Box::new(AvroSchema::Long)))
                .unwrap(),
            json!({"type": "map", "values": "long"})
        );
    }

    #[test]
    fn test_second_occurrence_is_a_reference() {
        let doc = resolve_schema(&json!({
            "type": "record",
            "name": "Pair",
            "namespace": "geo",
            "fields": [
                {"name": "a", "type": {"type": "fixed", "name": "Coord", "size": 8}},
                {"name": "b", "type": "Coord"},
                {"name": "c", "type": "geo.Coord"}
            ]
        }))
        .unwrap();

        let value = doc.to_json_value().unwrap();
        assert_eq!(value["namespace"], json!("geo"));
        assert_eq!(value["fields"][0]["type"]["type"], json!("fixed"));
        assert!(value["fields"][0]["type"].get("namespace").is_none());
        assert_eq!(value["fields"][1]["type"], json!("Coord"));
        assert_eq!(value["fields"][2]["type"], json!("Coord"));
    }

    #[test]
    fn test_reference_across_namespaces_is_qualified() {
        let name = SchemaName::parse("a.b.C").unwrap();
        assert_eq!(reference_name(&name, Some("a.b")), "C");
        assert_eq!(reference_name(&name, Some("x")), "a.b.C");
        assert_eq!(reference_name(&name, None), "a.b.C");
    }

    #[test]
    fn test_logical_types_keep_parameters() {
        let doc = resolve_schema(&json!({
            "type": "bytes",
            "logicalType": "decimal",
            "precision": 12,
            "scale": 3
        }))
        .unwrap();
        assert_eq!(
            doc.to_json_value().unwrap(),
            json!({"type": "bytes", "logicalType": "decimal", "precision": 12, "scale": 3})
        );
    }

    #[test]
    fn test_annotated_fixed_written_once() {
        let doc = resolve_schema(&json!({
            "type": "record",
            "name": "Ids",
            "fields": [
                {"name": "a", "type": {"type": "fixed", "name": "U", "size": 16, "logicalType": "uuid"}},
                {"name": "b", "type": "U"}
            ]
        }))
        .unwrap();

        let value = doc.to_json_value().unwrap();
        assert_eq!(
            value["fields"][0]["type"],
            json!({"type": "fixed", "name": "U", "size": 16, "logicalType": "uuid"})
        );
        assert_eq!(value["fields"][1]["type"], json!("U"));
    }

    #[test]
    fn test_object_cannot_be_written() {
        let registry = SchemaRegistry::new();
        let mut writer = JsonWriter::new(&registry);
        assert!(writer.write(&AvroSchema::Object).is_err());
    }

    #[test]
    fn test_marks_written() {
        let doc = resolve_schema(&json!({"type": "enum", "name": "E", "symbols": ["A"]})).unwrap();
        let id = doc.registry().lookup("E").unwrap();
        let mut writer = JsonWriter::new(doc.registry());
        assert!(!writer.is_written(id));
        writer.write(doc.root()).unwrap();
        assert!(writer.is_written(id));
        assert_eq!(writer.write(doc.root()).unwrap(), json!("E"));
    }
}
