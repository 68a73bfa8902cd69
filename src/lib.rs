//! Avro schema registration and type resolution for code generators
//!
//! This library resolves an Avro schema document (JSON) into a linked type
//! graph: every named schema registered once, every reference bound, unions
//! reduced to a representable type with nullability, logical types mapped to
//! target types, and field defaults rendered as target literals.
//!
//! # Example
//! ```
//! use avrolink::{parse_schema, AvroSchema};
//!
//! let doc = parse_schema(
//!     r#"{"type": "record", "name": "R",
//!         "fields": [{"name": "f", "type": ["null", "string"], "default": null}]}"#,
//! )
//! .unwrap();
//!
//! let field = &doc.record("R").unwrap().fields[0];
//! assert_eq!(field.underlying_type, AvroSchema::String);
//! assert!(field.is_nullable);
//! assert!(field.default_literal.is_none());
//! assert!(field.remarks.is_some());
//! ```

pub mod error;
pub mod options;
pub mod schema;

// Re-export main types
pub use error::{NameError, SchemaError};
pub use options::ResolverOptions;
pub use schema::{
    parse_schema, parse_schema_with_options, resolve_schema, resolve_schema_with_options,
    AbstractRecordSchema, AvroSchema, EnumSchema, FieldSchema, FixedSchema, JsonWriter,
    LogicalSchema, LogicalTypeName, MessageSchema, NamedSchema, ProtocolSchema, RecordSchema,
    ResolvedDocument, SchemaName, SchemaParser, SchemaRef, SchemaRegistry, UnionSchema,
};
