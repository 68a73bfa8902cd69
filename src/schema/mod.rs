//! Avro schema resolution.
//!
//! This module turns an Avro schema document into a linked type graph:
//! named schemas are registered once per document, references are bound to
//! registry handles, unions are reduced to a representable type, and logical
//! types and default values are mapped onto the target language.

mod binding;
mod defaults;
mod document;
mod logical;
mod names;
mod parser;
mod protocol;
mod registry;
mod types;
mod union;
mod writer;

pub use binding::{field_type_name, type_name};
pub use defaults::{synthesize_default, DefaultLiteral};
pub use document::ResolvedDocument;
pub use logical::{apply_logical_type, parse_logical_type};
pub use names::{
    escape_dotted, escape_identifier, is_reserved_word, pascal_case, validate_identifier,
    SchemaName,
};
pub use parser::{
    parse_schema, parse_schema_with_options, resolve_schema, resolve_schema_with_options,
    SchemaParser, RESERVED_PROPERTIES,
};
pub use registry::SchemaRegistry;
pub use types::*;
pub use union::{
    abstract_base_name, is_abstract_base_candidate, reduce_union, synthesize_abstract_base,
};
pub use writer::JsonWriter;
