//! Target-language type names.
//!
//! Maps any resolved schema to the type a code generator would declare for
//! it. Named schemas map to their escaped qualified name.

use crate::schema::{AvroSchema, FieldSchema, SchemaRegistry};

const LIST_TYPE: &str = "System.Collections.Generic.IList";
const DICTIONARY_TYPE: &str = "System.Collections.Generic.IDictionary";

/// The target type name of a schema.
///
/// Unions map to their underlying type, with `?` appended when nullable.
///
/// # Example
/// ```
/// use avrolink::schema::{parse_schema, type_name};
///
/// let doc = parse_schema(r#"{"type": "map", "values": ["null", "long"]}"#).unwrap();
/// assert_eq!(
///     type_name(doc.root(), doc.registry()),
///     "System.Collections.Generic.IDictionary<string, long?>"
/// );
/// ```
pub fn type_name(schema: &AvroSchema, registry: &SchemaRegistry) -> String {
    match schema {
        AvroSchema::Null | AvroSchema::Object => "object".to_string(),
        AvroSchema::Boolean => "bool".to_string(),
        AvroSchema::Int => "int".to_string(),
        AvroSchema::Long => "long".to_string(),
        AvroSchema::Float => "float".to_string(),
        AvroSchema::Double => "double".to_string(),
        AvroSchema::Bytes => "byte[]".to_string(),
        AvroSchema::String => "string".to_string(),
        AvroSchema::Record(_)
        | AvroSchema::Error(_)
        | AvroSchema::Enum(_)
        | AvroSchema::Fixed(_)
        | AvroSchema::Protocol(_)
        | AvroSchema::AbstractBase(_) => registry.name_of(schema).escaped_full_name(),
        AvroSchema::Array(items) => format!("{}<{}>", LIST_TYPE, type_name(items, registry)),
        AvroSchema::Map(values) => format!(
            "{}<string, {}>",
            DICTIONARY_TYPE,
            type_name(values, registry)
        ),
        AvroSchema::Union(u) => nullable(type_name(&u.underlying, registry), u.is_nullable),
        AvroSchema::Logical(l) => l.logical_type.target_type().to_string(),
    }
}

/// The target type name of a field's underlying type.
pub fn field_type_name(field: &FieldSchema, registry: &SchemaRegistry) -> String {
    nullable(type_name(&field.underlying_type, registry), field.is_nullable)
}

fn nullable(name: String, is_nullable: bool) -> String {
    if is_nullable {
        format!("{}?", name)
    } else {
        name
    }
}
