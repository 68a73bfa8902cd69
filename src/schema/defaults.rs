//! Default value literals.
//!
//! Turns a field's raw JSON `default` into a target-language literal,
//! directed by the field's declared type. Only scalar shapes are handled;
//! complex defaults are left to the emitter.

use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::names::escape_identifier;
use crate::schema::{AvroSchema, NamedSchema, SchemaRegistry};

/// Outcome of default synthesis for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultLiteral {
    /// A literal consistent with the field type.
    Literal(String),
    /// The declared type is not handled; carries the type kind.
    Unsupported(&'static str),
}

impl DefaultLiteral {
    /// The literal, if one was produced.
    pub fn literal(&self) -> Option<&str> {
        match self {
            DefaultLiteral::Literal(s) => Some(s),
            DefaultLiteral::Unsupported(_) => None,
        }
    }

    /// Explanation for a missing literal, suitable for field remarks.
    pub fn remark(&self) -> Option<String> {
        match self {
            DefaultLiteral::Literal(_) => None,
            DefaultLiteral::Unsupported(kind) => Some(format!(
                "default value for a field of type '{}' is not synthesized",
                kind
            )),
        }
    }
}

/// Synthesize a literal for `default` given the field's declared type.
///
/// # Errors
/// A default of the wrong JSON kind for a handled type, an enum default that
/// is not a symbol, or a bytes default with code points above 0xFF.
pub fn synthesize_default(
    declared: &AvroSchema,
    default: &Value,
    registry: &SchemaRegistry,
    node: &Value,
) -> Result<DefaultLiteral, SchemaError> {
    let mismatch = || {
        SchemaError::invalid(
            format!(
                "default value {} does not match field type '{}'",
                default,
                declared.kind()
            ),
            node,
        )
    };

    let literal = match declared {
        AvroSchema::Null => match default {
            Value::Null => "null".to_string(),
            _ => return Err(mismatch()),
        },
        AvroSchema::Boolean => match default {
            Value::Bool(b) => b.to_string(),
            _ => return Err(mismatch()),
        },
        AvroSchema::Int => match default.as_i64() {
            Some(v) if i32::try_from(v).is_ok() => v.to_string(),
            _ if default.is_i64() || default.is_u64() => {
                return Err(SchemaError::invalid(
                    format!("int default {} is out of range", default),
                    node,
                ))
            }
            _ => return Err(mismatch()),
        },
        AvroSchema::Long => match default {
            Value::Number(n) if n.is_i64() => n.to_string(),
            Value::Number(n) if n.is_u64() => {
                return Err(SchemaError::invalid(
                    format!("long default {} is out of range", n),
                    node,
                ))
            }
            _ => return Err(mismatch()),
        },
        AvroSchema::Float => match default {
            Value::Number(n) => format!("{}f", n),
            _ => return Err(mismatch()),
        },
        AvroSchema::Double => match default {
            Value::Number(n) => n.to_string(),
            _ => return Err(mismatch()),
        },
        AvroSchema::String => match default {
            Value::String(_) => default.to_string(),
            _ => return Err(mismatch()),
        },
        AvroSchema::Bytes => match default {
            Value::String(s) => bytes_literal(s).ok_or_else(|| {
                SchemaError::invalid(
                    "bytes default may only contain code points up to \\u00FF",
                    node,
                )
            })?,
            _ => return Err(mismatch()),
        },
        AvroSchema::Enum(id) => {
            let Some(NamedSchema::Enum(e)) = registry.get(*id) else {
                return Err(mismatch());
            };
            match default.as_str() {
                Some(symbol) if e.symbol_index(symbol).is_some() => format!(
                    "{}.{}",
                    e.name.escaped_full_name(),
                    escape_identifier(symbol)
                ),
                _ => {
                    return Err(SchemaError::invalid(
                        format!("default {} is not a symbol of enum '{}'", default, e.name),
                        node,
                    ))
                }
            }
        }
        AvroSchema::Record(_)
        | AvroSchema::Error(_)
        | AvroSchema::Fixed(_)
        | AvroSchema::Protocol(_)
        | AvroSchema::AbstractBase(_)
        | AvroSchema::Array(_)
        | AvroSchema::Map(_)
        | AvroSchema::Union(_)
        | AvroSchema::Logical(_)
        | AvroSchema::Object => return Ok(DefaultLiteral::Unsupported(declared.kind())),
    };

    Ok(DefaultLiteral::Literal(literal))
}

/// `new byte[] { 0x.., ... }` for an Avro bytes default, where each code
/// point of the JSON string is one byte.
fn bytes_literal(s: &str) -> Option<String> {
    let bytes = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;

    if bytes.is_empty() {
        return Some("new byte[0]".to_string());
    }
    let items = bytes
        .iter()
        .map(|b| format!("0x{:02X}", b))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("new byte[] {{ {} }}", items))
}
