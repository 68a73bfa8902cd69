//! Logical type mapping.
//!
//! Logical types are overlays: the underlying schema stays fully resolved
//! and is what gets serialized, while the logical name selects a richer
//! target type. Unknown logical names fall back to the underlying schema.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{AvroSchema, LogicalSchema, LogicalTypeName, SchemaRegistry};

impl LogicalTypeName {
    /// Target-language type the logical type maps to.
    pub fn target_type(&self) -> &'static str {
        match self {
            LogicalTypeName::Date => "System.DateOnly",
            LogicalTypeName::Decimal { .. } => "decimal",
            LogicalTypeName::Duration => "System.TimeSpan",
            LogicalTypeName::TimeMillis | LogicalTypeName::TimeMicros => "System.TimeOnly",
            LogicalTypeName::TimestampMillis | LogicalTypeName::TimestampMicros => {
                "System.DateTimeOffset"
            }
            LogicalTypeName::LocalTimestampMillis | LogicalTypeName::LocalTimestampMicros => {
                "System.DateTime"
            }
            LogicalTypeName::Uuid => "System.Guid",
        }
    }

    /// Check whether the logical type may annotate `underlying`.
    pub fn accepts(&self, underlying: &AvroSchema, registry: &SchemaRegistry) -> bool {
        let fixed_size = match underlying {
            AvroSchema::Fixed(id) => registry.get(*id).and_then(|e| e.as_fixed()).map(|f| f.size),
            _ => None,
        };
        match self {
            LogicalTypeName::Date | LogicalTypeName::TimeMillis => {
                matches!(underlying, AvroSchema::Int)
            }
            LogicalTypeName::TimeMicros
            | LogicalTypeName::TimestampMillis
            | LogicalTypeName::TimestampMicros
            | LogicalTypeName::LocalTimestampMillis
            | LogicalTypeName::LocalTimestampMicros => matches!(underlying, AvroSchema::Long),
            LogicalTypeName::Decimal { .. } => {
                matches!(underlying, AvroSchema::Bytes) || fixed_size.is_some()
            }
            LogicalTypeName::Duration => fixed_size == Some(12),
            LogicalTypeName::Uuid => {
                matches!(underlying, AvroSchema::String) || fixed_size == Some(16)
            }
        }
    }
}

/// Parse a `logicalType` string and its parameters.
///
/// Returns `Ok(None)` for logical names outside the known table.
pub fn parse_logical_type(
    logical_name: &str,
    obj: &Map<String, Value>,
    node: &Value,
) -> Result<Option<LogicalTypeName>, SchemaError> {
    let logical_type = match logical_name {
        "decimal" => {
            let precision = obj
                .get("precision")
                .and_then(Value::as_u64)
                .filter(|p| *p > 0 && *p <= u64::from(u32::MAX))
                .ok_or_else(|| {
                    SchemaError::invalid("decimal requires a positive integer 'precision'", node)
                })? as u32;

            let scale = match obj.get("scale") {
                None => 0,
                Some(v) => v
                    .as_u64()
                    .filter(|s| *s <= u64::from(precision))
                    .ok_or_else(|| {
                        SchemaError::invalid(
                            "decimal 'scale' must be a non-negative integer not above 'precision'",
                            node,
                        )
                    })? as u32,
            };

            LogicalTypeName::Decimal { precision, scale }
        }
        "uuid" => LogicalTypeName::Uuid,
        "date" => LogicalTypeName::Date,
        "time-millis" => LogicalTypeName::TimeMillis,
        "time-micros" => LogicalTypeName::TimeMicros,
        "timestamp-millis" => LogicalTypeName::TimestampMillis,
        "timestamp-micros" => LogicalTypeName::TimestampMicros,
        "duration" => LogicalTypeName::Duration,
        "local-timestamp-millis" => LogicalTypeName::LocalTimestampMillis,
        "local-timestamp-micros" => LogicalTypeName::LocalTimestampMicros,
        _ => return Ok(None),
    };
    Ok(Some(logical_type))
}

/// Layer a logical type over an already resolved underlying schema.
pub fn apply_logical_type(
    logical_name: &str,
    underlying: AvroSchema,
    obj: &Map<String, Value>,
    registry: &SchemaRegistry,
    node: &Value,
) -> Result<AvroSchema, SchemaError> {
    let Some(logical_type) = parse_logical_type(logical_name, obj, node)? else {
        debug!(
            logical_type = logical_name,
            underlying = underlying.kind(),
            "Ignoring unknown logical type"
        );
        return Ok(underlying);
    };

    if !logical_type.accepts(&underlying, registry) {
        return Err(SchemaError::invalid(
            format!(
                "logical type '{}' cannot annotate '{}'",
                logical_name,
                registry.name_of(&underlying)
            ),
            node,
        ));
    }

    Ok(AvroSchema::Logical(LogicalSchema::new(
        underlying,
        logical_type,
    )))
}
