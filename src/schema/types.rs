//! Resolved Avro schema types.
//!
//! This module defines the linked type graph produced by resolution:
//! primitives, composites, and handles to the named schemas owned by a
//! [`SchemaRegistry`](super::SchemaRegistry).

use serde_json::{Map, Value};

use super::names::{escape_identifier, SchemaName};

/// Handle to a named schema inside a registry.
///
/// Two references to the same declaration carry the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaRef(pub(crate) usize);

impl SchemaRef {
    /// Position of the entry in registration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A resolved Avro schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroSchema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating-point.
    Float,
    /// 64-bit IEEE 754 floating-point.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Named types
    /// Record type with named fields.
    Record(SchemaRef),
    /// Error type (a record thrown by protocol messages).
    Error(SchemaRef),
    /// Enumeration type.
    Enum(SchemaRef),
    /// Fixed-size byte array.
    Fixed(SchemaRef),
    /// RPC protocol.
    Protocol(SchemaRef),
    /// Synthesized polymorphic base of a union of records.
    AbstractBase(SchemaRef),

    // Composite types
    /// Array of items with a single schema.
    Array(Box<AvroSchema>),
    /// Map with string keys and values of a single schema.
    Map(Box<AvroSchema>),
    /// Union of multiple schemas.
    Union(UnionSchema),
    /// Logical type overlay on a primitive or fixed schema.
    Logical(LogicalSchema),

    /// Boxed representation of a union that does not reduce to one branch.
    /// Only ever appears as a union's underlying schema.
    Object,
}

impl AvroSchema {
    /// Parse a primitive type keyword.
    pub fn primitive(keyword: &str) -> Option<AvroSchema> {
        match keyword {
            "null" => Some(AvroSchema::Null),
            "boolean" => Some(AvroSchema::Boolean),
            "int" => Some(AvroSchema::Int),
            "long" => Some(AvroSchema::Long),
            "float" => Some(AvroSchema::Float),
            "double" => Some(AvroSchema::Double),
            "bytes" => Some(AvroSchema::Bytes),
            "string" => Some(AvroSchema::String),
            _ => None,
        }
    }

    /// Check if this schema is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            AvroSchema::Null
                | AvroSchema::Boolean
                | AvroSchema::Int
                | AvroSchema::Long
                | AvroSchema::Float
                | AvroSchema::Double
                | AvroSchema::Bytes
                | AvroSchema::String
        )
    }

    /// Check if this schema is a handle to a registry entry.
    pub fn is_named(&self) -> bool {
        self.schema_ref().is_some()
    }

    /// Check if this schema is the null type.
    pub fn is_null(&self) -> bool {
        matches!(self, AvroSchema::Null)
    }

    /// The registry handle of a named schema, if applicable.
    pub fn schema_ref(&self) -> Option<SchemaRef> {
        match self {
            AvroSchema::Record(r)
            | AvroSchema::Error(r)
            | AvroSchema::Enum(r)
            | AvroSchema::Fixed(r)
            | AvroSchema::Protocol(r)
            | AvroSchema::AbstractBase(r) => Some(*r),
            _ => None,
        }
    }

    /// The Avro keyword of this schema's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AvroSchema::Null => "null",
            AvroSchema::Boolean => "boolean",
            AvroSchema::Int => "int",
            AvroSchema::Long => "long",
            AvroSchema::Float => "float",
            AvroSchema::Double => "double",
            AvroSchema::Bytes => "bytes",
            AvroSchema::String => "string",
            AvroSchema::Record(_) => "record",
            AvroSchema::Error(_) => "error",
            AvroSchema::Enum(_) => "enum",
            AvroSchema::Fixed(_) => "fixed",
            AvroSchema::Protocol(_) => "protocol",
            AvroSchema::AbstractBase(_) => "abstract",
            AvroSchema::Array(_) => "array",
            AvroSchema::Map(_) => "map",
            AvroSchema::Union(_) => "union",
            AvroSchema::Logical(_) => "logical",
            AvroSchema::Object => "object",
        }
    }

    /// For a union, its reduced schema; otherwise the schema itself.
    pub fn underlying(&self) -> &AvroSchema {
        match self {
            AvroSchema::Union(u) => &u.underlying,
            other => other,
        }
    }

    /// Check if this schema is a union that reduced to a nullable type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, AvroSchema::Union(u) if u.is_nullable)
    }
}

/// A union and its reduction to a single representable type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    /// The branches in declaration order.
    pub branches: Vec<AvroSchema>,
    /// The type the union is represented as; never a union itself.
    pub underlying: Box<AvroSchema>,
    /// Whether the representation must admit null.
    pub is_nullable: bool,
}

/// Logical type overlay on a base schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalSchema {
    /// The underlying Avro schema used for serialization.
    pub underlying: Box<AvroSchema>,
    /// The logical type name and parameters.
    pub logical_type: LogicalTypeName,
}

impl LogicalSchema {
    /// Create a new LogicalSchema.
    pub fn new(underlying: AvroSchema, logical_type: LogicalTypeName) -> Self {
        Self {
            underlying: Box::new(underlying),
            logical_type,
        }
    }

    /// The `logicalType` string.
    pub fn logical_name(&self) -> &'static str {
        self.logical_type.name()
    }
}

/// Logical type names with their parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalTypeName {
    /// Decimal with precision and scale.
    Decimal { precision: u32, scale: u32 },
    /// UUID (string or fixed[16]).
    Uuid,
    /// Date (days since Unix epoch).
    Date,
    /// Time in milliseconds.
    TimeMillis,
    /// Time in microseconds.
    TimeMicros,
    /// Timestamp in milliseconds since Unix epoch.
    TimestampMillis,
    /// Timestamp in microseconds since Unix epoch.
    TimestampMicros,
    /// Duration (months, days, milliseconds in a fixed[12]).
    Duration,
    /// Local timestamp in milliseconds (no timezone).
    LocalTimestampMillis,
    /// Local timestamp in microseconds (no timezone).
    LocalTimestampMicros,
}

impl LogicalTypeName {
    /// Get the string name of the logical type.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalTypeName::Decimal { .. } => "decimal",
            LogicalTypeName::Uuid => "uuid",
            LogicalTypeName::Date => "date",
            LogicalTypeName::TimeMillis => "time-millis",
            LogicalTypeName::TimeMicros => "time-micros",
            LogicalTypeName::TimestampMillis => "timestamp-millis",
            LogicalTypeName::TimestampMicros => "timestamp-micros",
            LogicalTypeName::Duration => "duration",
            LogicalTypeName::LocalTimestampMillis => "local-timestamp-millis",
            LogicalTypeName::LocalTimestampMicros => "local-timestamp-micros",
        }
    }
}

/// Field ordering for record comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    /// Parse an `order` property value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ascending" => Some(FieldOrder::Ascending),
            "descending" => Some(FieldOrder::Descending),
            "ignore" => Some(FieldOrder::Ignore),
            _ => None,
        }
    }

    /// The `order` property value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOrder::Ascending => "ascending",
            FieldOrder::Descending => "descending",
            FieldOrder::Ignore => "ignore",
        }
    }
}

/// A resolved record field (or RPC request parameter).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// The name of the field.
    pub name: String,
    /// The type as declared; an abstract base replaces an eligible union.
    pub declared_type: AvroSchema,
    /// The declared type with any union reduced.
    pub underlying_type: AvroSchema,
    /// Whether the field admits null.
    pub is_nullable: bool,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this field.
    pub aliases: Vec<String>,
    /// The raw `default` value, if present.
    pub default: Option<Value>,
    /// Target-language literal synthesized from `default`.
    pub default_literal: Option<String>,
    /// Explicit `order`, if present.
    pub order: Option<FieldOrder>,
    /// Extension properties.
    pub properties: Map<String, Value>,
    /// Why a present default produced no literal.
    pub remarks: Option<String>,
}

impl FieldSchema {
    /// Create a field, reducing a union type to its underlying type and
    /// nullability.
    pub fn new(name: impl Into<String>, schema: AvroSchema) -> Self {
        let (underlying_type, is_nullable) = match &schema {
            AvroSchema::Union(u) => ((*u.underlying).clone(), u.is_nullable),
            other => (other.clone(), false),
        };
        Self {
            name: name.into(),
            declared_type: schema,
            underlying_type,
            is_nullable,
            doc: None,
            aliases: Vec::new(),
            default: None,
            default_literal: None,
            order: None,
            properties: Map::new(),
            remarks: None,
        }
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// The field name as a target identifier.
    pub fn member_name(&self) -> String {
        escape_identifier(&self.name).into_owned()
    }
}

/// Schema for a record or error type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// The qualified name of the record.
    pub name: SchemaName,
    /// The fields of the record.
    pub fields: Vec<FieldSchema>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this record.
    pub aliases: Vec<String>,
    /// Extension properties.
    pub properties: Map<String, Value>,
    /// Abstract bases this record derives from.
    pub bases: Vec<SchemaRef>,
}

impl RecordSchema {
    /// Create a new RecordSchema with the given name and fields.
    pub fn new(name: SchemaName, fields: Vec<FieldSchema>) -> Self {
        Self {
            name,
            fields,
            doc: None,
            aliases: Vec::new(),
            properties: Map::new(),
            bases: Vec::new(),
        }
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        self.name.full_name()
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    /// The qualified name of the enum.
    pub name: SchemaName,
    /// The symbols (variants) of the enum.
    pub symbols: Vec<String>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this enum.
    pub aliases: Vec<String>,
    /// Default symbol (for schema resolution).
    pub default: Option<String>,
    /// Extension properties.
    pub properties: Map<String, Value>,
}

impl EnumSchema {
    /// Create a new EnumSchema with the given name and symbols.
    pub fn new(name: SchemaName, symbols: Vec<String>) -> Self {
        Self {
            name,
            symbols,
            doc: None,
            aliases: Vec::new(),
            default: None,
            properties: Map::new(),
        }
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        self.name.full_name()
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    /// The qualified name of the fixed type.
    pub name: SchemaName,
    /// The size in bytes.
    pub size: usize,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this fixed type.
    pub aliases: Vec<String>,
    /// Extension properties.
    pub properties: Map<String, Value>,
    /// Logical type declared together with the fixed, applied to every
    /// reference to it.
    pub logical_type: Option<LogicalTypeName>,
}

impl FixedSchema {
    /// Create a new FixedSchema with the given name and size.
    pub fn new(name: SchemaName, size: usize) -> Self {
        Self {
            name,
            size,
            doc: None,
            aliases: Vec::new(),
            properties: Map::new(),
            logical_type: None,
        }
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        self.name.full_name()
    }
}

/// Polymorphic marker synthesized for a union of records.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractRecordSchema {
    /// The synthesized name.
    pub name: SchemaName,
    /// The record (or message) owning the field.
    pub owner: SchemaName,
    /// The field (or parameter) whose union produced this base.
    pub field: String,
    /// The union's branches, in declaration order.
    pub derived: Vec<AvroSchema>,
}

/// A resolved RPC message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /// The message name.
    pub name: String,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Request parameters in declaration order.
    pub request: Vec<FieldSchema>,
    /// The response type as declared.
    pub response: AvroSchema,
    /// The response with any union reduced.
    pub response_underlying: AvroSchema,
    /// Whether the response admits null.
    pub response_nullable: bool,
    /// Error types, starting with the implicit `string`.
    pub errors: Vec<AvroSchema>,
    /// Whether the message expects no response.
    pub one_way: bool,
    /// Extension properties.
    pub properties: Map<String, Value>,
}

/// Schema for an RPC protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolSchema {
    /// The qualified protocol name.
    pub name: SchemaName,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Named types declared by the protocol.
    pub types: Vec<AvroSchema>,
    /// Messages in declaration order.
    pub messages: Vec<MessageSchema>,
    /// Extension properties.
    pub properties: Map<String, Value>,
}

impl ProtocolSchema {
    /// Find a message by name.
    pub fn message(&self, name: &str) -> Option<&MessageSchema> {
        self.messages.iter().find(|m| m.name == name)
    }
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum NamedSchema {
    Record(RecordSchema),
    Error(RecordSchema),
    Enum(EnumSchema),
    Fixed(FixedSchema),
    Protocol(ProtocolSchema),
    AbstractBase(AbstractRecordSchema),
}

impl NamedSchema {
    /// The qualified name of the entry.
    pub fn name(&self) -> &SchemaName {
        match self {
            NamedSchema::Record(r) | NamedSchema::Error(r) => &r.name,
            NamedSchema::Enum(e) => &e.name,
            NamedSchema::Fixed(f) => &f.name,
            NamedSchema::Protocol(p) => &p.name,
            NamedSchema::AbstractBase(a) => &a.name,
        }
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        self.name().full_name()
    }

    /// Documentation, if any.
    pub fn doc(&self) -> Option<&str> {
        match self {
            NamedSchema::Record(r) | NamedSchema::Error(r) => r.doc.as_deref(),
            NamedSchema::Enum(e) => e.doc.as_deref(),
            NamedSchema::Fixed(f) => f.doc.as_deref(),
            NamedSchema::Protocol(p) => p.doc.as_deref(),
            NamedSchema::AbstractBase(_) => None,
        }
    }

    /// Aliases, in declaration order.
    pub fn aliases(&self) -> &[String] {
        match self {
            NamedSchema::Record(r) | NamedSchema::Error(r) => &r.aliases,
            NamedSchema::Enum(e) => &e.aliases,
            NamedSchema::Fixed(f) => &f.aliases,
            NamedSchema::Protocol(_) | NamedSchema::AbstractBase(_) => &[],
        }
    }

    /// The schema value referring to this entry.
    ///
    /// A fixed declared with a logical type yields the logical overlay.
    pub fn to_schema(&self, id: SchemaRef) -> AvroSchema {
        match self {
            NamedSchema::Record(_) => AvroSchema::Record(id),
            NamedSchema::Error(_) => AvroSchema::Error(id),
            NamedSchema::Enum(_) => AvroSchema::Enum(id),
            NamedSchema::Fixed(f) => match &f.logical_type {
                Some(logical_type) => AvroSchema::Logical(LogicalSchema::new(
                    AvroSchema::Fixed(id),
                    logical_type.clone(),
                )),
                None => AvroSchema::Fixed(id),
            },
            NamedSchema::Protocol(_) => AvroSchema::Protocol(id),
            NamedSchema::AbstractBase(_) => AvroSchema::AbstractBase(id),
        }
    }

    /// The record payload of a record or error.
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            NamedSchema::Record(r) | NamedSchema::Error(r) => Some(r),
            _ => None,
        }
    }

    /// The enum payload.
    pub fn as_enum(&self) -> Option<&EnumSchema> {
        match self {
            NamedSchema::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// The fixed payload.
    pub fn as_fixed(&self) -> Option<&FixedSchema> {
        match self {
            NamedSchema::Fixed(f) => Some(f),
            _ => None,
        }
    }

    /// The protocol payload.
    pub fn as_protocol(&self) -> Option<&ProtocolSchema> {
        match self {
            NamedSchema::Protocol(p) => Some(p),
            _ => None,
        }
    }

    /// The abstract base payload.
    pub fn as_abstract_base(&self) -> Option<&AbstractRecordSchema> {
        match self {
            NamedSchema::AbstractBase(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_types() {
        for keyword in ["null", "boolean", "int", "long", "float", "double", "bytes", "string"] {
            let schema = AvroSchema::primitive(keyword).unwrap();
            assert!(schema.is_primitive());
            assert_eq!(schema.kind(), keyword);
        }
        assert_eq!(AvroSchema::primitive("record"), None);
    }

    #[test]
    fn test_named_handles() {
        let schema = AvroSchema::Record(SchemaRef(3));
        assert!(schema.is_named());
        assert_eq!(schema.schema_ref(), Some(SchemaRef(3)));
        assert!(!AvroSchema::Array(Box::new(schema)).is_named());
    }

    #[test]
    fn test_union_underlying() {
        let union = AvroSchema::Union(UnionSchema {
            branches: vec![AvroSchema::Null, AvroSchema::String],
            underlying: Box::new(AvroSchema::String),
            is_nullable: true,
        });
        assert!(union.is_nullable());
        assert_eq!(union.underlying(), &AvroSchema::String);
        assert!(!AvroSchema::String.is_nullable());

        let field = FieldSchema::new("name", union);
        assert_eq!(field.underlying_type, AvroSchema::String);
        assert!(field.is_nullable);
    }

    #[test]
    fn test_record_schema() {
        let name = SchemaName::parse("com.example.User").unwrap();
        let record = RecordSchema::new(
            name,
            vec![
                FieldSchema::new("id", AvroSchema::Long),
                FieldSchema::new("class", AvroSchema::String).with_doc("reserved"),
            ],
        );

        assert_eq!(record.fullname(), "com.example.User");
        assert_eq!(record.field("class").unwrap().member_name(), "@class");
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn test_enum_symbol_index() {
        let symbols = vec!["RED".to_string(), "GREEN".to_string(), "BLUE".to_string()];
        let enum_schema = EnumSchema::new(SchemaName::new("Color"), symbols);

        assert_eq!(enum_schema.symbol_index("GREEN"), Some(1));
        assert_eq!(enum_schema.symbol_index("YELLOW"), None);
    }

    #[test]
    fn test_field_order_parse() {
        assert_eq!(FieldOrder::parse("descending"), Some(FieldOrder::Descending));
        assert_eq!(FieldOrder::parse("sideways"), None);
        assert_eq!(FieldOrder::Ignore.as_str(), "ignore");
    }

    #[test]
    fn test_logical_names() {
        let decimal = LogicalSchema::new(
            AvroSchema::Bytes,
            LogicalTypeName::Decimal {
                precision: 10,
                scale: 2,
            },
        );
        assert_eq!(decimal.logical_name(), "decimal");
        assert_eq!(*decimal.underlying, AvroSchema::Bytes);
        assert_eq!(LogicalTypeName::LocalTimestampMicros.name(), "local-timestamp-micros");
    }

    #[test]
    fn test_named_schema_accessors() {
        let fixed = NamedSchema::Fixed(FixedSchema::new(SchemaName::new("MD5"), 16));
        assert_eq!(fixed.fullname(), "MD5");
        assert_eq!(fixed.to_schema(SchemaRef(0)), AvroSchema::Fixed(SchemaRef(0)));
        assert_eq!(fixed.as_fixed().map(|f| f.size), Some(16));
        assert!(fixed.as_record().is_none());
        assert!(fixed.aliases().is_empty());
    }

    #[test]
    fn test_annotated_fixed_refers_as_logical() {
        let mut uuid = FixedSchema::new(SchemaName::new("U"), 16);
        uuid.logical_type = Some(LogicalTypeName::Uuid);
        let entry = NamedSchema::Fixed(uuid);

        match entry.to_schema(SchemaRef(2)) {
            AvroSchema::Logical(l) => {
                assert_eq!(*l.underlying, AvroSchema::Fixed(SchemaRef(2)));
                assert_eq!(l.logical_type, LogicalTypeName::Uuid);
            }
            other => panic!("Expected Logical schema, got {:?}", other),
        }
    }
}
