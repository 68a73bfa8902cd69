//! JSON schema resolver for Avro schemas.
//!
//! Walks an Avro schema document once, registering every named schema and
//! linking every reference, and produces a [`ResolvedDocument`].

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{NameError, SchemaError};
use crate::options::ResolverOptions;
use crate::schema::defaults::synthesize_default;
use crate::schema::logical::apply_logical_type;
use crate::schema::names::validate_identifier;
use crate::schema::union::{is_abstract_base_candidate, reduce_union, synthesize_abstract_base};
use crate::schema::{
    AvroSchema, EnumSchema, FieldOrder, FieldSchema, FixedSchema, NamedSchema, RecordSchema,
    ResolvedDocument, SchemaName, SchemaRegistry,
};

/// Property names with a fixed meaning; all others are extension properties.
pub const RESERVED_PROPERTIES: &[&str] = &[
    "type",
    "name",
    "namespace",
    "fields",
    "items",
    "size",
    "symbols",
    "values",
    "aliases",
    "order",
    "doc",
    "default",
    "logicalType",
];

/// Parse and resolve an Avro schema from a JSON string.
///
/// # Example
/// ```
/// use avrolink::schema::parse_schema;
///
/// let doc = parse_schema(r#"{"type": "fixed", "name": "MD5", "size": 16}"#).unwrap();
/// assert_eq!(doc.get("MD5").unwrap().fullname(), "MD5");
/// ```
pub fn parse_schema(json: &str) -> Result<ResolvedDocument, SchemaError> {
    parse_schema_with_options(json, ResolverOptions::default())
}

/// Parse and resolve an Avro schema from a JSON string with options.
///
/// # Errors
/// `ParseError` for invalid JSON text, `InvalidSchema` for everything the
/// resolver rejects.
pub fn parse_schema_with_options(
    json: &str,
    options: ResolverOptions,
) -> Result<ResolvedDocument, SchemaError> {
    let value: Value = serde_json::from_str(json)?;
    resolve_schema_with_options(&value, options)
}

/// Resolve an already parsed schema document.
pub fn resolve_schema(value: &Value) -> Result<ResolvedDocument, SchemaError> {
    resolve_schema_with_options(value, ResolverOptions::default())
}

/// Resolve an already parsed schema document with options.
pub fn resolve_schema_with_options(
    value: &Value,
    options: ResolverOptions,
) -> Result<ResolvedDocument, SchemaError> {
    let mut parser = SchemaParser::with_options(options);
    let root = parser.parse(value)?;
    Ok(parser.finish(root))
}

/// A declared type together with its union reduction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlotType {
    pub declared: AvroSchema,
    pub underlying: AvroSchema,
    pub is_nullable: bool,
}

/// Name, documentation, aliases and extension properties of a named schema.
struct NamedHeader {
    name: SchemaName,
    doc: Option<String>,
    aliases: Vec<String>,
    properties: Map<String, Value>,
}

/// Schema resolver holding the registry for one document.
#[derive(Debug, Default)]
pub struct SchemaParser {
    pub(super) registry: SchemaRegistry,
    pub(super) options: ResolverOptions,
}

impl SchemaParser {
    /// Create a new SchemaParser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new SchemaParser with the given options.
    pub fn with_options(options: ResolverOptions) -> Self {
        Self {
            registry: SchemaRegistry::new(),
            options,
        }
    }

    /// The options in effect.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Named schemas registered so far.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Resolve a document root.
    pub fn parse(&mut self, value: &Value) -> Result<AvroSchema, SchemaError> {
        self.resolve(value, None)
    }

    /// Hand the registry over to a [`ResolvedDocument`] rooted at `root`.
    pub fn finish(self, root: AvroSchema) -> ResolvedDocument {
        ResolvedDocument::new(root, self.registry)
    }

    /// Resolve one node within the containing namespace.
    pub fn resolve(
        &mut self,
        node: &Value,
        namespace: Option<&str>,
    ) -> Result<AvroSchema, SchemaError> {
        match node {
            Value::String(s) => self.resolve_reference(s, namespace, node),
            Value::Object(obj) => self.resolve_object(obj, namespace, node),
            Value::Array(branches) => self.resolve_union(branches, namespace),
            _ => Err(SchemaError::invalid(
                "expected a type name, a schema object, or a union array",
                node,
            )),
        }
    }

    /// Resolve a primitive keyword or a reference to a declared schema.
    ///
    /// Unqualified names are looked up in the containing namespace first,
    /// then without a namespace.
    fn resolve_reference(
        &self,
        reference: &str,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        if let Some(primitive) = AvroSchema::primitive(reference) {
            return Ok(primitive);
        }

        let name = SchemaName::resolve(reference, None, namespace)
            .map_err(|e| SchemaError::invalid(e.to_string(), node))?;

        let found = self.registry.resolve_reference(&name).or_else(|| {
            if namespace.is_some() && !reference.contains('.') {
                self.registry.resolve_reference(&SchemaName::new(reference))
            } else {
                None
            }
        });

        match found.and_then(|id| self.registry.schema_of(id)) {
            Some(schema) => Ok(schema),
            None => Err(SchemaError::invalid(
                format!("unknown schema '{}'", name),
                node,
            )),
        }
    }

    /// Route a schema object on its `type`, `logicalType` or `protocol`.
    ///
    /// An object with a `type` is never a protocol; `protocol` is then an
    /// extension property.
    fn resolve_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        if obj.contains_key("protocol") && !obj.contains_key("type") {
            return self.resolve_protocol(obj, namespace, node);
        }

        if let Some(logical) = obj.get("logicalType") {
            let logical_name = logical
                .as_str()
                .ok_or_else(|| SchemaError::invalid("'logicalType' must be a string", node))?;
            return self.resolve_logical(logical_name, obj, namespace, node);
        }

        self.resolve_typed(obj, namespace, node)
    }

    /// Layer a logical type over the object's `type`.
    ///
    /// A fixed declared here keeps the logical type in its registry entry so
    /// that later references resolve to the same overlay.
    fn resolve_logical(
        &mut self,
        logical_name: &str,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        let declares_fixed = obj.get("type").and_then(Value::as_str) == Some("fixed");

        let underlying = match self.resolve_typed(obj, namespace, node)? {
            // A reference to an annotated fixed is re-annotated from the bare fixed.
            AvroSchema::Logical(l) if l.underlying.is_named() => *l.underlying,
            other => other,
        };
        let declared_fixed = match &underlying {
            AvroSchema::Fixed(id) if declares_fixed => Some(*id),
            _ => None,
        };

        let schema = apply_logical_type(logical_name, underlying, obj, &self.registry, node)?;

        if let (Some(id), AvroSchema::Logical(l)) = (declared_fixed, &schema) {
            if let Some(NamedSchema::Fixed(f)) = self.registry.get_mut(id) {
                f.logical_type = Some(l.logical_type.clone());
            }
        }
        Ok(schema)
    }

    fn resolve_typed(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::invalid("missing required property 'type'", node))?;

        let type_name = match type_value {
            Value::String(s) => s.as_str(),
            Value::Object(_) | Value::Array(_) => return self.resolve(type_value, namespace),
            _ => {
                return Err(SchemaError::invalid(
                    "'type' must be a string, an object, or an array",
                    node,
                ))
            }
        };

        match type_name {
            "record" => self.resolve_record(obj, namespace, node, false),
            "error" => self.resolve_record(obj, namespace, node, true),
            "enum" => self.resolve_enum(obj, namespace, node),
            "fixed" => self.resolve_fixed(obj, namespace, node),
            "array" => {
                let items = obj.get("items").ok_or_else(|| {
                    SchemaError::invalid("array requires an 'items' schema", node)
                })?;
                Ok(AvroSchema::Array(Box::new(self.resolve(items, namespace)?)))
            }
            "map" => {
                let values = obj.get("values").ok_or_else(|| {
                    SchemaError::invalid("map requires a 'values' schema", node)
                })?;
                Ok(AvroSchema::Map(Box::new(self.resolve(values, namespace)?)))
            }
            other => self.resolve_reference(other, namespace, type_value),
        }
    }

    /// Resolve the branches of a union and reduce them.
    fn resolve_union(
        &mut self,
        branches: &[Value],
        namespace: Option<&str>,
    ) -> Result<AvroSchema, SchemaError> {
        let branches = branches
            .iter()
            .map(|branch| self.resolve(branch, namespace))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AvroSchema::Union(reduce_union(branches, &self.options)))
    }

    /// Resolve a record or error.
    ///
    /// The record is registered before its fields are resolved so that the
    /// fields may refer back to it.
    fn resolve_record(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
        is_error: bool,
    ) -> Result<AvroSchema, SchemaError> {
        let kind = if is_error { "error" } else { "record" };
        let header = self.resolve_header(obj, namespace, node, kind)?;

        let fields_value = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::invalid(format!("{} requires a 'fields' array", kind), node))?;

        let name = header.name.clone();
        let record = RecordSchema {
            name: header.name,
            fields: Vec::new(),
            doc: header.doc,
            aliases: header.aliases,
            properties: header.properties,
            bases: Vec::new(),
        };
        let placeholder = if is_error {
            NamedSchema::Error(record)
        } else {
            NamedSchema::Record(record)
        };
        let id = self.registry.register(placeholder, node)?;

        let fields = self.resolve_fields(fields_value, &name)?;

        if let Some(NamedSchema::Record(r) | NamedSchema::Error(r)) = self.registry.get_mut(id) {
            r.fields = fields;
        }

        Ok(if is_error {
            AvroSchema::Error(id)
        } else {
            AvroSchema::Record(id)
        })
    }

    /// Resolve an ordered list of fields owned by `owner`.
    pub(super) fn resolve_fields(
        &mut self,
        fields: &[Value],
        owner: &SchemaName,
    ) -> Result<Vec<FieldSchema>, SchemaError> {
        let mut resolved: Vec<FieldSchema> = Vec::with_capacity(fields.len());
        for node in fields {
            let field = self.resolve_field(node, owner)?;
            if resolved.iter().any(|f| f.name == field.name) {
                return Err(SchemaError::invalid(
                    format!("duplicate field '{}' in '{}'", field.name, owner),
                    node,
                ));
            }
            resolved.push(field);
        }
        Ok(resolved)
    }

    fn resolve_field(
        &mut self,
        node: &Value,
        owner: &SchemaName,
    ) -> Result<FieldSchema, SchemaError> {
        let obj = node
            .as_object()
            .ok_or_else(|| SchemaError::invalid("field must be an object", node))?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::invalid("field requires a string 'name'", node))?;
        self.check_simple_name(name, node)?;

        let type_value = obj.get("type").ok_or_else(|| {
            SchemaError::invalid(format!("field '{}' requires a 'type'", name), node)
        })?;
        let declared = self.resolve(type_value, owner.namespace())?;
        let slot = self.resolve_slot(declared, owner, name, type_value)?;

        let default = obj.get("default").cloned();
        let (default_literal, remarks) = match &default {
            Some(raw) => {
                let synthesized = synthesize_default(&slot.declared, raw, &self.registry, node)?;
                (synthesized.literal().map(String::from), synthesized.remark())
            }
            None => (None, None),
        };

        let order = match obj.get("order") {
            None => None,
            Some(v) => Some(v.as_str().and_then(FieldOrder::parse).ok_or_else(|| {
                SchemaError::invalid(
                    "'order' must be one of 'ascending', 'descending', 'ignore'",
                    node,
                )
            })?),
        };

        Ok(FieldSchema {
            name: name.to_string(),
            declared_type: slot.declared,
            underlying_type: slot.underlying,
            is_nullable: slot.is_nullable,
            doc: optional_str(obj, "doc", node)?.map(String::from),
            aliases: string_list(obj, "aliases", node)?,
            default,
            default_literal,
            order,
            properties: extension_properties(obj, RESERVED_PROPERTIES),
            remarks,
        })
    }

    /// Reduce a declared type for a field, parameter or response slot.
    ///
    /// A union of records is replaced by its abstract base.
    pub(super) fn resolve_slot(
        &mut self,
        declared: AvroSchema,
        owner: &SchemaName,
        slot: &str,
        node: &Value,
    ) -> Result<SlotType, SchemaError> {
        if let AvroSchema::Union(union) = &declared {
            let is_nullable = union.is_nullable;

            if self.options.synthesize_abstract_bases
                && is_abstract_base_candidate(&union.branches)
            {
                let base = synthesize_abstract_base(&mut self.registry, owner, slot, union, node)?;
                return Ok(SlotType {
                    declared: AvroSchema::AbstractBase(base),
                    underlying: AvroSchema::AbstractBase(base),
                    is_nullable,
                });
            }

            let underlying = (*union.underlying).clone();
            return Ok(SlotType {
                declared,
                underlying,
                is_nullable,
            });
        }

        Ok(SlotType {
            underlying: declared.clone(),
            declared,
            is_nullable: false,
        })
    }

    fn resolve_enum(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        let header = self.resolve_header(obj, namespace, node, "enum")?;

        let symbols_value = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::invalid("enum requires a 'symbols' array", node))?;

        let mut symbols: Vec<String> = Vec::with_capacity(symbols_value.len());
        for value in symbols_value {
            let symbol = value
                .as_str()
                .ok_or_else(|| SchemaError::invalid("enum symbols must be strings", node))?;
            self.check_simple_name(symbol, node)?;
            if symbols.iter().any(|s| s == symbol) {
                return Err(SchemaError::invalid(
                    format!("duplicate enum symbol '{}'", symbol),
                    node,
                ));
            }
            symbols.push(symbol.to_string());
        }

        if symbols.is_empty() {
            return Err(SchemaError::invalid(
                "enum must have at least one symbol",
                node,
            ));
        }

        let default = optional_str(obj, "default", node)?.map(String::from);
        if let Some(d) = &default {
            if !symbols.contains(d) {
                return Err(SchemaError::invalid(
                    format!("enum default '{}' is not one of its symbols", d),
                    node,
                ));
            }
        }

        let id = self.registry.register(
            NamedSchema::Enum(EnumSchema {
                name: header.name,
                symbols,
                doc: header.doc,
                aliases: header.aliases,
                default,
                properties: header.properties,
            }),
            node,
        )?;
        Ok(AvroSchema::Enum(id))
    }

    fn resolve_fixed(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        let header = self.resolve_header(obj, namespace, node, "fixed")?;

        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| {
                SchemaError::invalid("fixed requires a non-negative integer 'size'", node)
            })?;

        let id = self.registry.register(
            NamedSchema::Fixed(FixedSchema {
                name: header.name,
                size,
                doc: header.doc,
                aliases: header.aliases,
                properties: header.properties,
                logical_type: None,
            }),
            node,
        )?;
        Ok(AvroSchema::Fixed(id))
    }

    fn resolve_header(
        &self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
        kind: &str,
    ) -> Result<NamedHeader, SchemaError> {
        let raw_name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::invalid(format!("{} requires a string 'name'", kind), node))?;
        let raw_namespace = optional_str(obj, "namespace", node)?;

        let name = SchemaName::resolve(raw_name, raw_namespace, namespace)
            .map_err(|e| SchemaError::invalid(e.to_string(), node))?;
        self.check_name(&name, node)?;

        Ok(NamedHeader {
            name,
            doc: optional_str(obj, "doc", node)?.map(String::from),
            aliases: string_list(obj, "aliases", node)?,
            properties: extension_properties(obj, RESERVED_PROPERTIES),
        })
    }

    /// Apply the Avro identifier grammar to a qualified name.
    pub(super) fn check_name(&self, name: &SchemaName, node: &Value) -> Result<(), SchemaError> {
        self.enforce(name.validate(), node)
    }

    /// Check a field name, enum symbol or message name.
    pub(super) fn check_simple_name(&self, name: &str, node: &Value) -> Result<(), SchemaError> {
        if name.trim().is_empty() {
            return Err(SchemaError::invalid(NameError::Empty.to_string(), node));
        }
        if name.contains('.') {
            return Err(SchemaError::invalid(
                NameError::Dotted(name.to_string()).to_string(),
                node,
            ));
        }
        self.enforce(validate_identifier(name), node)
    }

    fn enforce(&self, result: Result<(), NameError>, node: &Value) -> Result<(), SchemaError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if self.options.strict_names => Err(SchemaError::invalid(e.to_string(), node)),
            Err(e) => {
                warn!(error = %e, "Accepting name outside the Avro grammar");
                Ok(())
            }
        }
    }
}

/// An optional string property; `null` counts as absent.
pub(super) fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    node: &Value,
) -> Result<Option<&'a str>, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(SchemaError::invalid(
            format!("'{}' must be a string", key),
            node,
        )),
    }
}

/// An optional array of strings, such as `aliases`.
pub(super) fn string_list(
    obj: &Map<String, Value>,
    key: &str,
    node: &Value,
) -> Result<Vec<String>, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    SchemaError::invalid(format!("'{}' must contain only strings", key), node)
                })
            })
            .collect(),
        Some(_) => Err(SchemaError::invalid(
            format!("'{}' must be an array of strings", key),
            node,
        )),
    }
}

/// Every property not in `reserved`, in document order.
pub(super) fn extension_properties(
    obj: &Map<String, Value>,
    reserved: &[&str],
) -> Map<String, Value> {
    obj.iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
