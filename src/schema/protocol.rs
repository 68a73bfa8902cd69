//! Avro protocol resolution.
//!
//! A protocol declares named types and RPC messages. Types are resolved in
//! the protocol's namespace; message parameters follow the same rules as
//! record fields, with the message standing in as their owner.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::parser::{
    extension_properties, optional_str, SchemaParser, RESERVED_PROPERTIES,
};
use crate::schema::{AvroSchema, MessageSchema, NamedSchema, ProtocolSchema, SchemaName};

/// Protocol keys with a fixed meaning, in addition to [`RESERVED_PROPERTIES`].
const PROTOCOL_PROPERTIES: &[&str] = &["protocol", "types", "messages"];

/// Message keys with a fixed meaning.
const MESSAGE_PROPERTIES: &[&str] = &["request", "response", "errors", "one-way", "oneWay", "doc"];

impl SchemaParser {
    /// Resolve a protocol object.
    ///
    /// The protocol is registered before its types so that it cannot be
    /// redeclared by one of them.
    pub(super) fn resolve_protocol(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        node: &Value,
    ) -> Result<AvroSchema, SchemaError> {
        let raw_name = obj
            .get("protocol")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::invalid("'protocol' must be a string", node))?;
        let raw_namespace = optional_str(obj, "namespace", node)?;

        let name = SchemaName::resolve(raw_name, raw_namespace, namespace)
            .map_err(|e| SchemaError::invalid(e.to_string(), node))?;
        self.check_name(&name, node)?;

        let reserved: Vec<&str> = RESERVED_PROPERTIES
            .iter()
            .chain(PROTOCOL_PROPERTIES)
            .copied()
            .collect();

        let protocol_ns = name.namespace().map(String::from);
        let id = self.registry.register(
            NamedSchema::Protocol(ProtocolSchema {
                name: name.clone(),
                doc: optional_str(obj, "doc", node)?.map(String::from),
                types: Vec::new(),
                messages: Vec::new(),
                properties: extension_properties(obj, &reserved),
            }),
            node,
        )?;

        let types = match obj.get("types") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let mut types = Vec::with_capacity(items.len());
                for item in items {
                    let schema = self.resolve(item, protocol_ns.as_deref())?;
                    let named = match &schema {
                        AvroSchema::Logical(l) => l.underlying.is_named(),
                        other => other.is_named(),
                    };
                    if !named {
                        return Err(SchemaError::invalid(
                            format!("protocol types must be named, found '{}'", schema.kind()),
                            item,
                        ));
                    }
                    types.push(schema);
                }
                types
            }
            Some(_) => {
                return Err(SchemaError::invalid(
                    "'types' must be an array of schemas",
                    node,
                ))
            }
        };

        let messages = match obj.get("messages") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(message, body)| self.resolve_message(message, body, &name))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(SchemaError::invalid(
                    "'messages' must be an object keyed by message name",
                    node,
                ))
            }
        };

        if let Some(NamedSchema::Protocol(p)) = self.registry.get_mut(id) {
            p.types = types;
            p.messages = messages;
        }

        Ok(AvroSchema::Protocol(id))
    }

    fn resolve_message(
        &mut self,
        message: &str,
        node: &Value,
        protocol: &SchemaName,
    ) -> Result<MessageSchema, SchemaError> {
        self.check_simple_name(message, node)?;
        let obj = node
            .as_object()
            .ok_or_else(|| SchemaError::invalid("message must be an object", node))?;
        let namespace = protocol.namespace();
        let owner = SchemaName::new(message).with_namespace(namespace);

        let request = obj
            .get("request")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SchemaError::invalid(
                    format!("message '{}' requires a 'request' array", message),
                    node,
                )
            })?;
        let request = self.resolve_fields(request, &owner)?;

        let response_value = obj.get("response").ok_or_else(|| {
            SchemaError::invalid(
                format!("message '{}' requires a 'response'", message),
                node,
            )
        })?;
        let declared = self.resolve(response_value, namespace)?;
        let response = self.resolve_slot(declared, &owner, "response", response_value)?;

        let mut errors = vec![AvroSchema::String];
        match obj.get("errors") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let error = self.resolve(item, namespace)?;
                    if !matches!(error, AvroSchema::Error(_)) {
                        return Err(SchemaError::invalid(
                            format!(
                                "message '{}' declares '{}' as an error, which is not an error schema",
                                message,
                                self.registry.name_of(&error)
                            ),
                            item,
                        ));
                    }
                    errors.push(error);
                }
            }
            Some(_) => {
                return Err(SchemaError::invalid(
                    "'errors' must be an array of error schemas",
                    node,
                ))
            }
        }

        let one_way = match obj.get("one-way").or_else(|| obj.get("oneWay")) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(SchemaError::invalid("'one-way' must be a boolean", node));
            }
        };
        if one_way && (!response.declared.is_null() || errors.len() > 1) {
            return Err(SchemaError::invalid(
                format!(
                    "one-way message '{}' must have a null response and no errors",
                    message
                ),
                node,
            ));
        }

        Ok(MessageSchema {
            name: message.to_string(),
            doc: optional_str(obj, "doc", node)?.map(String::from),
            request,
            response: response.declared,
            response_underlying: response.underlying,
            response_nullable: response.is_nullable,
            errors,
            one_way,
            properties: extension_properties(obj, MESSAGE_PROPERTIES),
        })
    }
}
