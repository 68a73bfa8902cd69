//! Tests for protocol resolution.

use avrolink::schema::*;
use avrolink::SchemaError;

const MAIL: &str = r#"{
    "protocol": "Mail",
    "namespace": "org.post",
    "doc": "Sends letters.",
    "transport": "http",
    "types": [
        {"type": "record", "name": "Letter", "fields": [
            {"name": "to", "type": "string"},
            {"name": "body", "type": "string"}
        ]},
        {"type": "record", "name": "Parcel", "fields": [{"name": "weight", "type": "double"}]},
        {"type": "error", "name": "Undeliverable", "fields": [{"name": "why", "type": "string"}]}
    ],
    "messages": {
        "send": {
            "doc": "Deliver one item.",
            "request": [
                {"name": "item", "type": ["Letter", "Parcel"]},
                {"name": "priority", "type": "int", "default": 0}
            ],
            "response": ["null", "string"],
            "errors": ["Undeliverable"],
            "idempotent": false
        },
        "notify": {
            "request": [{"name": "who", "type": "string"}],
            "response": "null",
            "one-way": true
        }
    }
}"#;

fn protocol(doc: &ResolvedDocument) -> &ProtocolSchema {
    match doc.root() {
        AvroSchema::Protocol(id) => doc.registry()[*id].as_protocol().unwrap(),
        other => panic!("Expected Protocol schema, got {:?}", other),
    }
}

// ============================================================================
// Protocol Tests
// ============================================================================

#[test]
fn test_protocol_header() {
    let doc = parse_schema(MAIL).unwrap();
    let p = protocol(&doc);

    assert_eq!(p.name.full_name(), "org.post.Mail");
    assert_eq!(p.doc.as_deref(), Some("Sends letters."));
    assert_eq!(p.types.len(), 3);
    assert_eq!(p.properties.get("transport"), Some(&serde_json::json!("http")));
    assert_eq!(p.properties.len(), 1);
}

#[test]
fn test_messages_in_declaration_order() {
    let doc = parse_schema(MAIL).unwrap();
    let names: Vec<&str> = protocol(&doc).messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["send", "notify"]);
}

#[test]
fn test_request_parameters_resolve_like_fields() {
    let doc = parse_schema(MAIL).unwrap();
    let send = protocol(&doc).message("send").unwrap();

    assert_eq!(send.doc.as_deref(), Some("Deliver one item."));
    assert_eq!(send.request.len(), 2);
    assert_eq!(send.request[1].default_literal.as_deref(), Some("0"));

    // A union of records in a parameter gets an abstract base owned by the message.
    let base = doc.registry().lookup("org.post.SendItemBase").unwrap();
    assert_eq!(send.request[0].declared_type, AvroSchema::AbstractBase(base));
    assert!(!send.request[0].is_nullable);
    assert_eq!(doc.record("org.post.Letter").unwrap().bases, vec![base]);
    assert_eq!(doc.record("org.post.Parcel").unwrap().bases, vec![base]);

    assert_eq!(send.properties.get("idempotent"), Some(&serde_json::json!(false)));
}

#[test]
fn test_response_and_errors() {
    let doc = parse_schema(MAIL).unwrap();
    let send = protocol(&doc).message("send").unwrap();

    assert_eq!(send.response_underlying, AvroSchema::String);
    assert!(send.response_nullable);
    assert!(!send.one_way);

    let undeliverable = doc.registry().lookup("org.post.Undeliverable").unwrap();
    assert_eq!(
        send.errors,
        vec![AvroSchema::String, AvroSchema::Error(undeliverable)]
    );

    let notify = protocol(&doc).message("notify").unwrap();
    assert!(notify.one_way);
    assert_eq!(notify.response, AvroSchema::Null);
    assert_eq!(notify.errors, vec![AvroSchema::String]);
}

#[test]
fn test_message_requires_request_and_response() {
    let err = parse_schema(r#"{"protocol": "P", "messages": {"m": {"response": "null"}}}"#)
        .unwrap_err();
    assert!(err.reason().contains("'request'"));

    let err = parse_schema(r#"{"protocol": "P", "messages": {"m": {"request": []}}}"#)
        .unwrap_err();
    assert!(err.reason().contains("'response'"));
}

#[test]
fn test_one_way_with_errors_is_rejected() {
    let err = parse_schema(
        r#"{
            "protocol": "P",
            "types": [{"type": "error", "name": "E", "fields": []}],
            "messages": {"m": {"request": [], "response": "null", "errors": ["E"], "one-way": true}}
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    assert!(err.reason().contains("no errors"));
}

#[test]
fn test_annotated_fixed_is_a_named_protocol_type() {
    let doc = parse_schema(
        r#"{"protocol": "P", "types": [{"type": "fixed", "name": "Id", "size": 16, "logicalType": "uuid"}]}"#,
    )
    .unwrap();
    assert_eq!(protocol(&doc).types.len(), 1);
    assert_eq!(doc.type_name(&protocol(&doc).types[0]), "System.Guid");
}

#[test]
fn test_protocol_name_cannot_be_reused() {
    let err = parse_schema(
        r#"{"protocol": "P", "types": [{"type": "record", "name": "P", "fields": []}]}"#,
    )
    .unwrap_err();
    assert_eq!(err.reason(), "redeclaration of schema 'P'");
}

#[test]
fn test_protocol_projection_omits_implicit_error() {
    let doc = parse_schema(MAIL).unwrap();
    let value = doc.to_json_value().unwrap();

    assert_eq!(value["protocol"], "Mail");
    assert_eq!(value["namespace"], "org.post");
    assert_eq!(value["messages"]["send"]["errors"], serde_json::json!(["Undeliverable"]));
    assert!(value["messages"]["notify"].get("errors").is_none());
    assert_eq!(value["messages"]["notify"]["one-way"], true);
    assert_eq!(
        value["messages"]["send"]["request"][0]["type"],
        serde_json::json!(["Letter", "Parcel"])
    );

    let again = parse_schema(&value.to_string()).unwrap();
    assert_eq!(protocol(&again).messages.len(), 2);
    assert!(again.get("org.post.SendItemBase").is_some());
}
