//! Property-based tests for schema resolution.
//!
//! These tests use proptest to check resolution invariants across many
//! generated schema documents.

use proptest::prelude::*;
use serde_json::{json, Value};

use avrolink::schema::*;

// ============================================================================
// Schema Generators
// ============================================================================

const PRIMITIVES: &[&str] = &["null", "boolean", "int", "long", "float", "double", "bytes", "string"];

/// Generate a primitive type keyword.
fn arb_primitive() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PRIMITIVES)
}

/// Generate a type name that cannot collide with a primitive keyword.
fn arb_type_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9_]{0,10}"
}

/// Generate an optional dotted namespace.
fn arb_namespace() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[a-z][a-z0-9_]{0,8}".prop_map(Some),
        ("[a-z][a-z0-9_]{0,8}", "[a-z][a-z0-9_]{0,8}")
            .prop_map(|(a, b)| Some(format!("{}.{}", a, b))),
    ]
}

/// Generate a field type built from primitives.
fn arb_field_type() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_primitive().prop_map(|p| json!(p)),
        arb_primitive().prop_map(|p| json!(["null", p])),
        arb_primitive().prop_map(|p| json!([p, "null"])),
        arb_primitive().prop_map(|p| json!({"type": "array", "items": p})),
        arb_primitive().prop_map(|p| json!({"type": "map", "values": ["null", p]})),
        (arb_primitive(), arb_primitive()).prop_map(|(a, b)| json!([a, b, "null"])),
    ]
}

/// Generate a record with uniquely named fields.
fn arb_record() -> impl Strategy<Value = Value> {
    (
        arb_type_name(),
        arb_namespace(),
        prop::collection::vec(arb_field_type(), 0..8),
    )
        .prop_map(|(name, namespace, types)| {
            let fields: Vec<Value> = types
                .into_iter()
                .enumerate()
                .map(|(i, t)| json!({"name": format!("f{}", i), "type": t}))
                .collect();
            let mut record = json!({"type": "record", "name": name, "fields": fields});
            if let Some(ns) = namespace {
                record["namespace"] = json!(ns);
            }
            record
        })
}

fn field_shape(doc: &ResolvedDocument) -> Vec<(String, bool, String)> {
    let (_, entry) = doc.named_schemas().next().unwrap();
    entry
        .as_record()
        .unwrap()
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.is_nullable, doc.type_name(&f.underlying_type)))
        .collect()
}

fn contains_nested_union(schema: &AvroSchema) -> bool {
    match schema {
        AvroSchema::Union(u) => {
            matches!(*u.underlying, AvroSchema::Union(_))
                || u.branches.iter().any(contains_nested_union)
        }
        AvroSchema::Array(inner) | AvroSchema::Map(inner) => contains_nested_union(inner),
        _ => false,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolving the same document twice yields identical output.
    #[test]
    fn prop_resolution_is_deterministic(record in arb_record()) {
        let first = resolve_schema(&record).unwrap();
        let second = resolve_schema(&record).unwrap();

        prop_assert_eq!(first.root(), second.root());
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    /// Projecting and re-resolving preserves names, field order and nullability.
    #[test]
    fn prop_projection_round_trip(record in arb_record()) {
        let doc = resolve_schema(&record).unwrap();
        let text = doc.to_json().unwrap();
        let again = parse_schema(&text)
            .unwrap_or_else(|e| panic!("Failed to re-resolve {}: {}", text, e));

        let names: Vec<String> = doc.named_schemas().map(|(_, e)| e.fullname()).collect();
        let names_again: Vec<String> = again.named_schemas().map(|(_, e)| e.fullname()).collect();
        prop_assert_eq!(names, names_again);
        prop_assert_eq!(field_shape(&doc), field_shape(&again));
    }

    /// A qualified name splits on its last dot.
    #[test]
    fn prop_name_splits_on_last_dot(namespace in arb_namespace(), name in arb_type_name()) {
        let full = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.clone(),
        };
        let parsed = SchemaName::parse(&full).unwrap();

        prop_assert_eq!(parsed.name(), name.as_str());
        prop_assert_eq!(parsed.namespace(), namespace.as_deref());
        prop_assert_eq!(parsed.full_name(), full);
        prop_assert_eq!(
            SchemaName::resolve(&name, namespace.as_deref(), None).unwrap(),
            parsed
        );
    }

    /// Every reference to a declaration binds to the same handle.
    #[test]
    fn prop_references_share_one_handle(
        name in arb_type_name(),
        namespace in arb_namespace(),
        extra in 1usize..6,
    ) {
        prop_assume!(name != "Holder");
        let mut fields = vec![json!({
            "name": "first",
            "type": {"type": "fixed", "name": name, "size": 4}
        })];
        let qualified = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.clone(),
        };
        for i in 0..extra {
            let reference = if i % 2 == 0 { name.clone() } else { qualified.clone() };
            fields.push(json!({"name": format!("r{}", i), "type": reference}));
        }
        let mut record = json!({"type": "record", "name": "Holder", "fields": fields});
        if let Some(ns) = &namespace {
            record["namespace"] = json!(ns);
        }

        let doc = resolve_schema(&record).unwrap();
        let fixed = doc.registry().lookup(&qualified).unwrap();
        let holder = doc.named_schemas().next().unwrap().1.as_record().unwrap();
        for field in &holder.fields {
            prop_assert_eq!(&field.declared_type, &AvroSchema::Fixed(fixed));
        }
        prop_assert_eq!(doc.registry().len(), 2);
    }

    /// A union's underlying schema is never itself a union.
    #[test]
    fn prop_union_underlying_is_flat(field_type in arb_field_type()) {
        let doc = resolve_schema(&field_type).unwrap();
        prop_assert!(!contains_nested_union(doc.root()));
        if let AvroSchema::Union(u) = doc.root() {
            let has_null = u.branches.iter().any(AvroSchema::is_null);
            prop_assert!(u.is_nullable == has_null);
        }
    }
}
