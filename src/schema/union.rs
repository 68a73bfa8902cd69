//! Union reduction and abstract-base synthesis.
//!
//! A union is represented in generated code by a single type. Two-branch
//! unions with exactly one `null` reduce to the other branch; everything
//! else that has more than one branch is boxed.

use serde_json::Value;
use tracing::debug;

use crate::error::SchemaError;
use crate::options::ResolverOptions;
use crate::schema::names::pascal_case;
use crate::schema::{
    AbstractRecordSchema, AvroSchema, NamedSchema, SchemaName, SchemaRef, SchemaRegistry,
    UnionSchema,
};

/// Reduce resolved branches to a [`UnionSchema`].
///
/// | branches | underlying | nullable |
/// |---|---|---|
/// | `[]`, `[null, null]` | `Null` | `nullable_references` |
/// | `[T]` | `T` | false |
/// | `[T, null]`, `[null, T]` | `T` | true |
/// | anything else | `Object` | has null && `nullable_references` |
///
/// An underlying union is flattened until a non-union is reached.
pub fn reduce_union(branches: Vec<AvroSchema>, options: &ResolverOptions) -> UnionSchema {
    let (mut underlying, mut is_nullable) = reduce(&branches, options);

    while let AvroSchema::Union(inner) = underlying {
        let (next, nullable) = reduce(&inner.branches, options);
        underlying = next;
        is_nullable |= nullable;
    }

    UnionSchema {
        branches,
        underlying: Box::new(underlying),
        is_nullable,
    }
}

fn reduce(branches: &[AvroSchema], options: &ResolverOptions) -> (AvroSchema, bool) {
    match branches {
        [] => (AvroSchema::Null, options.nullable_references),
        [single] => (single.clone(), false),
        [AvroSchema::Null, AvroSchema::Null] => (AvroSchema::Null, options.nullable_references),
        [other, AvroSchema::Null] | [AvroSchema::Null, other] => (other.clone(), true),
        _ => {
            let has_null = branches.iter().any(AvroSchema::is_null);
            (AvroSchema::Object, has_null && options.nullable_references)
        }
    }
}

/// Check whether a union's branches call for an abstract base.
///
/// Requires more than two branches (or two non-null branches), every
/// branch a record or `null`, and at least one record.
pub fn is_abstract_base_candidate(branches: &[AvroSchema]) -> bool {
    let shape = match branches.len() {
        0 | 1 => false,
        2 => !branches.iter().any(AvroSchema::is_null),
        _ => true,
    };
    shape
        && branches
            .iter()
            .all(|b| matches!(b, AvroSchema::Record(_) | AvroSchema::Null))
        && branches.iter().any(|b| !b.is_null())
}

/// Name given to the abstract base of `owner.field`.
pub fn abstract_base_name(owner: &SchemaName, field: &str) -> SchemaName {
    let local = format!("{}{}Base", pascal_case(owner.name()), pascal_case(field));
    SchemaName::new(local).with_namespace(owner.namespace())
}

/// Append a counter while the name is taken by another synthesized base.
///
/// Distinct fields such as `b_c` and `bC` share a Pascal-cased name. A name
/// taken by a declared schema is left alone and fails as a redeclaration.
fn unique_base_name(registry: &SchemaRegistry, name: SchemaName) -> SchemaName {
    let is_synthesized = |candidate: &SchemaName| {
        registry
            .resolve_reference(candidate)
            .and_then(|id| registry.get(id))
            .is_some_and(|entry| entry.as_abstract_base().is_some())
    };
    if !is_synthesized(&name) {
        return name;
    }

    let local = name.name().to_string();
    let namespace = name.namespace().map(String::from);
    (2usize..)
        .map(|n| SchemaName::new(format!("{}{}", local, n)).with_namespace(namespace.as_deref()))
        .find(|candidate| !is_synthesized(candidate))
        .unwrap_or(name)
}

/// Synthesize (or reuse) the abstract base for `owner.field`.
///
/// Registers the base, then links every record branch to it.
pub fn synthesize_abstract_base(
    registry: &mut SchemaRegistry,
    owner: &SchemaName,
    field: &str,
    union: &UnionSchema,
    node: &Value,
) -> Result<SchemaRef, SchemaError> {
    if let Some(existing) = registry.abstract_base(owner, field) {
        return Ok(existing);
    }

    let name = unique_base_name(registry, abstract_base_name(owner, field));
    debug!(
        name = %name,
        owner = %owner,
        field,
        derived = union.branches.len(),
        "Synthesizing abstract base"
    );

    let base = registry.register(
        NamedSchema::AbstractBase(AbstractRecordSchema {
            name,
            owner: owner.clone(),
            field: field.to_string(),
            derived: union.branches.clone(),
        }),
        node,
    )?;
    registry.memoize_abstract_base(owner.clone(), field.to_string(), base);

    for branch in &union.branches {
        if let AvroSchema::Record(record) = branch {
            registry.add_base(*record, base);
        }
    }

    Ok(base)
}
