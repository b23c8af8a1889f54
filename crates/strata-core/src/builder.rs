//! Resolves a table's declarations into record types.
//!
//! Object definitions may reference each other in any declaration order, so
//! they are built by repeated passes until a fixed point:
//!
//! 1. Each pass checks every unbuilt object definition. It is ready once
//!    every member resolves to a primitive or an already-registered type.
//! 2. Everything found ready is registered after the pass, so a definition
//!    never sees a sibling built during the same pass.
//! 3. A pass that registers nothing while definitions remain is a
//!    dependency error listing every unbuilt definition and the member that
//!    blocked it.
//! 4. Root columns are resolved last and registered under the table name.
//!
//! Unknown type names and members with no object field are reported before
//! the passes start, since no amount of iteration would resolve them.

use crate::error::SchemaError;
use crate::registry::{TypeEntry, TypeRegistry};
use crate::schema::{FieldDef, FieldSpec, ObjectTypeSpec, RecordType, RecordTypeHandle, TableSchema, ValueKind};
use std::collections::{HashMap, HashSet};

/// Build every record type declared by `schema`.
///
/// Returns the root type (one instance per table row) and the registry that
/// holds it alongside every object type and the primitives.
pub fn build_table(schema: &TableSchema) -> Result<(RecordTypeHandle, TypeRegistry), SchemaError> {
    let table = schema.name.as_str();
    let fields_by_name = index_object_fields(schema)?;
    check_declarations(schema, &fields_by_name)?;

    let mut registry = TypeRegistry::new();
    let mut pending: Vec<&ObjectTypeSpec> = schema.object_definitions.iter().collect();
    let mut pass = 0usize;

    while !pending.is_empty() {
        pass += 1;
        let mut ready = Vec::new();
        let mut blocked = Vec::new();
        let mut culprits = Vec::new();

        for spec in pending {
            match resolve_object(table, spec, &fields_by_name, &registry) {
                Ok(fields) => ready.push((spec, fields)),
                Err(culprit) => {
                    culprits.push(culprit);
                    blocked.push(spec);
                }
            }
        }

        if ready.is_empty() {
            return Err(SchemaError::Dependency {
                table: table.to_string(),
                unresolved: blocked.iter().map(|s| s.name.clone()).collect(),
                culprits,
                passes: pass,
            });
        }

        tracing::debug!(
            table = %table,
            pass,
            built = ready.len(),
            remaining = blocked.len(),
            "object type pass"
        );

        for (spec, fields) in ready {
            let handle = RecordType::new(spec.name.clone(), fields).into_handle();
            registry.register(&spec.name, handle)?;
        }
        pending = blocked;
    }

    let mut root_fields = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        let kind = resolve_kind(column, &registry).ok_or_else(|| SchemaError::UnknownType {
            name: column.type_name.clone(),
            referenced_by: format!("{table}.{}", column.name),
        })?;
        root_fields.push(FieldDef {
            name: column.name.clone(),
            kind,
        });
    }

    let root = RecordType::new(table, root_fields).into_handle();
    registry.register(table, root.clone())?;

    tracing::info!(
        table = %table,
        object_types = registry.record_count() - 1,
        columns = root.field_count(),
        passes = pass,
        "built record types"
    );

    Ok((root, registry))
}

/// Map full object-field names to their declarations.
fn index_object_fields(schema: &TableSchema) -> Result<HashMap<&str, &FieldSpec>, SchemaError> {
    let mut map = HashMap::with_capacity(schema.object_fields.len());
    for field in &schema.object_fields {
        if map.insert(field.name.as_str(), field).is_some() {
            return Err(SchemaError::DuplicateType(format!(
                "{}.{}",
                schema.name, field.name
            )));
        }
    }
    Ok(map)
}

/// Up-front checks that iteration cannot fix.
fn check_declarations(
    schema: &TableSchema,
    fields_by_name: &HashMap<&str, &FieldSpec>,
) -> Result<(), SchemaError> {
    let table = schema.name.as_str();
    let mut declared: HashSet<&str> = HashSet::new();
    for spec in &schema.object_definitions {
        if TypeRegistry::is_basic_type(&spec.name) || !declared.insert(spec.name.as_str()) {
            return Err(SchemaError::DuplicateType(spec.name.clone()));
        }
    }

    let known = |type_name: &str| {
        TypeRegistry::is_basic_type(type_name) || declared.contains(type_name)
    };

    for spec in &schema.object_definitions {
        let mut seen = HashSet::new();
        for member in &spec.members {
            let short = spec.member_short_name(member);
            if !seen.insert(short) {
                return Err(SchemaError::DuplicateType(format!(
                    "{table}.{}.{short}",
                    spec.name
                )));
            }
            let full = spec.member_full_name(member);
            let Some(field) = fields_by_name.get(full.as_str()) else {
                let mut candidates: Vec<String> =
                    fields_by_name.keys().map(|k| k.to_string()).collect();
                candidates.sort();
                return Err(SchemaError::MissingObjectField {
                    table: table.to_string(),
                    object: spec.name.clone(),
                    member: short.to_string(),
                    candidates,
                });
            };
            if !known(&field.type_name) {
                return Err(SchemaError::UnknownType {
                    name: field.type_name.clone(),
                    referenced_by: format!("{table}.{}.{short}", spec.name),
                });
            }
        }
    }

    let mut columns = HashSet::new();
    for column in &schema.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateType(format!(
                "{table}.{}",
                column.name
            )));
        }
        if !known(&column.type_name) {
            return Err(SchemaError::UnknownType {
                name: column.type_name.clone(),
                referenced_by: format!("{table}.{}", column.name),
            });
        }
    }

    Ok(())
}

/// Resolve every member of an object definition, or name the first member
/// (`table.object.member`) that is not resolvable yet.
fn resolve_object(
    table: &str,
    spec: &ObjectTypeSpec,
    fields_by_name: &HashMap<&str, &FieldSpec>,
    registry: &TypeRegistry,
) -> Result<Vec<FieldDef>, String> {
    let mut fields = Vec::with_capacity(spec.members.len());
    for member in &spec.members {
        let short = spec.member_short_name(member);
        let culprit = || format!("{table}.{}.{short}", spec.name);
        let full = spec.member_full_name(member);
        let field = fields_by_name.get(full.as_str()).ok_or_else(culprit)?;
        let kind = resolve_kind(field, registry).ok_or_else(culprit)?;
        fields.push(FieldDef {
            name: short.to_string(),
            kind,
        });
    }
    Ok(fields)
}

fn resolve_kind(field: &FieldSpec, registry: &TypeRegistry) -> Option<ValueKind> {
    let base = match registry.resolve(&field.type_name).ok()? {
        TypeEntry::Primitive(p) => ValueKind::Primitive(*p),
        TypeEntry::Record(handle) => ValueKind::Nested(handle.clone()),
    };
    Some(if field.is_collection {
        ValueKind::collection_of(base)
    } else {
        base
    })
}
