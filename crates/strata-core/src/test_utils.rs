//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to unit tests, integration tests and benchmarks.

use crate::builder::build_table;
use crate::record::DynamicRecord;
use crate::schema::{FieldSpec, ObjectTypeSpec, RecordTypeHandle, TableSchema};

// ===========================================================================
// Schemas
// ===========================================================================

/// `Player {id: string, level: int, stats: Stats, tags: [string], items: [Item]}`
/// with `Stats {hp: int, mp: int}` and `Item {kind: string, weight: float}`.
pub fn player_schema() -> TableSchema {
    TableSchema::new("Player")
        .column(FieldSpec::new("id", "string"))
        .column(FieldSpec::new("level", "int"))
        .column(FieldSpec::new("stats", "Stats"))
        .column(FieldSpec::array("tags", "string"))
        .column(FieldSpec::array("items", "Item"))
        .object_field(FieldSpec::new("Stats.hp", "int"))
        .object_field(FieldSpec::new("Stats.mp", "int"))
        .object_field(FieldSpec::new("Item.kind", "string"))
        .object_field(FieldSpec::new("Item.weight", "float"))
        .object(ObjectTypeSpec::new("Stats", ["hp", "mp"]))
        .object(ObjectTypeSpec::new("Item", ["kind", "weight"]))
}

/// A table whose objects nest `depth` levels deep: `L0.next -> L1 ... ->
/// L{depth-1}.leaf`. Object definitions are listed deepest-last so the
/// builder needs one pass per level.
pub fn chain_schema(depth: usize) -> TableSchema {
    let mut schema = TableSchema::new("Chain").column(FieldSpec::new("head", "L0"));
    for level in 0..depth {
        let name = format!("L{level}");
        if level + 1 == depth {
            schema = schema.object_field(FieldSpec::new(format!("{name}.leaf"), "int"));
            schema = schema.object(ObjectTypeSpec::new(name, ["leaf"]));
        } else {
            let next = format!("L{}", level + 1);
            schema = schema.object_field(FieldSpec::new(format!("{name}.next"), next));
            schema = schema.object(ObjectTypeSpec::new(name, ["next"]));
        }
    }
    schema
}

/// Dotted path to the leaf of [`chain_schema`].
pub fn chain_leaf_path(depth: usize) -> String {
    let mut path = vec!["head"];
    path.extend(std::iter::repeat_n("next", depth.saturating_sub(1)));
    path.push("leaf");
    path.join(".")
}

// ===========================================================================
// Records
// ===========================================================================

pub fn player_type() -> RecordTypeHandle {
    build_table(&player_schema())
        .map(|(root, _)| root)
        .unwrap_or_else(|e| panic!("player schema should build: {e}"))
}

/// A fully populated player with `item_count` items.
pub fn sample_player(id: &str, item_count: usize) -> DynamicRecord {
    let mut record = DynamicRecord::new(player_type());
    let mut entries = vec![
        ("id".to_string(), id.to_string()),
        ("level".to_string(), "3".to_string()),
        ("stats.hp".to_string(), "100".to_string()),
        ("stats.mp".to_string(), "40".to_string()),
        ("tags.0".to_string(), "brave".to_string()),
    ];
    for i in 0..item_count {
        entries.push((format!("items.{i}.kind"), format!("item{i}")));
        entries.push((format!("items.{i}.weight"), format!("{i}.5")));
    }
    record
        .deserialize(entries)
        .unwrap_or_else(|e| panic!("sample player should deserialize: {e}"));
    record
}
