//! Strata Core -- a schema-driven dynamic record engine.
//!
//! Tables are declared as data: columns, reusable nested object types, and
//! the members of those types. This crate turns those declarations into
//! record types at runtime, fills records from flat dotted-path maps, reads
//! them back the same way, and checks declarative rules across tables.
//!
//! # Pipeline
//!
//! 1. **Declare** -- a [`schema::TableSchema`] lists columns, object fields
//!    and object definitions in any order.
//! 2. **Build** -- [`builder::build_table`] resolves object types by
//!    repeated passes until nothing changes, then builds the root type.
//! 3. **Populate** -- [`record::DynamicRecord::deserialize`] applies a flat
//!    `{"stats.hp": "10", "items.0.kind": "sword"}` map.
//! 4. **Extract** -- [`record::DynamicRecord::flatten`] reads requested
//!    paths back, with `None` for anything absent.
//! 5. **Validate** -- [`rule::Rule::check`] walks a `table.path` across all
//!    records of a table.
//!
//! ```rust,ignore
//! let (player, _registry) = build_table(&schema)?;
//! let mut record = DynamicRecord::new(player);
//! record.deserialize([("id", "p1"), ("stats.hp", "10")])?;
//! assert_eq!(record.get("stats.hp").unwrap().to_string(), "10");
//! ```
//!
//! # Key Types
//!
//! - [`registry::TypeRegistry`] -- per-table name-to-type table, seeded with
//!   the seven primitives.
//! - [`schema::RecordType`] -- resolved, immutable field list shared through
//!   [`schema::RecordTypeHandle`].
//! - [`record::DynamicRecord`] -- a record instance with per-slot
//!   [`record::Value`]s.
//! - [`rule::Rule`] -- table mapping, value set, interval and uniqueness
//!   checks.
//! - [`table::TableSet`] -- every table of a project with its records.

pub mod builder;
pub mod error;
pub mod primitive;
pub mod record;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
