//! Per-table type registry.
//!
//! Maps type names to either a primitive or a built record type. The seven
//! primitives are seeded up front; object types and the table's root type
//! are added by the builder as they resolve.

use crate::error::SchemaError;
use crate::primitive::Primitive;
use crate::schema::RecordTypeHandle;
use std::collections::HashMap;

/// What a registered name resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeEntry {
    Primitive(Primitive),
    Record(RecordTypeHandle),
}

/// Name-to-type table for one table's build.
///
/// Seeded with the seven primitives, which can never be replaced. Every
/// other name registers at most once.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<(String, TypeEntry)>,
    name_to_index: HashMap<String, usize>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(Primitive::ALL.len()),
            name_to_index: HashMap::new(),
        };
        for p in Primitive::ALL {
            registry.insert(p.name(), TypeEntry::Primitive(p));
        }
        registry
    }

    /// Whether `name` is one of the fixed primitive names.
    pub fn is_basic_type(name: &str) -> bool {
        Primitive::from_name(name).is_some()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Register a record type under `name`.
    pub fn register(
        &mut self,
        name: &str,
        handle: RecordTypeHandle,
    ) -> Result<(), SchemaError> {
        if self.is_defined(name) {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }
        self.insert(name, TypeEntry::Record(handle));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&TypeEntry, SchemaError> {
        self.name_to_index
            .get(name)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| SchemaError::UnknownType {
                name: name.to_string(),
                referenced_by: "registry lookup".to_string(),
            })
    }

    /// Resolve a name that must be a record type.
    pub fn resolve_record(&self, name: &str) -> Result<&RecordTypeHandle, SchemaError> {
        match self.resolve(name)? {
            TypeEntry::Record(handle) => Ok(handle),
            TypeEntry::Primitive(_) => Err(SchemaError::UnknownType {
                name: name.to_string(),
                referenced_by: "record type lookup".to_string(),
            }),
        }
    }

    /// Registered names in registration order, primitives first.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered record types (everything except primitives).
    pub fn record_count(&self) -> usize {
        self.entries.len() - Primitive::ALL.len()
    }

    fn insert(&mut self, name: &str, entry: TypeEntry) {
        self.name_to_index
            .insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), entry));
    }
}
