//! Table declarations and the resolved record types built from them.
//!
//! Declarations ([`FieldSpec`], [`ObjectTypeSpec`], [`TableSchema`]) are what
//! a layout source hands in. [`RecordType`] is what the builder hands back:
//! an immutable, ordered field list shared through a [`RecordTypeHandle`].

use crate::primitive::Primitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ===========================================================================
// Declarations
// ===========================================================================

/// One column or nested-object member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// A primitive name or an object type name.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_collection: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_collection: false,
        }
    }

    pub fn array(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: element_type.into(),
            is_collection: true,
        }
    }
}

/// A reusable nested structure: a name and its ordered member names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTypeSpec {
    pub name: String,
    pub members: Vec<String>,
}

impl ObjectTypeSpec {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Full object-field name (`Object.member`) for a member. Members already
    /// written in full form are returned unchanged.
    pub fn member_full_name(&self, member: &str) -> String {
        match member.strip_prefix(self.name.as_str()) {
            Some(rest) if rest.starts_with('.') => member.to_string(),
            _ => format!("{}.{member}", self.name),
        }
    }

    /// Short member name, with any `Object.` prefix removed.
    pub fn member_short_name<'a>(&self, member: &'a str) -> &'a str {
        match member.strip_prefix(self.name.as_str()) {
            Some(rest) if rest.starts_with('.') => &rest[1..],
            _ => member,
        }
    }
}

/// All declarations for a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<FieldSpec>,
    /// Object members, named by full `Object.member` name.
    #[serde(default)]
    pub object_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub object_definitions: Vec<ObjectTypeSpec>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn column(mut self, field: FieldSpec) -> Self {
        self.columns.push(field);
        self
    }

    pub fn object_field(mut self, field: FieldSpec) -> Self {
        self.object_fields.push(field);
        self
    }

    pub fn object(mut self, definition: ObjectTypeSpec) -> Self {
        self.object_definitions.push(definition);
        self
    }
}

// ===========================================================================
// Resolved types
// ===========================================================================

/// Shared handle to a resolved record type. Cheap to clone.
pub type RecordTypeHandle = Arc<RecordType>;

/// The resolved kind of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Primitive(Primitive),
    Nested(RecordTypeHandle),
    Collection(Box<ValueKind>),
}

impl ValueKind {
    pub fn collection_of(element: ValueKind) -> Self {
        ValueKind::Collection(Box::new(element))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Primitive(p) => write!(f, "{p}"),
            ValueKind::Nested(ty) => write!(f, "object {}", ty.name()),
            ValueKind::Collection(element) => write!(f, "array of {element}"),
        }
    }
}

/// A declared field of a resolved record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: ValueKind,
}

/// A resolved record type: ordered fields plus a name-to-slot index.
///
/// Field order is fixed when the type is built and never changes.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
    slots: HashMap<String, usize>,
}

impl RecordType {
    /// Build a type from ordered fields. Later duplicates of a field name
    /// are ignored by name lookup; the builder never produces them.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        let mut slots = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            slots.entry(field.name.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            fields,
            slots,
        }
    }

    pub fn into_handle(self) -> RecordTypeHandle {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Slot index of a field by name.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.slot(name).map(|i| &self.fields[i])
    }
}

/// Structural equality: same name and same fields in the same order.
impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}
