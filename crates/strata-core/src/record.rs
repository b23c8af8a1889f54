//! Dynamic records: runtime values conforming to a [`RecordTypeHandle`].
//!
//! A record owns one [`Value`] slot per declared field. Slots start
//! [`Value::Unset`] and are filled by path:
//!
//! ```rust,ignore
//! let mut player = DynamicRecord::new(root);
//! player.set("stats.hp", "10")?;
//! player.set("stats.tags.0", "strong")?;
//! assert_eq!(player.get("stats.hp"), Some(&Value::Primitive(Scalar::Int(10))));
//! ```
//!
//! Name segments select fields, numeric segments index collections. The
//! flat dotted key space of tabular storage maps one-to-one onto the record
//! tree, so a single traversal handles every shape a schema can declare.

use crate::error::{DataError, DeserializeError, PathError};
use crate::primitive::Scalar;
use crate::schema::{RecordTypeHandle, ValueKind};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A slot value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unset,
    Primitive(Scalar),
    Nested(DynamicRecord),
    Collection(Vec<Value>),
}

impl Value {
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Primitive(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&DynamicRecord> {
        match self {
            Value::Nested(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }
}

/// Text form: scalars as natural text, records as their rendered dump,
/// collections as comma-joined elements, unset as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => Ok(()),
            Value::Primitive(s) => write!(f, "{s}"),
            Value::Nested(r) => write!(f, "{r}"),
            Value::Collection(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// A record instance. Its field set is fixed by its type at construction.
#[derive(Debug, Clone)]
pub struct DynamicRecord {
    ty: RecordTypeHandle,
    slots: Vec<Value>,
}

impl PartialEq for DynamicRecord {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.ty, &other.ty) || self.ty == other.ty) && self.slots == other.slots
    }
}

impl DynamicRecord {
    /// A fresh record with every slot unset.
    pub fn new(ty: RecordTypeHandle) -> Self {
        let slots = vec![Value::Unset; ty.field_count()];
        Self { ty, slots }
    }

    pub fn record_type(&self) -> &RecordTypeHandle {
        &self.ty
    }

    /// Slot value of a top-level field, or `None` if undeclared.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.ty.slot(name).map(|i| &self.slots[i])
    }

    /// Whether a top-level field holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.field(name).is_some_and(|v| !v.is_unset())
    }

    /// Declared field names paired with their slot values, in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.slots.iter())
    }

    // -----------------------------------------------------------------------
    // Write
    // -----------------------------------------------------------------------

    /// Write `value` at `path`, creating intermediate records and appending
    /// collection elements as needed.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: &Scalar) -> Result<(), DataError> {
        set_in_record(self, path, value)
    }

    /// [`set_path`](Self::set_path) with a dotted path.
    pub fn set(&mut self, path: &str, value: impl Into<Scalar>) -> Result<(), DataError> {
        let segments = split_path(path);
        self.set_path(&segments, &value.into())
    }

    /// Apply a flat dotted-path map.
    ///
    /// Entries are applied in natural path order (numeric segments compare
    /// numerically), so collection indices arrive in order regardless of the
    /// map's own ordering. Every failing entry is reported; entries that
    /// succeed stay applied.
    pub fn deserialize<I, K, V>(&mut self, entries: I) -> Result<(), DeserializeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Scalar>,
    {
        let mut entries: Vec<(Vec<String>, String, Scalar)> = entries
            .into_iter()
            .map(|(k, v)| {
                let key = k.as_ref().to_string();
                let segments = split_path(&key).into_iter().map(str::to_string).collect();
                (segments, key, v.into())
            })
            .collect();
        entries.sort_by(|a, b| compare_paths(&a.0, &b.0));

        let mut errors = Vec::new();
        for (segments, path, value) in entries {
            if let Err(source) = self.set_path(&segments, &value) {
                tracing::debug!(record = %self.ty.name(), %path, error = %source, "entry rejected");
                errors.push(PathError { path, source });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DeserializeError { errors })
        }
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Value at `path`, or `None` when anything along the way is missing:
    /// unset slots, out-of-range indices, or undeclared names.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (head, rest) = path.split_first()?;
        let value = self.field(head.as_ref().trim())?;
        get_in_value(value, rest)
    }

    /// [`get_path`](Self::get_path) with a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(&split_path(path))
    }

    /// Read each requested dotted path. Absent paths map to `None`.
    pub fn flatten<S: AsRef<str>>(&self, paths: &[S]) -> Vec<(String, Option<&Value>)> {
        paths
            .iter()
            .map(|p| (p.as_ref().to_string(), self.get(p.as_ref())))
            .collect()
    }

    /// Depth-first text dump for diagnostics. Not meant to be parsed back.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        render_record(self, 0, &mut out);
        out
    }
}

impl fmt::Display for DynamicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

// ===========================================================================
// Path helpers
// ===========================================================================

/// Split a dotted path into trimmed segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').map(str::trim).collect()
}

/// Sort key of one path segment. Indices order numerically and before
/// names, so any mix of segments gives a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SegmentKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl<'a> SegmentKey<'a> {
    fn of(segment: &'a str) -> Self {
        segment
            .parse()
            .map_or(SegmentKey::Name(segment), SegmentKey::Index)
    }
}

fn path_keys(path: &[String]) -> Vec<SegmentKey<'_>> {
    path.iter().map(|s| SegmentKey::of(s)).collect()
}

fn compare_paths(a: &[String], b: &[String]) -> Ordering {
    path_keys(a).cmp(&path_keys(b))
}

// ===========================================================================
// Traversal
// ===========================================================================

fn set_in_record<S: AsRef<str>>(
    record: &mut DynamicRecord,
    path: &[S],
    value: &Scalar,
) -> Result<(), DataError> {
    let Some((head, rest)) = path.split_first() else {
        return Err(DataError::FieldNotFound {
            field: String::new(),
        });
    };
    let name = head.as_ref().trim();
    let ty = Arc::clone(&record.ty);
    let slot = ty.slot(name).ok_or_else(|| DataError::FieldNotFound {
        field: name.to_string(),
    })?;
    let kind = &ty.fields()[slot].kind;
    set_in_slot(&mut record.slots[slot], kind, name, rest, value)
}

fn set_in_slot<S: AsRef<str>>(
    slot: &mut Value,
    kind: &ValueKind,
    field: &str,
    rest: &[S],
    value: &Scalar,
) -> Result<(), DataError> {
    match kind {
        ValueKind::Primitive(p) => {
            if let Some(next) = rest.first() {
                return Err(DataError::FieldNotFound {
                    field: next.as_ref().trim().to_string(),
                });
            }
            let coerced = p.coerce(value).ok_or_else(|| DataError::InvalidValue {
                field: field.to_string(),
                expected: p.to_string(),
                found: value.to_string(),
            })?;
            *slot = Value::Primitive(coerced);
            Ok(())
        }
        ValueKind::Nested(ty) => {
            if rest.is_empty() {
                return Err(DataError::InvalidValue {
                    field: field.to_string(),
                    expected: kind.to_string(),
                    found: value.to_string(),
                });
            }
            if slot.is_unset() {
                *slot = Value::Nested(DynamicRecord::new(ty.clone()));
            }
            match slot {
                Value::Nested(child) => set_in_record(child, rest, value),
                other => Err(DataError::InvalidValue {
                    field: field.to_string(),
                    expected: kind.to_string(),
                    found: other.to_string(),
                }),
            }
        }
        ValueKind::Collection(element) => {
            let Some((index_segment, tail)) = rest.split_first() else {
                return Err(DataError::InvalidValue {
                    field: field.to_string(),
                    expected: kind.to_string(),
                    found: value.to_string(),
                });
            };
            if slot.is_unset() {
                *slot = Value::Collection(Vec::new());
            }
            let items = match slot {
                Value::Collection(items) => items,
                other => {
                    return Err(DataError::InvalidValue {
                        field: field.to_string(),
                        expected: kind.to_string(),
                        found: other.to_string(),
                    });
                }
            };

            let index_text = index_segment.as_ref().trim();
            let invalid_index = |len: usize| DataError::InvalidIndex {
                field: field.to_string(),
                index: index_text.to_string(),
                len,
            };
            let index: usize = index_text.parse().map_err(|_| invalid_index(items.len()))?;
            if index > items.len() {
                return Err(invalid_index(items.len()));
            }

            let element_name = format!("{field}.{index}");
            if index == items.len() {
                items.push(Value::Unset);
                let result = set_in_slot(&mut items[index], element, &element_name, tail, value);
                if result.is_err() {
                    items.pop();
                }
                result
            } else {
                set_in_slot(&mut items[index], element, &element_name, tail, value)
            }
        }
    }
}

fn get_in_value<'a, S: AsRef<str>>(value: &'a Value, rest: &[S]) -> Option<&'a Value> {
    let Some((head, tail)) = rest.split_first() else {
        return (!value.is_unset()).then_some(value);
    };
    let segment = head.as_ref().trim();
    match value {
        Value::Unset | Value::Primitive(_) => None,
        Value::Nested(record) => get_in_value(record.field(segment)?, tail),
        Value::Collection(items) => {
            let index: usize = segment.parse().ok()?;
            get_in_value(items.get(index)?, tail)
        }
    }
}

// ===========================================================================
// Rendering
// ===========================================================================

const INDENT: usize = 4;

fn render_record(record: &DynamicRecord, depth: usize, out: &mut String) {
    for (name, value) in record.fields() {
        match value {
            Value::Collection(items) => {
                for (i, item) in items.iter().enumerate() {
                    push_line(out, depth, &format!("{name}.{i}"));
                    render_value(item, depth + 1, out);
                }
            }
            other => {
                push_line(out, depth, name);
                render_value(other, depth + 1, out);
            }
        }
    }
}

fn push_line(out: &mut String, depth: usize, label: &str) {
    out.push('\n');
    out.extend(std::iter::repeat_n(' ', depth * INDENT));
    out.push_str(label);
    out.push_str(": ");
}

fn render_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Unset => {}
        Value::Primitive(s) => out.push_str(&s.to_string()),
        Value::Nested(record) => render_record(record, depth, out),
        Value::Collection(items) => {
            for (i, item) in items.iter().enumerate() {
                push_line(out, depth, &i.to_string());
                render_value(item, depth + 1, out);
            }
        }
    }
}
