//! Error types shared across the core.
//!
//! Three families, by when they happen:
//! - [`SchemaError`] aborts a whole table build.
//! - [`DataError`] is raised per path while populating or reading a record.
//! - [`RuleError`] is raised when a rule check finds a violation.

use std::fmt;

// ===========================================================================
// Schema errors
// ===========================================================================

/// Fatal errors while resolving a table's declarations into record types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The fixed point stopped making progress: some object types depend on
    /// each other (or on something that never builds).
    #[error(
        "cannot build object type(s) {} in table '{table}' after {passes} pass(es); blocked by: {}",
        .unresolved.join(", "),
        .culprits.join(", ")
    )]
    Dependency {
        table: String,
        unresolved: Vec<String>,
        culprits: Vec<String>,
        /// Passes run, including the one that made no progress.
        passes: usize,
    },

    /// A type name is neither a primitive nor a declared object type.
    #[error("unknown type '{name}' referenced by '{referenced_by}'")]
    UnknownType { name: String, referenced_by: String },

    /// A name was registered twice.
    #[error("type '{0}' is already registered")]
    DuplicateType(String),

    /// An object definition lists a member with no matching object field.
    #[error(
        "in table '{table}', object '{object}' member '{member}' has no object field; declared fields: [{}]",
        .candidates.join(", ")
    )]
    MissingObjectField {
        table: String,
        object: String,
        member: String,
        candidates: Vec<String>,
    },
}

// ===========================================================================
// Data errors
// ===========================================================================

/// Errors raised by a single path operation on a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("field '{field}' is not declared")]
    FieldNotFound { field: String },

    #[error("index '{index}' is invalid for '{field}' (length {len}); indices must be assigned in order")]
    InvalidIndex {
        field: String,
        index: String,
        len: usize,
    },

    #[error("value '{found}' for '{field}' does not match the expected type {expected}")]
    InvalidValue {
        field: String,
        expected: String,
        found: String,
    },
}

/// A [`DataError`] tagged with the dotted path that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("in path \"{path}\": {source}")]
pub struct PathError {
    pub path: String,
    pub source: DataError,
}

/// Every entry that failed during a bulk deserialize, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError {
    pub errors: Vec<PathError>,
}

impl DeserializeError {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.path.as_str())
    }
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entr", self.errors.len())?;
        f.write_str(if self.errors.len() == 1 { "y" } else { "ies" })?;
        f.write_str(" failed")?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeserializeError {}

// ===========================================================================
// Rule errors
// ===========================================================================

/// Why a leaf value broke a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// Not in the set collected from another table's path.
    NotInTable { source: String },
    /// Not in a fixed list of allowed values.
    NotInValues { allowed: Vec<String> },
    /// Not an integer at all.
    NotAnInteger { min: i64, max: i64 },
    /// An integer outside `[min, max]`.
    OutOfInterval { min: i64, max: i64 },
    /// Seen earlier in the same check.
    Duplicate,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::NotInTable { source } => write!(f, "was not found in {source}"),
            ViolationReason::NotInValues { allowed } => {
                write!(f, "was not found in {}", allowed.join(","))
            }
            ViolationReason::NotAnInteger { min, max } => {
                write!(f, "is not an integer in interval [{min}, {max}]")
            }
            ViolationReason::OutOfInterval { min, max } => {
                write!(f, "is not in interval [{min}, {max}]")
            }
            ViolationReason::Duplicate => f.write_str("is present multiple times"),
        }
    }
}

/// The first leaf that broke a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value '{value}' from {table}.{path} {reason}")]
pub struct RuleViolation {
    pub table: String,
    pub path: String,
    pub value: String,
    pub reason: ViolationReason,
}

/// Outcome of a failed rule check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Violation(#[from] RuleViolation),

    #[error("rule references unknown table '{0}'")]
    UnknownTable(String),
}

/// A rule declaration that cannot be turned into a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleDeclarationError {
    #[error("unknown rule kind '{0}'")]
    UnknownKind(String),

    #[error("rule '{kind}' is missing its {argument} argument")]
    MissingArgument {
        kind: &'static str,
        argument: &'static str,
    },

    #[error("rule target '{0}' must be of the form table.path")]
    InvalidTarget(String),

    #[error("rule '{kind}' bound '{value}' is not an integer")]
    InvalidBound { kind: &'static str, value: String },
}

// ===========================================================================
// Table errors
// ===========================================================================

/// Errors from the per-run table set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("table '{0}' already exists")]
    DuplicateTable(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{source} -- at row {row} in table {table}")]
    Entry {
        table: String,
        row: usize,
        source: DeserializeError,
    },
}
