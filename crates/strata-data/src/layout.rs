//! Serde structs for declaration files and their conversion into core
//! declarations.
//!
//! Three files describe a project:
//!
//! - `tables.{ron,json,toml,csv}` -- the table manifest.
//! - `<table>_layout.{ext}` -- one row per column, object field or object
//!   definition of a table.
//! - `rules.{ext}` -- optional validation rules.
//!
//! Legacy `.csv` files carry the same rows as comma-separated text.

use crate::loader::{split_cells, text_lines, DataLoadError};
use serde::Deserialize;
use std::path::Path;
use strata_core::rule::Rule;
use strata_core::schema::{FieldSpec, ObjectTypeSpec, TableSchema};

// ===========================================================================
// Manifest
// ===========================================================================

/// One table of the project manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDecl {
    pub name: String,
    /// Name of the storage index used to page through the table.
    #[serde(default)]
    pub index: String,
    /// Field the index is ordered by.
    #[serde(default)]
    pub index_field: String,
}

/// Legacy manifest text: `name,index,index_field` per line, no header.
pub fn parse_table_lines(content: &str) -> Vec<TableDecl> {
    text_lines(content, false)
        .map(|line| {
            let mut cells = split_cells(line).into_iter();
            TableDecl {
                name: cells.next().unwrap_or_default(),
                index: cells.next().unwrap_or_default(),
                index_field: cells.next().unwrap_or_default(),
            }
        })
        .collect()
}

// ===========================================================================
// Layout rows
// ===========================================================================

pub const COLUMN: &str = "column";
pub const OBJECT_DEFINITION: &str = "object_definition";
pub const OBJECT_FIELD: &str = "object_field";

const LAYOUT_KINDS: [&str; 3] = [COLUMN, OBJECT_DEFINITION, OBJECT_FIELD];

/// Data type marking a collection; the element type is the first extra.
pub const ARRAY_TYPE: &str = "array";

/// One declaration row of a table layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LayoutRow {
    pub kind: String,
    pub name: String,
    /// Primitive or object type name, or `array`.
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Element type for arrays, member names for object definitions.
    #[serde(default)]
    pub extra: Vec<String>,
}

impl LayoutRow {
    fn field_spec(&self, file: &Path) -> Result<FieldSpec, DataLoadError> {
        if self.type_name != ARRAY_TYPE {
            return Ok(FieldSpec::new(&self.name, &self.type_name));
        }
        let element = self
            .extra
            .first()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| DataLoadError::Parse {
                file: file.to_path_buf(),
                detail: format!("array field '{}' has no element type", self.name),
            })?;
        Ok(FieldSpec::array(&self.name, element))
    }

    fn object_spec(&self) -> ObjectTypeSpec {
        ObjectTypeSpec::new(
            &self.name,
            self.extra
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty()),
        )
    }
}

/// Legacy layout text: a header line, then `kind,name,type,extra...` rows.
pub fn parse_layout_rows(content: &str) -> Vec<LayoutRow> {
    text_lines(content, true)
        .map(|line| {
            let mut cells = split_cells(line).into_iter();
            LayoutRow {
                kind: cells.next().unwrap_or_default(),
                name: cells.next().unwrap_or_default(),
                type_name: cells.next().unwrap_or_default(),
                extra: cells.collect(),
            }
        })
        .collect()
}

/// Turn the layout rows of `table` into a [`TableSchema`].
///
/// Every row kind is checked before anything is converted, so one error
/// lists all the unknown kinds of the file.
pub fn schema_from_rows(
    table: &str,
    rows: &[LayoutRow],
    file: &Path,
) -> Result<TableSchema, DataLoadError> {
    let invalid: Vec<String> = rows
        .iter()
        .filter(|row| !LAYOUT_KINDS.contains(&row.kind.as_str()))
        .map(|row| row.kind.clone())
        .collect();
    if !invalid.is_empty() {
        return Err(DataLoadError::InvalidLayoutKind {
            file: file.to_path_buf(),
            kinds: invalid,
        });
    }

    let mut schema = TableSchema::new(table);
    for row in rows {
        match row.kind.as_str() {
            COLUMN => schema.columns.push(row.field_spec(file)?),
            OBJECT_FIELD => schema.object_fields.push(row.field_spec(file)?),
            _ => schema.object_definitions.push(row.object_spec()),
        }
    }
    Ok(schema)
}

// ===========================================================================
// Rules
// ===========================================================================

/// A rule declaration: a kind tag and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleDecl {
    pub kind: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Legacy rules text: a header line, then `kind,target,args...` rows.
pub fn parse_rule_lines(content: &str) -> Vec<RuleDecl> {
    text_lines(content, true)
        .map(|line| {
            let mut cells = split_cells(line).into_iter();
            RuleDecl {
                kind: cells.next().unwrap_or_default(),
                args: cells.collect(),
            }
        })
        .collect()
}

/// Build rules from declarations. Errors carry the 1-based declaration
/// number.
pub fn rules_from_decls(decls: &[RuleDecl], file: &Path) -> Result<Vec<Rule>, DataLoadError> {
    decls
        .iter()
        .enumerate()
        .map(|(i, decl)| {
            Rule::from_declaration(&decl.kind, &decl.args).map_err(|source| {
                DataLoadError::Rule {
                    file: file.to_path_buf(),
                    index: i + 1,
                    source,
                }
            })
        })
        .collect()
}

// ===========================================================================
// TOML keys
// ===========================================================================

// Each TOML file wraps its list in a top-level array of tables.
pub const TOML_TABLES_KEY: &str = "tables";
pub const TOML_ROWS_KEY: &str = "rows";
pub const TOML_RULES_KEY: &str = "rules";
