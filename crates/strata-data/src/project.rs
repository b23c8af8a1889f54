//! Project loading: manifest, per-table layouts and rules from one
//! directory.

use crate::layout::{
    parse_layout_rows, parse_rule_lines, parse_table_lines, rules_from_decls, schema_from_rows,
    LayoutRow, RuleDecl, TableDecl, TOML_ROWS_KEY, TOML_RULES_KEY, TOML_TABLES_KEY,
};
use crate::loader::{find_data_file, read_list, require_data_file, DataLoadError};
use std::path::{Path, PathBuf};
use strata_core::rule::Rule;
use strata_core::schema::TableSchema;
use strata_core::table::TableSet;

/// Everything declared for a project, ready to build.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub tables: Vec<TableDecl>,
    /// One schema per manifest entry, in manifest order.
    pub schemas: Vec<TableSchema>,
    pub rules: Vec<Rule>,
}

impl Project {
    pub fn schema(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.iter().find(|s| s.name == table)
    }

    /// Build every declared table into an empty [`TableSet`].
    pub fn build_tables(&self) -> Result<TableSet, DataLoadError> {
        let mut set = TableSet::new();
        for schema in &self.schemas {
            set.create_table(schema)?;
        }
        tracing::info!(tables = self.schemas.len(), "built project tables");
        Ok(set)
    }
}

/// Load the manifest, every table layout and the optional rules file from
/// `dir`.
pub fn load_project(dir: &Path) -> Result<Project, DataLoadError> {
    let manifest = require_data_file(dir, "tables")?;
    let tables: Vec<TableDecl> = read_list(&manifest, TOML_TABLES_KEY, parse_table_lines)?;

    let mut schemas = Vec::with_capacity(tables.len());
    for decl in &tables {
        let path = require_data_file(dir, &format!("{}_layout", decl.name))?;
        let rows: Vec<LayoutRow> = read_list(&path, TOML_ROWS_KEY, parse_layout_rows)?;
        let schema = schema_from_rows(&decl.name, &rows, &path)?;
        tracing::debug!(
            table = %decl.name,
            columns = schema.columns.len(),
            objects = schema.object_definitions.len(),
            "loaded layout"
        );
        schemas.push(schema);
    }

    let rules = match find_data_file(dir, "rules")? {
        Some(path) => {
            let decls: Vec<RuleDecl> = read_list(&path, TOML_RULES_KEY, parse_rule_lines)?;
            rules_from_decls(&decls, &path)?
        }
        None => Vec::new(),
    };

    tracing::info!(
        dir = %dir.display(),
        tables = tables.len(),
        rules = rules.len(),
        "loaded project"
    );

    Ok(Project {
        dir: dir.to_path_buf(),
        tables,
        schemas,
        rules,
    })
}
