//! A named collection of tables: built types plus the records loaded into
//! them.

use crate::builder::build_table;
use crate::error::{RuleError, TableError};
use crate::primitive::Scalar;
use crate::record::DynamicRecord;
use crate::rule::{Rule, TableRecords};
use crate::schema::{RecordTypeHandle, TableSchema};
use std::collections::HashMap;

/// Every table of a project, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    order: Vec<String>,
    types: HashMap<String, RecordTypeHandle>,
    records: TableRecords,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the record types for `schema` and add an empty table.
    pub fn create_table(&mut self, schema: &TableSchema) -> Result<RecordTypeHandle, TableError> {
        if self.types.contains_key(&schema.name) {
            return Err(TableError::DuplicateTable(schema.name.clone()));
        }
        let (root, _registry) = build_table(schema)?;
        self.order.push(schema.name.clone());
        self.types.insert(schema.name.clone(), root.clone());
        self.records.insert(schema.name.clone(), Vec::new());
        Ok(root)
    }

    /// Create a record from a flat dotted-path map and append it to `table`.
    ///
    /// The record is stored only if every entry applied. Errors carry the
    /// 1-based row number the record would have had.
    pub fn add_entry<I, K, V>(&mut self, table: &str, entries: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Scalar>,
    {
        let ty = self.record_type(table)?.clone();
        let rows = self
            .records
            .get_mut(table)
            .ok_or_else(|| TableError::UnknownTable(table.to_string()))?;

        let mut record = DynamicRecord::new(ty);
        record
            .deserialize(entries)
            .map_err(|source| TableError::Entry {
                table: table.to_string(),
                row: rows.len() + 1,
                source,
            })?;
        rows.push(record);
        Ok(())
    }

    pub fn record_type(&self, table: &str) -> Result<&RecordTypeHandle, TableError> {
        self.types
            .get(table)
            .ok_or_else(|| TableError::UnknownTable(table.to_string()))
    }

    pub fn records(&self, table: &str) -> Result<&[DynamicRecord], TableError> {
        self.records
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::UnknownTable(table.to_string()))
    }

    pub fn entry_count(&self, table: &str) -> Result<usize, TableError> {
        self.records(table).map(<[DynamicRecord]>::len)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// One row per record, one cell per header path. Absent and unset
    /// values are `None`.
    pub fn project<S: AsRef<str>>(
        &self,
        table: &str,
        headers: &[S],
    ) -> Result<Vec<Vec<Option<String>>>, TableError> {
        Ok(self
            .records(table)?
            .iter()
            .map(|record| {
                record
                    .flatten(headers)
                    .into_iter()
                    .map(|(_, value)| value.filter(|v| !v.is_unset()).map(ToString::to_string))
                    .collect()
            })
            .collect())
    }

    pub fn run_rule(&self, rule: &Rule) -> Result<(), RuleError> {
        rule.check(&self.records)
    }

    /// Check each rule independently, returning one outcome per rule in
    /// input order.
    pub fn run_rules<'a>(&self, rules: &'a [Rule]) -> Vec<(&'a Rule, Result<(), RuleError>)> {
        let outcomes: Vec<_> = rules
            .iter()
            .map(|rule| {
                let outcome = self.run_rule(rule);
                match &outcome {
                    Ok(()) => tracing::debug!(%rule, "rule passed"),
                    Err(error) => tracing::warn!(%rule, %error, "rule failed"),
                }
                (rule, outcome)
            })
            .collect();
        let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        tracing::info!(rules = rules.len(), failed, "rule check finished");
        outcomes
    }
}
