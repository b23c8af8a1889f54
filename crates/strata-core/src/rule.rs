//! Declarative cross-record validation rules.
//!
//! Every rule targets one `table.dotted.path`. Checking walks that path in
//! every record of the table; a collection on the way fans out to each of
//! its elements, and a missing or unset value simply ends that branch. The
//! first leaf that breaks the rule stops the check.

use crate::error::{RuleDeclarationError, RuleError, RuleViolation, ViolationReason};
use crate::record::{DynamicRecord, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Records of every table in a run, keyed by table name.
pub type TableRecords = HashMap<String, Vec<DynamicRecord>>;

/// A `table.dotted.path` split once into its table and path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTarget {
    pub table: String,
    pub path: String,
    pub segments: Vec<String>,
}

impl RuleTarget {
    pub fn parse(target: &str) -> Result<Self, RuleDeclarationError> {
        let target = target.trim();
        let (table, path) = target
            .split_once('.')
            .ok_or_else(|| RuleDeclarationError::InvalidTarget(target.to_string()))?;
        let (table, path) = (table.trim(), path.trim());
        if table.is_empty() || path.is_empty() {
            return Err(RuleDeclarationError::InvalidTarget(target.to_string()));
        }
        Ok(Self {
            table: table.to_string(),
            path: path.to_string(),
            segments: path.split('.').map(|s| s.trim().to_string()).collect(),
        })
    }

    fn violation(&self, value: &str, reason: ViolationReason) -> RuleError {
        RuleError::Violation(RuleViolation {
            table: self.table.clone(),
            path: self.path.clone(),
            value: value.to_string(),
            reason,
        })
    }

    fn records<'a>(&self, tables: &'a TableRecords) -> Result<&'a [DynamicRecord], RuleError> {
        tables
            .get(&self.table)
            .map(Vec::as_slice)
            .ok_or_else(|| RuleError::UnknownTable(self.table.clone()))
    }

    /// Visit every leaf reached by this target, stopping at the first error.
    fn walk<E>(
        &self,
        tables: &TableRecords,
        visit: &mut impl FnMut(&Value) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<RuleError>,
    {
        for record in self.records(tables)? {
            walk_record(record, &self.segments, visit)?;
        }
        Ok(())
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.path)
    }
}

fn walk_record<E>(
    record: &DynamicRecord,
    segments: &[String],
    visit: &mut impl FnMut(&Value) -> Result<(), E>,
) -> Result<(), E> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    match record.field(head) {
        Some(value) => walk_value(value, rest, visit),
        None => Ok(()),
    }
}

fn walk_value<E>(
    value: &Value,
    segments: &[String],
    visit: &mut impl FnMut(&Value) -> Result<(), E>,
) -> Result<(), E> {
    match value {
        Value::Unset => Ok(()),
        Value::Collection(items) => {
            // An explicit index picks one element; otherwise fan out.
            if let Some(index) = segments.first().and_then(|s| s.parse::<usize>().ok()) {
                return match items.get(index) {
                    Some(item) => walk_value(item, &segments[1..], visit),
                    None => Ok(()),
                };
            }
            for item in items {
                walk_value(item, segments, visit)?;
            }
            Ok(())
        }
        _ if segments.is_empty() => visit(value),
        Value::Nested(record) => walk_record(record, segments, visit),
        Value::Primitive(_) => Ok(()),
    }
}

/// Text of every leaf reached by `target`.
fn collect_leaves(target: &RuleTarget, tables: &TableRecords) -> Result<HashSet<String>, RuleError> {
    let mut leaves = HashSet::new();
    target.walk(tables, &mut |leaf: &Value| -> Result<(), RuleError> {
        leaves.insert(leaf.to_string());
        Ok(())
    })?;
    Ok(leaves)
}

/// A validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Every checked value must appear at `source` in another (or the same)
    /// table.
    TableMapping {
        target: RuleTarget,
        source: RuleTarget,
    },
    /// Every comma-separated token of a checked value must be allowed.
    ValueSet {
        target: RuleTarget,
        allowed: Vec<String>,
    },
    /// Every checked value must be an integer in `[min, max]`.
    Interval {
        target: RuleTarget,
        min: i64,
        max: i64,
    },
    /// No checked value may repeat across the table.
    Uniqueness { target: RuleTarget },
}

impl Rule {
    pub fn table_mapping(target: &str, source: &str) -> Result<Self, RuleDeclarationError> {
        Ok(Rule::TableMapping {
            target: RuleTarget::parse(target)?,
            source: RuleTarget::parse(source)?,
        })
    }

    pub fn value_set<I, S>(target: &str, allowed: I) -> Result<Self, RuleDeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Rule::ValueSet {
            target: RuleTarget::parse(target)?,
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    pub fn interval(target: &str, min: i64, max: i64) -> Result<Self, RuleDeclarationError> {
        Ok(Rule::Interval {
            target: RuleTarget::parse(target)?,
            min,
            max,
        })
    }

    pub fn uniqueness(target: &str) -> Result<Self, RuleDeclarationError> {
        Ok(Rule::Uniqueness {
            target: RuleTarget::parse(target)?,
        })
    }

    /// Build a rule from a declaration: a kind tag (`table`, `values`,
    /// `interval`, `unique`) and its positional arguments, target first.
    pub fn from_declaration<S: AsRef<str>>(
        kind: &str,
        args: &[S],
    ) -> Result<Self, RuleDeclarationError> {
        let kind = kind.trim();
        let arg = move |i: usize, kind: &'static str, argument: &'static str| {
            args.get(i)
                .map(|a| a.as_ref().trim())
                .ok_or(RuleDeclarationError::MissingArgument { kind, argument })
        };
        let bound = move |i: usize, kind: &'static str, argument: &'static str| {
            let text = arg(i, kind, argument)?;
            text.parse::<i64>()
                .map_err(|_| RuleDeclarationError::InvalidBound {
                    kind,
                    value: text.to_string(),
                })
        };

        match kind {
            "table" => Rule::table_mapping(arg(0, "table", "target")?, arg(1, "table", "source")?),
            "values" => Rule::value_set(
                arg(0, "values", "target")?,
                args[1..].iter().map(|a| a.as_ref().trim().to_string()),
            ),
            "interval" => Rule::interval(
                arg(0, "interval", "target")?,
                bound(1, "interval", "min")?,
                bound(2, "interval", "max")?,
            ),
            "unique" => Rule::uniqueness(arg(0, "unique", "target")?),
            other => Err(RuleDeclarationError::UnknownKind(other.to_string())),
        }
    }

    pub fn target(&self) -> &RuleTarget {
        match self {
            Rule::TableMapping { target, .. }
            | Rule::ValueSet { target, .. }
            | Rule::Interval { target, .. }
            | Rule::Uniqueness { target } => target,
        }
    }

    /// Check the rule against every table's records. Read-only; stops at the
    /// first violation.
    pub fn check(&self, tables: &TableRecords) -> Result<(), RuleError> {
        match self {
            Rule::TableMapping { target, source } => {
                let allowed = collect_leaves(source, tables)?;
                target.walk(tables, &mut |leaf: &Value| {
                    let text = leaf.to_string();
                    if allowed.contains(&text) {
                        Ok(())
                    } else {
                        Err(target.violation(
                            &text,
                            ViolationReason::NotInTable {
                                source: source.to_string(),
                            },
                        ))
                    }
                })
            }
            Rule::ValueSet { target, allowed } => target.walk(tables, &mut |leaf: &Value| {
                let text = leaf.to_string();
                for token in text.trim_matches('"').split(',') {
                    if !allowed.iter().any(|a| a == token) {
                        return Err(target.violation(
                            token,
                            ViolationReason::NotInValues {
                                allowed: allowed.clone(),
                            },
                        ));
                    }
                }
                Ok(())
            }),
            Rule::Interval { target, min, max } => target.walk(tables, &mut |leaf: &Value| {
                let text = leaf.to_string();
                let value = text.trim().parse::<i64>().map_err(|_| {
                    target.violation(
                        &text,
                        ViolationReason::NotAnInteger {
                            min: *min,
                            max: *max,
                        },
                    )
                })?;
                if value < *min || value > *max {
                    return Err(target.violation(
                        &text,
                        ViolationReason::OutOfInterval {
                            min: *min,
                            max: *max,
                        },
                    ));
                }
                Ok(())
            }),
            Rule::Uniqueness { target } => {
                let mut seen = HashSet::new();
                target.walk(tables, &mut |leaf: &Value| {
                    let text = leaf.to_string();
                    if seen.contains(&text) {
                        return Err(target.violation(&text, ViolationReason::Duplicate));
                    }
                    seen.insert(text);
                    Ok(())
                })
            }
        }
    }
}

/// Renders the rule in declaration form, e.g. `interval Player.level 1 5`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::TableMapping { target, source } => write!(f, "table {target} {source}"),
            Rule::ValueSet { target, allowed } => {
                write!(f, "values {target} {}", allowed.join(","))
            }
            Rule::Interval { target, min, max } => write!(f, "interval {target} {min} {max}"),
            Rule::Uniqueness { target } => write!(f, "unique {target}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_table;
    use crate::schema::{FieldSpec, ObjectTypeSpec, TableSchema};

    fn tables(rows: &[&[(&str, &str)]]) -> TableRecords {
        let schema = TableSchema::new("Player")
            .column(FieldSpec::new("id", "string"))
            .column(FieldSpec::new("level", "int"))
            .column(FieldSpec::new("color", "string"))
            .column(FieldSpec::array("items", "Item"))
            .object_field(FieldSpec::new("Item.kind", "string"))
            .object(ObjectTypeSpec::new("Item", ["kind"]));
        let (root, _) = build_table(&schema).unwrap();
        let records = rows
            .iter()
            .map(|row| {
                let mut record = DynamicRecord::new(root.clone());
                record.deserialize(row.iter().copied()).unwrap();
                record
            })
            .collect();
        let mut map = HashMap::new();
        map.insert("Player".to_string(), records);
        map
    }

    fn violation(result: Result<(), RuleError>) -> RuleViolation {
        match result {
            Err(RuleError::Violation(v)) => v,
            other => panic!("expected violation, got: {other:?}"),
        }
    }

    #[test]
    fn target_parse() {
        let t = RuleTarget::parse("Player.stats.hp").unwrap();
        assert_eq!(t.table, "Player");
        assert_eq!(t.path, "stats.hp");
        assert_eq!(t.segments, vec!["stats", "hp"]);
        assert!(RuleTarget::parse("Player").is_err());
        assert!(RuleTarget::parse(".hp").is_err());
    }

    #[test]
    fn value_set_splits_tokens() {
        let data = tables(&[&[("color", "red,green")]]);
        let rule = Rule::value_set("Player.color", ["red", "blue"]).unwrap();
        let v = violation(rule.check(&data));
        assert_eq!(v.value, "green");

        let data = tables(&[&[("color", "red,blue")], &[("color", "red")]]);
        assert!(rule.check(&data).is_ok());
    }

    #[test]
    fn value_set_strips_quotes() {
        let data = tables(&[&[("color", "\"red,blue\"")]]);
        let rule = Rule::value_set("Player.color", ["red", "blue"]).unwrap();
        assert!(rule.check(&data).is_ok());
    }

    #[test]
    fn interval_bounds_inclusive() {
        let rule = Rule::interval("Player.level", 1, 5).unwrap();
        assert!(rule.check(&tables(&[&[("level", "5")], &[("level", "1")]])).is_ok());
        let v = violation(rule.check(&tables(&[&[("level", "6")]])));
        assert_eq!(v.value, "6");
        assert_eq!(v.reason, ViolationReason::OutOfInterval { min: 1, max: 5 });
    }

    #[test]
    fn interval_rejects_non_integers() {
        let rule = Rule::interval("Player.id", 1, 5).unwrap();
        let v = violation(rule.check(&tables(&[&[("id", "abc")]])));
        assert!(matches!(v.reason, ViolationReason::NotAnInteger { .. }));
    }

    #[test]
    fn uniqueness_across_records() {
        let rule = Rule::uniqueness("Player.id").unwrap();
        let data = tables(&[&[("id", "a")], &[("id", "b")], &[("id", "a")]]);
        let v = violation(rule.check(&data));
        assert_eq!(v.value, "a");
        assert_eq!(v.reason, ViolationReason::Duplicate);
    }

    #[test]
    fn uniqueness_state_is_per_check() {
        let rule = Rule::uniqueness("Player.id").unwrap();
        let data = tables(&[&[("id", "a")]]);
        assert!(rule.check(&data).is_ok());
        assert!(rule.check(&data).is_ok());
    }

    #[test]
    fn walk_fans_out_over_collections() {
        let rule = Rule::value_set("Player.items.kind", ["sword", "shield"]).unwrap();
        let data = tables(&[&[
            ("items.0.kind", "sword"),
            ("items.1.kind", "bow"),
        ]]);
        assert_eq!(violation(rule.check(&data)).value, "bow");
    }

    #[test]
    fn explicit_index_selects_one_element() {
        let rule = Rule::value_set("Player.items.0.kind", ["sword"]).unwrap();
        let data = tables(&[&[
            ("items.0.kind", "sword"),
            ("items.1.kind", "bow"),
        ]]);
        assert!(rule.check(&data).is_ok());
    }

    #[test]
    fn missing_values_are_not_checked() {
        let rule = Rule::interval("Player.level", 1, 5).unwrap();
        let data = tables(&[&[("id", "a")], &[]]);
        assert!(rule.check(&data).is_ok());
        let rule = Rule::value_set("Player.items.kind", ["sword"]).unwrap();
        assert!(rule.check(&data).is_ok());
    }

    #[test]
    fn table_mapping_within_same_table() {
        let rule = Rule::table_mapping("Player.color", "Player.id").unwrap();
        let ok = tables(&[&[("id", "red"), ("color", "red")], &[("id", "blue")]]);
        assert!(rule.check(&ok).is_ok());

        let bad = tables(&[&[("id", "red"), ("color", "green")]]);
        let v = violation(rule.check(&bad));
        assert_eq!(v.value, "green");
        assert_eq!(
            v.reason,
            ViolationReason::NotInTable {
                source: "Player.id".into()
            }
        );
    }

    #[test]
    fn unknown_table_is_reported() {
        let rule = Rule::uniqueness("Guild.id").unwrap();
        assert_eq!(
            rule.check(&tables(&[])),
            Err(RuleError::UnknownTable("Guild".into()))
        );
    }

    #[test]
    fn from_declaration_maps_kinds() {
        assert!(matches!(
            Rule::from_declaration("table", &["A.x", "B.y"]),
            Ok(Rule::TableMapping { .. })
        ));
        match Rule::from_declaration("values", &["A.x", "red", "blue"]).unwrap() {
            Rule::ValueSet { allowed, .. } => assert_eq!(allowed, vec!["red", "blue"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            Rule::from_declaration("interval", &["A.x", "1", "5"]).unwrap(),
            Rule::interval("A.x", 1, 5).unwrap()
        );
        assert!(matches!(
            Rule::from_declaration("unique", &["A.x"]),
            Ok(Rule::Uniqueness { .. })
        ));
    }

    #[test]
    fn from_declaration_errors() {
        assert_eq!(
            Rule::from_declaration::<&str>("sorted", &["A.x"]),
            Err(RuleDeclarationError::UnknownKind("sorted".into()))
        );
        assert!(matches!(
            Rule::from_declaration("interval", &["A.x", "1"]),
            Err(RuleDeclarationError::MissingArgument { argument: "max", .. })
        ));
        assert!(matches!(
            Rule::from_declaration("interval", &["A.x", "one", "5"]),
            Err(RuleDeclarationError::InvalidBound { .. })
        ));
        assert!(matches!(
            Rule::from_declaration::<&str>("unique", &[]),
            Err(RuleDeclarationError::MissingArgument { .. })
        ));
        assert!(matches!(
            Rule::from_declaration("unique", &["nodot"]),
            Err(RuleDeclarationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn display_is_declaration_form() {
        let rule = Rule::interval("Player.level", 1, 5).unwrap();
        assert_eq!(rule.to_string(), "interval Player.level 1 5");
        assert_eq!(rule.target().table, "Player");
    }
}
