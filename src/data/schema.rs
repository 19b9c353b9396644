use std::fmt;

use thiserror::Error;

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Logical fields
// ---------------------------------------------------------------------------

/// A semantic column identity, independent of how the source file spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalField {
    StateOfResidence,
    Month,
    MonthCode,
    YearCode,
    SexOfInfant,
    Births,
}

impl LogicalField {
    /// The canonical name, which is also the substring searched for.
    pub fn name(self) -> &'static str {
        match self {
            LogicalField::StateOfResidence => "state_of_residence",
            LogicalField::Month => "month",
            LogicalField::MonthCode => "month_code",
            LogicalField::YearCode => "year_code",
            LogicalField::SexOfInfant => "sex_of_infant",
            LogicalField::Births => "births",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Column name canonicalisation
// ---------------------------------------------------------------------------

/// Trim surrounding whitespace, lowercase, and turn interior spaces into `_`.
pub fn canonical_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

// ---------------------------------------------------------------------------
// Resolution rules
// ---------------------------------------------------------------------------

/// One `logical field → column predicate` rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: LogicalField,
}

impl FieldRule {
    /// A canonical column satisfies the rule when it contains the field name.
    pub fn matches(&self, column: &str) -> bool {
        column.contains(self.field.name())
    }
}

/// Rules are evaluated in this order, each independently of the others.
///
/// First match wins: a rule binds the first column (in table order) that
/// satisfies it, even if a later column would fit better.  Because "month" is
/// a substring of "month_code", a `Month Code` column placed before `Month`
/// binds to both `month` and `month_code`.  That misbinding is kept as is;
/// [`normalize`] then names the shared column after the later rule and looks
/// `month` up by name among the renamed columns.
pub const FIELD_RULES: [FieldRule; 6] = [
    FieldRule { field: LogicalField::StateOfResidence },
    FieldRule { field: LogicalField::Month },
    FieldRule { field: LogicalField::MonthCode },
    FieldRule { field: LogicalField::YearCode },
    FieldRule { field: LogicalField::SexOfInfant },
    FieldRule { field: LogicalField::Births },
];

/// Outcome of evaluating one rule against the canonical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// Exactly one column satisfied the rule.
    Unique(usize),
    /// Several columns satisfied the rule; the first was taken.
    Ambiguous { chosen: usize, others: Vec<usize> },
    /// No column satisfied the rule.
    Unresolved,
}

impl FieldMatch {
    pub fn column(&self) -> Option<usize> {
        match self {
            FieldMatch::Unique(idx) => Some(*idx),
            FieldMatch::Ambiguous { chosen, .. } => Some(*chosen),
            FieldMatch::Unresolved => None,
        }
    }
}

/// Evaluate a single rule over canonical column names.
pub fn match_field(rule: &FieldRule, columns: &[String]) -> FieldMatch {
    let mut hits = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| rule.matches(c))
        .map(|(i, _)| i);

    match hits.next() {
        None => FieldMatch::Unresolved,
        Some(chosen) => {
            let others: Vec<usize> = hits.collect();
            if others.is_empty() {
                FieldMatch::Unique(chosen)
            } else {
                FieldMatch::Ambiguous { chosen, others }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Field map
// ---------------------------------------------------------------------------

/// Column index of every logical field in a normalised table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    columns: [usize; 6],
}

impl FieldMap {
    pub fn column(&self, field: LogicalField) -> usize {
        self.columns[field.slot()]
    }

    /// Point every field at the column now carrying its name.
    ///
    /// After renaming, a field whose bound column was renamed by a later rule
    /// moves to the first column spelled exactly like the field; with no such
    /// column it keeps its first-match binding.
    fn rebind_by_name(mut self, renamed: &[String]) -> Self {
        for rule in &FIELD_RULES {
            let name = rule.field.name();
            let slot = rule.field.slot();
            if renamed[self.columns[slot]] == name {
                continue;
            }
            if let Some(idx) = renamed.iter().position(|c| c == name) {
                self.columns[slot] = idx;
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(
        "Missing required logical fields: [{}]. Available columns: [{}]",
        field_names(.missing),
        .available.join(", ")
    )]
    MissingFields {
        missing: Vec<LogicalField>,
        available: Vec<String>,
    },
}

fn field_names(fields: &[LogicalField]) -> String {
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

/// Run every rule over the canonical columns.
///
/// Fails only after all rules have been evaluated, naming every unresolved
/// field together with the full list of available columns.
pub fn resolve_fields(columns: &[String]) -> Result<FieldMap, SchemaError> {
    let mut resolved = [0usize; 6];
    let mut missing = Vec::new();

    for rule in &FIELD_RULES {
        let found = match_field(rule, columns);
        if let FieldMatch::Ambiguous { chosen, others } = &found {
            log::warn!(
                "Logical field '{}' matches several columns; using '{}' over {:?}",
                rule.field,
                columns[*chosen],
                others.iter().map(|&i| &columns[i]).collect::<Vec<_>>()
            );
        }
        match found.column() {
            Some(idx) => resolved[rule.field.slot()] = idx,
            None => missing.push(rule.field),
        }
    }

    if missing.is_empty() {
        Ok(FieldMap { columns: resolved })
    } else {
        Err(SchemaError::MissingFields {
            missing,
            available: columns.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// BirthTable – the normalised table the rest of the pipeline works on
// ---------------------------------------------------------------------------

/// Record table after canonicalisation, field resolution, renaming and
/// births coercion.  Every row's births cell is a finite [`Value::Float`].
#[derive(Debug, Clone, PartialEq)]
pub struct BirthTable {
    pub table: Table,
    pub fields: FieldMap,
}

impl BirthTable {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.table.rows
    }

    /// The cell holding `field` in `row`.
    pub fn value<'a>(&self, row: &'a [Value], field: LogicalField) -> &'a Value {
        &row[self.fields.column(field)]
    }

    /// The births measure of `row`.
    pub fn births(&self, row: &[Value]) -> f64 {
        self.value(row, LogicalField::Births)
            .as_measure()
            .unwrap_or_default()
    }

    /// Same schema, only the rows `keep` accepts.
    pub fn retain_rows<F>(&self, keep: F) -> BirthTable
    where
        F: FnMut(&[Value]) -> bool,
    {
        BirthTable {
            table: self.table.retain_rows(keep),
            fields: self.fields,
        }
    }
}

/// Canonicalise, resolve, rename and coerce births.
///
/// Rows whose births value is missing after coercion are dropped.
pub fn normalize(mut table: Table) -> Result<BirthTable, SchemaError> {
    for col in &mut table.columns {
        *col = canonical_column_name(col);
    }

    let fields = resolve_fields(&table.columns)?;

    // A column bound by two rules takes the name of the later one.
    for rule in &FIELD_RULES {
        table.columns[fields.column(rule.field)] = rule.field.name().to_string();
    }
    let fields = fields.rebind_by_name(&table.columns);

    let births_idx = fields.column(LogicalField::Births);
    let before = table.len();
    table.rows.retain_mut(|row| match row[births_idx].as_measure() {
        Some(v) => {
            row[births_idx] = Value::Float(v);
            true
        }
        None => false,
    });

    let dropped = before - table.len();
    if dropped > 0 {
        log::warn!("Dropped {dropped} rows with a non-numeric births value");
    }

    Ok(BirthTable { table, fields })
}
