use std::collections::BTreeSet;
use std::fmt;

use super::model::Value;
use super::schema::{BirthTable, LogicalField};

// ---------------------------------------------------------------------------
// Dimensions and selections
// ---------------------------------------------------------------------------

/// A filterable dimension of the birth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Month,
    Gender,
    State,
}

impl Dimension {
    /// Filters are applied in this order.
    pub const ALL: [Dimension; 3] = [Dimension::Month, Dimension::Gender, Dimension::State];

    pub fn field(self) -> LogicalField {
        match self {
            Dimension::Month => LogicalField::Month,
            Dimension::Gender => LogicalField::SexOfInfant,
            Dimension::State => LogicalField::StateOfResidence,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Month => "Month",
            Dimension::Gender => "Gender",
            Dimension::State => "State",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which values of one dimension are allowed through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No filtering on this dimension.
    #[default]
    Unrestricted,
    /// Only these values pass.  An empty set lets nothing through.
    RestrictedTo(BTreeSet<Value>),
}

/// One entry of a multi-select control: the "All" sentinel or a real value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Choice {
    All,
    Value(Value),
}

impl Selection {
    /// Build a selection from the entries ticked in a multi-select.
    ///
    /// If `All` is among the choices the dimension is unrestricted, even when
    /// specific values are ticked alongside it.
    pub fn from_choices<'a, I>(choices: I) -> Self
    where
        I: IntoIterator<Item = &'a Choice>,
    {
        let mut values = BTreeSet::new();
        for choice in choices {
            match choice {
                Choice::All => return Selection::Unrestricted,
                Choice::Value(v) => {
                    values.insert(v.clone());
                }
            }
        }
        Selection::RestrictedTo(values)
    }

    pub fn allows(&self, value: &Value) -> bool {
        match self {
            Selection::Unrestricted => true,
            Selection::RestrictedTo(values) => values.contains(value),
        }
    }
}

/// Selections for all three dimensions of one render cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelections {
    pub month: Selection,
    pub gender: Selection,
    pub state: Selection,
}

impl FilterSelections {
    pub fn get(&self, dimension: Dimension) -> &Selection {
        match dimension {
            Dimension::Month => &self.month,
            Dimension::Gender => &self.gender,
            Dimension::State => &self.state,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut Selection {
        match dimension {
            Dimension::Month => &mut self.month,
            Dimension::Gender => &mut self.gender,
            Dimension::State => &mut self.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Sorted non-null values of `dimension`, used to populate its options.
pub fn distinct_values(table: &BirthTable, dimension: Dimension) -> BTreeSet<Value> {
    table
        .table
        .distinct_values(table.fields.column(dimension.field()))
}

/// Keep the rows whose `dimension` value the selection allows.
pub fn apply_selection(
    table: &BirthTable,
    dimension: Dimension,
    selection: &Selection,
) -> BirthTable {
    if let Selection::Unrestricted = selection {
        return table.clone();
    }
    let idx = table.fields.column(dimension.field());
    let filtered = table.retain_rows(|row| selection.allows(&row[idx]));
    log::debug!(
        "{dimension} filter kept {} of {} rows",
        filtered.len(),
        table.len()
    );
    filtered
}

/// Apply every dimension in turn; a row survives only if all three allow it.
pub fn apply_filters(table: &BirthTable, selections: &FilterSelections) -> BirthTable {
    Dimension::ALL
        .iter()
        .fold(table.clone(), |acc, &dim| {
            apply_selection(&acc, dim, selections.get(dim))
        })
}
