use std::path::Path;

use thiserror::Error;

use super::aggregate::{AggregateRow, aggregate_births};
use super::filter::{Dimension, FilterSelections, apply_filters, distinct_values};
use super::loader::{LoadError, load_dataset};
use super::model::Value;
use super::schema::{BirthTable, SchemaError, normalize};

/// A condition that stops the cycle before anything is rendered.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Artifacts the presenter draws for a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Filtered raw rows, in source order.
    pub filtered: BirthTable,
    /// Births summed per (state, gender), sorted by state.
    pub aggregated: Vec<AggregateRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered(Rendered),
    /// The selections matched no rows.
    NoData,
}

/// Options offered by each multi-select, taken from the unfiltered table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOptions {
    pub month: Vec<Value>,
    pub gender: Vec<Value>,
    pub state: Vec<Value>,
}

impl FilterOptions {
    pub fn from_table(table: &BirthTable) -> Self {
        let opts = |d: Dimension| -> Vec<Value> { distinct_values(table, d).into_iter().collect() };
        FilterOptions {
            month: opts(Dimension::Month),
            gender: opts(Dimension::Gender),
            state: opts(Dimension::State),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &[Value] {
        match dimension {
            Dimension::Month => &self.month,
            Dimension::Gender => &self.gender,
            Dimension::State => &self.state,
        }
    }
}

/// Everything one render cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// Normalised, unfiltered table.
    pub table: BirthTable,
    pub options: FilterOptions,
    pub outcome: Outcome,
}

/// Filter and aggregate an already normalised table.
pub fn evaluate(table: &BirthTable, selections: &FilterSelections) -> Outcome {
    let filtered = apply_filters(table, selections);
    if filtered.is_empty() {
        return Outcome::NoData;
    }
    let aggregated = aggregate_births(&filtered);
    Outcome::Rendered(Rendered {
        filtered,
        aggregated,
    })
}

/// Run one full cycle: load, normalise, filter, aggregate.
pub fn run_cycle(path: &Path, selections: &FilterSelections) -> Result<Cycle, PipelineError> {
    let raw = load_dataset(path)?;
    let table = normalize(raw)?;
    let options = FilterOptions::from_table(&table);
    let outcome = evaluate(&table, selections);

    match &outcome {
        Outcome::Rendered(r) => log::info!(
            "Cycle rendered {} of {} rows into {} groups",
            r.filtered.len(),
            table.len(),
            r.aggregated.len()
        ),
        Outcome::NoData => log::info!("Cycle matched no rows"),
    }

    Ok(Cycle {
        table,
        options,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::{TempDir, tempdir};

    use crate::data::filter::Selection;
    use crate::data::schema::LogicalField;

    const HEADER: &str = "State of Residence,Month,Month Code,Year Code,Sex of Infant,Births";

    fn write_csv(lines: &[&str]) -> Result<(TempDir, PathBuf)> {
        let dir = tempdir()?;
        let path = dir.path().join("natality.csv");
        let mut body = String::from(HEADER);
        for l in lines {
            body.push('\n');
            body.push_str(l);
        }
        body.push('\n');
        std::fs::write(&path, body)?;
        Ok((dir, path))
    }

    fn only(vals: &[&str]) -> Selection {
        Selection::RestrictedTo(vals.iter().map(|&v| Value::from(v)).collect())
    }

    fn rendered(cycle: &Cycle) -> &Rendered {
        match &cycle.outcome {
            Outcome::Rendered(r) => r,
            Outcome::NoData => panic!("expected rendered outcome"),
        }
    }

    #[test]
    fn single_row_resolves_and_aggregates() -> Result<()> {
        let (_dir, path) = write_csv(&["California,January,1,2025,M,100"])?;
        let cycle = run_cycle(&path, &FilterSelections::default())?;

        let r = rendered(&cycle);
        assert_eq!(r.filtered.len(), 1);
        assert_eq!(
            r.aggregated,
            vec![AggregateRow {
                state: Value::from("California"),
                gender: Value::from("M"),
                births: 100.0,
            }]
        );
        Ok(())
    }

    #[test]
    fn non_numeric_births_never_reach_aggregation() -> Result<()> {
        let (_dir, path) = write_csv(&[
            "Texas,January,1,2025,F,N/A",
            "Texas,January,1,2025,F,50",
        ])?;
        let cycle = run_cycle(&path, &FilterSelections::default())?;

        assert_eq!(cycle.table.len(), 1);
        let r = rendered(&cycle);
        assert_eq!(r.aggregated.len(), 1);
        assert_eq!(r.aggregated[0].births, 50.0);
        Ok(())
    }

    #[test]
    fn single_state_groups_by_gender_within_it() -> Result<()> {
        let (_dir, path) = write_csv(&[
            "Texas,January,1,2025,M,10",
            "Ohio,January,1,2025,M,99",
            "Texas,February,2,2025,F,20",
            "Texas,March,3,2025,M,5",
        ])?;
        let selections = FilterSelections {
            state: only(&["Texas"]),
            ..Default::default()
        };
        let cycle = run_cycle(&path, &selections)?;
        let r = rendered(&cycle);

        assert!(r.filtered.rows().iter().all(|row| {
            r.filtered.value(row, LogicalField::StateOfResidence) == &Value::from("Texas")
        }));
        assert_eq!(r.filtered.len(), 3);
        let groups: Vec<(String, f64)> = r
            .aggregated
            .iter()
            .map(|a| (a.gender.to_string(), a.births))
            .collect();
        assert_eq!(groups, vec![("F".into(), 20.0), ("M".into(), 15.0)]);
        Ok(())
    }

    #[test]
    fn selection_without_rows_is_no_data() -> Result<()> {
        let (_dir, path) = write_csv(&[
            "Texas,January,1,2025,M,10",
            "Ohio,February,2,2025,F,20",
        ])?;
        let selections = FilterSelections {
            month: only(&["January"]),
            state: only(&["Ohio"]),
            ..Default::default()
        };
        let cycle = run_cycle(&path, &selections)?;
        assert_eq!(cycle.outcome, Outcome::NoData);
        // Options still come from the unfiltered table.
        assert_eq!(cycle.options.state.len(), 2);
        Ok(())
    }

    #[test]
    fn missing_field_halts_with_schema_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("natality.csv");
        std::fs::write(
            &path,
            "State of Residence,Month,Month Code,Year Code,Births\nTexas,January,1,2025,10\n",
        )?;

        match run_cycle(&path, &FilterSelections::default()) {
            Err(PipelineError::Schema(SchemaError::MissingFields { missing, available })) => {
                assert_eq!(missing, vec![LogicalField::SexOfInfant]);
                assert_eq!(
                    available,
                    vec!["state_of_residence", "month", "month_code", "year_code", "births"]
                );
            }
            other => panic!("expected schema error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_file_halts_with_load_error() {
        let err = run_cycle(Path::new("does/not/exist.csv"), &FilterSelections::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoadError::NotFound(_))));
        assert_eq!(err.to_string(), "Dataset file not found: does/not/exist.csv");
    }

    #[test]
    fn month_code_before_month_still_filters_by_month_name() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("natality.csv");
        std::fs::write(
            &path,
            "State of Residence,Month Code,Month,Year Code,Sex of Infant,Births\n\
             Texas,1,January,2025,M,10\n\
             Texas,2,February,2025,F,20\n",
        )?;

        let selections = FilterSelections {
            month: only(&["January"]),
            ..Default::default()
        };
        let cycle = run_cycle(&path, &selections)?;
        assert_eq!(
            cycle.options.month,
            vec![Value::from("February"), Value::from("January")]
        );
        let r = rendered(&cycle);
        assert_eq!(r.filtered.len(), 1);
        assert_eq!(r.aggregated[0].births, 10.0);
        Ok(())
    }

    #[test]
    fn identical_inputs_give_identical_cycles() -> Result<()> {
        let (_dir, path) = write_csv(&[
            "Texas,January,1,2025,M,10",
            "Ohio,February,2,2025,F,20.5",
            "Utah,February,2,2025,F,3",
        ])?;
        let selections = FilterSelections {
            month: only(&["February"]),
            gender: Selection::RestrictedTo(BTreeSet::from([Value::from("F")])),
            state: Selection::Unrestricted,
        };
        let first = run_cycle(&path, &selections)?;
        let second = run_cycle(&path, &selections)?;
        assert_eq!(first, second);
        Ok(())
    }
}
