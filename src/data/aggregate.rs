use std::collections::BTreeMap;

use super::model::Value;
use super::schema::{BirthTable, LogicalField};

/// Total births for one (state, gender) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub state: Value,
    pub gender: Value,
    pub births: f64,
}

/// Group rows by exact (state, gender) and sum births within each group.
///
/// Only pairs present in `table` appear; output is sorted by state, then by
/// gender.  A null state or gender forms its own group.
pub fn aggregate_births(table: &BirthTable) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(Value, Value), f64> = BTreeMap::new();

    for row in table.rows() {
        let key = (
            table.value(row, LogicalField::StateOfResidence).clone(),
            table.value(row, LogicalField::SexOfInfant).clone(),
        );
        *groups.entry(key).or_default() += table.births(row);
    }

    groups
        .into_iter()
        .map(|((state, gender), births)| AggregateRow {
            state,
            gender,
            births,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Table;
    use crate::data::schema::normalize;

    fn births_table(rows: &[[&str; 6]]) -> BirthTable {
        let mut t = Table::new(
            ["state_of_residence", "month", "month_code", "year_code", "sex_of_infant", "births"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        for r in rows {
            t.push_row(r.iter().map(|s| Value::infer(s)).collect());
        }
        normalize(t).unwrap()
    }

    #[test]
    fn sums_per_state_and_gender_sorted_by_state() {
        let t = births_table(&[
            ["Texas", "January", "1", "2025", "M", "10"],
            ["Alabama", "January", "1", "2025", "F", "7"],
            ["Texas", "February", "2", "2025", "M", "15"],
            ["Texas", "February", "2", "2025", "F", "4"],
        ]);
        let agg = aggregate_births(&t);
        let got: Vec<(String, String, f64)> = agg
            .iter()
            .map(|r| (r.state.to_string(), r.gender.to_string(), r.births))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Alabama".into(), "F".into(), 7.0),
                ("Texas".into(), "F".into(), 4.0),
                ("Texas".into(), "M".into(), 25.0),
            ]
        );
    }

    #[test]
    fn aggregation_is_a_partition_sum() {
        let t = births_table(&[
            ["Ohio", "January", "1", "2025", "M", "3"],
            ["Ohio", "January", "1", "2025", "M", "4.5"],
            ["Ohio", "March", "3", "2025", "F", "1"],
            ["Utah", "March", "3", "2025", "", "2"],
            ["Utah", "April", "4", "2025", "F", "N/A"],
        ]);
        let agg = aggregate_births(&t);

        let total: f64 = t.rows().iter().map(|r| t.births(r)).sum();
        assert_eq!(agg.iter().map(|r| r.births).sum::<f64>(), total);

        for out in &agg {
            let expected: f64 = t
                .rows()
                .iter()
                .filter(|r| {
                    t.value(r, LogicalField::StateOfResidence) == &out.state
                        && t.value(r, LogicalField::SexOfInfant) == &out.gender
                })
                .map(|r| t.births(r))
                .sum();
            assert_eq!(out.births, expected);
        }
        assert!(agg.iter().any(|r| r.gender == Value::Null));
    }

    #[test]
    fn empty_table_has_no_groups() {
        let t = births_table(&[]);
        assert!(aggregate_births(&t).is_empty());
    }
}
