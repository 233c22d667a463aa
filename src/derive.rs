use statrs::statistics::Statistics;

use crate::error::Result;
use crate::table::{Column, ColumnKind, Table, Value};

/// Appends `output` = row-wise mean of `sources`. A row with any missing
/// source value gets a missing result.
pub(crate) fn with_mean(table: &Table, sources: &[&str], output: &str) -> Result<Table> {
    let indices = sources
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<Vec<_>>>()?;

    let values = table
        .rows()
        .map(|row| {
            indices
                .iter()
                .map(|&i| row.value(i).as_number())
                .collect::<Option<Vec<f64>>>()
                .filter(|v| !v.is_empty())
                .map_or(Value::Missing, |v| Value::Number(v.mean()))
        })
        .collect();

    table.with_column(Column::new(output, ColumnKind::Number), values)
}

/// Appends `output` = `minuend` - `subtrahend`.
pub(crate) fn with_difference(
    table: &Table,
    minuend: &str,
    subtrahend: &str,
    output: &str,
) -> Result<Table> {
    let a = table.column_index(minuend)?;
    let b = table.column_index(subtrahend)?;

    let values = table
        .rows()
        .map(|row| match (row.value(a).as_number(), row.value(b).as_number()) {
            (Some(x), Some(y)) => Value::Number(x - y),
            _ => Value::Missing,
        })
        .collect();

    table.with_column(Column::new(output, ColumnKind::Number), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::merge::merge;
    use crate::table::tests::metric_table;
    use crate::table::ENTITY;

    fn retirement() -> Table {
        let women = metric_table(
            "Women",
            &[("Portugal", 2010, 65.0), ("Spain", 2010, 63.0), ("France", 2010, 60.0)],
        );
        let men = metric_table(
            "Men",
            &[("Portugal", 2010, 68.0), ("Spain", 2010, 66.0), ("France", 2010, 62.0)],
        );
        let both = merge(&women, &men).unwrap();
        with_mean(&both, &["Women", "Men"], "Retirement").unwrap()
    }

    #[test]
    fn retirement_is_the_mean_of_both_sexes() {
        let table = retirement();
        let got: Vec<(&str, f64)> = table
            .rows()
            .map(|r| (r.text(ENTITY).unwrap(), r.number("Retirement").unwrap()))
            .collect();
        assert_eq!(
            got,
            vec![("Portugal", 66.5), ("Spain", 64.5), ("France", 61.0)]
        );
    }

    #[test]
    fn retired_is_expectancy_minus_retirement() {
        let life = metric_table(
            "Expectancy",
            &[("Portugal", 2010, 79.3), ("Spain", 2010, 81.7), ("France", 2010, 81.4)],
        );
        let df = merge(&retirement(), &life).unwrap();
        let df = with_difference(&df, "Expectancy", "Retirement", "Retired").unwrap();

        assert_eq!(df.len(), 3);
        for row in df.rows() {
            let expected = row.number("Expectancy").unwrap() - row.number("Retirement").unwrap();
            assert_eq!(row.number("Retired"), Some(expected));
        }
    }

    #[test]
    fn sick_is_expectancy_minus_hale() {
        let life = metric_table("Expectancy", &[("Chad", 2019, 59.6), ("Japan", 2019, 84.4)]);
        let hale = metric_table("HALE", &[("Chad", 2019, 52.0), ("Japan", 2019, 74.1)]);
        let table = with_difference(&merge(&life, &hale).unwrap(), "Expectancy", "HALE", "Sick")
            .unwrap();

        for row in table.rows() {
            let expected = row.number("Expectancy").unwrap() - row.number("HALE").unwrap();
            assert_eq!(row.number("Sick"), Some(expected));
        }
    }

    #[test]
    fn input_table_is_not_modified() {
        let life = metric_table("Expectancy", &[("Chad", 2019, 59.6)]);
        let hale = metric_table("HALE", &[("Chad", 2019, 52.0)]);
        let merged = merge(&life, &hale).unwrap();
        let before = merged.clone();

        let derived = with_difference(&merged, "Expectancy", "HALE", "Sick").unwrap();
        assert_eq!(merged, before);
        assert_eq!(derived.columns().len(), merged.columns().len() + 1);
    }

    #[test]
    fn missing_source_column_is_an_error() {
        let life = metric_table("Expectancy", &[("Chad", 2019, 59.6)]);
        let err = with_difference(&life, "Expectancy", "HALE", "Sick").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "HALE"));

        let err = with_mean(&life, &["Women", "Men"], "Retirement").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "Women"));
    }

    #[test]
    fn missing_value_propagates() {
        let table = metric_table("Expectancy", &[("Chad", 2019, 59.6)]);
        let table = table
            .with_column(Column::new("HALE", ColumnKind::Number), vec![Value::Missing])
            .unwrap();
        let derived = with_difference(&table, "Expectancy", "HALE", "Sick").unwrap();
        assert_eq!(derived.rows().next().unwrap().number("Sick"), None);
    }
}
