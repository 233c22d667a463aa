use std::collections::HashMap;

use log::debug;

use crate::error::{PipelineError, Result};
use crate::table::{Column, Row, Table};

type Key<'a> = (&'a str, i32);

/// Inner join on `(Entity, Year)`.
///
/// Rows keep the order of `left`. The output has every column of `left`
/// followed by the columns of `right` that `left` does not already have, so
/// shared columns such as `Code` appear once. A key that occurs twice in
/// either input makes the join ambiguous and is rejected.
pub(crate) fn merge(left: &Table, right: &Table) -> Result<Table> {
    let left_rows: Vec<Row<'_>> = left.rows().collect();
    let right_rows: Vec<Row<'_>> = right.rows().collect();

    // Duplicate check on both sides, even though only the right index is used.
    index_keys(left, &left_rows)?;
    let right_index = index_keys(right, &right_rows)?;

    let extra: Vec<usize> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !left.has_column(&c.name))
        .map(|(i, _)| i)
        .collect();

    let mut columns: Vec<Column> = left.columns().to_vec();
    columns.extend(extra.iter().map(|&i| right.columns()[i].clone()));

    let (entity, year) = left.key_indices()?;
    let mut rows = Vec::new();
    for row in &left_rows {
        let Some(key) = key_of(row, entity, year) else {
            continue;
        };
        if let Some(&matched) = right_index.get(&key) {
            let mut values = row.values().to_vec();
            values.extend(extra.iter().map(|&i| right_rows[matched].value(i).clone()));
            rows.push(values);
        }
    }

    debug!(
        "Merged {} x {} rows into {} rows",
        left.len(),
        right.len(),
        rows.len()
    );
    Ok(Table::from_rows(columns, rows))
}

fn key_of<'a>(row: &Row<'a>, entity: usize, year: usize) -> Option<Key<'a>> {
    Some((row.value(entity).as_text()?, row.value(year).as_year()?))
}

fn index_keys<'a>(table: &Table, rows: &[Row<'a>]) -> Result<HashMap<Key<'a>, usize>> {
    let (entity, year) = table.key_indices()?;
    let mut index = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(key) = key_of(row, entity, year) else {
            continue;
        };
        if index.insert(key, i).is_some() {
            return Err(PipelineError::DuplicateKey {
                entity: key.0.to_string(),
                year: key.1,
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::metric_table;
    use crate::table::{ColumnKind, Value, CODE, ENTITY, YEAR};
    use std::collections::BTreeSet;

    fn keys(table: &Table) -> BTreeSet<(String, i32)> {
        table
            .rows()
            .map(|r| (r.text(ENTITY).unwrap().to_string(), r.year(YEAR).unwrap()))
            .collect()
    }

    fn life() -> Table {
        metric_table(
            "Expectancy",
            &[
                ("Portugal", 2010, 79.0),
                ("Portugal", 2011, 79.5),
                ("Spain", 2010, 81.6),
                ("Chad", 2010, 50.1),
            ],
        )
    }

    fn hale() -> Table {
        metric_table(
            "HALE",
            &[
                ("Spain", 2010, 72.0),
                ("Portugal", 2010, 70.3),
                ("Japan", 2010, 73.9),
            ],
        )
    }

    #[test]
    fn keeps_only_keys_present_in_both() {
        let merged = merge(&life(), &hale()).unwrap();
        let expected: BTreeSet<(String, i32)> =
            [("Portugal".to_string(), 2010), ("Spain".to_string(), 2010)].into();
        assert_eq!(keys(&merged), expected);

        let names: Vec<&str> = merged.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![ENTITY, YEAR, "Expectancy", "HALE"]);

        let spain = merged
            .rows()
            .find(|r| r.text(ENTITY) == Some("Spain"))
            .unwrap();
        assert_eq!(spain.number("Expectancy"), Some(81.6));
        assert_eq!(spain.number("HALE"), Some(72.0));
    }

    #[test]
    fn key_set_is_commutative() {
        let ab = merge(&life(), &hale()).unwrap();
        let ba = merge(&hale(), &life()).unwrap();
        assert_eq!(keys(&ab), keys(&ba));
    }

    #[test]
    fn merged_keys_come_from_both_inputs() {
        let merged = merge(&life(), &hale()).unwrap();
        let (l, r) = (keys(&life()), keys(&hale()));
        assert!(keys(&merged).iter().all(|k| l.contains(k) && r.contains(k)));
    }

    #[test]
    fn rows_follow_left_order() {
        let merged = merge(&life(), &hale()).unwrap();
        let order: Vec<&str> = merged.rows().filter_map(|r| r.text(ENTITY)).collect();
        assert_eq!(order, vec!["Portugal", "Spain"]);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let dup = metric_table("HALE", &[("Spain", 2010, 72.0), ("Spain", 2010, 72.5)]);
        let err = merge(&life(), &dup).unwrap_err();
        assert!(
            matches!(err, PipelineError::DuplicateKey { entity, year } if entity == "Spain" && year == 2010)
        );
        assert!(merge(&dup, &life()).is_err());
    }

    #[test]
    fn shared_code_column_appears_once() {
        let columns = vec![
            Column::new(ENTITY, ColumnKind::Text),
            Column::new(CODE, ColumnKind::Text),
            Column::new(YEAR, ColumnKind::Year),
            Column::new("Women", ColumnKind::Number),
        ];
        let women = Table::from_rows(
            columns,
            vec![vec![
                Value::Text("Portugal".into()),
                Value::Text("PRT".into()),
                Value::Year(2010),
                Value::Number(65.0),
            ]],
        );
        let men = women.renamed(&[("Women", "Men")]).unwrap();

        let merged = merge(&women, &men).unwrap();
        let codes = merged.columns().iter().filter(|c| c.name == CODE).count();
        assert_eq!(codes, 1);
        assert_eq!(merged.columns().len(), 5);
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let no_year = Table::new(vec![Column::new(ENTITY, ColumnKind::Text)]);
        let err = merge(&life(), &no_year).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == YEAR));
    }
}
