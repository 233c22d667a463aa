//! Typed, immutable tables. Every transformation returns a new `Table`; the
//! rows of the source are never touched after construction.

use crate::error::{PipelineError, Result};

pub(crate) const ENTITY: &str = "Entity";
pub(crate) const CODE: &str = "Code";
pub(crate) const YEAR: &str = "Year";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Text,
    Year,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
}

impl Column {
    pub(crate) fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Text(String),
    Year(i32),
    Number(f64),
    Missing,
}

impl Value {
    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_year(&self) -> Option<i32> {
        match self {
            Value::Year(y) => Some(*y),
            _ => None,
        }
    }

    /// Numbers and years both read as `f64`, so a year can sit on a plot axis.
    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) if !v.is_nan() => Some(*v),
            Value::Year(y) => Some(f64::from(*y)),
            _ => None,
        }
    }

    /// Label used when a value becomes a legend entry or a category.
    pub(crate) fn label(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Year(y) => y.to_string(),
            Value::Number(v) => v.to_string(),
            Value::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Table { columns, rows }
    }

    pub(crate) fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub(crate) fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Indices of the `(Entity, Year)` join key.
    pub(crate) fn key_indices(&self) -> Result<(usize, usize)> {
        Ok((self.column_index(ENTITY)?, self.column_index(YEAR)?))
    }

    pub(crate) fn max_year(&self) -> Result<Option<i32>> {
        let year = self.column_index(YEAR)?;
        Ok(self.rows.iter().filter_map(|r| r[year].as_year()).max())
    }

    pub(crate) fn renamed(&self, renames: &[(&str, &str)]) -> Result<Table> {
        let mut columns = self.columns.clone();
        for (from, to) in renames {
            let index = self.column_index(from)?;
            columns[index].name = (*to).to_string();
        }
        Ok(Table {
            columns,
            rows: self.rows.clone(),
        })
    }

    pub(crate) fn filter(&self, keep: impl Fn(&Row<'_>) -> bool) -> Table {
        let rows = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| row.values.to_vec())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rows whose entity is one of `entities`.
    pub(crate) fn filter_entities(&self, entities: &[String]) -> Table {
        self.filter(|row| {
            row.text(ENTITY)
                .is_some_and(|e| entities.iter().any(|x| x == e))
        })
    }

    /// Appends one column; `values` holds one entry per row.
    pub(crate) fn with_column(&self, column: Column, values: Vec<Value>) -> Result<Table> {
        if self.has_column(&column.name) {
            return Err(PipelineError::DuplicateColumn(column.name));
        }
        debug_assert_eq!(values.len(), self.rows.len());

        let mut columns = self.columns.clone();
        columns.push(column);
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();
        Ok(Table { columns, rows })
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Row<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub(crate) fn values(&self) -> &'a [Value] {
        self.values
    }

    pub(crate) fn value(&self, index: usize) -> &'a Value {
        &self.values[index]
    }

    pub(crate) fn get(&self, name: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| &self.values[i])
    }

    pub(crate) fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_text)
    }

    pub(crate) fn year(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_year)
    }

    pub(crate) fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `Entity, Year, <metric>` table built from tuples.
    pub(crate) fn metric_table(metric: &str, rows: &[(&str, i32, f64)]) -> Table {
        let columns = vec![
            Column::new(ENTITY, ColumnKind::Text),
            Column::new(YEAR, ColumnKind::Year),
            Column::new(metric, ColumnKind::Number),
        ];
        let rows = rows
            .iter()
            .map(|(e, y, v)| vec![Value::Text(e.to_string()), Value::Year(*y), Value::Number(*v)])
            .collect();
        Table::from_rows(columns, rows)
    }

    #[test]
    fn renamed_keeps_rows_and_changes_names() {
        let table = metric_table("Period life expectancy", &[("Portugal", 2019, 81.0)]);
        let renamed = table
            .renamed(&[("Period life expectancy", "Expectancy")])
            .unwrap();

        assert!(renamed.has_column("Expectancy"));
        assert!(!renamed.has_column("Period life expectancy"));
        assert_eq!(renamed.rows().next().unwrap().number("Expectancy"), Some(81.0));
        // Source table is untouched.
        assert!(table.has_column("Period life expectancy"));
    }

    #[test]
    fn renamed_rejects_unknown_column() {
        let table = metric_table("HALE", &[]);
        let err = table.renamed(&[("Nope", "Other")]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "Nope"));
    }

    #[test]
    fn with_column_rejects_existing_name() {
        let table = metric_table("HALE", &[("Spain", 2019, 72.0)]);
        let err = table
            .with_column(Column::new("HALE", ColumnKind::Number), vec![Value::Missing])
            .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateColumn(_)));
    }

    #[test]
    fn filter_entities_and_max_year() {
        let table = metric_table(
            "Expectancy",
            &[("Portugal", 2018, 81.0), ("Spain", 2019, 83.0), ("Chad", 2017, 54.0)],
        );
        let picked = table.filter_entities(&["Portugal".to_string(), "Chad".to_string()]);
        assert_eq!(picked.len(), 2);
        assert_eq!(table.max_year().unwrap(), Some(2019));
        assert_eq!(Table::new(table.columns().to_vec()).max_year().unwrap(), None);
    }
}
