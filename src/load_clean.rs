use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::KeyRecord;
use crate::table::{Column, ColumnKind, Table, Value, CODE, ENTITY, YEAR};

// Load and Clean Data
//
// Reads one OWID/OECD style CSV (`Entity, [Code,] Year, <values>...`) into a
// typed table. Rows without a country code are regional aggregates and are
// dropped; a file without a `Code` column keeps every row.
pub(crate) fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let load_err = |source: csv::Error| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(load_err)?;
    let headers = reader.headers().map_err(load_err)?.clone();

    for required in [ENTITY, YEAR] {
        if !headers.iter().any(|h| h == required) {
            return Err(PipelineError::MalformedInput {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }
    let has_code = headers.iter().any(|h| h == CODE);

    let columns: Vec<Column> = headers
        .iter()
        .map(|name| Column::new(name, column_kind(name)))
        .collect();
    let mut table = Table::new(columns.clone());
    let mut dropped = 0usize;

    for result in reader.records() {
        let record = result.map_err(load_err)?;
        let line = record.position().map_or(0, |p| p.line());

        let key: KeyRecord = record.deserialize(Some(&headers)).map_err(|_| {
            let value = headers
                .iter()
                .position(|h| h == YEAR)
                .and_then(|i| record.get(i))
                .unwrap_or_default();
            PipelineError::Parse {
                path: path.to_path_buf(),
                line,
                column: YEAR.to_string(),
                value: value.to_string(),
            }
        })?;

        if has_code && !key.is_country() {
            debug!("Skipping aggregate {} ({})", key.entity, key.year);
            dropped += 1;
            continue;
        }

        let mut row = Vec::with_capacity(columns.len());
        for (column, field) in columns.iter().zip(record.iter()) {
            let value = match column.kind {
                ColumnKind::Year => Value::Year(key.year),
                ColumnKind::Text if field.is_empty() => Value::Missing,
                ColumnKind::Text => Value::Text(field.to_string()),
                ColumnKind::Number => parse_number(field).ok_or_else(|| PipelineError::Parse {
                    path: path.to_path_buf(),
                    line,
                    column: column.name.clone(),
                    value: field.to_string(),
                })?,
            };
            row.push(value);
        }
        table.push_row(row);
    }

    info!("Loaded {} rows from {}", table.len(), path.display());
    debug!("Dropped {} rows without a country code from {}", dropped, path.display());

    Ok(table)
}

fn column_kind(name: &str) -> ColumnKind {
    match name {
        ENTITY | CODE => ColumnKind::Text,
        YEAR => ColumnKind::Year,
        _ => ColumnKind::Number,
    }
}

fn parse_number(field: &str) -> Option<Value> {
    if field.is_empty() {
        return Some(Value::Missing);
    }
    field.parse::<f64>().ok().map(Value::Number)
}
