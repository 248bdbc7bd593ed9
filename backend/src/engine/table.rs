//! Column-oriented table with a single row count shared by every column.
//!
//! Submissions arrive as rows and are stored as one value list per field; the
//! stored form is only meaningful while every list has the same length.
//! [`ColumnTable`] owns that invariant: columns are added through
//! [`ColumnTable::push`], which refuses a column of the wrong length, and stored
//! data is read back through [`ColumnTable::from_filled`], which refuses ragged
//! input instead of silently misaligning rows.

use common::model::loaded_data::FilledField;
use common::requests::Row;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("la columna '{column}' tiene {actual} valores, se esperaban {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("la columna '{0}' está repetida")]
    DuplicateColumn(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTable {
    row_count: usize,
    columns: Vec<FilledField>,
}

impl ColumnTable {
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            columns: Vec::new(),
        }
    }

    /// Rebuilds a table from stored columns, taking the row count from the first one.
    pub fn from_filled(filled: Vec<FilledField>) -> Result<Self, TableError> {
        let row_count = filled.first().map_or(0, |f| f.values.len());
        let mut table = Self::new(row_count);
        for column in filled {
            table.push(column.field_name, column.values)?;
        }
        Ok(table)
    }

    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, Vec<Value>)>,
    ) -> Result<Self, TableError> {
        Self::from_filled(
            columns
                .into_iter()
                .map(|(field_name, values)| FilledField { field_name, values })
                .collect(),
        )
    }

    pub fn push(&mut self, field_name: String, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.row_count {
            return Err(TableError::RaggedColumn {
                column: field_name,
                expected: self.row_count,
                actual: values.len(),
            });
        }
        if self.columns.iter().any(|c| c.field_name == field_name) {
            return Err(TableError::DuplicateColumn(field_name));
        }
        self.columns.push(FilledField { field_name, values });
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[FilledField] {
        &self.columns
    }

    pub fn into_filled(self) -> Vec<FilledField> {
        self.columns
    }

    /// Row view: one map per row, keyed by column name in column order.
    pub fn to_rows(&self) -> Vec<Row> {
        (0..self.row_count)
            .map(|index| {
                self.columns
                    .iter()
                    .map(|c| (c.field_name.clone(), c.values[index].clone()))
                    .collect()
            })
            .collect()
    }
}

/// Checks stored columns without taking ownership of them.
pub fn check_filled(filled: &[FilledField]) -> Result<(), TableError> {
    let expected = filled.first().map_or(0, |f| f.values.len());
    let mut seen = HashSet::new();
    for column in filled {
        if column.values.len() != expected {
            return Err(TableError::RaggedColumn {
                column: column.field_name.clone(),
                expected,
                actual: column.values.len(),
            });
        }
        if !seen.insert(column.field_name.as_str()) {
            return Err(TableError::DuplicateColumn(column.field_name.clone()));
        }
    }
    Ok(())
}

/// Raw cells of one column; rows without the key contribute `null`.
pub fn column_of(rows: &[Row], name: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Every column name used by at least one row, in the order the rows
/// introduce them (`Row` keeps insertion order).
pub fn submitted_columns(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .flat_map(|row| row.keys())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
