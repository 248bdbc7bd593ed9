//! Validator tables: small named lookup tables whose flagged columns act as
//! allow-lists for template fields.

use crate::model::field::Datatype;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Separator between the table and the column in a `validate_with` reference.
pub const REFERENCE_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorColumn {
    pub name: String,
    pub datatype: Datatype,
    /// The column can be referenced by template fields.
    #[serde(default)]
    pub is_validator: bool,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorTable {
    pub name: String,
    pub columns: Vec<ValidatorColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorTableError {
    #[error("el nombre del validador no puede estar vacío")]
    EmptyName,
    #[error("el nombre '{0}' no puede contener el carácter '-'")]
    NameHasSeparator(String),
    #[error("el validador debe tener al menos una columna")]
    NoColumns,
    #[error("la columna '{0}' está repetida")]
    DuplicateColumn(String),
    #[error("la columna '{column}' tiene {actual} valores, se esperaban {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl ValidatorTable {
    pub fn column(&self, name: &str) -> Option<&ValidatorColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Checks the rules a table must satisfy before it is stored.
    pub fn check(&self) -> Result<(), ValidatorTableError> {
        if self.name.trim().is_empty() {
            return Err(ValidatorTableError::EmptyName);
        }
        if self.name.contains('-') {
            return Err(ValidatorTableError::NameHasSeparator(self.name.clone()));
        }
        let Some(first) = self.columns.first() else {
            return Err(ValidatorTableError::NoColumns);
        };

        let expected = first.values.len();
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.contains('-') {
                return Err(ValidatorTableError::NameHasSeparator(column.name.clone()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ValidatorTableError::DuplicateColumn(column.name.clone()));
            }
            if column.values.len() != expected {
                return Err(ValidatorTableError::RaggedColumn {
                    column: column.name.clone(),
                    expected,
                    actual: column.values.len(),
                });
            }
        }
        Ok(())
    }

    /// References other templates can use, one per flagged column.
    pub fn reference_options(&self) -> impl Iterator<Item = ReferenceOption> + '_ {
        self.columns
            .iter()
            .filter(|c| c.is_validator)
            .map(|c| ReferenceOption {
                name: format!("{}{}{}", self.name, REFERENCE_SEPARATOR, c.name),
                datatype: c.datatype,
            })
    }
}

/// An entry of the list offered to template designers for `validate_with`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub name: String,
    pub datatype: Datatype,
}
