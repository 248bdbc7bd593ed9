//! Row-addressable error reports returned to submitters and kept in the
//! validation log.

use crate::model::submitter::Submitter;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Text shown in place of an empty offending cell.
pub const NO_VALUE: &str = "Sin valor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The submitted column set does not match the template.
    Structural,
    /// A cell failed a type or reference check.
    Content,
    /// The field references a validator table or column that does not exist.
    Lookup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number; absent for errors that concern the whole column.
    pub register: Option<usize>,
    pub value: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnErrors {
    pub column: String,
    pub class: ErrorClass,
    pub errors: Vec<RowError>,
}

/// One rejected submission attempt. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationLog {
    pub user: Submitter,
    pub published_template: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub errors: Vec<ColumnErrors>,
}

impl ColumnErrors {
    /// `true` when the column passed every check.
    pub fn status(&self) -> bool {
        self.errors.is_empty()
    }
}
