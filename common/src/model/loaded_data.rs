//! Column-oriented storage of one dependency's submission.
//!
//! `filled_data` keeps one entry per template field, and every `values` list is
//! indexed by the row of the original upload. All lists in a single
//! [`LoadedData`] have the same length; the backend builds them through its
//! table abstraction, which refuses ragged columns.

use crate::model::submitter::Submitter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledField {
    pub field_name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedData {
    pub dependency: String,
    pub send_by: Submitter,
    #[serde(with = "time::serde::rfc3339")]
    pub loaded_date: OffsetDateTime,
    pub filled_data: Vec<FilledField>,
}

impl LoadedData {
    pub fn row_count(&self) -> usize {
        self.filled_data.first().map_or(0, |f| f.values.len())
    }
}
