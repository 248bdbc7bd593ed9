use crate::model::loaded_data::FilledField;
use crate::model::report::ColumnErrors;
use crate::requests::Row;
use serde::{Deserialize, Serialize};

/// Body returned by the submit endpoints, for accepted and rejected batches alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub status: String,
    #[serde(rename = "recordsLoaded", skip_serializing_if = "Option::is_none")]
    pub records_loaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ColumnErrors>>,
}

impl SubmitResponse {
    pub fn accepted(records_loaded: usize) -> Self {
        Self {
            accepted: true,
            status: "Data loaded successfully".to_string(),
            records_loaded: Some(records_loaded),
            errors: None,
        }
    }

    pub fn rejected(status: &str, errors: Vec<ColumnErrors>) -> Self {
        Self {
            accepted: false,
            status: status.to_string(),
            records_loaded: None,
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub id: String,
}

/// A dependency's stored data, in both its stored and its row shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDataResponse {
    pub filled_data: Vec<FilledField>,
    pub rows: Vec<Row>,
}
