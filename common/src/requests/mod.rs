use crate::model::directory::Student;
use crate::model::submitter::Submitter;
use serde::Deserialize;
use serde_json::{Map, Value};
use time::Date;

/// One spreadsheet row: field name to raw cell.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
/// Request payload for `POST /api/published/{id}/submit`.
pub struct SubmitRequest {
    pub send_by: Submitter,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEmptyRequest {
    pub send_by: Submitter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub template_id: String,
    pub period: String,
    pub deadline: Date,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDeadlinesRequest {
    pub published_ids: Vec<String>,
    pub deadline: Date,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersRequest {
    pub identifications: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentsRequest {
    pub students: Vec<Student>,
}
