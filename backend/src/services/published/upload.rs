use crate::services::published::submit::submit;
use crate::services::AppState;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use common::model::submitter::Submitter;
use common::requests::Row;
use common::responses::SubmitResponse;
use futures_util::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("The file must end with .csv")]
    NotCsv,
    #[error("Missing submitter")]
    MissingSubmitter,
    #[error("Missing file")]
    MissingFile,
    #[error("The file is not valid UTF-8")]
    NotUtf8,
    #[error("CSV header cells must not be empty")]
    EmptyHeader,
    #[error("CSV header '{0}' appears more than once")]
    DuplicateHeader(String),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("multipart: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
}

/// HTTP handler wrapper: reads the form, then submits like `/submit` does.
///
/// - On a malformed form or file: `400 Bad Request` with the error message.
/// - Otherwise: the same responses as `submit::process`.
pub async fn process(
    state: web::Data<AppState>,
    published_id: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    let (send_by, rows) = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
    };
    match submit(&state, published_id.into_inner(), send_by, rows).await {
        Ok(records) => HttpResponse::Ok().json(SubmitResponse::accepted(records)),
        Err(e) => e.response(),
    }
}

/// Collects the `json` part (the submitter) and the `file` part (the CSV) in any order.
async fn read_form(mut payload: Multipart) -> Result<(Submitter, Vec<Row>), UploadError> {
    let mut send_by: Option<Submitter> = None;
    let mut file: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !filename.to_lowercase().ends_with(".csv") {
                    return Err(UploadError::NotCsv);
                }
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                file = Some(bytes);
            }
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                send_by = Some(serde_json::from_slice(&bytes)?);
            }
            _ => {}
        }
    }

    let send_by = send_by.ok_or(UploadError::MissingSubmitter)?;
    let file = file.ok_or(UploadError::MissingFile)?;
    Ok((send_by, rows_from_csv(&file)?))
}

/// The delimiter that occurs most often in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .filter(|&d| header_line.contains(d as char))
        .unwrap_or(b',')
}

fn cell_value(cell: &str) -> Value {
    let cell = cell.replace('\u{00A0}', " ");
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::String(cell.to_string())
    }
}

/// Parses a CSV upload into rows keyed by the header cells. Blank lines are skipped.
pub fn rows_from_csv(bytes: &[u8]) -> Result<Vec<Row>, UploadError> {
    let text = std::str::from_utf8(bytes).map_err(|_| UploadError::NotUtf8)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header_line = text.lines().next().unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    // Header names are matched against template fields as they are.
    let mut seen = HashSet::new();
    for header in &headers {
        if header.is_empty() {
            return Err(UploadError::EmptyHeader);
        }
        if !seen.insert(header.as_str()) {
            return Err(UploadError::DuplicateHeader(header.clone()));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(cell_value))
                .collect(),
        );
    }
    Ok(rows)
}
