//! Submission of a dependency's data to a published template.
//!
//! An attempt loads the published template, checks that the dependency may
//! still submit, evaluates the batch and stores it against the revision it
//! loaded. Attempts for the same dependency are serialized with
//! [`SubmissionLocks`](crate::submission_lock::SubmissionLocks); an attempt
//! that still loses the revision race (another dependency wrote in between) is
//! run again from the start, up to the configured number of retries.

use crate::engine::submission::{StructuralError, Verdict, evaluate};
use crate::services::{ApiError, AppState};
use crate::storage::directories::SqliteSource;
use crate::storage::logs::insert_log;
use crate::storage::published::{get_published, insert_empty_loaded_data, replace_loaded_data};
use crate::storage::{Store, StoreError};
use actix_web::{HttpResponse, Responder, web};
use common::model::loaded_data::LoadedData;
use common::model::published::PublishedTemplate;
use common::model::report::{ColumnErrors, ValidationLog};
use common::model::submitter::Submitter;
use common::requests::{Row, SubmitEmptyRequest, SubmitRequest};
use common::responses::SubmitResponse;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use time::{Date, OffsetDateTime, UtcOffset};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("La fecha límite de carga ({0}) ya pasó")]
    DeadlinePassed(Date),
    #[error("La dependencia '{0}' no está habilitada para cargar esta plantilla")]
    ProducerNotAllowed(String),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("la carga tiene errores en {} columnas", .0.len())]
    Rejected(Vec<ColumnErrors>),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SubmitError {
    pub fn response(self) -> HttpResponse {
        match self {
            err @ (SubmitError::DeadlinePassed(_) | SubmitError::ProducerNotAllowed(_)) => {
                HttpResponse::Forbidden().body(err.to_string())
            }
            SubmitError::Structural(err @ StructuralError::ColumnMismatch(_)) => HttpResponse::BadRequest()
                .json(SubmitResponse::rejected("Column mismatch error", err.report())),
            SubmitError::Structural(err) => HttpResponse::BadRequest()
                .json(SubmitResponse::rejected("Structural error", err.report())),
            SubmitError::Rejected(errors) => {
                HttpResponse::BadRequest().json(SubmitResponse::rejected("Validation error", errors))
            }
            SubmitError::Store(err) => ApiError::Store(err).response(),
            SubmitError::Join(err) => ApiError::Join(err).response(),
        }
    }
}

pub async fn process(
    state: web::Data<AppState>,
    published_id: web::Path<String>,
    payload: web::Json<SubmitRequest>,
) -> impl Responder {
    let SubmitRequest { send_by, rows } = payload.into_inner();
    match submit(&state, published_id.into_inner(), send_by, rows).await {
        Ok(records) => HttpResponse::Ok().json(SubmitResponse::accepted(records)),
        Err(e) => e.response(),
    }
}

pub async fn empty(
    state: web::Data<AppState>,
    published_id: web::Path<String>,
    payload: web::Json<SubmitEmptyRequest>,
) -> impl Responder {
    let published_id = published_id.into_inner();
    let SubmitEmptyRequest { send_by } = payload.into_inner();
    let dependency = send_by.dep_code.clone();
    let key = published_id.clone();
    let offset = state.utc_offset;

    let result = with_retries(&state, &key, &dependency, move |store| {
        let mut conn = store.connect()?;
        let published = get_published(&conn, &published_id)?;
        admit(&published, &send_by.dep_code, local_day(OffsetDateTime::now_utc(), offset))?;
        let data = LoadedData {
            dependency: send_by.dep_code.clone(),
            send_by: send_by.clone(),
            loaded_date: OffsetDateTime::now_utc(),
            filled_data: Vec::new(),
        };
        insert_empty_loaded_data(&mut conn, &published.id, published.revision, &data)?;
        Ok(())
    })
    .await;

    match result {
        Ok(()) => {
            info!("empty submission recorded for '{dependency}'");
            HttpResponse::Ok().json(SubmitResponse::accepted(0))
        }
        Err(e) => e.response(),
    }
}

/// Validates `rows` and stores them as the dependency's data. Returns the
/// number of rows stored.
pub async fn submit(
    state: &AppState,
    published_id: String,
    send_by: Submitter,
    rows: Vec<Row>,
) -> Result<usize, SubmitError> {
    let dependency = send_by.dep_code.clone();
    let key = published_id.clone();
    let offset = state.utc_offset;
    with_retries(state, &key, &dependency, move |store| {
        let today = local_day(OffsetDateTime::now_utc(), offset);
        evaluate_and_store(store, &published_id, &send_by, &rows, today)
    })
    .await
}

async fn with_retries<T, F>(
    state: &AppState,
    published_id: &str,
    dependency: &str,
    work: F,
) -> Result<T, SubmitError>
where
    T: Send + 'static,
    F: Fn(&Store) -> Result<T, SubmitError> + Send + Sync + 'static,
{
    let _guard = state.locks.acquire(published_id, dependency).await;
    let work = Arc::new(work);
    let mut retries = 0;
    loop {
        let store = state.store.clone();
        let attempt = Arc::clone(&work);
        match tokio::task::spawn_blocking(move || attempt(&store)).await? {
            Err(SubmitError::Store(StoreError::RevisionMismatch { expected, actual }))
                if retries < state.submit_retries =>
            {
                retries += 1;
                warn!(
                    "'{published_id}' changed while '{dependency}' was submitting (revision {expected} -> {actual}), retry {retries}/{}",
                    state.submit_retries
                );
            }
            Err(err @ SubmitError::Store(StoreError::RevisionMismatch { .. })) => {
                warn!("giving up on submission of '{dependency}' to '{published_id}': {err}");
                return Err(err);
            }
            result => return result,
        }
    }
}

/// The calendar day `now` falls on at the institution's offset.
fn local_day(now: OffsetDateTime, offset: UtcOffset) -> Date {
    now.to_offset(offset).date()
}

/// Refuses dependencies that may not submit to `published` on `today`.
fn admit(published: &PublishedTemplate, dependency: &str, today: Date) -> Result<(), SubmitError> {
    if published.is_closed_on(today) {
        return Err(SubmitError::DeadlinePassed(published.deadline));
    }
    if !published.template.accepts_producer(dependency) {
        return Err(SubmitError::ProducerNotAllowed(dependency.to_string()));
    }
    Ok(())
}

fn evaluate_and_store(
    store: &Store,
    published_id: &str,
    send_by: &Submitter,
    rows: &[Row],
    today: Date,
) -> Result<usize, SubmitError> {
    let mut conn = store.connect()?;
    let published = get_published(&conn, published_id)?;
    admit(&published, &send_by.dep_code, today)?;

    let verdict = evaluate(&published.template.fields, rows, &SqliteSource::new(&conn))?;
    match verdict {
        Verdict::Rejected(errors) => {
            insert_log(
                &conn,
                &ValidationLog {
                    user: send_by.clone(),
                    published_template: published.id.clone(),
                    date: OffsetDateTime::now_utc(),
                    errors: errors.clone(),
                },
            )?;
            Err(SubmitError::Rejected(errors))
        }
        Verdict::Accepted(table) => {
            let records = table.row_count();
            let data = LoadedData {
                dependency: send_by.dep_code.clone(),
                send_by: send_by.clone(),
                loaded_date: OffsetDateTime::now_utc(),
                filled_data: table.into_filled(),
            };
            let revision = replace_loaded_data(&mut conn, &published.id, published.revision, &data)?;
            info!(
                "{records} rows from '{}' stored in '{}' (revision {revision})",
                data.dependency, published.id
            );
            Ok(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::field;
    use crate::storage::published::publish;
    use crate::storage::templates::save_template;
    use crate::storage::test_support::temp_store;
    use actix_web::http::StatusCode;
    use common::model::field::Datatype;
    use common::model::loaded_data::FilledField;
    use common::model::template::Template;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use time::macros::{date, datetime, offset};

    fn template(producers: Vec<String>) -> Template {
        Template {
            id: "t1".to_string(),
            name: "Matriculados".to_string(),
            fields: vec![field("edad", Datatype::Integer, true, false)],
            producers,
        }
    }

    fn published_state(submit_retries: u32) -> (TempDir, AppState, String) {
        let (dir, store) = temp_store();
        let conn = store.connect().unwrap();
        save_template(&conn, &template(vec![])).unwrap();
        let id = publish(&conn, "t1", "2026-2", date!(2999 - 12 - 31)).unwrap();
        (dir, AppState::new(store, submit_retries, offset!(-5)), id)
    }

    fn loaded(dependency: &str) -> LoadedData {
        LoadedData {
            dependency: dependency.to_string(),
            send_by: Submitter {
                email: format!("{dependency}@example.org"),
                full_name: String::new(),
                dep_code: dependency.to_string(),
            },
            loaded_date: OffsetDateTime::now_utc(),
            filled_data: vec![FilledField {
                field_name: "edad".to_string(),
                values: vec![json!(20)],
            }],
        }
    }

    /// Runs a D01 write that lets D02 write first during the first
    /// `interruptions` attempts. Returns the outcome and the attempt count.
    async fn racing_write(
        state: &AppState,
        published_id: &str,
        interruptions: usize,
    ) -> (Result<i64, SubmitError>, usize) {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let id = published_id.to_string();
        let result = with_retries(state, published_id, "D01", move |store| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            let mut conn = store.connect()?;
            let published = get_published(&conn, &id)?;
            if attempt < interruptions {
                replace_loaded_data(&mut conn, &id, published.revision, &loaded("D02"))?;
            }
            Ok(replace_loaded_data(&mut conn, &id, published.revision, &loaded("D01"))?)
        })
        .await;
        (result, attempts.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn a_lost_revision_race_is_run_again() {
        let (_dir, state, id) = published_state(3);

        let (result, attempts) = racing_write(&state, &id, 1).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts, 2);

        let conn = state.store.connect().unwrap();
        let published = get_published(&conn, &id).unwrap();
        let deps: Vec<_> = published.loaded_data.iter().map(|d| d.dependency.as_str()).collect();
        assert_eq!(deps, vec!["D02", "D01"]);
    }

    #[tokio::test]
    async fn retries_run_out_with_a_conflict() {
        let (_dir, state, id) = published_state(2);

        let (result, attempts) = racing_write(&state, &id, usize::MAX).await;
        assert_eq!(attempts, 3);
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Store(StoreError::RevisionMismatch { .. })
        ));
        assert_eq!(err.response().status(), StatusCode::CONFLICT);

        let conn = state.store.connect().unwrap();
        assert!(get_published(&conn, &id).unwrap().loaded_for("D01").is_none());
    }

    #[test]
    fn the_deadline_day_ends_at_local_midnight() {
        let bogota = offset!(-5);
        let mut published = PublishedTemplate {
            id: "p1".to_string(),
            template: template(vec![]),
            period: "2026-1".to_string(),
            deadline: date!(2026 - 03 - 10),
            published_date: datetime!(2026-01-15 12:00 UTC),
            revision: 0,
            loaded_data: vec![],
        };

        // 19:30 on the deadline day in Bogotá, already the next day in UTC.
        let evening = datetime!(2026-03-11 0:30 UTC);
        assert_eq!(local_day(evening, bogota), date!(2026 - 03 - 10));
        assert!(admit(&published, "D01", local_day(evening, bogota)).is_ok());
        assert!(matches!(
            admit(&published, "D01", local_day(evening, offset!(UTC))),
            Err(SubmitError::DeadlinePassed(_))
        ));

        let after_midnight = datetime!(2026-03-11 5:30 UTC);
        assert!(matches!(
            admit(&published, "D01", local_day(after_midnight, bogota)),
            Err(SubmitError::DeadlinePassed(d)) if d == date!(2026 - 03 - 10)
        ));

        published.template.producers = vec!["D02".to_string()];
        assert!(matches!(
            admit(&published, "D01", date!(2026 - 03 - 01)),
            Err(SubmitError::ProducerNotAllowed(d)) if d == "D01"
        ));
    }
}
