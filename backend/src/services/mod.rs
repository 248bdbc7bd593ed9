//! HTTP layer. Each sub-module exposes a `configure_routes()` scope that
//! `main.rs` registers on the Actix application.
//!
//! Handlers never touch SQLite on the async executor: [`run_blocking`] opens a
//! connection on the blocking pool and runs the storage calls there.

pub mod directories;
pub mod published;
pub mod templates;
pub mod validators;

use crate::storage::{Store, StoreError};
use crate::submission_lock::SubmissionLocks;
use actix_web::HttpResponse;
use log::error;
use rusqlite::Connection;
use thiserror::Error;
use time::UtcOffset;

/// Shared application state, injected as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub locks: SubmissionLocks,
    pub submit_retries: u32,
    /// Deadlines are compared with the calendar day at this offset.
    pub utc_offset: UtcOffset,
}

impl AppState {
    pub fn new(store: Store, submit_retries: u32, utc_offset: UtcOffset) -> Self {
        Self {
            store,
            locks: SubmissionLocks::default(),
            submit_retries,
            utc_offset,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn response(&self) -> HttpResponse {
        match self {
            ApiError::BadRequest(message) => HttpResponse::BadRequest().body(message.clone()),
            ApiError::Store(StoreError::NotFound(what)) => {
                HttpResponse::NotFound().body(format!("{what} not found"))
            }
            ApiError::Store(err @ (StoreError::Conflict(_) | StoreError::RevisionMismatch { .. })) => {
                HttpResponse::Conflict().body(err.to_string())
            }
            other => {
                error!("request failed: {other}");
                HttpResponse::ServiceUnavailable().body(format!("Error: {other}"))
            }
        }
    }
}

/// Runs `work` with a fresh connection on the blocking thread pool.
pub async fn run_blocking<T, F>(store: &Store, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = store.connect()?;
        work(&mut conn)
    })
    .await?
}
