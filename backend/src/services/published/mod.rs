//! # Published Template Service Module
//!
//! Everything that happens to a template once it is deployed into a reporting
//! period: publication, deadlines, submissions from the dependencies, and the
//! stored data and validation logs those submissions leave behind.
//!
//! ## Sub-modules:
//! - `publish`: Publication and deadline updates.
//! - `submit`: JSON submissions and empty submissions, serialized per dependency
//!   and retried when the published template changes underneath them.
//! - `upload`: The same submission, read from a CSV file.
//! - `data`: Reading and deleting loaded data.
//! - `logs`: The validation failure log.

mod data;
mod logs;
mod publish;
pub mod submit;
pub mod upload;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/published";

/// Configures and returns the Actix `Scope` for published templates.
///
/// # Registered Routes:
///
/// *   **`POST /publish`**: `publish::process`. Deploys a template into a period with a
///     deadline and answers with the new id.
/// *   **`POST /deadline`**: `publish::deadline`. Moves the deadline of several published
///     templates at once.
/// *   **`GET /{published_id}`**: `publish::get`. The published template with its loaded data.
/// *   **`POST /{published_id}/submit`**: `submit::process`. Validates a batch of rows and either
///     stores it as the dependency's data (`200`) or answers with every error found (`400`).
///     Closed deadlines and dependencies outside the producer list get `403`.
/// *   **`POST /{published_id}/upload`**: `upload::process`. Multipart form with a `json` part
///     (the submitter) and a `file` part (the CSV); then as `/submit`.
/// *   **`POST /{published_id}/submit_empty`**: `submit::empty`. Records that the dependency has
///     nothing to report. `409` if it already has data.
/// *   **`GET /{published_id}/data`**: `data::merged`. Rows of every dependency, each tagged
///     with its `Dependencia`.
/// *   **`GET /{published_id}/data/{dependency}`**: `data::get`. One dependency's data.
/// *   **`DELETE /{published_id}/data/{dependency}`**: `data::remove`.
/// *   **`GET /{published_id}/logs`**: `logs::process`. Rejected attempts, oldest first.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/publish", post().to(publish::process))
        .route("/deadline", post().to(publish::deadline))
        .route("/{published_id}", get().to(publish::get))
        .route("/{published_id}/submit", post().to(submit::process))
        .route("/{published_id}/upload", post().to(upload::process))
        .route("/{published_id}/submit_empty", post().to(submit::empty))
        .route("/{published_id}/data", get().to(data::merged))
        .route("/{published_id}/data/{dependency}", get().to(data::get))
        .route("/{published_id}/data/{dependency}", delete().to(data::remove))
        .route("/{published_id}/logs", get().to(logs::process))
}
