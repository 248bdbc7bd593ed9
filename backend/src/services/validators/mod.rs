//! # Validator Service Module
//!
//! Endpoints for the validator tables: the named lookup tables whose flagged
//! columns serve as allow-lists for template fields.
//!
//! ## Sub-modules:
//! - `save`: Checks and stores a validator table.
//! - `get`: Returns a table as stored, or reshaped into rows.
//! - `options`: Lists every reference a template field may use.

mod get;
mod options;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/validators";

/// Configures and returns the Actix `Scope` for all validator routes.
///
/// # Registered Routes:
///
/// *   **`POST /save`**: `save::process`. Creates or replaces a table. Names may not contain
///     `-`, column names must be unique and every column must hold the same number of values.
/// *   **`GET /options`**: `options::process`. The reserved directory references followed by
///     `"<table> - <column>"` for each flagged column of every table.
/// *   **`GET /{name}`**: `get::process`. The table in its stored, column-oriented shape.
/// *   **`GET /{name}/rows`**: `get::rows`. The same table as one JSON object per row.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route("/options", get().to(options::process))
        .route("/{name}", get().to(get::process))
        .route("/{name}/rows", get().to(get::rows))
}
