//! # Templates
//!
//! Schema definitions for the ingestion forms. A template lists the fields a
//! dependency fills in, each with its datatype, whether it is required or
//! multi-valued, and an optional reference to an allow-list. Publishing copies
//! the template, so saving here only affects future publications.
//!
//! - `save`: checks field names and references, then upserts by id.
//! - `get`: returns a stored template.

mod get;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/templates";

/// Routes under `/api/templates`:
///
/// * `POST /save` (`save::process`): body is a `Template`. Answers 400 when two
///   fields share a name, a name is blank, or a `validate_with` cannot be parsed.
///   Unknown datatype names already fail while the JSON is read.
/// * `GET /{template_id}` (`get::process`): the stored template, or 404.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route("/{template_id}", get().to(get::process))
}
