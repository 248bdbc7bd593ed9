//! Imports of the identity directories behind the reserved references
//! (`Funcionarios`, `Estudiantes`, `Participantes`). Each import replaces the
//! whole directory.

mod import;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/directories";

/// # Registered Routes:
///
/// *   **`POST /members`**: `import::members`. Body `{"identifications": [..]}`.
/// *   **`POST /students`**: `import::students`. Body `{"students": [{"code", "identification"}]}`.
///
/// Both answer with the number of distinct entries now in the directory.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/members", post().to(import::members))
        .route("/students", post().to(import::students))
}
