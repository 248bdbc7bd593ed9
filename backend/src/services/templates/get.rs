use crate::services::{run_blocking, AppState};
use crate::storage::templates::get_template;
use actix_web::{web, HttpResponse, Responder};

/// Actix web handler for the `GET /api/templates/{template_id}` endpoint.
///
/// # Returns
/// - `200 OK` with the `Template` object as a JSON payload on success.
/// - `404 Not Found` if no template has that id.
/// - `503 Service Unavailable` if the stored definition cannot be read.
pub async fn process(state: web::Data<AppState>, template_id: web::Path<String>) -> impl Responder {
    let template_id = template_id.into_inner();
    match run_blocking(&state.store, move |conn| Ok(get_template(conn, &template_id)?)).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => e.response(),
    }
}
