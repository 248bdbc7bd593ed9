use crate::services::{run_blocking, AppState};
use crate::storage::logs::logs_for;
use crate::storage::published::get_published;
use actix_web::{web, HttpResponse, Responder};

pub async fn process(state: web::Data<AppState>, published_id: web::Path<String>) -> impl Responder {
    let published_id = published_id.into_inner();
    let result = run_blocking(&state.store, move |conn| {
        // 404 for unknown ids rather than an empty list.
        get_published(conn, &published_id)?;
        Ok(logs_for(conn, &published_id)?)
    })
    .await;
    match result {
        Ok(logs) => HttpResponse::Ok().json(logs),
        Err(e) => e.response(),
    }
}
