use crate::services::{run_blocking, ApiError, AppState};
use crate::storage::published::{get_published, publish, update_deadlines};
use actix_web::{web, HttpResponse, Responder};
use common::requests::{PublishRequest, UpdateDeadlinesRequest};
use common::responses::PublishResponse;
use log::info;

pub async fn process(state: web::Data<AppState>, payload: web::Json<PublishRequest>) -> impl Responder {
    let PublishRequest {
        template_id,
        period,
        deadline,
    } = payload.into_inner();
    if period.trim().is_empty() {
        return ApiError::BadRequest("El periodo no puede estar vacío".to_string()).response();
    }

    let result = run_blocking(&state.store, move |conn| {
        let id = publish(conn, &template_id, &period, deadline)?;
        info!("template '{template_id}' published for {period} as '{id}', deadline {deadline}");
        Ok(id)
    })
    .await;
    match result {
        Ok(id) => HttpResponse::Ok().json(PublishResponse { id }),
        Err(e) => e.response(),
    }
}

pub async fn deadline(
    state: web::Data<AppState>,
    payload: web::Json<UpdateDeadlinesRequest>,
) -> impl Responder {
    let UpdateDeadlinesRequest {
        published_ids,
        deadline,
    } = payload.into_inner();
    match run_blocking(&state.store, move |conn| Ok(update_deadlines(conn, &published_ids, deadline)?)).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => e.response(),
    }
}

pub async fn get(state: web::Data<AppState>, published_id: web::Path<String>) -> impl Responder {
    let published_id = published_id.into_inner();
    match run_blocking(&state.store, move |conn| Ok(get_published(conn, &published_id)?)).await {
        Ok(published) => HttpResponse::Ok().json(published),
        Err(e) => e.response(),
    }
}
