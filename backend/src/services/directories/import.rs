use crate::services::{run_blocking, AppState};
use crate::storage::directories::{replace_members, replace_students};
use actix_web::{web, HttpResponse, Responder};
use common::requests::{MembersRequest, StudentsRequest};
use log::info;

pub async fn members(state: web::Data<AppState>, payload: web::Json<MembersRequest>) -> impl Responder {
    let MembersRequest { identifications } = payload.into_inner();
    match run_blocking(&state.store, move |conn| Ok(replace_members(conn, &identifications)?)).await {
        Ok(count) => {
            info!("member directory replaced: {count} entries");
            HttpResponse::Ok().json(count)
        }
        Err(e) => e.response(),
    }
}

pub async fn students(state: web::Data<AppState>, payload: web::Json<StudentsRequest>) -> impl Responder {
    let StudentsRequest { students } = payload.into_inner();
    match run_blocking(&state.store, move |conn| Ok(replace_students(conn, &students)?)).await {
        Ok(count) => {
            info!("student directory replaced: {count} entries");
            HttpResponse::Ok().json(count)
        }
        Err(e) => e.response(),
    }
}
