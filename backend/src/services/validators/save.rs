use crate::services::{run_blocking, ApiError, AppState};
use crate::storage::validators::save_validator;
use actix_web::{web, HttpResponse, Responder};
use common::model::validator::ValidatorTable;
use log::info;

pub async fn process(state: web::Data<AppState>, payload: web::Json<ValidatorTable>) -> impl Responder {
    let table = payload.into_inner();
    if let Err(e) = table.check() {
        return ApiError::BadRequest(e.to_string()).response();
    }

    let name = table.name.clone();
    let rows = table.row_count();
    match run_blocking(&state.store, move |conn| Ok(save_validator(conn, &table)?)).await {
        Ok(()) => {
            info!("validator '{name}' saved with {rows} rows");
            HttpResponse::Ok().body("Validador guardado correctamente")
        }
        Err(e) => e.response(),
    }
}
