use crate::engine::table::ColumnTable;
use crate::services::{run_blocking, ApiError, AppState};
use crate::storage::validators::get_validator;
use crate::storage::StoreError;
use actix_web::{web, HttpResponse, Responder};
use common::model::validator::ValidatorTable;

async fn load(state: &AppState, name: String) -> Result<ValidatorTable, ApiError> {
    run_blocking(&state.store, move |conn| {
        get_validator(conn, &name)?
            .ok_or_else(|| StoreError::NotFound(format!("validator '{name}'")).into())
    })
    .await
}

pub async fn process(state: web::Data<AppState>, name: web::Path<String>) -> impl Responder {
    match load(&state, name.into_inner()).await {
        Ok(table) => HttpResponse::Ok().json(table),
        Err(e) => e.response(),
    }
}

/// Row view of a table, used to prefill spreadsheets for download.
pub async fn rows(state: web::Data<AppState>, name: web::Path<String>) -> impl Responder {
    let table = match load(&state, name.into_inner()).await {
        Ok(table) => table,
        Err(e) => return e.response(),
    };
    match ColumnTable::from_columns(table.columns.into_iter().map(|c| (c.name, c.values))) {
        Ok(columns) => HttpResponse::Ok().json(columns.to_rows()),
        Err(e) => ApiError::Store(e.into()).response(),
    }
}
