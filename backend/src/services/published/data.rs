use crate::engine::table::ColumnTable;
use crate::services::{run_blocking, ApiError, AppState};
use crate::storage::published::{delete_loaded_data, get_published};
use crate::storage::StoreError;
use actix_web::{web, HttpResponse, Responder};
use common::requests::Row;
use common::responses::LoadedDataResponse;
use log::info;
use serde_json::Value;

/// Column tagging each merged row with the dependency that sent it.
pub const DEPENDENCY_COLUMN: &str = "Dependencia";

pub async fn get(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (published_id, dependency) = path.into_inner();
    let result = run_blocking(&state.store, move |conn| {
        let published = get_published(conn, &published_id)?;
        let data = published.loaded_for(&dependency).ok_or_else(|| {
            StoreError::NotFound(format!("data of '{dependency}' in '{published_id}'"))
        })?;
        let rows = ColumnTable::from_filled(data.filled_data.clone())
            .map_err(StoreError::from)?
            .to_rows();
        Ok(LoadedDataResponse {
            filled_data: data.filled_data.clone(),
            rows,
        })
    })
    .await;
    match result {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.response(),
    }
}

/// Rows of every dependency, in submission slot order.
pub async fn merged(state: web::Data<AppState>, published_id: web::Path<String>) -> impl Responder {
    let published_id = published_id.into_inner();
    let result = run_blocking(&state.store, move |conn| {
        let published = get_published(conn, &published_id)?;
        let mut merged: Vec<Row> = Vec::new();
        for data in published.loaded_data {
            let table = ColumnTable::from_filled(data.filled_data).map_err(StoreError::from)?;
            merged.extend(table.to_rows().into_iter().map(|mut row| {
                row.insert(
                    DEPENDENCY_COLUMN.to_string(),
                    Value::String(data.dependency.clone()),
                );
                row
            }));
        }
        Ok::<_, ApiError>(merged)
    })
    .await;
    match result {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => e.response(),
    }
}

pub async fn remove(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (published_id, dependency) = path.into_inner();
    let _guard = state.locks.acquire(&published_id, &dependency).await;

    let target = (published_id.clone(), dependency.clone());
    let result = run_blocking(&state.store, move |conn| {
        Ok(delete_loaded_data(conn, &target.0, &target.1)?)
    })
    .await;
    match result {
        Ok(revision) => {
            info!("data of '{dependency}' deleted from '{published_id}' (revision {revision})");
            HttpResponse::Ok().body("Data deleted")
        }
        Err(e) => e.response(),
    }
}
