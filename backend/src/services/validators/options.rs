use crate::engine::reference::reserved_options;
use crate::services::{run_blocking, AppState};
use crate::storage::validators::list_validators;
use actix_web::{web, HttpResponse, Responder};

pub async fn process(state: web::Data<AppState>) -> impl Responder {
    let tables = run_blocking(&state.store, |conn| Ok(list_validators(conn)?)).await;
    match tables {
        Ok(tables) => {
            let mut options = reserved_options();
            options.extend(tables.iter().flat_map(|t| t.reference_options()));
            HttpResponse::Ok().json(options)
        }
        Err(e) => e.response(),
    }
}
