use actix_web::{web, App, HttpServer};
use env_logger::Env;
use ingesta::config::Config;
use ingesta::services::{self, AppState};
use ingesta::storage::Store;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let store = Store::open(&config.db_path).map_err(io::Error::other)?;
    info!("Database ready at {}", store.path().display());

    let state = AppState::new(store, config.submit_retries, config.utc_offset);
    let json_limit = config.json_limit;

    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(web::Data::new(state.clone()))
            .service(services::templates::configure_routes())
            .service(services::validators::configure_routes())
            .service(services::directories::configure_routes())
            .service(services::published::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
