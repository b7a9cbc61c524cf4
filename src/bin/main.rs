use actix_web::{middleware::Logger, web, App, HttpServer};
use std::path::Path;
use std::sync::Arc;
use team_manager_server::config::settings;
use team_manager_server::storage::{LocalStore, ObjectStore};
use team_manager_server::{db, http, metrics};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cfg = settings();
    if cfg.database_url.is_empty() {
        log::error!("DATABASE_URL must be set");
        return Err(std::io::Error::other("DATABASE_URL must be set"));
    }

    // Postgres pool
    let db_pool = db::connect(&cfg.database_url, cfg.db_max_connections, cfg.db_connect_retries)
        .await
        .map_err(|e| std::io::Error::other(format!("{e:#}")))?;

    // Object storage
    let bucket = Path::new(&cfg.storage_dir).join(&cfg.teams_bucket);
    let store: Arc<dyn ObjectStore> = Arc::new(
        LocalStore::new(bucket, &cfg.storage_public_url).map_err(std::io::Error::other)?,
    );
    let store = web::Data::from(store);

    log::info!("listening on {}", cfg.server_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(store.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&cfg.server_addr)?
    .run()
    .await
}
