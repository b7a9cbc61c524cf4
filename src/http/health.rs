//! Liveness and readiness checks.

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "Hello": "World" }))
}

#[get("/database-check")]
pub async fn database_check(db: web::Data<PgPool>) -> impl Responder {
    if let Err(e) = sqlx::query("SELECT 1").execute(db.get_ref()).await {
        log::warn!("database not ready: {e}");
        return HttpResponse::ServiceUnavailable().json(json!({ "status": "waiting connection" }));
    }
    HttpResponse::Ok().json(json!({ "status": "ready" }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(database_check);
}
