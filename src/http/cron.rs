use actix_web::{get, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::datetime::utc_now;
use crate::error::AppError;
use crate::services::cron as cron_service;
use crate::storage::ObjectStore;

/// GET /cron/reset-demo-team-data
#[get("/cron/reset-demo-team-data")]
pub async fn reset_demo_team_data(
    db: web::Data<PgPool>,
    store: web::Data<dyn ObjectStore>,
) -> Result<HttpResponse, AppError> {
    cron_service::reset_demo_team(&db, store.get_ref(), utc_now()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Demo team data reset" })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(reset_demo_team_data);
}
