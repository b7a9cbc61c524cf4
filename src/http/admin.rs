//! Password-guarded operator endpoints.

use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::admin::{self as admin_service, check_admin_password, RegisterTeam, RenewSubscription};

/// POST /admin/run-migrations/{password}
#[post("/admin/run-migrations/{password}")]
pub async fn run_migrations(
    db: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    check_admin_password(&path)?;
    admin_service::run_migrations(&db).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Migrations applied successfully" })))
}

/// GET /admin/pending-migrations/{password}
#[get("/admin/pending-migrations/{password}")]
pub async fn pending_migrations(
    db: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    check_admin_password(&path)?;
    let status = admin_service::pending_migrations(&db).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// POST /admin/register-team/{password}
#[post("/admin/register-team/{password}")]
pub async fn register_team(
    db: web::Data<PgPool>,
    path: web::Path<String>,
    body: web::Json<RegisterTeam>,
) -> Result<HttpResponse, AppError> {
    check_admin_password(&path)?;
    let registered = admin_service::register_team(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(registered))
}

/// POST /admin/renew-subscription
#[post("/admin/renew-subscription")]
pub async fn renew_subscription(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<RenewSubscription>,
) -> Result<HttpResponse, AppError> {
    let renewed = admin_service::renew_subscription(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(renewed))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(run_migrations)
        .service(pending_migrations)
        .service(register_team)
        .service(renew_subscription);
}
