use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::stats as stats_service;

/// GET /stats/month-top-scorer
#[get("/stats/month-top-scorer")]
pub async fn month_top_scorer(
    db: web::Data<PgPool>,
    auth: JwtAuth,
) -> Result<HttpResponse, AppError> {
    let scorer = stats_service::month_top_scorer(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(scorer))
}

/// GET /stats/season-summary
#[get("/stats/season-summary")]
pub async fn season_summary(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let summary = stats_service::season_summary(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /stats/game/{game_id}
#[get("/stats/game/{game_id}")]
pub async fn game_stats_by_game(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_service::game_stats(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /stats/{game_id}
#[get("/stats/{game_id}")]
pub async fn game_stats(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_service::game_stats(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(month_top_scorer)
        .service(season_summary)
        .service(game_stats_by_game)
        .service(game_stats);
}
