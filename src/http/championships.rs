use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::championship::ChampionshipInput;
use crate::domain::filters::ChampionshipFilter;
use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::championship as championship_service;

/// POST /championships
#[post("/championships")]
pub async fn create_championship(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<ChampionshipInput>,
) -> Result<HttpResponse, AppError> {
    let championship =
        championship_service::create_championship(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(championship))
}

/// GET /championships
#[get("/championships")]
pub async fn list_championships(
    db: web::Data<PgPool>,
    auth: JwtAuth,
) -> Result<HttpResponse, AppError> {
    let championships = championship_service::list_championships(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(championships))
}

/// POST /championships/filter
#[post("/championships/filter")]
pub async fn filter_championships(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<ChampionshipFilter>,
) -> Result<HttpResponse, AppError> {
    let championships =
        championship_service::filter_championships(&db, auth.user.team_id, &body).await?;
    Ok(HttpResponse::Ok().json(championships))
}

/// GET /championships/{id}
#[get("/championships/{id}")]
pub async fn get_championship(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let championship =
        championship_service::get_championship(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(championship))
}

/// PATCH /championships/{id}
#[patch("/championships/{id}")]
pub async fn update_championship(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<ChampionshipInput>,
) -> Result<HttpResponse, AppError> {
    let championship = championship_service::update_championship(
        &db,
        &auth.user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(championship))
}

/// DELETE /championships/{id}
#[delete("/championships/{id}")]
pub async fn delete_championship(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    championship_service::delete_championship(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_championship)
        .service(list_championships)
        .service(filter_championships)
        .service(get_championship)
        .service(update_championship)
        .service(delete_championship);
}
