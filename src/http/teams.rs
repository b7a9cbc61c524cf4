use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::permissions::require_super_admin;
use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::team::{self as team_service, IntentionCreate, TeamCreate, TeamUpdate};

/// POST /teams
#[post("/teams")]
pub async fn create_team(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<TeamCreate>,
) -> Result<HttpResponse, AppError> {
    require_super_admin(&auth.user.principal())?;
    let team = team_service::create_team(db.get_ref(), body.into_inner(), Some(auth.user.id)).await?;
    Ok(HttpResponse::Created().json(team))
}

/// POST /teams/intention-to-subscribe (public)
#[post("/teams/intention-to-subscribe")]
pub async fn intention_to_subscribe(
    db: web::Data<PgPool>,
    body: web::Json<IntentionCreate>,
) -> Result<HttpResponse, AppError> {
    let intention = team_service::create_intention(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(intention))
}

/// GET /teams/me
#[get("/teams/me")]
pub async fn my_team(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let team = team_service::load_team(db.get_ref(), auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// GET /teams/{id}
#[get("/teams/{id}")]
pub async fn get_team(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let team = team_service::get_team(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// PATCH /teams/{id}
#[patch("/teams/{id}")]
pub async fn update_team(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<TeamUpdate>,
) -> Result<HttpResponse, AppError> {
    let team =
        team_service::update_team(&db, &auth.user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// DELETE /teams/{id}
#[delete("/teams/{id}")]
pub async fn delete_team(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    team_service::delete_team(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_team)
        .service(intention_to_subscribe)
        .service(my_team)
        .service(get_team)
        .service(update_team)
        .service(delete_team);
}
