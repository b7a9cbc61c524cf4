use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::availability::{self as availability_service, AvailabilityCreate, AvailabilityUpdate};

/// POST /player-availability
#[post("")]
pub async fn create_availability(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<AvailabilityCreate>,
) -> Result<HttpResponse, AppError> {
    let id = availability_service::create_availability(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// GET /player-availability/{game_id}
#[get("/{game_id}")]
pub async fn game_availability(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let grouped = availability_service::game_availability(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(grouped))
}

/// PATCH /player-availability/{game_id}
#[patch("/{game_id}")]
pub async fn update_availability(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<AvailabilityUpdate>,
) -> Result<HttpResponse, AppError> {
    let entry = availability_service::update_availability(
        &db,
        &auth.user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(entry))
}

/// DELETE /player-availability/{game_id}
#[delete("/{game_id}")]
pub async fn delete_availability(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    availability_service::delete_availability(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/player-availability")
            .service(create_availability)
            .service(game_availability)
            .service(update_availability)
            .service(delete_availability),
    );
}
