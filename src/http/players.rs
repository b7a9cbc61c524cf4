use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::filters::{PlayerFilter, PlayersStatsFilter};
use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::player::{self as player_service, PlayerCreate, PlayerUpdate};
use crate::storage::{file_extension, ObjectStore};

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Original file name; its extension names the stored object.
    pub filename: Option<String>,
}

/// Extension from `?filename=`, falling back to the request content type.
pub fn upload_extension(req: &HttpRequest, params: &UploadParams) -> String {
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    file_extension(params.filename.as_deref(), content_type)
}

pub fn ensure_not_empty(body: &[u8]) -> Result<(), AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("File must not be empty.".into()));
    }
    Ok(())
}

//////////////////////////////////////////////////
// Collection
//////////////////////////////////////////////////

/// POST /players
#[post("/players")]
pub async fn create_player(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<PlayerCreate>,
) -> Result<HttpResponse, AppError> {
    let player = player_service::create_player(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(player))
}

/// GET /players
#[get("/players")]
pub async fn list_players(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let players = player_service::list_players(&db, &auth.user).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// POST /players/filter
#[post("/players/filter")]
pub async fn filter_players(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<PlayerFilter>,
) -> Result<HttpResponse, AppError> {
    let players = player_service::filter_players(&db, auth.user.team_id, &body).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// GET /players/without-user
#[get("/players/without-user")]
pub async fn without_user(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let players = player_service::players_without_user(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// GET /players/all-name-and-shirt
#[get("/players/all-name-and-shirt")]
pub async fn all_name_and_shirt(
    db: web::Data<PgPool>,
    auth: JwtAuth,
) -> Result<HttpResponse, AppError> {
    let players = player_service::names_and_shirts(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// POST /players/stats-filter
#[post("/players/stats-filter")]
pub async fn stats_filter(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<PlayersStatsFilter>,
) -> Result<HttpResponse, AppError> {
    let players = player_service::stats_filter(&db, auth.user.team_id, &body).await?;
    Ok(HttpResponse::Ok().json(players))
}

//////////////////////////////////////////////////
// Single player
//////////////////////////////////////////////////

/// GET /players/{id}
#[get("/players/{id}")]
pub async fn get_player(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let player = player_service::get_player(&db, auth.user.team_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// PATCH /players/{id}
#[patch("/players/{id}")]
pub async fn update_player(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<PlayerUpdate>,
) -> Result<HttpResponse, AppError> {
    let player =
        player_service::update_player(&db, &auth.user, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(player))
}

/// DELETE /players/{id}
#[delete("/players/{id}")]
pub async fn delete_player(
    db: web::Data<PgPool>,
    store: web::Data<dyn ObjectStore>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    player_service::delete_player(&db, store.get_ref(), &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /players/{id}/image?filename=..  (raw image bytes)
#[post("/players/{id}/image")]
pub async fn upload_image(
    db: web::Data<PgPool>,
    store: web::Data<dyn ObjectStore>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    params: web::Query<UploadParams>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    ensure_not_empty(&body)?;
    let extension = upload_extension(&req, &params);
    let url = player_service::upload_image(
        &db,
        store.get_ref(),
        &auth.user,
        path.into_inner(),
        &extension,
        body.to_vec(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "image_url": url })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_player)
        .service(list_players)
        .service(filter_players)
        .service(without_user)
        .service(all_name_and_shirt)
        .service(stats_filter)
        .service(get_player)
        .service(update_player)
        .service(delete_player)
        .service(upload_image);
}
