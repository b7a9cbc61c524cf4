//! Game endpoints.

use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::filters::GameFilter;
use crate::domain::game::{GameInput, GameUpdateInput};
use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::game::{self as game_service, Pagination};

//////////////////////////////////////////////////
// POST /games
//////////////////////////////////////////////////
#[post("/games")]
pub async fn create_game(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<GameInput>,
) -> Result<HttpResponse, AppError> {
    let id = game_service::create_game(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

//////////////////////////////////////////////////
// Listing
//////////////////////////////////////////////////

/// GET /games?limit=&offset=
#[get("/games")]
pub async fn list_games(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    page: web::Query<Pagination>,
) -> Result<HttpResponse, AppError> {
    let games =
        game_service::page_games(&db, auth.user.team_id, &GameFilter::default(), page.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(games))
}

/// POST /games/filter?limit=&offset=
#[post("/games/filter")]
pub async fn filter_games(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    page: web::Query<Pagination>,
    body: web::Json<GameFilter>,
) -> Result<HttpResponse, AppError> {
    let games = game_service::page_games(&db, auth.user.team_id, &body, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(games))
}

/// GET /games/next-game
#[get("/games/next-game")]
pub async fn next_game(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let game = game_service::next_game(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(game))
}

/// GET /games/last-games
#[get("/games/last-games")]
pub async fn last_games(db: web::Data<PgPool>, auth: JwtAuth) -> Result<HttpResponse, AppError> {
    let games = game_service::last_games(&db, auth.user.team_id).await?;
    Ok(HttpResponse::Ok().json(games))
}

//////////////////////////////////////////////////
// Single game
//////////////////////////////////////////////////

/// GET /games/to-update/{id}
#[get("/games/to-update/{id}")]
pub async fn game_to_update(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let game = game_service::game_to_update(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(game))
}

/// PATCH /games/{id}
#[patch("/games/{id}")]
pub async fn update_game(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<GameUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let game =
        game_service::update_game(&db, &auth.user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(game))
}

/// DELETE /games/{id}
#[delete("/games/{id}")]
pub async fn delete_game(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    game_service::delete_game(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /games/reactivate/{id}
#[post("/games/reactivate/{id}")]
pub async fn reactivate_game(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let game = game_service::reactivate_game(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(game))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_game)
        .service(list_games)
        .service(filter_games)
        .service(next_game)
        .service(last_games)
        .service(game_to_update)
        .service(update_game)
        .service(delete_game)
        .service(reactivate_game);
}
