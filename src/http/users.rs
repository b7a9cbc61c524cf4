use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::user::{self as user_service, UserCreate, UserUpdate};

//////////////////////////////////////////////////
// POST /users
//////////////////////////////////////////////////
#[post("/users")]
pub async fn create_user(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<UserCreate>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::create_user(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

//////////////////////////////////////////////////
// GET /users/me
//////////////////////////////////////////////////
#[get("/users/me")]
pub async fn me(auth: JwtAuth) -> HttpResponse {
    HttpResponse::Ok().json(auth.user)
}

//////////////////////////////////////////////////
// GET /users/team/{team_id}
//////////////////////////////////////////////////
#[get("/users/team/{team_id}")]
pub async fn team_users(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let users = user_service::list_team_users(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(users))
}

//////////////////////////////////////////////////
// GET|PATCH|DELETE /users/{id}
//////////////////////////////////////////////////
#[get("/users/{id}")]
pub async fn get_user(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::get_user(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[patch("/users/{id}")]
pub async fn update_user(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
    body: web::Json<UserUpdate>,
) -> Result<HttpResponse, AppError> {
    let user =
        user_service::update_user(&db, &auth.user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user_service::delete_user(&db, &auth.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(me)
        .service(team_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}
