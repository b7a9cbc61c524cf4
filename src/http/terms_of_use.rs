use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::services::terms::{self as terms_service, AcceptTerms, TermsCreate};

/// GET /terms_of_use/active (public)
#[get("/terms_of_use/active")]
pub async fn active_terms(db: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let terms = terms_service::get_active(&db).await?;
    Ok(HttpResponse::Ok().json(terms))
}

/// POST /terms_of_use
#[post("/terms_of_use")]
pub async fn publish_terms(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<TermsCreate>,
) -> Result<HttpResponse, AppError> {
    let terms = terms_service::publish(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(terms))
}

/// POST /terms_of_use/accept
#[post("/terms_of_use/accept")]
pub async fn accept_terms(
    db: web::Data<PgPool>,
    auth: JwtAuth,
    body: web::Json<AcceptTerms>,
) -> Result<HttpResponse, AppError> {
    terms_service::accept(&db, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Terms accepted" })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(active_terms)
        .service(publish_terms)
        .service(accept_terms);
}
