//! Emblem uploads and read access to stored objects.

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::http::auth::JwtAuth;
use crate::http::players::{ensure_not_empty, upload_extension, UploadParams};
use crate::services::team as team_service;
use crate::storage::{content_type_for, ObjectStore};

/// POST /bucket/upload-emblem?filename=..  (raw image bytes)
#[post("/bucket/upload-emblem")]
pub async fn upload_emblem(
    db: web::Data<PgPool>,
    store: web::Data<dyn ObjectStore>,
    auth: JwtAuth,
    params: web::Query<UploadParams>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    ensure_not_empty(&body)?;
    let extension = upload_extension(&req, &params);
    let url =
        team_service::upload_emblem(&db, store.get_ref(), &auth.user, &extension, body.to_vec())
            .await?;
    Ok(HttpResponse::Ok().json(json!({ "emblem_url": url })))
}

/// GET /files/{path}
#[get("/files/{path:.*}")]
pub async fn serve_file(
    store: web::Data<dyn ObjectStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let path = path.into_inner();
    let bytes = store.read(&path).await.map_err(|e| {
        log::warn!("rejected file read {path}: {e}");
        AppError::BadRequest("Invalid file path.".into())
    })?;
    match bytes {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&path))
            .body(bytes)),
        None => Ok(HttpResponse::NotFound().json(json!({ "detail": "File not found" }))),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_emblem).service(serve_file);
}
