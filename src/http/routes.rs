use actix_web::{error, web, HttpRequest};

use crate::error::AppError;
use crate::http;

fn unprocessable(detail: String) -> error::Error {
    AppError::Validation(detail).into()
}

/// Malformed bodies, queries and paths answer 422 `{"detail": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| unprocessable(err.to_string()))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req: &HttpRequest| unprocessable(err.to_string()))
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req: &HttpRequest| unprocessable(err.to_string()))
}

pub fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .error_handler(|err, _req: &HttpRequest| unprocessable(err.to_string()))
}

/// Upload bodies are capped at 5 MiB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Mount every HTTP sub-module.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(form_config())
        .configure(http::health::init_routes)
        .configure(http::auth::init_routes)
        .configure(http::users::init_routes)
        .configure(http::teams::init_routes)
        .configure(http::terms_of_use::init_routes)
        .configure(http::championships::init_routes)
        .configure(http::players::init_routes)
        .configure(http::games::init_routes)
        .configure(http::stats::init_routes)
        .configure(http::availability::init_routes)
        .configure(http::storage::init_routes)
        .configure(http::admin::init_routes)
        .configure(http::cron::init_routes);
}
