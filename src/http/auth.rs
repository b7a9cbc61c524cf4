//! Login sessions: JWT access tokens, refresh cookies and the `JwtAuth` extractor.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::services::user::{self as user_service, Session};

pub const REFRESH_COOKIE: &str = "refresh_token";

//////////////////////////////////////////////////
// Data structs
//////////////////////////////////////////////////

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub team_id: Uuid,
    pub exp: usize,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
    pub terms_version_to_accept: Option<i32>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

//////////////////////////////////////////////////
// Tokens
//////////////////////////////////////////////////

pub fn encode_claims(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encode failed: {e}")))
}

pub fn decode_claims(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidAccessToken)
}

pub fn create_access_token(user_id: Uuid, team_id: Uuid) -> AppResult<String> {
    let exp = Utc::now() + Duration::minutes(settings().access_token_expire_minutes);
    let claims = Claims {
        sub: user_id,
        team_id,
        exp: exp.timestamp() as usize,
    };
    encode_claims(&claims, &settings().jwt_secret)
}

pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(!settings().is_local())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(settings().refresh_token_expire_days))
        .finish()
}

fn expired_refresh_cookie() -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(!settings().is_local())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}

//////////////////////////////////////////////////
// ─────────────  JwtAuth extractor  ─────────────
//////////////////////////////////////////////////

pub mod extractor {
    use super::decode_claims;
    use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
    use futures_util::future::LocalBoxFuture;
    use sqlx::PgPool;

    use crate::config::settings;
    use crate::db::{models::User, user_repo};
    use crate::error::AppError;

    /// Validates the Bearer JWT and loads the user it was issued to.
    #[derive(Debug, Clone)]
    pub struct JwtAuth {
        pub user: User,
    }

    fn bearer_token(req: &HttpRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    }

    impl FromRequest for JwtAuth {
        type Error = AppError;
        type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            let token = bearer_token(req);
            let db = req.app_data::<web::Data<PgPool>>().cloned();

            Box::pin(async move {
                let token = token.ok_or(AppError::InvalidAccessToken)?;
                let claims = decode_claims(&token, &settings().jwt_secret)?;
                let db = db.ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("database pool is not registered"))
                })?;

                // A user moved to another team must log in again.
                let user = user_repo::get_by_id(db.get_ref(), claims.sub)
                    .await?
                    .filter(|u| u.team_id == claims.team_id)
                    .ok_or(AppError::InvalidAccessToken)?;
                Ok(JwtAuth { user })
            })
        }
    }
}
pub use extractor::JwtAuth;

fn session_response(session: Session) -> AppResult<HttpResponse> {
    let access_token = create_access_token(session.user.id, session.user.team_id)?;
    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&session.refresh_token))
        .json(LoginResponse {
            access_token,
            token_type: "bearer",
            user: session.user,
            terms_version_to_accept: session.terms_version_to_accept,
        }))
}

//////////////////////////////////////////////////
// POST /users/login
//////////////////////////////////////////////////
#[post("/users/login")]
pub async fn login(
    db: web::Data<PgPool>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let session = user_service::login(&db, &form.username, &form.password).await?;
    session_response(session)
}

//////////////////////////////////////////////////
// POST /users/refresh
//////////////////////////////////////////////////
#[post("/users/refresh")]
pub async fn refresh(db: web::Data<PgPool>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let token = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::InvalidRefreshToken)?;
    let session = user_service::refresh(&db, &token).await?;
    let access_token = create_access_token(session.user.id, session.user.team_id)?;
    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&session.refresh_token))
        .json(TokenResponse {
            access_token,
            token_type: "bearer",
        }))
}

//////////////////////////////////////////////////
// POST /users/logout
//////////////////////////////////////////////////
#[post("/users/logout")]
pub async fn logout(db: web::Data<PgPool>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());
    user_service::logout(&db, token.as_deref()).await?;
    Ok(HttpResponse::Ok()
        .cookie(expired_refresh_cookie())
        .json(serde_json::json!({ "message": "Logged out" })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login).service(refresh).service(logout);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_with_the_same_secret() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp() as usize,
        };
        let token = encode_claims(&claims, "s3cret").unwrap();
        let decoded = decode_claims(&token, "s3cret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.team_id, claims.team_id);

        assert!(matches!(
            decode_claims(&token, "other"),
            Err(AppError::InvalidAccessToken)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode_claims(&claims, "s3cret").unwrap();
        assert!(decode_claims(&token, "s3cret").is_err());
    }

    #[test]
    fn refresh_cookie_is_http_only() {
        let cookie = refresh_cookie("abc");
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
