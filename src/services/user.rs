//! User management, login sessions and refresh-token rotation.

use chrono::Duration;
use rand::{distr::Alphanumeric, Rng};
use serde::Deserialize;
use serde_with::rust::double_option;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::config::settings;
use crate::datetime::utc_now;
use crate::db::models::User;
use crate::db::user_repo::{self, NewUser, UserFields};
use crate::db::{player_repo, session_repo, terms_repo};
use crate::domain::permissions::{check_user_delete, check_user_update, require_admin};
use crate::error::{AppError, AppResult};
use crate::password::{hash_password, validate_password_length, verify_password};

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub player_id: Option<Uuid>,
}

/// `player_id: null` unlinks the player; a missing key leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default, with = "double_option")]
    pub player_id: Option<Option<Uuid>>,
}

/// Result of a successful login or refresh.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub refresh_token: String,
    pub terms_version_to_accept: Option<i32>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name_and_email(name: &str, email: &str) -> AppResult<()> {
    let name_len = name.chars().count();
    if name_len == 0 || name_len > 255 {
        return Err(AppError::Validation(
            "Name must be between 1 and 255 characters long.".into(),
        ));
    }
    if email.len() > 254 || !email.contains('@') {
        return Err(AppError::Validation("Invalid email.".into()));
    }
    Ok(())
}

/// Opaque token stored in `logged_users` and sent as a cookie.
pub fn generate_refresh_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

//////////////////////////////////////////////////
// Reads
//////////////////////////////////////////////////

pub async fn get_user(db: &PgPool, actor: &User, user_id: Uuid) -> AppResult<User> {
    let user = user_repo::get_by_id(db, user_id)
        .await?
        .filter(|u| u.team_id == actor.team_id || actor.is_super_admin)
        .ok_or(AppError::UserNotFound)?;
    Ok(user)
}

pub async fn list_team_users(db: &PgPool, actor: &User, team_id: Uuid) -> AppResult<Vec<User>> {
    if team_id != actor.team_id && !actor.is_super_admin {
        return Err(AppError::AdminRequired);
    }
    Ok(user_repo::list_by_team(db, team_id).await?)
}

//////////////////////////////////////////////////
// Writes
//////////////////////////////////////////////////

async fn ensure_email_free(db: &PgPool, email: &str, except: Option<Uuid>) -> AppResult<()> {
    match user_repo::get_by_email(db, email).await? {
        Some(existing) if Some(existing.id) != except => Err(AppError::EmailAlreadyInUse),
        _ => Ok(()),
    }
}

/// The player must belong to the team and must not back another live user.
async fn ensure_player_linkable(
    db: &PgPool,
    team_id: Uuid,
    player_id: Uuid,
    except: Option<Uuid>,
) -> AppResult<()> {
    player_repo::get_by_id(db, team_id, player_id)
        .await?
        .ok_or(AppError::PlayerNotFound)?;
    match user_repo::get_by_player_id(db, player_id).await? {
        Some(holder) if Some(holder.id) != except => Err(AppError::PlayerAlreadyLinked),
        _ => Ok(()),
    }
}

pub async fn create_user(db: &PgPool, actor: &User, input: UserCreate) -> AppResult<User> {
    require_admin(&actor.principal())?;
    validate_password_length(&input.password)?;
    let email = normalize_email(&input.email);
    validate_name_and_email(&input.name, &email)?;
    ensure_email_free(db, &email, None).await?;
    if let Some(player_id) = input.player_id {
        ensure_player_linkable(db, actor.team_id, player_id, None).await?;
    }

    let new = NewUser {
        team_id: actor.team_id,
        player_id: input.player_id,
        name: input.name,
        email,
        hashed_password: hash_password(&input.password, &settings().password_pepper)?,
        is_admin: input.is_admin,
        is_super_admin: false,
        is_initial_user: false,
    };
    let user = user_repo::create(db, &new, Some(actor.id)).await?;
    log::info!("user {} created by {}", user.id, actor.id);
    Ok(user)
}

pub async fn update_user(
    db: &PgPool,
    actor: &User,
    user_id: Uuid,
    input: UserUpdate,
) -> AppResult<User> {
    let target = get_user(db, actor, user_id).await?;
    check_user_update(&actor.principal(), &target.principal(), input.password.is_some())?;

    // Only admins grant admin rights.
    if input.is_admin.is_some_and(|flag| flag != target.is_admin) {
        require_admin(&actor.principal())?;
    }

    let mut fields = UserFields::from_user(&target);
    if let Some(name) = input.name {
        fields.name = name;
    }
    if let Some(email) = input.email {
        fields.email = normalize_email(&email);
        if fields.email != target.email {
            ensure_email_free(db, &fields.email, Some(target.id)).await?;
        }
    }
    validate_name_and_email(&fields.name, &fields.email)?;
    if let Some(password) = input.password {
        validate_password_length(&password)?;
        fields.hashed_password = hash_password(&password, &settings().password_pepper)?;
    }
    if let Some(is_admin) = input.is_admin {
        fields.is_admin = is_admin;
    }
    if let Some(player_id) = input.player_id {
        if let Some(player_id) = player_id {
            ensure_player_linkable(db, target.team_id, player_id, Some(target.id)).await?;
        }
        fields.player_id = player_id;
    }

    Ok(user_repo::update(db, target.id, &fields, actor.id).await?)
}

pub async fn delete_user(db: &PgPool, actor: &User, user_id: Uuid) -> AppResult<()> {
    if actor.id == user_id {
        return Err(AppError::CantDeleteYourself);
    }
    let target = get_user(db, actor, user_id).await?;
    check_user_delete(&actor.principal(), &target.principal())?;

    let mut tx = db.begin().await?;
    user_repo::soft_delete(&mut *tx, target.id, actor.id).await?;
    session_repo::delete_by_user(&mut *tx, target.id).await?;
    tx.commit().await?;
    log::info!("user {} deleted by {}", target.id, actor.id);
    Ok(())
}

//////////////////////////////////////////////////
// Sessions
//////////////////////////////////////////////////

/// Active terms version the user still has to accept, if any.
pub async fn terms_version_to_accept(db: &PgPool, user: &User) -> AppResult<Option<i32>> {
    let active = terms_repo::get_active(db).await?;
    Ok(active
        .map(|terms| terms.version)
        .filter(|version| user.terms_accepted_version != Some(*version)))
}

async fn insert_session(db: impl PgExecutor<'_>, user_id: Uuid) -> AppResult<String> {
    let refresh_token = generate_refresh_token();
    let expires_at = utc_now() + Duration::days(settings().refresh_token_expire_days);
    session_repo::create(db, user_id, &refresh_token, expires_at).await?;
    Ok(refresh_token)
}

async fn session_for(db: &PgPool, user: User, refresh_token: String) -> AppResult<Session> {
    let terms_version_to_accept = terms_version_to_accept(db, &user).await?;
    Ok(Session {
        user,
        refresh_token,
        terms_version_to_accept,
    })
}

/// Over-long passwords are not rejected here; they simply never match.
pub async fn login(db: &PgPool, email: &str, password: &str) -> AppResult<Session> {
    let user = user_repo::get_by_email(db, &normalize_email(email))
        .await?
        .filter(|u| verify_password(password, &settings().password_pepper, &u.hashed_password))
        .ok_or(AppError::IncorrectCredentials)?;

    log::info!("user {} logged in", user.id);
    let refresh_token = insert_session(db, user.id).await?;
    session_for(db, user, refresh_token).await
}

/// Swaps a valid refresh token for a fresh one.
/// The old token is consumed atomically, so replaying it fails.
pub async fn refresh(db: &PgPool, refresh_token: &str) -> AppResult<Session> {
    let mut tx = db.begin().await?;
    let session = session_repo::take_valid(&mut *tx, refresh_token)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;
    let user = user_repo::get_by_id(&mut *tx, session.user_id)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;
    let new_token = insert_session(&mut *tx, user.id).await?;
    tx.commit().await?;

    session_for(db, user, new_token).await
}

pub async fn logout(db: &PgPool, refresh_token: Option<&str>) -> AppResult<()> {
    if let Some(token) = refresh_token {
        session_repo::delete_by_token(db, token).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_long_and_unique() {
        let a = generate_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_refresh_token());
    }

    #[test]
    fn player_id_null_differs_from_missing() {
        let missing: UserUpdate = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(missing.player_id, None);
        let cleared: UserUpdate = serde_json::from_str(r#"{"player_id": null}"#).unwrap();
        assert_eq!(cleared.player_id, Some(None));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Time.COM "), "ana@time.com");
    }
}
