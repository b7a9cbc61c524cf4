//! Refresh-token sessions (`logged_users`).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::LoggedUser;

pub async fn create(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO logged_users (user_id, refresh_token, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(refresh_token)
    .bind(expires_at)
    .execute(db)
    .await
    .context("opening session")?;
    Ok(())
}

/// Deletes the session for `refresh_token` and returns it if it was still valid.
/// Only one of several concurrent callers gets the row back.
pub async fn take_valid(db: impl PgExecutor<'_>, refresh_token: &str) -> Result<Option<LoggedUser>> {
    sqlx::query_as::<_, LoggedUser>(
        r#"DELETE FROM logged_users
            WHERE refresh_token = $1 AND expires_at > NOW()
        RETURNING *"#,
    )
    .bind(refresh_token)
    .fetch_optional(db)
    .await
    .context("consuming session")
}

pub async fn delete_by_token(db: impl PgExecutor<'_>, refresh_token: &str) -> Result<()> {
    sqlx::query("DELETE FROM logged_users WHERE refresh_token = $1")
        .bind(refresh_token)
        .execute(db)
        .await
        .context("closing session")?;
    Ok(())
}

pub async fn delete_by_user(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM logged_users WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .context("closing user sessions")?;
    Ok(())
}

/// Drops sessions of every user of a team except the ones in `keep`.
pub async fn delete_by_team_except(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    keep: &[Uuid],
) -> Result<()> {
    sqlx::query(
        r#"DELETE FROM logged_users l
             USING users u
            WHERE u.id = l.user_id
              AND u.team_id = $1
              AND NOT (u.id = ANY($2))"#,
    )
    .bind(team_id)
    .bind(keep)
    .execute(db)
    .await
    .context("closing team sessions")?;
    Ok(())
}
