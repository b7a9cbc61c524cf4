use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_initial_user: bool,
}

/// Final values of the editable columns after an update.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub player_id: Option<Uuid>,
}

impl UserFields {
    pub fn from_user(user: &User) -> Self {
        UserFields {
            name: user.name.clone(),
            email: user.email.clone(),
            hashed_password: user.hashed_password.clone(),
            is_admin: user.is_admin,
            player_id: user.player_id,
        }
    }
}

pub async fn create(
    db: impl PgExecutor<'_>,
    new: &NewUser,
    created_by: Option<Uuid>,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"INSERT INTO users (team_id, player_id, name, email, hashed_password,
                              is_admin, is_super_admin, is_initial_user, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
           RETURNING *"#,
    )
    .bind(new.team_id)
    .bind(new.player_id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.hashed_password)
    .bind(new.is_admin)
    .bind(new.is_super_admin)
    .bind(new.is_initial_user)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting user")
}

pub async fn get_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND NOT deleted")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching user")
}

pub async fn get_by_email(db: impl PgExecutor<'_>, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND NOT deleted")
        .bind(email)
        .fetch_optional(db)
        .await
        .context("fetching user by email")
}

pub async fn get_by_player_id(db: impl PgExecutor<'_>, player_id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE player_id = $1 AND NOT deleted")
        .bind(player_id)
        .fetch_optional(db)
        .await
        .context("fetching user by player")
}

pub async fn list_by_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE team_id = $1 AND NOT deleted ORDER BY name",
    )
    .bind(team_id)
    .fetch_all(db)
    .await
    .context("listing team users")
}

/// The support account created when the team was registered.
pub async fn get_team_super_user(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"SELECT * FROM users
            WHERE team_id = $1 AND is_super_admin AND NOT deleted
            ORDER BY created_at
            LIMIT 1"#,
    )
    .bind(team_id)
    .fetch_optional(db)
    .await
    .context("fetching team super user")
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    fields: &UserFields,
    updated_by: Uuid,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"UPDATE users
              SET name            = $2,
                  email           = $3,
                  hashed_password = $4,
                  is_admin        = $5,
                  player_id       = $6,
                  updated_at      = NOW(),
                  updated_by      = $7
            WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.hashed_password)
    .bind(fields.is_admin)
    .bind(fields.player_id)
    .bind(updated_by)
    .fetch_one(db)
    .await
    .context("updating user")
}

pub async fn set_player(
    db: impl PgExecutor<'_>,
    id: Uuid,
    player_id: Option<Uuid>,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE users SET player_id = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(player_id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("linking user to player")?;
    Ok(())
}

/// Detaches whichever user points at `player_id`.
pub async fn unlink_player(db: impl PgExecutor<'_>, player_id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        r#"UPDATE users
              SET player_id = NULL, updated_at = NOW(), updated_by = $2
            WHERE player_id = $1"#,
    )
    .bind(player_id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("unlinking player from user")?;
    Ok(())
}

pub async fn set_terms_version(db: impl PgExecutor<'_>, id: Uuid, version: i32) -> Result<()> {
    sqlx::query("UPDATE users SET terms_accepted_version = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(version)
        .execute(db)
        .await
        .context("recording accepted terms version")?;
    Ok(())
}

pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE users SET deleted = TRUE, updated_at = NOW(), updated_by = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting user")?;
    Ok(())
}

/// Hard delete of every user of a team except the ones in `keep`.
pub async fn purge_team_users_except(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    keep: &[Uuid],
) -> Result<u64> {
    let done = sqlx::query("DELETE FROM users WHERE team_id = $1 AND NOT (id = ANY($2))")
        .bind(team_id)
        .bind(keep)
        .execute(db)
        .await
        .context("purging team users")?;
    Ok(done.rows_affected())
}

pub async fn clear_players_of_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE users SET player_id = NULL WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("clearing team user players")?;
    Ok(())
}
