use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::IntentionToSubscribe;

pub async fn create(
    db: impl PgExecutor<'_>,
    user_name: &str,
    user_email: &str,
    phone_number: &str,
    team_name: &str,
) -> Result<IntentionToSubscribe> {
    sqlx::query_as::<_, IntentionToSubscribe>(
        r#"INSERT INTO intentions_to_subscribe (user_name, user_email, phone_number, team_name)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(user_name)
    .bind(user_email)
    .bind(phone_number)
    .bind(team_name)
    .fetch_one(db)
    .await
    .context("inserting intention to subscribe")
}

pub async fn get_by_email(
    db: impl PgExecutor<'_>,
    user_email: &str,
) -> Result<Option<IntentionToSubscribe>> {
    sqlx::query_as::<_, IntentionToSubscribe>(
        "SELECT * FROM intentions_to_subscribe WHERE user_email = $1 AND NOT deleted",
    )
    .bind(user_email)
    .fetch_optional(db)
    .await
    .context("fetching intention to subscribe")
}

/// Removed for good once the team is registered, so the email can apply again.
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM intentions_to_subscribe WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("deleting intention to subscribe")?;
    Ok(())
}
