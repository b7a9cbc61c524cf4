use anyhow::{Context, Result};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::db::models::TermsOfUse;

pub async fn get_active(db: impl PgExecutor<'_>) -> Result<Option<TermsOfUse>> {
    sqlx::query_as::<_, TermsOfUse>(
        "SELECT * FROM terms_of_use WHERE is_active ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(db)
    .await
    .context("fetching active terms of use")
}

pub async fn get_by_version(db: impl PgExecutor<'_>, version: i32) -> Result<Option<TermsOfUse>> {
    sqlx::query_as::<_, TermsOfUse>("SELECT * FROM terms_of_use WHERE version = $1")
        .bind(version)
        .fetch_optional(db)
        .await
        .context("fetching terms of use")
}

/// Publishes the next version and makes it the only active one.
pub async fn publish(conn: &mut PgConnection, content: &str) -> Result<TermsOfUse> {
    sqlx::query("UPDATE terms_of_use SET is_active = FALSE WHERE is_active")
        .execute(&mut *conn)
        .await
        .context("deactivating terms of use")?;

    sqlx::query_as::<_, TermsOfUse>(
        r#"INSERT INTO terms_of_use (version, content, is_active)
           SELECT COALESCE(MAX(version), 0) + 1, $1, TRUE FROM terms_of_use
           RETURNING *"#,
    )
    .bind(content)
    .fetch_one(&mut *conn)
    .await
    .context("inserting terms of use")
}

pub async fn record_acceptance(db: impl PgExecutor<'_>, user_id: Uuid, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO user_terms_acceptances (user_id, terms_version) VALUES ($1, $2)")
        .bind(user_id)
        .bind(version)
        .execute(db)
        .await
        .context("recording terms acceptance")?;
    Ok(())
}
