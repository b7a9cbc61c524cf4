use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::Team;

/// Editable fields of a team, shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct TeamFields {
    pub name: String,
    pub emblem_url: Option<String>,
    pub foundation_date: Option<NaiveDate>,
    pub season_start_date: Option<NaiveDate>,
    pub season_end_date: Option<NaiveDate>,
    pub primary_color: Option<String>,
}

pub async fn create(
    db: impl PgExecutor<'_>,
    fields: &TeamFields,
    paid_until: NaiveDate,
    created_by: Option<Uuid>,
) -> Result<Team> {
    sqlx::query_as::<_, Team>(
        r#"INSERT INTO teams (name, emblem_url, foundation_date, paid_until,
                              season_start_date, season_end_date, primary_color, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '#2563eb'), $8)
           RETURNING *"#,
    )
    .bind(&fields.name)
    .bind(&fields.emblem_url)
    .bind(fields.foundation_date)
    .bind(paid_until)
    .bind(fields.season_start_date)
    .bind(fields.season_end_date)
    .bind(&fields.primary_color)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting team")
}

pub async fn get_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Team>> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1 AND NOT deleted")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching team")
}

pub async fn get_by_ids(db: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<Team>> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ANY($1) AND NOT deleted")
        .bind(ids)
        .fetch_all(db)
        .await
        .context("fetching teams by id")
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    fields: &TeamFields,
    updated_by: Uuid,
) -> Result<Team> {
    sqlx::query_as::<_, Team>(
        r#"UPDATE teams
              SET name              = $2,
                  emblem_url        = $3,
                  foundation_date   = $4,
                  season_start_date = $5,
                  season_end_date   = $6,
                  primary_color     = $7,
                  updated_at        = NOW(),
                  updated_by        = $8
            WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.emblem_url)
    .bind(fields.foundation_date)
    .bind(fields.season_start_date)
    .bind(fields.season_end_date)
    .bind(&fields.primary_color)
    .bind(updated_by)
    .fetch_one(db)
    .await
    .context("updating team")
}

pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE teams SET deleted = TRUE, updated_at = NOW(), updated_by = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting team")?;
    Ok(())
}

pub async fn set_emblem_url(
    db: impl PgExecutor<'_>,
    id: Uuid,
    emblem_url: &str,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE teams SET emblem_url = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(emblem_url)
    .bind(updated_by)
    .execute(db)
    .await
    .context("setting team emblem")?;
    Ok(())
}

pub async fn set_paid_until(
    db: impl PgExecutor<'_>,
    id: Uuid,
    paid_until: NaiveDate,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE teams SET paid_until = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(paid_until)
    .bind(updated_by)
    .execute(db)
    .await
    .context("renewing team subscription")?;
    Ok(())
}

/// Puts the demo team's profile back to its showcase values.
pub async fn reset_demo_profile(
    db: impl PgExecutor<'_>,
    id: Uuid,
    foundation_date: NaiveDate,
    season_start_date: NaiveDate,
    primary_color: &str,
) -> Result<()> {
    sqlx::query(
        r#"UPDATE teams
              SET foundation_date   = $2,
                  season_start_date = $3,
                  season_end_date   = NULL,
                  primary_color     = $4,
                  updated_at        = NOW()
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(foundation_date)
    .bind(season_start_date)
    .bind(primary_color)
    .execute(db)
    .await
    .context("resetting demo team")?;
    Ok(())
}
