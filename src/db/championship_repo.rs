use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::Championship;
use crate::domain::championship::ChampionshipInput;
use crate::domain::filters::ChampionshipFilter;
use crate::domain::types::{ChampionshipFormat, ChampionshipStatus};

pub async fn create(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    input: &ChampionshipInput,
    created_by: Option<Uuid>,
) -> Result<Championship> {
    sqlx::query_as::<_, Championship>(
        r#"INSERT INTO championships (team_id, name, start_date, end_date, is_league_format,
                                      final_stage, final_position, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING *"#,
    )
    .bind(team_id)
    .bind(&input.name)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_league_format)
    .bind(input.final_stage.map(|s| s.as_str()))
    .bind(input.final_position)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting championship")
}

pub async fn get_by_id(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    id: Uuid,
) -> Result<Option<Championship>> {
    sqlx::query_as::<_, Championship>(
        "SELECT * FROM championships WHERE id = $1 AND team_id = $2 AND NOT deleted",
    )
    .bind(id)
    .bind(team_id)
    .fetch_optional(db)
    .await
    .context("fetching championship")
}

pub async fn get_by_name(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    name: &str,
) -> Result<Option<Championship>> {
    sqlx::query_as::<_, Championship>(
        "SELECT * FROM championships WHERE team_id = $1 AND name = $2 AND NOT deleted",
    )
    .bind(team_id)
    .bind(name)
    .fetch_optional(db)
    .await
    .context("fetching championship by name")
}

pub async fn list_by_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<Vec<Championship>> {
    sqlx::query_as::<_, Championship>(
        "SELECT * FROM championships WHERE team_id = $1 AND NOT deleted",
    )
    .bind(team_id)
    .fetch_all(db)
    .await
    .context("listing championships")
}

fn push_status(qb: &mut QueryBuilder<'_, Postgres>, status: ChampionshipStatus, today: NaiveDate) {
    match status {
        ChampionshipStatus::NaoIniciado => {
            qb.push("start_date > ").push_bind(today);
        }
        ChampionshipStatus::Finalizado => {
            qb.push("(end_date IS NOT NULL AND end_date < ")
                .push_bind(today)
                .push(")");
        }
        ChampionshipStatus::EmAndamento => {
            qb.push("(start_date <= ")
                .push_bind(today)
                .push(" AND (end_date IS NULL OR end_date >= ")
                .push_bind(today)
                .push("))");
        }
    }
}

/// Filtered championships; unordered unless `filter.order_by` is set.
pub async fn filter(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    filter: &ChampionshipFilter,
    today: NaiveDate,
) -> Result<Vec<Championship>> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM championships WHERE NOT deleted AND team_id = ");
    qb.push_bind(team_id);

    if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
        qb.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(statuses) = filter.status.as_ref().filter(|s| !s.is_empty()) {
        qb.push(" AND (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            push_status(&mut qb, *status, today);
        }
        qb.push(")");
    }
    if let Some(format) = filter.format {
        qb.push(" AND is_league_format = ")
            .push_bind(format == ChampionshipFormat::League);
    }
    if let Some(stages) = filter.final_stages.as_ref().filter(|s| !s.is_empty()) {
        let stages: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
        qb.push(" AND final_stage = ANY(").push_bind(stages).push(")");
    }
    if let Some(from) = filter.start_date_from {
        qb.push(" AND start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.start_date_to {
        qb.push(" AND start_date <= ").push_bind(to);
    }
    if let Some(from) = filter.end_date_from {
        qb.push(" AND end_date >= ").push_bind(from);
    }
    if let Some(to) = filter.end_date_to {
        qb.push(" AND end_date <= ").push_bind(to);
    }
    if let Some(order) = filter.order_by {
        qb.push(" ORDER BY ").push(order.sql());
    }

    qb.build_query_as::<Championship>()
        .fetch_all(db)
        .await
        .context("filtering championships")
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    input: &ChampionshipInput,
    updated_by: Uuid,
) -> Result<Championship> {
    sqlx::query_as::<_, Championship>(
        r#"UPDATE championships
              SET name             = $2,
                  start_date       = $3,
                  end_date         = $4,
                  is_league_format = $5,
                  final_stage      = $6,
                  final_position   = $7,
                  updated_at       = NOW(),
                  updated_by       = $8
            WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&input.name)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_league_format)
    .bind(input.final_stage.map(|s| s.as_str()))
    .bind(input.final_position)
    .bind(updated_by)
    .fetch_one(db)
    .await
    .context("updating championship")
}

pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE championships SET deleted = TRUE, updated_at = NOW(), updated_by = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting championship")?;
    Ok(())
}

pub async fn purge_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM championships WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("purging team championships")?;
    Ok(done.rows_affected())
}
