use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::{Game, GameWithChampionship};
use crate::domain::filters::{GameFilter, GameOrder};
use crate::domain::game::GameInfo;

const WITH_CHAMPIONSHIP: &str = r#"SELECT g.*, c.name AS championship_name
      FROM games g
      JOIN championships c ON c.id = g.championship_id"#;

pub async fn create(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    info: &GameInfo,
    created_by: Uuid,
) -> Result<Game> {
    sqlx::query_as::<_, Game>(
        r#"INSERT INTO games (team_id, championship_id, adversary, date_hour, round, stage,
                              is_home, is_wo, team_score, adversary_score,
                              team_penalty_score, adversary_penalty_score, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
           RETURNING *"#,
    )
    .bind(team_id)
    .bind(info.championship_id)
    .bind(&info.adversary)
    .bind(info.date_hour)
    .bind(info.round)
    .bind(info.stage.map(|s| s.as_str()))
    .bind(info.is_home)
    .bind(info.is_wo)
    .bind(info.team_score)
    .bind(info.adversary_score)
    .bind(info.team_penalty_score)
    .bind(info.adversary_penalty_score)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting game")
}

/// `deleted = true` looks up soft-deleted games (for reactivation).
pub async fn get_by_id(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    id: Uuid,
    deleted: bool,
) -> Result<Option<Game>> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1 AND team_id = $2 AND deleted = $3")
        .bind(id)
        .bind(team_id)
        .bind(deleted)
        .fetch_optional(db)
        .await
        .context("fetching game")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, team_id: Uuid, filter: &GameFilter) {
    qb.push(" WHERE NOT g.deleted AND g.team_id = ").push_bind(team_id);

    if let Some(championship_id) = filter.championship_id {
        qb.push(" AND g.championship_id = ").push_bind(championship_id);
    }
    if let Some(adversary) = filter.adversary.as_deref().filter(|a| !a.is_empty()) {
        qb.push(" AND g.adversary ILIKE ").push_bind(format!("%{adversary}%"));
    }
    if let Some(from) = filter.date_hour_from {
        qb.push(" AND g.date_hour >= ").push_bind(from);
    }
    if let Some(to) = filter.date_hour_to {
        qb.push(" AND g.date_hour <= ").push_bind(to);
    }
    if let Some(round) = filter.round {
        qb.push(" AND g.round = ").push_bind(round);
    }
    if let Some(stages) = filter.stages.as_ref().filter(|s| !s.is_empty()) {
        let stages: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
        qb.push(" AND g.stage = ANY(").push_bind(stages).push(")");
    }
    if let Some(is_home) = filter.is_home {
        qb.push(" AND g.is_home = ").push_bind(is_home);
    }
    if let Some(is_wo) = filter.is_wo {
        qb.push(" AND g.is_wo = ").push_bind(is_wo);
    }
    if let Some(from) = filter.team_score_from {
        qb.push(" AND g.team_score >= ").push_bind(from);
    }
    if let Some(to) = filter.team_score_to {
        qb.push(" AND g.team_score <= ").push_bind(to);
    }
    if let Some(from) = filter.adversary_score_from {
        qb.push(" AND g.adversary_score >= ").push_bind(from);
    }
    if let Some(to) = filter.adversary_score_to {
        qb.push(" AND g.adversary_score <= ").push_bind(to);
    }
    match filter.has_penalty_score {
        Some(true) => {
            qb.push(" AND g.team_penalty_score IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND g.team_penalty_score IS NULL");
        }
        None => {}
    }
    if let Some(column) = filter.order_by.and_then(GameOrder::required_column) {
        qb.push(" AND ").push(column).push(" IS NOT NULL");
    }
}

/// One page of games matching `filter` plus the total match count.
pub async fn page(
    db: &PgPool,
    team_id: Uuid,
    filter: &GameFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<GameWithChampionship>, i64)> {
    let mut qb = QueryBuilder::<Postgres>::new(WITH_CHAMPIONSHIP);
    push_filters(&mut qb, team_id, filter);
    qb.push(" ORDER BY ")
        .push(filter.order_by.unwrap_or_default().sql())
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let games = qb
        .build_query_as::<GameWithChampionship>()
        .fetch_all(db)
        .await
        .context("listing games")?;

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM games g");
    push_filters(&mut count, team_id, filter);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(db)
        .await
        .context("counting games")?;

    Ok((games, total))
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    info: &GameInfo,
    updated_by: Uuid,
) -> Result<Game> {
    sqlx::query_as::<_, Game>(
        r#"UPDATE games
              SET championship_id         = $2,
                  adversary               = $3,
                  date_hour               = $4,
                  round                   = $5,
                  stage                   = $6,
                  is_home                 = $7,
                  is_wo                   = $8,
                  team_score              = $9,
                  adversary_score         = $10,
                  team_penalty_score      = $11,
                  adversary_penalty_score = $12,
                  updated_at              = NOW(),
                  updated_by              = $13
            WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(info.championship_id)
    .bind(&info.adversary)
    .bind(info.date_hour)
    .bind(info.round)
    .bind(info.stage.map(|s| s.as_str()))
    .bind(info.is_home)
    .bind(info.is_wo)
    .bind(info.team_score)
    .bind(info.adversary_score)
    .bind(info.team_penalty_score)
    .bind(info.adversary_penalty_score)
    .bind(updated_by)
    .fetch_one(db)
    .await
    .context("updating game")
}

pub async fn set_deleted(
    db: impl PgExecutor<'_>,
    id: Uuid,
    deleted: bool,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE games SET deleted = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(deleted)
    .bind(updated_by)
    .execute(db)
    .await
    .context("toggling game deletion")?;
    Ok(())
}

pub async fn count_by_championship(db: impl PgExecutor<'_>, championship_id: Uuid) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE championship_id = $1 AND NOT deleted")
        .bind(championship_id)
        .fetch_one(db)
        .await
        .context("counting championship games")
}

/// First game at or after `now`.
pub async fn next_game(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<GameWithChampionship>> {
    sqlx::query_as::<_, GameWithChampionship>(&format!(
        r#"{WITH_CHAMPIONSHIP}
            WHERE g.team_id = $1 AND NOT g.deleted AND g.date_hour >= $2
            ORDER BY g.date_hour ASC
            LIMIT 1"#
    ))
    .bind(team_id)
    .bind(now)
    .fetch_optional(db)
    .await
    .context("fetching next game")
}

/// Latest games that already have a score.
pub async fn last_scored(db: impl PgExecutor<'_>, team_id: Uuid, limit: i64) -> Result<Vec<Game>> {
    sqlx::query_as::<_, Game>(
        r#"SELECT * FROM games
            WHERE team_id = $1 AND NOT deleted AND team_score IS NOT NULL
            ORDER BY date_hour DESC
            LIMIT $2"#,
    )
    .bind(team_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("fetching last games")
}

/// Scored games inside `[from, to]`, skipping one championship if given.
pub async fn scored_between(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    exclude_championship: Option<Uuid>,
) -> Result<Vec<Game>> {
    sqlx::query_as::<_, Game>(
        r#"SELECT * FROM games
            WHERE team_id = $1
              AND NOT deleted
              AND team_score IS NOT NULL
              AND date_hour >= $2
              AND ($3::timestamptz IS NULL OR date_hour <= $3)
              AND ($4::uuid IS NULL OR championship_id <> $4)
            ORDER BY date_hour"#,
    )
    .bind(team_id)
    .bind(from)
    .bind(to)
    .bind(exclude_championship)
    .fetch_all(db)
    .await
    .context("fetching season games")
}

pub async fn purge_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM games WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("purging team games")?;
    Ok(done.rows_affected())
}
