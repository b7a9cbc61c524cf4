use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::db::models::StatWithPlayer;
use crate::domain::types::StatKind;

#[derive(Debug, Clone)]
pub struct NewStat {
    pub team_id: Uuid,
    pub game_id: Uuid,
    /// `None` for an own goal.
    pub player_id: Option<Uuid>,
    /// Assists point at the goal they led to.
    pub related_stat_id: Option<Uuid>,
    pub stat: StatKind,
    pub quantity: i32,
    pub is_before_system: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TopScorer {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(rename = "shirt")]
    pub shirt_number: Option<i32>,
    pub goals: i64,
    pub games_played: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct MvpPoints {
    pub name: String,
    pub points: i64,
}

/// Inserts one stat row and returns its id.
pub async fn insert(db: impl PgExecutor<'_>, stat: &NewStat, created_by: Uuid) -> Result<Uuid> {
    sqlx::query_scalar(
        r#"INSERT INTO game_player_stats (team_id, game_id, player_id, related_stat_id,
                                          stat, quantity, is_before_system, created_by)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING id"#,
    )
    .bind(stat.team_id)
    .bind(stat.game_id)
    .bind(stat.player_id)
    .bind(stat.related_stat_id)
    .bind(stat.stat.as_str())
    .bind(stat.quantity)
    .bind(stat.is_before_system)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting game stat")
}

/// Active stats of a game, oldest first, with the player they belong to.
pub async fn list_by_game(db: impl PgExecutor<'_>, game_id: Uuid) -> Result<Vec<StatWithPlayer>> {
    sqlx::query_as::<_, StatWithPlayer>(
        r#"SELECT s.id, s.player_id, s.related_stat_id, s.stat, s.quantity,
                  p.name         AS player_name,
                  p.shirt_number AS player_shirt_number,
                  p.position     AS player_position
             FROM game_player_stats s
             LEFT JOIN players p ON p.id = s.player_id
            WHERE s.game_id = $1 AND NOT s.deleted
            ORDER BY s.created_at, s.id"#,
    )
    .bind(game_id)
    .fetch_all(db)
    .await
    .context("listing game stats")
}

/// Removes a game's active stats for good (stats edit recreates them).
pub async fn purge_game(db: impl PgExecutor<'_>, game_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM game_player_stats WHERE game_id = $1 AND NOT deleted")
        .bind(game_id)
        .execute(db)
        .await
        .context("purging game stats")?;
    Ok(())
}

pub async fn set_deleted_by_game(
    db: impl PgExecutor<'_>,
    game_id: Uuid,
    deleted: bool,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"UPDATE game_player_stats
              SET deleted = $2, updated_at = NOW(), updated_by = $3
            WHERE game_id = $1 AND deleted <> $2"#,
    )
    .bind(game_id)
    .bind(deleted)
    .bind(updated_by)
    .execute(db)
    .await
    .context("toggling game stats deletion")?;
    Ok(())
}

/// Player with most goals in `[from, to]`: goals desc, games played asc, name asc.
pub async fn top_scorer_between(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Option<TopScorer>> {
    sqlx::query_as::<_, TopScorer>(
        r#"WITH month_stats AS (
               SELECT s.player_id, s.stat, s.quantity
                 FROM game_player_stats s
                 JOIN games g ON g.id = s.game_id
                WHERE s.team_id = $1
                  AND NOT s.deleted
                  AND NOT g.deleted
                  AND s.player_id IS NOT NULL
                  AND g.date_hour >= $2
                  AND g.date_hour <= $3
           )
           SELECT p.id, p.name, p.image_url, p.shirt_number,
                  SUM(m.quantity) FILTER (WHERE m.stat = 'goal')::BIGINT AS goals,
                  COUNT(*) FILTER (WHERE m.stat = 'played')            AS games_played
             FROM month_stats m
             JOIN players p ON p.id = m.player_id
            GROUP BY p.id
           HAVING SUM(m.quantity) FILTER (WHERE m.stat = 'goal') > 0
            ORDER BY goals DESC, games_played ASC, p.name ASC
            LIMIT 1"#,
    )
    .bind(team_id)
    .bind(from)
    .bind(to)
    .fetch_optional(db)
    .await
    .context("fetching month top scorer")
}

/// Player with most MVP points over `game_ids`.
pub async fn top_mvp(db: impl PgExecutor<'_>, game_ids: &[Uuid]) -> Result<Option<MvpPoints>> {
    sqlx::query_as::<_, MvpPoints>(
        r#"SELECT p.name, SUM(s.quantity)::BIGINT AS points
             FROM game_player_stats s
             JOIN players p ON p.id = s.player_id
            WHERE s.game_id = ANY($1)
              AND s.stat = 'mvp'
              AND NOT s.deleted
            GROUP BY p.id
            ORDER BY points DESC, p.name ASC
            LIMIT 1"#,
    )
    .bind(game_ids)
    .fetch_optional(db)
    .await
    .context("fetching top mvp")
}

pub async fn purge_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM game_player_stats WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("purging team stats")?;
    Ok(done.rows_affected())
}
