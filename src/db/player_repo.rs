use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::{Player, PlayerWithStats};
use crate::domain::filters::{PlayerFilter, PlayersStatsFilter, SortDirection};
use crate::domain::types::StatKind;

/// Editable fields of a player.
#[derive(Debug, Clone)]
pub struct PlayerFields {
    pub name: String,
    pub image_url: Option<String>,
    pub shirt_number: Option<i32>,
    pub position: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlayerNameAndShirt {
    pub id: Uuid,
    pub name: String,
    pub shirt_number: Option<i32>,
}

/// Bounds already resolved by the caller (BRT day edges, friendly id).
#[derive(Debug, Clone, Default)]
pub struct StatsWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub exclude_championship: Option<Uuid>,
}

fn stat_sum(kind: StatKind) -> String {
    format!(
        "COALESCE(SUM(CASE WHEN s.stat = '{}' THEN s.quantity ELSE 0 END), 0)::BIGINT",
        kind.as_str()
    )
}

fn stat_alias(kind: StatKind) -> &'static str {
    match kind {
        StatKind::Played => "played",
        StatKind::Goal => "goals",
        StatKind::Assist => "assists",
        StatKind::YellowCard => "yellow_cards",
        StatKind::RedCard => "red_cards",
        StatKind::Mvp => "mvps",
    }
}

fn push_stat_columns(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(
        "SELECT p.id, p.name, p.image_url, p.shirt_number, p.position, p.has_before_system_stats",
    );
    for kind in StatKind::ALL {
        qb.push(", ")
            .push(stat_sum(*kind))
            .push(" AS ")
            .push(stat_alias(*kind));
    }
}

pub async fn create(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    fields: &PlayerFields,
    created_by: Uuid,
) -> Result<Player> {
    sqlx::query_as::<_, Player>(
        r#"INSERT INTO players (team_id, name, image_url, shirt_number, position, created_by)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING *"#,
    )
    .bind(team_id)
    .bind(&fields.name)
    .bind(&fields.image_url)
    .bind(fields.shirt_number)
    .bind(&fields.position)
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting player")
}

pub async fn get_by_id(db: impl PgExecutor<'_>, team_id: Uuid, id: Uuid) -> Result<Option<Player>> {
    sqlx::query_as::<_, Player>(
        "SELECT * FROM players WHERE id = $1 AND team_id = $2 AND NOT deleted",
    )
    .bind(id)
    .bind(team_id)
    .fetch_optional(db)
    .await
    .context("fetching player")
}

pub async fn get_by_ids(db: impl PgExecutor<'_>, team_id: Uuid, ids: &[Uuid]) -> Result<Vec<Player>> {
    sqlx::query_as::<_, Player>(
        "SELECT * FROM players WHERE id = ANY($1) AND team_id = $2 AND NOT deleted",
    )
    .bind(ids)
    .bind(team_id)
    .fetch_all(db)
    .await
    .context("fetching players by id")
}

pub async fn count_by_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE team_id = $1 AND NOT deleted")
        .bind(team_id)
        .fetch_one(db)
        .await
        .context("counting players")
}

/// Players with their lifetime stat totals, optionally filtered.
pub async fn list_with_stats(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    filter: &PlayerFilter,
) -> Result<Vec<PlayerWithStats>> {
    let mut qb = QueryBuilder::<Postgres>::new("");
    push_stat_columns(&mut qb);
    qb.push(
        r#" FROM players p
            LEFT JOIN game_player_stats s ON s.player_id = p.id AND NOT s.deleted
           WHERE NOT p.deleted AND p.team_id = "#,
    )
    .push_bind(team_id);

    if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
        qb.push(" AND p.name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(shirt) = filter.shirt_number {
        qb.push(" AND p.shirt_number = ").push_bind(shirt);
    }
    if let Some(positions) = filter.positions.as_ref().filter(|p| !p.is_empty()) {
        let positions: Vec<&str> = positions.iter().map(|p| p.as_str()).collect();
        qb.push(" AND p.position = ANY(").push_bind(positions).push(")");
    }

    qb.push(" GROUP BY p.id ORDER BY ");
    qb.push(filter.order_by.map(|o| o.sql()).unwrap_or("p.name ASC"));

    qb.build_query_as::<PlayerWithStats>()
        .fetch_all(db)
        .await
        .context("listing players with stats")
}

pub async fn get_with_stats(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    id: Uuid,
) -> Result<Option<PlayerWithStats>> {
    let mut qb = QueryBuilder::<Postgres>::new("");
    push_stat_columns(&mut qb);
    qb.push(
        r#" FROM players p
            LEFT JOIN game_player_stats s ON s.player_id = p.id AND NOT s.deleted
           WHERE NOT p.deleted AND p.id = "#,
    )
    .push_bind(id)
    .push(" AND p.team_id = ")
    .push_bind(team_id)
    .push(" GROUP BY p.id");

    qb.build_query_as::<PlayerWithStats>()
        .fetch_optional(db)
        .await
        .context("fetching player with stats")
}

/// Players not linked to any active user.
pub async fn list_without_user(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<Vec<Player>> {
    sqlx::query_as::<_, Player>(
        r#"SELECT p.*
             FROM players p
             LEFT JOIN users u ON u.player_id = p.id AND NOT u.deleted
            WHERE p.team_id = $1 AND NOT p.deleted AND u.id IS NULL
            ORDER BY p.name"#,
    )
    .bind(team_id)
    .fetch_all(db)
    .await
    .context("listing players without user")
}

pub async fn list_names_and_shirts(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
) -> Result<Vec<PlayerNameAndShirt>> {
    sqlx::query_as::<_, PlayerNameAndShirt>(
        "SELECT id, name, shirt_number FROM players WHERE team_id = $1 AND NOT deleted ORDER BY name",
    )
    .bind(team_id)
    .fetch_all(db)
    .await
    .context("listing player names")
}

/// Stat totals per player over the games matching `filter`.
///
/// Only players with at least one stat row in those games are returned.
pub async fn filter_by_stats(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    filter: &PlayersStatsFilter,
    window: &StatsWindow,
) -> Result<Vec<PlayerWithStats>> {
    let mut qb = QueryBuilder::<Postgres>::new("");
    push_stat_columns(&mut qb);
    qb.push(
        r#" FROM players p
            JOIN game_player_stats s ON s.player_id = p.id
            JOIN games g ON g.id = s.game_id
           WHERE NOT s.deleted AND NOT p.deleted AND s.team_id = "#,
    )
    .push_bind(team_id);

    if let Some(from) = window.from {
        qb.push(" AND g.date_hour >= ").push_bind(from);
    }
    if let Some(to) = window.to {
        qb.push(" AND g.date_hour <= ").push_bind(to);
    }
    match filter.championships.as_ref().filter(|c| !c.is_empty()) {
        Some(ids) => {
            qb.push(" AND g.championship_id = ANY(").push_bind(ids.clone()).push(")");
        }
        None => {
            if let Some(excluded) = window.exclude_championship {
                qb.push(" AND g.championship_id <> ").push_bind(excluded);
            }
        }
    }
    if let Some(stages) = filter.stages.as_ref().filter(|s| !s.is_empty()) {
        let stages: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
        qb.push(" AND g.stage = ANY(").push_bind(stages).push(")");
    }
    if let Some(players) = filter.players.as_ref().filter(|p| !p.is_empty()) {
        qb.push(" AND p.id = ANY(").push_bind(players.clone()).push(")");
    }
    if let Some(positions) = filter.player_positions.as_ref().filter(|p| !p.is_empty()) {
        let positions: Vec<&str> = positions.iter().map(|p| p.as_str()).collect();
        qb.push(" AND p.position = ANY(").push_bind(positions).push(")");
    }

    qb.push(" GROUP BY p.id");

    let selected = stat_sum(filter.stat_name);
    if let Some(range) = filter.quantity_range {
        let mut having = " HAVING ";
        if let Some(min) = range.min {
            qb.push(having).push(&selected).push(" >= ").push_bind(min);
            having = " AND ";
        }
        if let Some(max) = range.max {
            qb.push(having).push(&selected).push(" <= ").push_bind(max);
        }
    }

    let alias = stat_alias(filter.stat_name);
    match filter.order_by.unwrap_or_default() {
        SortDirection::Desc => qb.push(format!(" ORDER BY {alias} DESC, played ASC, p.name ASC")),
        SortDirection::Asc => qb.push(format!(" ORDER BY {alias} ASC, played DESC, p.name ASC")),
    };

    qb.build_query_as::<PlayerWithStats>()
        .fetch_all(db)
        .await
        .context("filtering players by stats")
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    fields: &PlayerFields,
    updated_by: Uuid,
) -> Result<Player> {
    sqlx::query_as::<_, Player>(
        r#"UPDATE players
              SET name         = $2,
                  image_url    = $3,
                  shirt_number = $4,
                  position     = $5,
                  updated_at   = NOW(),
                  updated_by   = $6
            WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.image_url)
    .bind(fields.shirt_number)
    .bind(&fields.position)
    .bind(updated_by)
    .fetch_one(db)
    .await
    .context("updating player")
}

pub async fn set_image_url(
    db: impl PgExecutor<'_>,
    id: Uuid,
    image_url: Option<&str>,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE players SET image_url = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(image_url)
    .bind(updated_by)
    .execute(db)
    .await
    .context("setting player image")?;
    Ok(())
}

pub async fn mark_before_system_stats(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE players SET has_before_system_stats = TRUE WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("flagging before-system stats")?;
    Ok(())
}

pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE players SET deleted = TRUE, updated_at = NOW(), updated_by = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting player")?;
    Ok(())
}

pub async fn purge_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM players WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("purging team players")?;
    Ok(done.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_stat_sum_uses_stored_text() {
        assert_eq!(
            stat_sum(StatKind::YellowCard),
            "COALESCE(SUM(CASE WHEN s.stat = 'yellow_card' THEN s.quantity ELSE 0 END), 0)::BIGINT"
        );
        assert_eq!(stat_alias(StatKind::Mvp), "mvps");
    }

    #[test]
    fn stats_query_orders_by_selected_stat() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_stat_columns(&mut qb);
        let sql = qb.sql();
        for alias in ["played", "goals", "assists", "yellow_cards", "red_cards", "mvps"] {
            assert!(sql.contains(&format!(" AS {alias}")), "missing {alias}");
        }
    }
}
