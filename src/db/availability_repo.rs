use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::Availability;
use crate::domain::types::AvailabilityStatus;

const SELECT_WITH_PLAYER: &str = r#"SELECT a.id, a.game_id, a.player_id, a.status, p.name AS player_name
      FROM game_player_availabilities a
      JOIN players p ON p.id = a.player_id"#;

pub async fn create(
    db: impl PgExecutor<'_>,
    team_id: Uuid,
    game_id: Uuid,
    player_id: Uuid,
    status: AvailabilityStatus,
    created_by: Uuid,
) -> Result<Uuid> {
    sqlx::query_scalar(
        r#"INSERT INTO game_player_availabilities (team_id, game_id, player_id, status, created_by)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING id"#,
    )
    .bind(team_id)
    .bind(game_id)
    .bind(player_id)
    .bind(status.as_str())
    .bind(created_by)
    .fetch_one(db)
    .await
    .context("inserting availability")
}

/// The player's row for a game; `deleted` selects soft-deleted rows instead.
pub async fn get_for_player(
    db: impl PgExecutor<'_>,
    game_id: Uuid,
    player_id: Uuid,
    deleted: bool,
) -> Result<Option<Availability>> {
    sqlx::query_as::<_, Availability>(&format!(
        "{SELECT_WITH_PLAYER} WHERE a.game_id = $1 AND a.player_id = $2 AND a.deleted = $3"
    ))
    .bind(game_id)
    .bind(player_id)
    .bind(deleted)
    .fetch_optional(db)
    .await
    .context("fetching availability")
}

pub async fn list_by_game(db: impl PgExecutor<'_>, game_id: Uuid) -> Result<Vec<Availability>> {
    sqlx::query_as::<_, Availability>(&format!(
        "{SELECT_WITH_PLAYER} WHERE a.game_id = $1 AND NOT a.deleted ORDER BY a.created_at"
    ))
    .bind(game_id)
    .fetch_all(db)
    .await
    .context("listing availabilities")
}

/// Sets the status and clears the deleted flag.
pub async fn set_status(
    db: impl PgExecutor<'_>,
    id: Uuid,
    status: AvailabilityStatus,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"UPDATE game_player_availabilities
              SET status = $2, deleted = FALSE, updated_at = NOW(), updated_by = $3
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(updated_by)
    .execute(db)
    .await
    .context("updating availability")?;
    Ok(())
}

pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        r#"UPDATE game_player_availabilities
              SET deleted = TRUE, updated_at = NOW(), updated_by = $2
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting availability")?;
    Ok(())
}

pub async fn soft_delete_by_game(db: impl PgExecutor<'_>, game_id: Uuid, updated_by: Uuid) -> Result<()> {
    sqlx::query(
        r#"UPDATE game_player_availabilities
              SET deleted = TRUE, updated_at = NOW(), updated_by = $2
            WHERE game_id = $1 AND NOT deleted"#,
    )
    .bind(game_id)
    .bind(updated_by)
    .execute(db)
    .await
    .context("deleting game availabilities")?;
    Ok(())
}

pub async fn count_available(db: impl PgExecutor<'_>, game_id: Uuid) -> Result<i64> {
    sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM game_player_availabilities
            WHERE game_id = $1 AND status = 'available' AND NOT deleted"#,
    )
    .bind(game_id)
    .fetch_one(db)
    .await
    .context("counting confirmed players")
}

pub async fn purge_team(db: impl PgExecutor<'_>, team_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM game_player_availabilities WHERE team_id = $1")
        .bind(team_id)
        .execute(db)
        .await
        .context("purging team availabilities")?;
    Ok(done.rows_affected())
}
