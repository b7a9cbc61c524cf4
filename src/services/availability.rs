//! Per-game availability of the caller's player.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::availability_repo;
use crate::db::models::{Availability, User};
use crate::domain::types::AvailabilityStatus;
use crate::error::{AppError, AppResult};
use crate::services::game::load_game;

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityCreate {
    pub game_id: Uuid,
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityUpdate {
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityEntry {
    pub id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub status: AvailabilityStatus,
}

/// `GET /player-availability/{game_id}` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameAvailability {
    pub current_player: Option<AvailabilityEntry>,
    pub available: Vec<AvailabilityEntry>,
    pub not_available: Vec<AvailabilityEntry>,
    pub doubt: Vec<AvailabilityEntry>,
}

fn entry(row: Availability) -> Option<AvailabilityEntry> {
    let status = match row.status.parse::<AvailabilityStatus>() {
        Ok(status) => status,
        Err(e) => {
            log::warn!("skipping availability {}: {e}", row.id);
            return None;
        }
    };
    Some(AvailabilityEntry {
        id: row.id,
        player_id: row.player_id,
        player_name: row.player_name,
        status,
    })
}

/// Buckets rows by status; the caller's row also leads its bucket.
pub fn group_by_status(rows: Vec<Availability>, current: Option<Uuid>) -> GameAvailability {
    let mut grouped = GameAvailability::default();
    for entry in rows.into_iter().filter_map(entry) {
        let is_current = Some(entry.player_id) == current;
        if is_current {
            grouped.current_player = Some(entry.clone());
        }
        let bucket = match entry.status {
            AvailabilityStatus::Available => &mut grouped.available,
            AvailabilityStatus::NotAvailable => &mut grouped.not_available,
            AvailabilityStatus::Doubt => &mut grouped.doubt,
        };
        if is_current {
            bucket.insert(0, entry);
        } else {
            bucket.push(entry);
        }
    }
    grouped
}

fn own_player(actor: &User) -> AppResult<Uuid> {
    actor.player_id.ok_or(AppError::UserNeedsAssociatedPlayer)
}

/// Reuses a soft-deleted row for the same player when there is one.
pub async fn create_availability(
    db: &PgPool,
    actor: &User,
    input: AvailabilityCreate,
) -> AppResult<Uuid> {
    let player_id = own_player(actor)?;
    load_game(db, actor.team_id, input.game_id).await?;

    if let Some(active) =
        availability_repo::get_for_player(db, input.game_id, player_id, false).await?
    {
        availability_repo::set_status(db, active.id, input.status, actor.id).await?;
        return Ok(active.id);
    }
    if let Some(previous) =
        availability_repo::get_for_player(db, input.game_id, player_id, true).await?
    {
        availability_repo::set_status(db, previous.id, input.status, actor.id).await?;
        return Ok(previous.id);
    }
    Ok(availability_repo::create(
        db,
        actor.team_id,
        input.game_id,
        player_id,
        input.status,
        actor.id,
    )
    .await?)
}

pub async fn game_availability(
    db: &PgPool,
    actor: &User,
    game_id: Uuid,
) -> AppResult<GameAvailability> {
    load_game(db, actor.team_id, game_id).await?;
    let rows = availability_repo::list_by_game(db, game_id).await?;
    Ok(group_by_status(rows, actor.player_id))
}

async fn load_own(db: &PgPool, actor: &User, game_id: Uuid) -> AppResult<Availability> {
    let player_id = own_player(actor)?;
    load_game(db, actor.team_id, game_id).await?;
    availability_repo::get_for_player(db, game_id, player_id, false)
        .await?
        .ok_or(AppError::AvailabilityNotFound)
}

pub async fn update_availability(
    db: &PgPool,
    actor: &User,
    game_id: Uuid,
    input: AvailabilityUpdate,
) -> AppResult<AvailabilityEntry> {
    let mut row = load_own(db, actor, game_id).await?;
    availability_repo::set_status(db, row.id, input.status, actor.id).await?;
    row.status = input.status.as_str().to_string();
    entry(row).ok_or(AppError::AvailabilityNotFound)
}

pub async fn delete_availability(db: &PgPool, actor: &User, game_id: Uuid) -> AppResult<()> {
    let row = load_own(db, actor, game_id).await?;
    availability_repo::soft_delete(db, row.id, actor.id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(player: u128, name: &str, status: AvailabilityStatus) -> Availability {
        Availability {
            id: Uuid::from_u128(player + 100),
            game_id: Uuid::nil(),
            player_id: Uuid::from_u128(player),
            status: status.as_str().into(),
            player_name: name.into(),
        }
    }

    #[test]
    fn current_player_leads_its_bucket() {
        let rows = vec![
            row(1, "Ana", AvailabilityStatus::Available),
            row(2, "Bia", AvailabilityStatus::Doubt),
            row(3, "Caio", AvailabilityStatus::Available),
            row(4, "Davi", AvailabilityStatus::NotAvailable),
        ];
        let grouped = group_by_status(rows, Some(Uuid::from_u128(3)));

        let names: Vec<&str> = grouped.available.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, ["Caio", "Ana"]);
        assert_eq!(grouped.doubt.len(), 1);
        assert_eq!(grouped.not_available.len(), 1);
        assert_eq!(
            grouped.current_player.map(|e| e.player_name),
            Some("Caio".to_string())
        );
    }

    #[test]
    fn no_current_player_without_a_row() {
        let rows = vec![row(1, "Ana", AvailabilityStatus::Available)];
        let grouped = group_by_status(rows, Some(Uuid::from_u128(9)));
        assert!(grouped.current_player.is_none());
    }
}
