//! Players, their stat totals and their images.

use serde::Deserialize;
use serde_with::rust::double_option;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings;
use crate::datetime::local_day_bounds_utc;
use crate::db::models::{Player, PlayerWithStats, User};
use crate::db::player_repo::{self, PlayerFields, PlayerNameAndShirt, StatsWindow};
use crate::db::{championship_repo, user_repo};
use crate::domain::filters::{PlayerFilter, PlayersStatsFilter};
use crate::domain::permissions::require_admin_or_owner;
use crate::domain::types::PlayerPosition;
use crate::error::{AppError, AppResult};
use crate::services::game::create_before_system_game;
use crate::services::stats::{create_before_system_stats, StatTotals};
use crate::services::team::load_team;
use crate::storage::{self, ObjectStore};

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerCreate {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub shirt_number: Option<i32>,
    pub position: PlayerPosition,
    #[serde(flatten)]
    pub stats: StatTotals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub shirt_number: Option<Option<i32>>,
    #[serde(default)]
    pub position: Option<PlayerPosition>,
    #[serde(flatten)]
    pub stats: StatTotals,
}

fn validate_fields(fields: &PlayerFields) -> AppResult<()> {
    let len = fields.name.chars().count();
    if len == 0 || len > 255 {
        return Err(AppError::Validation(
            "Name must be between 1 and 255 characters long.".into(),
        ));
    }
    if fields.shirt_number.is_some_and(|n| n < 0) {
        return Err(AppError::Validation("Shirt number can't be negative.".into()));
    }
    Ok(())
}

impl PlayerCreate {
    fn fields(&self) -> AppResult<PlayerFields> {
        let fields = PlayerFields {
            name: self.name.trim().to_string(),
            image_url: self.image_url.clone(),
            shirt_number: self.shirt_number,
            position: self.position.as_str().to_string(),
        };
        validate_fields(&fields)?;
        Ok(fields)
    }
}

impl PlayerUpdate {
    /// Stored fields with this update applied on top.
    pub fn apply(&self, player: &Player) -> AppResult<PlayerFields> {
        let fields = PlayerFields {
            name: self
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| player.name.clone()),
            image_url: self.image_url.clone().unwrap_or_else(|| player.image_url.clone()),
            shirt_number: self.shirt_number.unwrap_or(player.shirt_number),
            position: self
                .position
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| player.position.clone()),
        };
        validate_fields(&fields)?;
        Ok(fields)
    }
}

fn unchanged(player: &Player, fields: &PlayerFields) -> bool {
    player.name == fields.name
        && player.image_url == fields.image_url
        && player.shirt_number == fields.shirt_number
        && player.position == fields.position
}

pub async fn load_player(db: &PgPool, team_id: Uuid, id: Uuid) -> AppResult<Player> {
    player_repo::get_by_id(db, team_id, id)
        .await?
        .ok_or(AppError::PlayerNotFound)
}

async fn with_stats(db: &PgPool, team_id: Uuid, id: Uuid) -> AppResult<PlayerWithStats> {
    player_repo::get_with_stats(db, team_id, id)
        .await?
        .ok_or(AppError::PlayerNotFound)
}

/// Stores the totals in a before-system game and flags the player.
async fn add_before_system_stats(
    db: &PgPool,
    team_id: Uuid,
    player_id: Uuid,
    totals: &StatTotals,
    created_by: Uuid,
) -> AppResult<()> {
    let mut tx = db.begin().await?;
    let game_id = create_before_system_game(&mut tx, team_id, created_by).await?;
    create_before_system_stats(&mut tx, team_id, game_id, player_id, totals, created_by).await?;
    player_repo::mark_before_system_stats(&mut *tx, player_id).await?;
    tx.commit().await?;
    Ok(())
}

async fn try_add_before_system_stats(
    db: &PgPool,
    team_id: Uuid,
    player_id: Uuid,
    totals: &StatTotals,
    created_by: Uuid,
) {
    if let Err(e) = add_before_system_stats(db, team_id, player_id, totals, created_by).await {
        log::error!("before-system stats for player {player_id} not saved: {e}");
    }
}

//////////////////////////////////////////////////
// Writes
//////////////////////////////////////////////////

pub async fn create_player(
    db: &PgPool,
    actor: &User,
    input: PlayerCreate,
) -> AppResult<PlayerWithStats> {
    let is_admin = actor.has_admin_privileges();
    // Regular users may only create the player that represents them.
    if !is_admin && actor.player_id.is_some() {
        return Err(AppError::AdminRequired);
    }
    let fields = input.fields()?;
    let team = load_team(db, actor.team_id).await?;
    if player_repo::count_by_team(db, team.id).await? >= i64::from(team.max_players) {
        return Err(AppError::PlayersLimitReached);
    }

    let mut tx = db.begin().await?;
    let player = player_repo::create(&mut *tx, team.id, &fields, actor.id).await?;
    if !is_admin {
        user_repo::set_player(&mut *tx, actor.id, Some(player.id), actor.id).await?;
    }
    tx.commit().await?;
    log::info!("player {} created by {}", player.id, actor.id);

    if is_admin && input.stats.has_any() {
        try_add_before_system_stats(db, team.id, player.id, &input.stats, actor.id).await;
    }
    with_stats(db, team.id, player.id).await
}

pub async fn update_player(
    db: &PgPool,
    actor: &User,
    id: Uuid,
    input: PlayerUpdate,
) -> AppResult<PlayerWithStats> {
    require_admin_or_owner(&actor.principal(), actor.player_id, id)?;
    let player = load_player(db, actor.team_id, id).await?;
    let fields = input.apply(&player)?;

    if !unchanged(&player, &fields) {
        player_repo::update(db, id, &fields, actor.id).await?;
    }
    if actor.has_admin_privileges() && !player.has_before_system_stats && input.stats.has_any() {
        try_add_before_system_stats(db, actor.team_id, id, &input.stats, actor.id).await;
    }
    with_stats(db, actor.team_id, id).await
}

/// Removes the image, unlinks the user and soft-deletes. Stats stay.
pub async fn delete_player(
    db: &PgPool,
    store: &dyn ObjectStore,
    actor: &User,
    id: Uuid,
) -> AppResult<()> {
    require_admin_or_owner(&actor.principal(), actor.player_id, id)?;
    let player = load_player(db, actor.team_id, id).await?;

    if let Err(e) = storage::remove_player_image(store, player.team_id, player.id).await {
        log::warn!("could not remove image of player {}: {e}", player.id);
    }

    let mut tx = db.begin().await?;
    user_repo::unlink_player(&mut *tx, player.id, actor.id).await?;
    player_repo::soft_delete(&mut *tx, player.id, actor.id).await?;
    tx.commit().await?;
    log::info!("player {} deleted by {}", player.id, actor.id);
    Ok(())
}

pub async fn upload_image(
    db: &PgPool,
    store: &dyn ObjectStore,
    actor: &User,
    id: Uuid,
    extension: &str,
    bytes: Vec<u8>,
) -> AppResult<String> {
    require_admin_or_owner(&actor.principal(), actor.player_id, id)?;
    let player = load_player(db, actor.team_id, id).await?;

    let url = storage::upload_player_image(store, player.team_id, player.id, extension, bytes)
        .await
        .map_err(|e| {
            log::error!("player image upload failed: {e}");
            AppError::FailedUploadStorage
        })?;
    player_repo::set_image_url(db, player.id, Some(&url), actor.id).await?;
    Ok(url)
}

//////////////////////////////////////////////////
// Reads
//////////////////////////////////////////////////

pub async fn get_player(db: &PgPool, team_id: Uuid, id: Uuid) -> AppResult<PlayerWithStats> {
    with_stats(db, team_id, id).await
}

/// Moves the caller's own player to the front, keeping the rest in order.
pub fn current_player_first(players: &mut [PlayerWithStats], current: Option<Uuid>) {
    players.sort_by_key(|p| Some(p.id) != current);
}

pub async fn list_players(db: &PgPool, actor: &User) -> AppResult<Vec<PlayerWithStats>> {
    let mut players =
        player_repo::list_with_stats(db, actor.team_id, &PlayerFilter::default()).await?;
    current_player_first(&mut players, actor.player_id);
    Ok(players)
}

pub async fn filter_players(
    db: &PgPool,
    team_id: Uuid,
    filter: &PlayerFilter,
) -> AppResult<Vec<PlayerWithStats>> {
    Ok(player_repo::list_with_stats(db, team_id, filter).await?)
}

pub async fn players_without_user(db: &PgPool, team_id: Uuid) -> AppResult<Vec<Player>> {
    Ok(player_repo::list_without_user(db, team_id).await?)
}

pub async fn names_and_shirts(db: &PgPool, team_id: Uuid) -> AppResult<Vec<PlayerNameAndShirt>> {
    Ok(player_repo::list_names_and_shirts(db, team_id).await?)
}

pub async fn stats_filter(
    db: &PgPool,
    team_id: Uuid,
    filter: &PlayersStatsFilter,
) -> AppResult<Vec<PlayerWithStats>> {
    filter.validate()?;

    let mut window = StatsWindow::default();
    if let Some(range) = &filter.date_range {
        let interval = range.interval()?;
        window.from = interval.start().map(|day| local_day_bounds_utc(day).0);
        window.to = interval.end().map(|day| local_day_bounds_utc(day).1);
    }
    let picks_championships = filter.championships.as_ref().is_some_and(|c| !c.is_empty());
    if filter.exclude_friendly && !picks_championships {
        window.exclude_championship =
            championship_repo::get_by_name(db, team_id, &settings().friendly_championship_name)
                .await?
                .map(|c| c.id);
    }

    Ok(player_repo::filter_by_stats(db, team_id, filter, &window).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str) -> PlayerWithStats {
        PlayerWithStats {
            id: Uuid::new_v4(),
            name: name.into(),
            image_url: None,
            shirt_number: None,
            position: "Fixo".into(),
            played: 0,
            goals: 0,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
            mvps: 0,
            has_before_system_stats: false,
        }
    }

    #[test]
    fn own_player_goes_first() {
        let mut players = vec![player("Ana"), player("Bia"), player("Caio")];
        let me = players[2].id;
        current_player_first(&mut players, Some(me));
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Caio", "Ana", "Bia"]);

        current_player_first(&mut players, None);
        assert_eq!(players[0].name, "Caio");
    }

    #[test]
    fn create_payload_reads_stat_totals() {
        let input: PlayerCreate = serde_json::from_str(
            r#"{"name": " Danilo ", "position": "Meio-campo", "shirt_number": 8, "goals": 12, "mvps": 3}"#,
        )
        .unwrap();
        assert_eq!(input.stats.goals, 12);
        assert_eq!(input.stats.played, 0);
        let fields = input.fields().unwrap();
        assert_eq!(fields.name, "Danilo");
        assert_eq!(fields.position, "Meio-campo");
    }

    #[test]
    fn update_can_clear_shirt_number() {
        let stored = Player {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            name: "Cláudio".into(),
            image_url: Some("http://img".into()),
            shirt_number: Some(7),
            position: "Ponta".into(),
            has_before_system_stats: false,
        };

        let keep: PlayerUpdate = serde_json::from_str(r#"{"name": "Cláudio"}"#).unwrap();
        assert!(unchanged(&stored, &keep.apply(&stored).unwrap()));

        let clear: PlayerUpdate = serde_json::from_str(r#"{"shirt_number": null}"#).unwrap();
        let fields = clear.apply(&stored).unwrap();
        assert_eq!(fields.shirt_number, None);
        assert_eq!(fields.image_url.as_deref(), Some("http://img"));
    }
}
