//! Games: CRUD, pagination and the dashboard views.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::config::{settings, DEFAULT_ADVERSARY};
use crate::datetime::{assume_brasilia, brasilia_date, brasilia_today, utc_now};
use crate::db::models::{Championship, Game, GameWithChampionship, User};
use crate::db::{availability_repo, championship_repo, game_repo, stat_repo};
use crate::domain::championship::date_is_within;
use crate::domain::filters::GameFilter;
use crate::domain::game::{game_result, truncate_chars, GameInfo, GameInput, GameStats, GameUpdateInput};
use crate::domain::permissions::{require_admin, require_super_admin};
use crate::domain::types::GameResult;
use crate::error::{AppError, AppResult};
use crate::services::stats::{build_stats_input, create_game_stats};
use crate::services::team::load_team;

const CHAMPIONSHIP_NAME_MAX: usize = 40;
const ADVERSARY_MAX: usize = 30;
const LAST_GAMES: i64 = 5;

//////////////////////////////////////////////////
// Responses
//////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize)]
pub struct GameResponse {
    pub id: Uuid,
    pub championship_id: Uuid,
    pub adversary: String,
    pub date_hour: DateTime<Utc>,
    pub round: Option<i32>,
    pub stage: Option<String>,
    pub is_home: bool,
    pub is_wo: bool,
    pub team_score: Option<i32>,
    pub adversary_score: Option<i32>,
    pub team_penalty_score: Option<i32>,
    pub adversary_penalty_score: Option<i32>,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        GameResponse {
            id: game.id,
            championship_id: game.championship_id,
            adversary: game.adversary,
            date_hour: game.date_hour,
            round: game.round,
            stage: game.stage,
            is_home: game.is_home,
            is_wo: game.is_wo,
            team_score: game.team_score,
            adversary_score: game.adversary_score,
            team_penalty_score: game.team_penalty_score,
            adversary_penalty_score: game.adversary_penalty_score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChampionshipRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameListItem {
    pub id: Uuid,
    pub championship: ChampionshipRef,
    pub adversary: String,
    pub date_hour: DateTime<Utc>,
    pub round: Option<i32>,
    pub stage: Option<String>,
    pub is_home: bool,
    pub is_wo: bool,
    pub team_score: Option<i32>,
    pub adversary_score: Option<i32>,
    pub team_penalty_score: Option<i32>,
    pub adversary_penalty_score: Option<i32>,
}

impl From<GameWithChampionship> for GameListItem {
    fn from(row: GameWithChampionship) -> Self {
        let game = row.game;
        GameListItem {
            id: game.id,
            championship: ChampionshipRef {
                id: game.championship_id,
                name: truncate_chars(&row.championship_name, CHAMPIONSHIP_NAME_MAX),
            },
            adversary: truncate_chars(&game.adversary, ADVERSARY_MAX),
            date_hour: game.date_hour,
            round: game.round,
            stage: game.stage,
            is_home: game.is_home,
            is_wo: game.is_wo,
            team_score: game.team_score,
            adversary_score: game.adversary_score,
            team_penalty_score: game.team_penalty_score,
            adversary_penalty_score: game.adversary_penalty_score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GamePage {
    pub items: Vec<GameListItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Game plus the stats payload that recreates it, for the edit form.
#[derive(Debug, Clone, Serialize)]
pub struct GameToUpdate {
    #[serde(flatten)]
    pub game: GameListItem,
    #[serde(flatten)]
    pub stats: GameStats,
}

impl GameToUpdate {
    pub fn new(game: Game, championship_name: String, stats: GameStats) -> Self {
        GameToUpdate {
            game: GameWithChampionship {
                game,
                championship_name,
            }
            .into(),
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NextGame {
    pub id: Uuid,
    pub championship_name: String,
    pub adversary: String,
    pub date_hour: DateTime<Utc>,
    pub is_home: bool,
    pub confirmed_players: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastGame {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub adversary: String,
    pub team_score: Option<i32>,
    pub adversary_score: Option<i32>,
    pub result: GameResult,
}

impl From<Game> for LastGame {
    fn from(game: Game) -> Self {
        LastGame {
            id: game.id,
            date: game.date_hour,
            result: game_result(game.team_score, game.adversary_score, game.is_wo),
            adversary: game.adversary,
            team_score: game.team_score,
            adversary_score: game.adversary_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)`, defaulting to the first five games.
    pub fn resolve(self) -> AppResult<(i64, i64)> {
        let limit = self.limit.unwrap_or(5);
        let offset = self.offset.unwrap_or(0);
        if !(1..=100).contains(&limit) {
            return Err(AppError::Validation("Limit must be between 1 and 100.".into()));
        }
        if offset < 0 {
            return Err(AppError::Validation("Offset must be zero or positive.".into()));
        }
        Ok((limit, offset))
    }
}

//////////////////////////////////////////////////
// Rules
//////////////////////////////////////////////////

/// Leagues use rounds, knockouts use stages, and the date must fall inside the championship.
pub fn check_against_championship(championship: &Championship, info: &GameInfo) -> AppResult<()> {
    let wrong_format = if championship.is_league_format {
        info.stage.is_some()
    } else {
        info.round.is_some()
    };
    if wrong_format {
        return Err(AppError::InvalidChampionshipFormat);
    }
    if !date_is_within(championship, brasilia_date(info.date_hour)) {
        return Err(AppError::GameDateOutsideChampionshipRange {
            start: championship.start_date,
            end: championship.end_date,
        });
    }
    Ok(())
}

async fn load_checked_championship(
    conn: &mut PgConnection,
    team_id: Uuid,
    info: &GameInfo,
) -> AppResult<Championship> {
    let championship = championship_repo::get_by_id(&mut *conn, team_id, info.championship_id)
        .await?
        .ok_or(AppError::ChampionshipNotFound)?;
    check_against_championship(&championship, info)?;
    Ok(championship)
}

pub async fn load_game(db: &PgPool, team_id: Uuid, id: Uuid) -> AppResult<Game> {
    game_repo::get_by_id(db, team_id, id, false)
        .await?
        .ok_or(AppError::GameNotFound)
}

//////////////////////////////////////////////////
// Writes
//////////////////////////////////////////////////

pub async fn create_game(db: &PgPool, actor: &User, input: GameInput) -> AppResult<Uuid> {
    require_admin(&actor.principal())?;
    let input = input.sanitize()?;
    load_team(db, actor.team_id).await?;

    let mut tx = db.begin().await?;
    load_checked_championship(&mut tx, actor.team_id, &input.info).await?;
    let game = game_repo::create(&mut *tx, actor.team_id, &input.info, actor.id).await?;
    create_game_stats(&mut tx, actor.team_id, game.id, &input.stats, actor.id).await?;
    tx.commit().await?;

    log::info!("game {} created by {}", game.id, actor.id);
    Ok(game.id)
}

pub async fn update_game(
    db: &PgPool,
    actor: &User,
    id: Uuid,
    input: GameUpdateInput,
) -> AppResult<GameResponse> {
    require_admin(&actor.principal())?;
    let has_stats_update = input.has_stats_update;
    let input = input.game.sanitize()?;
    let mut game = load_game(db, actor.team_id, id).await?;

    let mut tx = db.begin().await?;
    if input.info.differs_from(&game) {
        load_checked_championship(&mut tx, actor.team_id, &input.info).await?;
        game = game_repo::update(&mut *tx, id, &input.info, actor.id).await?;
    }
    if has_stats_update {
        stat_repo::purge_game(&mut *tx, id).await?;
        create_game_stats(&mut tx, actor.team_id, id, &input.stats, actor.id).await?;
    }
    tx.commit().await?;

    Ok(game.into())
}

/// Soft-deletes the game together with its stats and availabilities.
pub async fn delete_game(db: &PgPool, actor: &User, id: Uuid) -> AppResult<()> {
    require_admin(&actor.principal())?;
    load_game(db, actor.team_id, id).await?;

    let mut tx = db.begin().await?;
    game_repo::set_deleted(&mut *tx, id, true, actor.id).await?;
    stat_repo::set_deleted_by_game(&mut *tx, id, true, actor.id).await?;
    availability_repo::soft_delete_by_game(&mut *tx, id, actor.id).await?;
    tx.commit().await?;

    log::info!("game {id} deleted by {}", actor.id);
    Ok(())
}

pub async fn reactivate_game(db: &PgPool, actor: &User, id: Uuid) -> AppResult<GameResponse> {
    require_super_admin(&actor.principal())?;
    let game = game_repo::get_by_id(db, actor.team_id, id, true)
        .await?
        .ok_or(AppError::GameNotFound)?;

    let mut tx = db.begin().await?;
    game_repo::set_deleted(&mut *tx, id, false, actor.id).await?;
    stat_repo::set_deleted_by_game(&mut *tx, id, false, actor.id).await?;
    tx.commit().await?;

    log::info!("game {id} reactivated by {}", actor.id);
    Ok(game.into())
}

/// Holder game for stats a player had before the team joined.
///
/// Lives in the before-system championship, on its last day (or yesterday
/// when it has none).
pub async fn create_before_system_game(
    conn: &mut PgConnection,
    team_id: Uuid,
    created_by: Uuid,
) -> AppResult<Uuid> {
    let championship = championship_repo::get_by_name(
        &mut *conn,
        team_id,
        &settings().before_system_championship_name,
    )
    .await?
    .ok_or(AppError::ChampionshipNotFound)?;

    let day = championship
        .end_date
        .unwrap_or_else(|| brasilia_today() - Duration::days(1));
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);

    let info = GameInfo {
        championship_id: championship.id,
        adversary: DEFAULT_ADVERSARY.to_string(),
        date_hour: assume_brasilia(day.and_time(noon)),
        round: None,
        stage: None,
        is_home: true,
        is_wo: false,
        team_score: None,
        adversary_score: None,
        team_penalty_score: None,
        adversary_penalty_score: None,
    };
    let game = game_repo::create(&mut *conn, team_id, &info, created_by).await?;
    Ok(game.id)
}

//////////////////////////////////////////////////
// Reads
//////////////////////////////////////////////////

pub async fn page_games(
    db: &PgPool,
    team_id: Uuid,
    filter: &GameFilter,
    pagination: Pagination,
) -> AppResult<GamePage> {
    let (limit, offset) = pagination.resolve()?;
    let (rows, total) = game_repo::page(db, team_id, filter, limit, offset).await?;
    Ok(GamePage {
        items: rows.into_iter().map(GameListItem::from).collect(),
        total,
        limit,
        offset,
    })
}

pub async fn game_to_update(db: &PgPool, actor: &User, id: Uuid) -> AppResult<GameToUpdate> {
    require_admin(&actor.principal())?;
    let game = load_game(db, actor.team_id, id).await?;
    let championship = championship_repo::get_by_id(db, actor.team_id, game.championship_id)
        .await?
        .ok_or(AppError::ChampionshipNotFound)?;
    let stats = stat_repo::list_by_game(db, id).await?;
    Ok(GameToUpdate::new(
        game,
        championship.name,
        build_stats_input(&stats),
    ))
}

pub async fn next_game(db: &PgPool, team_id: Uuid) -> AppResult<Option<NextGame>> {
    let Some(row) = game_repo::next_game(db, team_id, utc_now()).await? else {
        return Ok(None);
    };
    let confirmed_players = availability_repo::count_available(db, row.game.id).await?;
    Ok(Some(NextGame {
        id: row.game.id,
        championship_name: row.championship_name,
        adversary: row.game.adversary,
        date_hour: row.game.date_hour,
        is_home: row.game.is_home,
        confirmed_players,
    }))
}

pub async fn last_games(db: &PgPool, team_id: Uuid) -> AppResult<Vec<LastGame>> {
    let games = game_repo::last_scored(db, team_id, LAST_GAMES).await?;
    Ok(games.into_iter().map(LastGame::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use crate::domain::types::StageOption;

    fn championship(is_league_format: bool, end: Option<NaiveDate>) -> Championship {
        Championship {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            name: "Copa".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: end,
            is_league_format,
            final_stage: None,
            final_position: None,
        }
    }

    fn info(championship_id: Uuid, date_hour: DateTime<Utc>) -> GameInfo {
        GameInfo {
            championship_id,
            adversary: "Vila Nova".into(),
            date_hour,
            round: None,
            stage: None,
            is_home: true,
            is_wo: false,
            team_score: None,
            adversary_score: None,
            team_penalty_score: None,
            adversary_penalty_score: None,
        }
    }

    #[test]
    fn stage_in_league_and_round_in_knockout_are_rejected() {
        let when = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();

        let league = championship(true, None);
        let mut game = info(league.id, when);
        game.stage = Some(StageOption::Final);
        assert!(matches!(
            check_against_championship(&league, &game),
            Err(AppError::InvalidChampionshipFormat)
        ));

        let knockout = championship(false, None);
        let mut game = info(knockout.id, when);
        game.round = Some(3);
        assert!(matches!(
            check_against_championship(&knockout, &game),
            Err(AppError::InvalidChampionshipFormat)
        ));
        game.round = None;
        assert!(check_against_championship(&knockout, &game).is_ok());
    }

    #[test]
    fn date_is_checked_on_the_brasilia_calendar() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let c = championship(true, Some(end));

        // 01:00 UTC on April 1st is still March 31st in Brasília.
        let late_kickoff = Utc.with_ymd_and_hms(2024, 4, 1, 1, 0, 0).unwrap();
        assert!(check_against_championship(&c, &info(c.id, late_kickoff)).is_ok());

        let too_late = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        assert!(matches!(
            check_against_championship(&c, &info(c.id, too_late)),
            Err(AppError::GameDateOutsideChampionshipRange { .. })
        ));
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        assert_eq!(Pagination::default().resolve().unwrap(), (5, 0));
        let too_big = Pagination { limit: Some(101), offset: None };
        assert!(too_big.resolve().is_err());
        let negative = Pagination { limit: Some(10), offset: Some(-1) };
        assert!(negative.resolve().is_err());
    }

    fn game_against(adversary: &str) -> Game {
        Game {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            championship_id: Uuid::new_v4(),
            adversary: adversary.into(),
            date_hour: Utc::now(),
            round: None,
            stage: None,
            is_home: true,
            is_wo: false,
            team_score: Some(1),
            adversary_score: Some(0),
            team_penalty_score: None,
            adversary_penalty_score: None,
        }
    }

    #[test]
    fn list_items_truncate_long_names() {
        let row = GameWithChampionship {
            game: game_against(&"A".repeat(50)),
            championship_name: "C".repeat(60),
        };
        let item = GameListItem::from(row);
        assert_eq!(item.adversary.chars().count(), 30);
        assert_eq!(item.championship.name.chars().count(), 40);
    }

    #[test]
    fn edit_form_nests_the_championship() {
        let game = game_against(&"B".repeat(45));
        let championship_id = game.championship_id;
        let form = GameToUpdate::new(
            game,
            "Campeonato Municipal de Futebol Amador de Várzea".into(),
            GameStats {
                red_cards: Some(vec![]),
                ..GameStats::default()
            },
        );

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["championship"]["id"], championship_id.to_string());
        assert_eq!(
            json["championship"]["name"].as_str().unwrap().chars().count(),
            40
        );
        assert_eq!(json["adversary"].as_str().unwrap().chars().count(), 30);
        assert!(json.get("championship_id").is_none());
        assert_eq!(json["red_cards"], serde_json::json!([]));
    }
}
