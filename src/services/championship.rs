//! Championship CRUD with the friendly and before-system protections.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings;
use crate::datetime::brasilia_today;
use crate::db::models::{Championship, User};
use crate::db::{championship_repo, game_repo};
use crate::domain::championship::{order_by_status_and_start_date, status_on, ChampionshipInput};
use crate::domain::filters::ChampionshipFilter;
use crate::domain::permissions::require_admin;
use crate::domain::types::ChampionshipStatus;
use crate::error::{AppError, AppResult};
use crate::services::team::load_team;

#[derive(Debug, Clone, Serialize)]
pub struct ChampionshipResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_league_format: bool,
    pub final_stage: Option<String>,
    pub final_position: Option<i32>,
    pub status: ChampionshipStatus,
}

impl ChampionshipResponse {
    pub fn new(championship: Championship, today: NaiveDate) -> Self {
        let status = status_on(championship.start_date, championship.end_date, today);
        ChampionshipResponse {
            id: championship.id,
            team_id: championship.team_id,
            name: championship.name,
            start_date: championship.start_date,
            end_date: championship.end_date,
            is_league_format: championship.is_league_format,
            final_stage: championship.final_stage,
            final_position: championship.final_position,
            status,
        }
    }
}

fn respond(championships: Vec<Championship>, today: NaiveDate) -> Vec<ChampionshipResponse> {
    championships
        .into_iter()
        .map(|c| ChampionshipResponse::new(c, today))
        .collect()
}

pub fn is_friendly(championship: &Championship) -> bool {
    championship.name == settings().friendly_championship_name
}

pub fn is_before_system(championship: &Championship) -> bool {
    championship.name == settings().before_system_championship_name
}

pub async fn load_championship(db: &PgPool, team_id: Uuid, id: Uuid) -> AppResult<Championship> {
    championship_repo::get_by_id(db, team_id, id)
        .await?
        .ok_or(AppError::ChampionshipNotFound)
}

pub async fn create_championship(
    db: &PgPool,
    actor: &User,
    input: ChampionshipInput,
) -> AppResult<ChampionshipResponse> {
    require_admin(&actor.principal())?;
    input.validate()?;
    load_team(db, actor.team_id).await?;
    if championship_repo::get_by_name(db, actor.team_id, &input.name)
        .await?
        .is_some()
    {
        return Err(AppError::ChampionshipAlreadyExists);
    }
    let championship = championship_repo::create(db, actor.team_id, &input, Some(actor.id)).await?;
    Ok(ChampionshipResponse::new(championship, brasilia_today()))
}

pub async fn get_championship(db: &PgPool, actor: &User, id: Uuid) -> AppResult<ChampionshipResponse> {
    let championship = load_championship(db, actor.team_id, id).await?;
    Ok(ChampionshipResponse::new(championship, brasilia_today()))
}

/// In progress, then not started, then finished; newest start first in each group.
pub async fn list_championships(db: &PgPool, team_id: Uuid) -> AppResult<Vec<ChampionshipResponse>> {
    let today = brasilia_today();
    let mut championships = championship_repo::list_by_team(db, team_id).await?;
    order_by_status_and_start_date(&mut championships, today);
    Ok(respond(championships, today))
}

pub async fn filter_championships(
    db: &PgPool,
    team_id: Uuid,
    filter: &ChampionshipFilter,
) -> AppResult<Vec<ChampionshipResponse>> {
    let today = brasilia_today();
    let mut championships = championship_repo::filter(db, team_id, filter, today).await?;
    if filter.order_by.is_none() {
        order_by_status_and_start_date(&mut championships, today);
    }
    Ok(respond(championships, today))
}

pub async fn update_championship(
    db: &PgPool,
    actor: &User,
    id: Uuid,
    input: ChampionshipInput,
) -> AppResult<ChampionshipResponse> {
    require_admin(&actor.principal())?;
    input.validate()?;
    let today = brasilia_today();

    let current = load_championship(db, actor.team_id, id).await?;
    if is_friendly(&current) {
        return Err(AppError::CantEditFriendlyChampionship);
    }
    let stored = ChampionshipInput::from_stored(&current);
    if stored == input {
        return Ok(ChampionshipResponse::new(current, today));
    }
    if is_before_system(&current) && input.changed_any_field_but_end_date(&stored) {
        return Err(AppError::CanOnlyEditEndDateBeforeSystemChampionship);
    }
    if current.name != input.name
        && championship_repo::get_by_name(db, actor.team_id, &input.name)
            .await?
            .is_some()
    {
        return Err(AppError::ChampionshipAlreadyExists);
    }

    let updated = championship_repo::update(db, id, &input, actor.id).await?;
    Ok(ChampionshipResponse::new(updated, today))
}

pub async fn delete_championship(db: &PgPool, actor: &User, id: Uuid) -> AppResult<()> {
    require_admin(&actor.principal())?;
    let championship = load_championship(db, actor.team_id, id).await?;
    if is_friendly(&championship) {
        return Err(AppError::CantDeleteFriendlyChampionship);
    }
    if is_before_system(&championship) {
        return Err(AppError::CantDeleteBeforeSystemChampionship);
    }
    let games = game_repo::count_by_championship(db, id).await?;
    if games > 0 {
        return Err(AppError::CantDeleteChampionshipWithGames(games));
    }
    championship_repo::soft_delete(db, id, actor.id).await?;
    Ok(())
}
