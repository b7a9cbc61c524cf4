//! Teams and intentions to subscribe.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::rust::double_option;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::datetime::{brasilia_today, this_day_next_month};
use crate::db::models::{IntentionToSubscribe, Team, User};
use crate::db::team_repo::{self, TeamFields};
use crate::db::intention_repo;
use crate::domain::permissions::{require_admin, require_super_admin};
use crate::error::{AppError, AppResult};
use crate::storage::{self, ObjectStore};

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
pub struct TeamCreate {
    pub name: String,
    #[serde(default)]
    pub emblem_url: Option<String>,
    #[serde(default)]
    pub foundation_date: Option<NaiveDate>,
    #[serde(default)]
    pub season_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub season_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub primary_color: Option<String>,
}

/// Absent fields keep their stored value; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "double_option")]
    pub emblem_url: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub foundation_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub season_start_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub season_end_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub primary_color: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentionCreate {
    pub user_name: String,
    pub user_email: String,
    pub phone_number: String,
    pub team_name: String,
}

fn validate_name(name: &str) -> AppResult<()> {
    let len = name.chars().count();
    if len == 0 || len > 255 {
        return Err(AppError::Validation(
            "Name must be between 1 and 255 characters long.".into(),
        ));
    }
    Ok(())
}

fn validate_season(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::StartDateBiggerThanEnd);
        }
    }
    Ok(())
}

impl TeamCreate {
    pub fn into_fields(self) -> AppResult<TeamFields> {
        validate_name(&self.name)?;
        validate_season(self.season_start_date, self.season_end_date)?;
        Ok(TeamFields {
            name: self.name,
            emblem_url: self.emblem_url,
            foundation_date: self.foundation_date,
            season_start_date: self.season_start_date,
            season_end_date: self.season_end_date,
            primary_color: self.primary_color,
        })
    }
}

impl TeamUpdate {
    pub fn apply(self, team: &Team) -> AppResult<TeamFields> {
        let fields = TeamFields {
            name: self.name.unwrap_or_else(|| team.name.clone()),
            emblem_url: self.emblem_url.unwrap_or_else(|| team.emblem_url.clone()),
            foundation_date: self.foundation_date.unwrap_or(team.foundation_date),
            season_start_date: self.season_start_date.unwrap_or(team.season_start_date),
            season_end_date: self.season_end_date.unwrap_or(team.season_end_date),
            primary_color: self.primary_color.unwrap_or_else(|| team.primary_color.clone()),
        };
        validate_name(&fields.name)?;
        validate_season(fields.season_start_date, fields.season_end_date)?;
        Ok(fields)
    }
}

//////////////////////////////////////////////////
// Operations
//////////////////////////////////////////////////

pub async fn load_team(db: impl PgExecutor<'_>, team_id: Uuid) -> AppResult<Team> {
    team_repo::get_by_id(db, team_id)
        .await?
        .ok_or(AppError::TeamNotFound)
}

/// New teams are paid until the same day next month.
pub async fn create_team(
    db: impl PgExecutor<'_>,
    input: TeamCreate,
    created_by: Option<Uuid>,
) -> AppResult<Team> {
    let fields = input.into_fields()?;
    let paid_until = this_day_next_month(brasilia_today());
    let team = team_repo::create(db, &fields, paid_until, created_by).await?;
    log::info!("team {} created ({})", team.id, team.name);
    Ok(team)
}

/// Teams are visible to their own users and to super admins.
pub async fn get_team(db: &PgPool, actor: &User, team_id: Uuid) -> AppResult<Team> {
    if actor.team_id != team_id && !actor.is_super_admin {
        return Err(AppError::TeamNotFound);
    }
    load_team(db, team_id).await
}

pub async fn update_team(
    db: &PgPool,
    actor: &User,
    team_id: Uuid,
    input: TeamUpdate,
) -> AppResult<Team> {
    require_admin(&actor.principal())?;
    if actor.team_id != team_id && !actor.is_super_admin {
        return Err(AppError::AdminRequired);
    }
    let team = load_team(db, team_id).await?;
    let fields = input.apply(&team)?;
    Ok(team_repo::update(db, team_id, &fields, actor.id).await?)
}

pub async fn delete_team(db: &PgPool, actor: &User, team_id: Uuid) -> AppResult<()> {
    require_super_admin(&actor.principal())?;
    load_team(db, team_id).await?;
    team_repo::soft_delete(db, team_id, actor.id).await?;
    log::info!("team {team_id} deleted by {}", actor.id);
    Ok(())
}

/// Replaces the caller's team emblem and returns its public URL.
pub async fn upload_emblem(
    db: &PgPool,
    store: &dyn ObjectStore,
    actor: &User,
    extension: &str,
    bytes: Vec<u8>,
) -> AppResult<String> {
    require_admin(&actor.principal())?;
    let team = load_team(db, actor.team_id).await?;
    let url = storage::upload_team_emblem(store, team.id, extension, bytes)
        .await
        .map_err(|e| {
            log::error!("emblem upload for team {} failed: {e}", team.id);
            AppError::FailedUploadStorage
        })?;
    team_repo::set_emblem_url(db, team.id, &url, actor.id).await?;
    Ok(url)
}

pub async fn create_intention(db: &PgPool, input: IntentionCreate) -> AppResult<IntentionToSubscribe> {
    validate_name(&input.user_name)?;
    validate_name(&input.team_name)?;
    if input.phone_number.chars().count() > 20 {
        return Err(AppError::Validation(
            "Phone number must have at most 20 characters.".into(),
        ));
    }
    let email = input.user_email.trim().to_lowercase();
    if intention_repo::get_by_email(db, &email).await?.is_some() {
        return Err(AppError::IntentionAlreadyExists);
    }

    let intention = intention_repo::create(
        db,
        &input.user_name,
        &email,
        &input.phone_number,
        &input.team_name,
    )
    .await?;

    log::info!(
        "new intention to subscribe: {} <{}> wants to register team {:?} (phone {})",
        intention.user_name,
        intention.user_email,
        intention.team_name,
        intention.phone_number
    );
    Ok(intention)
}
