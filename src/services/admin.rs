//! Operator endpoints: migrations, team onboarding and subscription renewal.

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::config::settings;
use crate::datetime::{add_or_subtract_months_to_date, brasilia_today};
use crate::db::models::{Team, User};
use crate::db::user_repo::{self, NewUser};
use crate::db::{championship_repo, intention_repo, team_repo, MIGRATOR};
use crate::domain::championship::ChampionshipInput;
use crate::domain::permissions::require_super_admin;
use crate::domain::registration::{generate_super_user_email, random_password};
use crate::error::{AppError, AppResult};
use crate::password::hash_password;
use crate::services::championship::ChampionshipResponse;
use crate::services::team::{create_team, TeamCreate};
use crate::services::user::normalize_email;

const SUPER_USER_NAME: &str = "Super User";

/// Compares against `MIGRATIONS_PWD`; an unset password locks the endpoints.
pub fn check_admin_password(given: &str) -> AppResult<()> {
    let expected = &settings().migrations_pwd;
    if expected.is_empty() || given != expected {
        return Err(AppError::InvalidAdminPassword);
    }
    Ok(())
}

//////////////////////////////////////////////////
// Migrations
//////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize)]
pub struct PendingMigration {
    pub revision: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub pending: bool,
    pub current_revision: Option<i64>,
    pub head_revision: Option<i64>,
    pub pending_migrations: Vec<PendingMigration>,
}

pub async fn run_migrations(db: &PgPool) -> AppResult<()> {
    MIGRATOR.run(db).await.context("running migrations")?;
    log::info!("migrations applied");
    Ok(())
}

pub async fn pending_migrations(db: &PgPool) -> AppResult<MigrationStatus> {
    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(db)
            .await?;
    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(db)
            .await?
    } else {
        Vec::new()
    };
    Ok(migration_status(&applied))
}

/// Compares applied versions against the embedded migrations.
pub fn migration_status(applied: &[i64]) -> MigrationStatus {
    let known: Vec<(i64, String)> = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| (m.version, m.description.to_string()))
        .collect();
    let applied_set: HashSet<i64> = applied.iter().copied().collect();

    let pending_migrations: Vec<PendingMigration> = known
        .iter()
        .filter(|(version, _)| !applied_set.contains(version))
        .map(|(version, description)| PendingMigration {
            revision: *version,
            message: description.clone(),
        })
        .collect();

    MigrationStatus {
        pending: !pending_migrations.is_empty(),
        current_revision: applied.iter().copied().max(),
        head_revision: known.iter().map(|(version, _)| *version).max(),
        pending_migrations,
    }
}

//////////////////////////////////////////////////
// Team onboarding
//////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTeam {
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredTeam {
    pub team: Team,
    pub super_user: User,
    pub client_user: User,
    pub friendly_championship: ChampionshipResponse,
    pub before_system_championship: ChampionshipResponse,
    pub super_user_email: String,
    pub client_user_email: String,
}

fn system_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// The friendly and before-system championships every team starts with.
pub async fn create_default_championships(
    conn: &mut PgConnection,
    team_id: Uuid,
    created_by: Option<Uuid>,
) -> AppResult<(ChampionshipResponse, ChampionshipResponse)> {
    let today = brasilia_today();
    let friendly = ChampionshipInput {
        name: settings().friendly_championship_name.clone(),
        start_date: system_start(),
        end_date: None,
        is_league_format: true,
        final_stage: None,
        final_position: None,
    };
    let before_system = ChampionshipInput {
        name: settings().before_system_championship_name.clone(),
        end_date: Some(today - Duration::days(1)),
        ..friendly.clone()
    };

    let friendly = championship_repo::create(&mut *conn, team_id, &friendly, created_by).await?;
    let before_system =
        championship_repo::create(&mut *conn, team_id, &before_system, created_by).await?;
    Ok((
        ChampionshipResponse::new(friendly, today),
        ChampionshipResponse::new(before_system, today),
    ))
}

/// Support account of a team. It is a super admin but not a team admin.
fn super_user_for(team_id: Uuid, email: String, hashed_password: String) -> NewUser {
    NewUser {
        team_id,
        player_id: None,
        name: SUPER_USER_NAME.to_string(),
        email,
        hashed_password,
        is_admin: false,
        is_super_admin: true,
        is_initial_user: false,
    }
}

/// Turns an intention to subscribe into a team with its first users.
pub async fn register_team(db: &PgPool, input: RegisterTeam) -> AppResult<RegisteredTeam> {
    let email = normalize_email(&input.user_email);
    let intention = intention_repo::get_by_email(db, &email)
        .await?
        .ok_or_else(|| AppError::BadRequest("No intention to subscribe found for this email.".into()))?;
    let pepper = &settings().password_pepper;

    let mut tx = db.begin().await?;

    let team = create_team(
        &mut *tx,
        TeamCreate {
            name: intention.team_name.clone(),
            emblem_url: None,
            foundation_date: None,
            season_start_date: None,
            season_end_date: None,
            primary_color: None,
        },
        None,
    )
    .await?;

    let super_user_email = generate_super_user_email(&team.name);
    let super_user = match user_repo::get_by_email(&mut *tx, &super_user_email).await? {
        Some(existing) => existing,
        None => {
            let new = super_user_for(
                team.id,
                super_user_email.clone(),
                hash_password(&settings().super_user_pwd, pepper)?,
            );
            user_repo::create(&mut *tx, &new, None).await?
        }
    };

    if user_repo::get_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AppError::BadRequest("A user with this email already exists.".into()));
    }
    let client = NewUser {
        team_id: team.id,
        player_id: None,
        name: intention.user_name.clone(),
        email: email.clone(),
        hashed_password: hash_password(&random_password(), pepper)?,
        is_admin: true,
        is_super_admin: false,
        is_initial_user: true,
    };
    let client_user = user_repo::create(&mut *tx, &client, Some(super_user.id)).await?;

    let (friendly_championship, before_system_championship) =
        create_default_championships(&mut tx, team.id, Some(super_user.id)).await?;

    intention_repo::delete(&mut *tx, intention.id).await?;
    tx.commit().await?;

    log::info!("team {} registered for {}", team.id, email);
    Ok(RegisteredTeam {
        team,
        super_user,
        client_user,
        friendly_championship,
        before_system_championship,
        super_user_email,
        client_user_email: email,
    })
}

//////////////////////////////////////////////////
// Subscriptions
//////////////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
pub struct RenewSubscription {
    pub team_ids: Vec<Uuid>,
    pub months: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenewedInfo {
    /// New `paid_until` (`YYYY-MM-DD`) to the names of the teams moved to it.
    pub renewed_info: BTreeMap<String, Vec<String>>,
}

pub async fn renew_subscription(
    db: &PgPool,
    actor: &User,
    input: RenewSubscription,
) -> AppResult<RenewedInfo> {
    require_super_admin(&actor.principal())?;
    let wanted: HashSet<Uuid> = input.team_ids.iter().copied().collect();
    let ids: Vec<Uuid> = wanted.iter().copied().collect();
    let teams = team_repo::get_by_ids(db, &ids).await?;
    if teams.len() != wanted.len() {
        return Err(AppError::TeamNotFound);
    }

    let mut info = RenewedInfo::default();
    let mut tx = db.begin().await?;
    for team in &teams {
        let paid_until = add_or_subtract_months_to_date(team.paid_until, input.months)?;
        team_repo::set_paid_until(&mut *tx, team.id, paid_until, actor.id).await?;
        info.renewed_info
            .entry(paid_until.format("%Y-%m-%d").to_string())
            .or_default()
            .push(team.name.clone());
    }
    tx.commit().await?;

    log::info!("{} subscriptions moved by {} months", teams.len(), input.months);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_everything_pending() {
        let status = migration_status(&[]);
        assert!(status.pending);
        assert_eq!(status.current_revision, None);
        assert_eq!(status.head_revision, Some(20241001000300));
        assert_eq!(status.pending_migrations.len(), 4);
    }

    #[test]
    fn up_to_date_database_has_nothing_pending() {
        let applied = [20241001000000, 20241001000100, 20241001000200, 20241001000300];
        let status = migration_status(&applied);
        assert!(!status.pending);
        assert_eq!(status.current_revision, status.head_revision);
        assert!(status.pending_migrations.is_empty());
    }

    #[test]
    fn super_user_is_not_a_team_admin() {
        let new = super_user_for(Uuid::nil(), "time_super_user@x.com".into(), "hash".into());
        assert!(new.is_super_admin);
        assert!(!new.is_admin);
        assert!(!new.is_initial_user);
        assert_eq!(new.name, SUPER_USER_NAME);
    }

    #[test]
    fn empty_password_never_matches() {
        assert!(matches!(
            check_admin_password(""),
            Err(AppError::InvalidAdminPassword)
        ));
    }
}
