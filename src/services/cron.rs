//! Scheduled jobs triggered over HTTP.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use sqlx::PgPool;

use crate::config::{settings, DEFAULT_PRIMARY_COLOR};
use crate::datetime::{assume_brasilia, brasilia_today};
use crate::db::player_repo::{self, PlayerFields};
use crate::db::{
    availability_repo, championship_repo, game_repo, session_repo, stat_repo, team_repo, user_repo,
};
use crate::domain::game::{GameInfo, GameStats, GoalAndAssist, PlayerAndQuantity};
use crate::domain::types::PlayerPosition;
use crate::error::{AppError, AppResult};
use crate::services::admin::create_default_championships;
use crate::services::stats::create_game_stats;
use crate::storage::{self, ObjectStore};

/// UTC hours in which the demo reset may run.
const RESET_WINDOW: std::ops::RangeInclusive<u32> = 6..=7;

pub fn reset_allowed_at(now: DateTime<Utc>) -> bool {
    RESET_WINDOW.contains(&now.hour())
}

/// Wipes the demo team and seeds it again with a small showcase.
pub async fn reset_demo_team(
    db: &PgPool,
    store: &dyn ObjectStore,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if !reset_allowed_at(now) {
        return Err(AppError::Forbidden("Not allowed".into()));
    }

    let demo = user_repo::get_by_email(db, &settings().demo_user_email)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let team_id = demo.team_id;
    let mut keep = vec![demo.id];
    if let Some(super_user) = user_repo::get_team_super_user(db, team_id).await? {
        keep.push(super_user.id);
    }

    let mut tx = db.begin().await?;

    user_repo::clear_players_of_team(&mut *tx, team_id).await?;
    availability_repo::purge_team(&mut *tx, team_id).await?;
    stat_repo::purge_team(&mut *tx, team_id).await?;
    game_repo::purge_team(&mut *tx, team_id).await?;
    championship_repo::purge_team(&mut *tx, team_id).await?;
    player_repo::purge_team(&mut *tx, team_id).await?;
    session_repo::delete_by_team_except(&mut *tx, team_id, &keep).await?;
    let removed_users = user_repo::purge_team_users_except(&mut *tx, team_id, &keep).await?;

    let (friendly, _) = create_default_championships(&mut tx, team_id, Some(demo.id)).await?;

    let claudio = PlayerFields {
        name: "Cláudio".into(),
        image_url: None,
        shirt_number: Some(7),
        position: PlayerPosition::Ponta.as_str().into(),
    };
    let danilo = PlayerFields {
        name: "Danilo".into(),
        image_url: None,
        shirt_number: Some(8),
        position: PlayerPosition::MeioCampo.as_str().into(),
    };
    let claudio = player_repo::create(&mut *tx, team_id, &claudio, demo.id).await?;
    let danilo = player_repo::create(&mut *tx, team_id, &danilo, demo.id).await?;

    let kickoff = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN);
    let yesterday = brasilia_today() - Duration::days(1);
    let game = GameInfo {
        championship_id: friendly.id,
        adversary: "Vila Esperança".into(),
        date_hour: assume_brasilia(yesterday.and_time(kickoff)),
        round: None,
        stage: None,
        is_home: true,
        is_wo: false,
        team_score: Some(2),
        adversary_score: Some(1),
        team_penalty_score: None,
        adversary_penalty_score: None,
    };
    let game = game_repo::create(&mut *tx, team_id, &game, demo.id).await?;
    let stats = GameStats {
        players: Some(vec![claudio.id, danilo.id]),
        goals_and_assists: Some(vec![
            GoalAndAssist {
                goal_player_id: Some(claudio.id),
                assist_player_id: Some(danilo.id),
            },
            GoalAndAssist {
                goal_player_id: Some(danilo.id),
                assist_player_id: None,
            },
        ]),
        yellow_cards: Some(vec![PlayerAndQuantity {
            player_id: danilo.id,
            quantity: 1,
        }]),
        red_cards: None,
        mvps: Some(vec![PlayerAndQuantity {
            player_id: claudio.id,
            quantity: 1,
        }]),
    };
    create_game_stats(&mut tx, team_id, game.id, &stats, demo.id).await?;

    team_repo::reset_demo_profile(
        &mut *tx,
        team_id,
        demo_foundation_date(),
        season_start(brasilia_today()),
        DEFAULT_PRIMARY_COLOR,
    )
    .await?;

    tx.commit().await?;

    if let Err(e) = storage::remove_team_player_images(store, team_id).await {
        log::warn!("demo player images not removed: {e}");
    }
    log::info!("demo team {team_id} reset ({removed_users} extra users removed)");
    Ok(())
}

fn demo_foundation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 11, 15).unwrap_or(NaiveDate::MIN)
}

fn season_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today)
}
