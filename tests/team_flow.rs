//! Full request flows against a scratch database.
//!
//! `DATABASE_URL` must point at a Postgres server; each test gets its own
//! database from `sqlx::test`.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use team_manager_server::datetime::{assume_brasilia, brasilia_today};
use team_manager_server::db::models::{PlayerWithStats, User};
use team_manager_server::domain::filters::{PlayersStatsFilter, SortDirection};
use team_manager_server::domain::game::{
    GameInfo, GameInput, GameStats, GameUpdateInput, GoalAndAssist, PlayerAndQuantity,
};
use team_manager_server::domain::types::{AvailabilityStatus, PlayerPosition};
use team_manager_server::error::AppError;
use team_manager_server::services::admin::{register_team, RegisterTeam, RegisteredTeam};
use team_manager_server::services::availability::{
    create_availability, delete_availability, game_availability, AvailabilityCreate,
};
use team_manager_server::services::game::{create_game, update_game};
use team_manager_server::services::player::{create_player, get_player, stats_filter, PlayerCreate};
use team_manager_server::services::stats::{game_stats, month_top_scorer, StatTotals};
use team_manager_server::services::team::{create_intention, IntentionCreate};
use team_manager_server::services::user::{
    create_user, login, refresh, update_user, UserCreate, UserUpdate,
};
use uuid::Uuid;

async fn onboard(pool: &PgPool, email: &str) -> RegisteredTeam {
    create_intention(
        pool,
        IntentionCreate {
            user_name: "Joana".into(),
            user_email: email.into(),
            phone_number: "+55 11 99999-0000".into(),
            team_name: "Unidos da Vila".into(),
        },
    )
    .await
    .unwrap();
    register_team(pool, RegisterTeam { user_email: email.into() })
        .await
        .unwrap()
}

fn player(name: &str, shirt: i32, stats: StatTotals) -> PlayerCreate {
    PlayerCreate {
        name: name.into(),
        image_url: None,
        shirt_number: Some(shirt),
        position: PlayerPosition::Atacante,
        stats,
    }
}

fn scorers(ids: &[Uuid]) -> Vec<GoalAndAssist> {
    ids.iter()
        .map(|id| GoalAndAssist {
            goal_player_id: Some(*id),
            assist_player_id: None,
        })
        .collect()
}

/// Friendly game won by as many goals as `goals` lists.
fn friendly_game(
    registered: &RegisteredTeam,
    date_hour: DateTime<Utc>,
    players: Vec<Uuid>,
    goals: &[Uuid],
) -> GameInput {
    GameInput {
        info: GameInfo {
            championship_id: registered.friendly_championship.id,
            adversary: "Real Várzea".into(),
            date_hour,
            round: None,
            stage: None,
            is_home: false,
            is_wo: false,
            team_score: Some(goals.len() as i32),
            adversary_score: Some(0),
            team_penalty_score: None,
            adversary_penalty_score: None,
        },
        stats: GameStats {
            players: Some(players),
            goals_and_assists: Some(scorers(goals)),
            ..GameStats::default()
        },
    }
}

async fn user_for(
    pool: &PgPool,
    admin: &User,
    email: &str,
    player_id: Option<Uuid>,
) -> Result<User, AppError> {
    create_user(
        pool,
        admin,
        UserCreate {
            name: "Atleta".into(),
            email: email.into(),
            password: "senha-forte-123".into(),
            is_admin: false,
            player_id,
        },
    )
    .await
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn onboarding_creates_users_and_default_championships(pool: PgPool) {
    let registered = onboard(&pool, "Joana@Example.com").await;

    assert_eq!(registered.client_user_email, "joana@example.com");
    assert_eq!(registered.super_user_email, "superuser@unidosdavila.com");
    assert!(registered.client_user.is_admin);
    assert!(registered.super_user.is_super_admin);
    assert!(!registered.super_user.is_admin);
    assert_eq!(registered.friendly_championship.end_date, None);
    assert!(registered.before_system_championship.end_date.is_some());

    // The intention is consumed.
    let again = register_team(
        &pool,
        RegisterTeam {
            user_email: "joana@example.com".into(),
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn before_system_totals_show_up_in_player_stats(pool: PgPool) {
    let registered = onboard(&pool, "coach@example.com").await;
    let admin = registered.client_user;

    let totals = StatTotals {
        played: 10,
        goals: 4,
        assists: 2,
        ..StatTotals::default()
    };
    let created = create_player(&pool, &admin, player("Tiago", 9, totals))
        .await
        .unwrap();
    assert!(created.has_before_system_stats);

    let fetched = get_player(&pool, admin.team_id, created.id).await.unwrap();
    assert_eq!(fetched.played, 10);
    assert_eq!(fetched.goals, 4);
    assert_eq!(fetched.assists, 2);
    assert_eq!(fetched.mvps, 0);
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn game_events_are_recorded_per_player(pool: PgPool) {
    let registered = onboard(&pool, "stats@example.com").await;
    let admin = registered.client_user;

    let striker = create_player(&pool, &admin, player("Rafa", 10, StatTotals::default()))
        .await
        .unwrap();
    let winger = create_player(&pool, &admin, player("Léo", 11, StatTotals::default()))
        .await
        .unwrap();

    let input = GameInput {
        info: GameInfo {
            championship_id: registered.friendly_championship.id,
            adversary: "Atlético do Bairro".into(),
            date_hour: Utc::now() - Duration::days(2),
            round: None,
            stage: None,
            is_home: true,
            is_wo: false,
            team_score: Some(2),
            adversary_score: Some(0),
            team_penalty_score: None,
            adversary_penalty_score: None,
        },
        stats: GameStats {
            players: Some(vec![striker.id, winger.id]),
            goals_and_assists: Some(vec![
                GoalAndAssist {
                    goal_player_id: Some(striker.id),
                    assist_player_id: Some(winger.id),
                },
                GoalAndAssist {
                    goal_player_id: None,
                    assist_player_id: None,
                },
            ]),
            yellow_cards: Some(vec![PlayerAndQuantity {
                player_id: winger.id,
                quantity: 1,
            }]),
            red_cards: None,
            mvps: Some(vec![PlayerAndQuantity {
                player_id: striker.id,
                quantity: 2,
            }]),
        },
    };
    let game_id = create_game(&pool, &admin, input).await.unwrap();

    let view = game_stats(&pool, &admin, game_id).await.unwrap();
    assert_eq!(view.players.len(), 2);
    assert_eq!(view.goals_and_assists.len(), 2);
    assert_eq!(view.yellow_cards, vec![("Léo".to_string(), 1)]);
    assert_eq!(view.mvps, vec![("Rafa".to_string(), 2)]);

    let rafa = get_player(&pool, admin.team_id, striker.id).await.unwrap();
    assert_eq!((rafa.played, rafa.goals, rafa.mvps), (1, 1, 2));
    let leo = get_player(&pool, admin.team_id, winger.id).await.unwrap();
    assert_eq!((leo.played, leo.assists, leo.yellow_cards), (1, 1, 1));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn month_top_scorer_prefers_fewer_games_then_name(pool: PgPool) {
    let registered = onboard(&pool, "artilharia@example.com").await;
    let admin = registered.client_user.clone();
    let ana = create_player(&pool, &admin, player("Ana", 7, StatTotals::default()))
        .await
        .unwrap();
    let bia = create_player(&pool, &admin, player("Bia", 8, StatTotals::default()))
        .await
        .unwrap();

    let kickoff = assume_brasilia(brasilia_today().and_hms_opt(0, 30, 0).unwrap());
    // Both end with two goals; Bia needed one game, Ana two.
    let first = friendly_game(&registered, kickoff, vec![ana.id, bia.id], &[bia.id, bia.id]);
    create_game(&pool, &admin, first).await.unwrap();
    let second = friendly_game(
        &registered,
        kickoff + Duration::minutes(30),
        vec![ana.id],
        &[ana.id, ana.id],
    );
    create_game(&pool, &admin, second).await.unwrap();

    let top = month_top_scorer(&pool, admin.team_id).await.unwrap().unwrap();
    assert_eq!(top.id, bia.id);
    assert_eq!((top.goals, top.games_played), (2, 1));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn stats_filter_orders_by_stat_then_games_then_name(pool: PgPool) {
    let registered = onboard(&pool, "filtro@example.com").await;
    let admin = registered.client_user.clone();
    let ana = create_player(&pool, &admin, player("Ana", 7, StatTotals::default()))
        .await
        .unwrap();
    let bia = create_player(&pool, &admin, player("Bia", 8, StatTotals::default()))
        .await
        .unwrap();
    let caio = create_player(&pool, &admin, player("Caio", 9, StatTotals::default()))
        .await
        .unwrap();

    let when = Utc::now() - Duration::days(3);
    let first = friendly_game(&registered, when, vec![ana.id, bia.id], &[bia.id, bia.id]);
    create_game(&pool, &admin, first).await.unwrap();
    let second = friendly_game(
        &registered,
        when + Duration::days(1),
        vec![ana.id, caio.id],
        &[ana.id, ana.id],
    );
    create_game(&pool, &admin, second).await.unwrap();

    let mut filter = PlayersStatsFilter {
        exclude_friendly: false,
        ..PlayersStatsFilter::default()
    };
    let names = |rows: Vec<PlayerWithStats>| {
        rows.into_iter().map(|p| p.name).collect::<Vec<_>>()
    };

    let desc = stats_filter(&pool, admin.team_id, &filter).await.unwrap();
    assert_eq!(names(desc), vec!["Bia", "Ana", "Caio"]);

    filter.order_by = Some(SortDirection::Asc);
    let asc = stats_filter(&pool, admin.team_id, &filter).await.unwrap();
    assert_eq!(names(asc), vec!["Caio", "Ana", "Bia"]);

    // Friendly games are skipped by default.
    let friendly_only = stats_filter(&pool, admin.team_id, &PlayersStatsFilter::default())
        .await
        .unwrap();
    assert!(friendly_only.is_empty());
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn game_update_replaces_stats_only_when_asked(pool: PgPool) {
    let registered = onboard(&pool, "edicao@example.com").await;
    let admin = registered.client_user.clone();
    let ana = create_player(&pool, &admin, player("Ana", 7, StatTotals::default()))
        .await
        .unwrap();
    let bia = create_player(&pool, &admin, player("Bia", 8, StatTotals::default()))
        .await
        .unwrap();

    let when = Utc::now() - Duration::days(1);
    let game_id = create_game(
        &pool,
        &admin,
        friendly_game(&registered, when, vec![ana.id, bia.id], &[ana.id]),
    )
    .await
    .unwrap();

    // Score changes alone keep the recorded events.
    let mut info_only = friendly_game(&registered, when, vec![ana.id, bia.id], &[bia.id]);
    info_only.info.adversary_score = Some(1);
    let updated = update_game(
        &pool,
        &admin,
        game_id,
        GameUpdateInput {
            game: info_only,
            has_stats_update: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.adversary_score, Some(1));
    assert_eq!(get_player(&pool, admin.team_id, ana.id).await.unwrap().goals, 1);

    let replaced = friendly_game(&registered, when, vec![bia.id], &[bia.id]);
    update_game(
        &pool,
        &admin,
        game_id,
        GameUpdateInput {
            game: replaced,
            has_stats_update: true,
        },
    )
    .await
    .unwrap();

    let ana_now = get_player(&pool, admin.team_id, ana.id).await.unwrap();
    assert_eq!((ana_now.played, ana_now.goals), (0, 0));
    let bia_now = get_player(&pool, admin.team_id, bia.id).await.unwrap();
    assert_eq!((bia_now.played, bia_now.goals), (1, 1));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn recreated_availability_reuses_the_deleted_row(pool: PgPool) {
    let registered = onboard(&pool, "presenca@example.com").await;
    let admin = registered.client_user.clone();
    let ana = create_player(&pool, &admin, player("Ana", 7, StatTotals::default()))
        .await
        .unwrap();
    let athlete = user_for(&pool, &admin, "ana@example.com", Some(ana.id))
        .await
        .unwrap();
    let mut upcoming = friendly_game(&registered, Utc::now() + Duration::days(2), vec![], &[]);
    upcoming.info.team_score = None;
    upcoming.info.adversary_score = None;
    upcoming.stats = GameStats::default();
    let game_id = create_game(&pool, &admin, upcoming).await.unwrap();

    let first = create_availability(
        &pool,
        &athlete,
        AvailabilityCreate {
            game_id,
            status: AvailabilityStatus::Available,
        },
    )
    .await
    .unwrap();
    delete_availability(&pool, &athlete, game_id).await.unwrap();
    assert!(game_availability(&pool, &athlete, game_id)
        .await
        .unwrap()
        .current_player
        .is_none());

    let second = create_availability(
        &pool,
        &athlete,
        AvailabilityCreate {
            game_id,
            status: AvailabilityStatus::Doubt,
        },
    )
    .await
    .unwrap();
    assert_eq!(first, second);

    let grouped = game_availability(&pool, &athlete, game_id).await.unwrap();
    assert_eq!(grouped.doubt.len(), 1);
    assert!(grouped.available.is_empty());
    assert_eq!(grouped.current_player.map(|e| e.id), Some(first));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn a_player_backs_at_most_one_user(pool: PgPool) {
    let registered = onboard(&pool, "vinculo@example.com").await;
    let admin = registered.client_user.clone();
    let ana = create_player(&pool, &admin, player("Ana", 7, StatTotals::default()))
        .await
        .unwrap();

    let first = user_for(&pool, &admin, "ana@example.com", Some(ana.id))
        .await
        .unwrap();
    let taken = user_for(&pool, &admin, "outra@example.com", Some(ana.id)).await;
    assert!(matches!(taken, Err(AppError::PlayerAlreadyLinked)));

    let second = user_for(&pool, &admin, "outra@example.com", None).await.unwrap();
    let relink = update_user(
        &pool,
        &admin,
        second.id,
        UserUpdate {
            player_id: Some(Some(ana.id)),
            ..UserUpdate::default()
        },
    )
    .await;
    assert!(matches!(relink, Err(AppError::PlayerAlreadyLinked)));

    // Re-sending the current link is fine.
    let same = update_user(
        &pool,
        &admin,
        first.id,
        UserUpdate {
            player_id: Some(Some(ana.id)),
            ..UserUpdate::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(same.player_id, Some(ana.id));
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn refresh_token_works_once(pool: PgPool) {
    let registered = onboard(&pool, "sessao@example.com").await;
    user_for(&pool, &registered.client_user, "ana@example.com", None)
        .await
        .unwrap();

    let session = login(&pool, "Ana@Example.com", "senha-forte-123").await.unwrap();
    let rotated = refresh(&pool, &session.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, session.refresh_token);

    let replay = refresh(&pool, &session.refresh_token).await;
    assert!(matches!(replay, Err(AppError::InvalidRefreshToken)));
    assert!(refresh(&pool, &rotated.refresh_token).await.is_ok());
}

#[sqlx::test(migrator = "team_manager_server::db::MIGRATOR")]
async fn overlong_login_password_is_just_wrong(pool: PgPool) {
    let registered = onboard(&pool, "login@example.com").await;
    user_for(&pool, &registered.client_user, "ana@example.com", None)
        .await
        .unwrap();

    let result = login(&pool, "ana@example.com", &"x".repeat(100)).await;
    assert!(matches!(result, Err(AppError::IncorrectCredentials)));
}
