use chrono::{TimeZone, Utc};
use team_manager_server::domain::game::{
    game_result, GameInfo, GameInput, GameStats, GoalAndAssist, PlayerAndQuantity,
};
use team_manager_server::domain::types::{GameResult, StageOption};
use team_manager_server::error::AppError;
use uuid::Uuid;

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

fn input(team_score: Option<i32>, adversary_score: Option<i32>) -> GameInput {
    GameInput {
        info: GameInfo {
            championship_id: id(99),
            adversary: "Real Várzea".into(),
            date_hour: Utc.with_ymd_and_hms(2024, 5, 10, 23, 0, 0).unwrap(),
            round: None,
            stage: None,
            is_home: true,
            is_wo: false,
            team_score,
            adversary_score,
            team_penalty_score: None,
            adversary_penalty_score: None,
        },
        stats: GameStats::default(),
    }
}

fn message(result: Result<GameInput, AppError>) -> String {
    match result {
        Err(AppError::Validation(msg)) => msg,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn walkover_forces_the_score_and_drops_stats() {
    let mut game = input(Some(0), Some(5));
    game.info.is_wo = true;
    game.info.team_penalty_score = Some(4);
    game.info.adversary_penalty_score = Some(3);
    game.stats.players = Some(vec![id(1)]);

    let game = game.sanitize().unwrap();
    assert_eq!(game.info.team_score, Some(3));
    assert_eq!(game.info.adversary_score, Some(0));
    assert_eq!(game.info.team_penalty_score, None);
    assert_eq!(game.stats, GameStats::default());
}

#[test]
fn scores_come_in_pairs() {
    assert_eq!(
        message(input(Some(1), None).sanitize()),
        "Must have both team_score and adversary_score or neither"
    );

    let mut game = input(Some(1), Some(1));
    game.info.team_penalty_score = Some(5);
    assert_eq!(
        message(game.sanitize()),
        "Must have both team_penalty_score and adversary_penalty_score or neither"
    );
}

#[test]
fn stage_and_round_are_exclusive() {
    let mut game = input(None, None);
    game.info.round = Some(3);
    game.info.stage = Some(StageOption::Final);
    assert_eq!(message(game.sanitize()), "Can't have both stage and round");
}

#[test]
fn score_bounds() {
    assert_eq!(
        message(input(Some(101), Some(0)).sanitize()),
        "Team score must be between 0 and 100 if provided."
    );
    let mut game = input(None, None);
    game.info.round = Some(0);
    assert_eq!(
        message(game.sanitize()),
        "Round must be between 1 and 10000 if provided."
    );
}

#[test]
fn events_need_players() {
    let mut game = input(Some(1), Some(0));
    game.stats.mvps = Some(vec![PlayerAndQuantity {
        player_id: id(1),
        quantity: 1,
    }]);
    assert_eq!(
        message(game.sanitize()),
        "Players must be provided if any stats are included."
    );
}

#[test]
fn goal_count_must_match_team_score() {
    let mut game = input(Some(2), Some(0));
    game.stats.players = Some(vec![id(1)]);
    game.stats.goals_and_assists = Some(vec![GoalAndAssist {
        goal_player_id: Some(id(1)),
        assist_player_id: None,
    }]);
    assert_eq!(
        message(game.sanitize()),
        "Can't have more goals and assists than team_score"
    );
}

#[test]
fn assist_rules() {
    let mut own_goal = input(Some(1), Some(0));
    own_goal.stats.players = Some(vec![id(1)]);
    own_goal.stats.goals_and_assists = Some(vec![GoalAndAssist {
        goal_player_id: None,
        assist_player_id: Some(id(1)),
    }]);
    assert_eq!(message(own_goal.sanitize()), "Can't assist an own goal");

    let mut self_assist = input(Some(1), Some(0));
    self_assist.stats.players = Some(vec![id(1)]);
    self_assist.stats.goals_and_assists = Some(vec![GoalAndAssist {
        goal_player_id: Some(id(1)),
        assist_player_id: Some(id(1)),
    }]);
    assert_eq!(
        message(self_assist.sanitize()),
        "Can't assist and score at the same time bro"
    );
}

#[test]
fn repeated_players_and_red_cards_are_collapsed() {
    let mut game = input(Some(0), Some(0));
    game.stats.players = Some(vec![id(1), id(2), id(1)]);
    game.stats.red_cards = Some(vec![id(2), id(2)]);

    let game = game.sanitize().unwrap();
    assert_eq!(game.stats.players, Some(vec![id(1), id(2)]));
    assert_eq!(game.stats.red_cards, Some(vec![id(2)]));
}

#[test]
fn results_ignore_penalties() {
    assert_eq!(game_result(None, None, false), GameResult::Pending);
    assert_eq!(game_result(Some(2), Some(1), false), GameResult::Win);
    assert_eq!(game_result(Some(1), Some(1), false), GameResult::Draw);
    assert_eq!(game_result(Some(0), Some(3), false), GameResult::Loss);
    assert_eq!(game_result(Some(3), Some(0), true), GameResult::Win);
}
