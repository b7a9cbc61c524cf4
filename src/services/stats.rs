//! Game statistics: creation from a game payload and the read views.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::config::settings;
use crate::datetime::{brasilia_today, current_month_range, local_day_bounds_utc};
use crate::db::models::{StatWithPlayer, User};
use crate::db::stat_repo::{self, MvpPoints, NewStat, TopScorer};
use crate::db::{championship_repo, game_repo, player_repo};
use crate::domain::game::{game_result, GameStats, GoalAndAssist, PlayerAndQuantity};
use crate::domain::types::{GameResult, StatKind};
use crate::error::{AppError, AppResult};
use crate::services::team::load_team;

/// Name shown for a goal without a player.
pub const OWN_GOAL_LABEL: &str = "Contra";

//////////////////////////////////////////////////
// Creation
//////////////////////////////////////////////////

struct StatWriter<'a> {
    conn: &'a mut PgConnection,
    team_id: Uuid,
    game_id: Uuid,
    created_by: Uuid,
    is_before_system: bool,
}

impl StatWriter<'_> {
    async fn insert(
        &mut self,
        stat: StatKind,
        player_id: Option<Uuid>,
        quantity: i32,
        related_stat_id: Option<Uuid>,
    ) -> AppResult<Uuid> {
        let row = NewStat {
            team_id: self.team_id,
            game_id: self.game_id,
            player_id,
            related_stat_id,
            stat,
            quantity,
            is_before_system: self.is_before_system,
        };
        Ok(stat_repo::insert(&mut *self.conn, &row, self.created_by).await?)
    }
}

fn ensure_in_game(players: &HashSet<Uuid>, player_id: Uuid) -> AppResult<()> {
    if players.contains(&player_id) {
        Ok(())
    } else {
        Err(AppError::StatPlayerNotInGamePlayers)
    }
}

/// Stores the per-player events of a game. Expects a sanitized payload.
///
/// Every listed player gets one `played`; goals get a linked `assist` row
/// when someone assisted them.
pub async fn create_game_stats(
    conn: &mut PgConnection,
    team_id: Uuid,
    game_id: Uuid,
    stats: &GameStats,
    created_by: Uuid,
) -> AppResult<()> {
    let Some(players) = stats.players.as_ref().filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    let found = player_repo::get_by_ids(&mut *conn, team_id, players).await?;
    if found.len() != players.len() {
        return Err(AppError::SomePlayersNotFound);
    }
    let in_game: HashSet<Uuid> = players.iter().copied().collect();

    let mut writer = StatWriter {
        conn,
        team_id,
        game_id,
        created_by,
        is_before_system: false,
    };

    for player_id in players {
        writer.insert(StatKind::Played, Some(*player_id), 1, None).await?;
    }

    for GoalAndAssist {
        goal_player_id,
        assist_player_id,
    } in stats.goals_and_assists.iter().flatten()
    {
        if let Some(scorer) = goal_player_id {
            ensure_in_game(&in_game, *scorer)?;
        }
        if let Some(assistant) = assist_player_id {
            ensure_in_game(&in_game, *assistant)?;
        }
        let goal_id = writer.insert(StatKind::Goal, *goal_player_id, 1, None).await?;
        if let Some(assistant) = assist_player_id {
            writer
                .insert(StatKind::Assist, Some(*assistant), 1, Some(goal_id))
                .await?;
        }
    }

    for PlayerAndQuantity { player_id, quantity } in stats.yellow_cards.iter().flatten() {
        ensure_in_game(&in_game, *player_id)?;
        if *quantity > 2 {
            return Err(AppError::InvalidYellowCardsQuantity);
        }
        writer
            .insert(StatKind::YellowCard, Some(*player_id), *quantity, None)
            .await?;
    }

    for player_id in stats.red_cards.iter().flatten() {
        ensure_in_game(&in_game, *player_id)?;
        writer.insert(StatKind::RedCard, Some(*player_id), 1, None).await?;
    }

    for PlayerAndQuantity { player_id, quantity } in stats.mvps.iter().flatten() {
        ensure_in_game(&in_game, *player_id)?;
        writer
            .insert(StatKind::Mvp, Some(*player_id), *quantity, None)
            .await?;
    }

    Ok(())
}

/// Totals a player had before the team started using the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct StatTotals {
    pub played: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub mvps: i32,
}

impl StatTotals {
    pub fn has_any(&self) -> bool {
        self.played > 0
            || self.goals > 0
            || self.assists > 0
            || self.yellow_cards > 0
            || self.red_cards > 0
            || self.mvps > 0
    }

    fn entries(&self) -> [(StatKind, i32); 6] {
        [
            (StatKind::Played, self.played),
            (StatKind::Goal, self.goals),
            (StatKind::Assist, self.assists),
            (StatKind::YellowCard, self.yellow_cards),
            (StatKind::RedCard, self.red_cards),
            (StatKind::Mvp, self.mvps),
        ]
    }
}

/// Records `totals` for one player inside the before-system game.
pub async fn create_before_system_stats(
    conn: &mut PgConnection,
    team_id: Uuid,
    game_id: Uuid,
    player_id: Uuid,
    totals: &StatTotals,
    created_by: Uuid,
) -> AppResult<()> {
    let mut writer = StatWriter {
        conn,
        team_id,
        game_id,
        created_by,
        is_before_system: true,
    };
    for (kind, quantity) in totals.entries() {
        if quantity > 0 {
            writer.insert(kind, Some(player_id), quantity, None).await?;
        }
    }
    Ok(())
}

//////////////////////////////////////////////////
// Views
//////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalView {
    pub player_name: String,
    pub assist_player_name: Option<String>,
}

/// `GET /stats/{game_id}` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStatsView {
    /// `[position, shirt_number, name]`
    pub players: Vec<(Option<String>, Option<i32>, String)>,
    pub goals_and_assists: Vec<GoalView>,
    pub yellow_cards: Vec<(String, i32)>,
    pub red_cards: Vec<String>,
    pub mvps: Vec<(String, i32)>,
}

fn display_name(stat: &StatWithPlayer) -> String {
    stat.player_name
        .clone()
        .unwrap_or_else(|| OWN_GOAL_LABEL.to_string())
}

/// Assist rows keyed by the goal they point at.
fn assists_by_goal(stats: &[StatWithPlayer]) -> HashMap<Uuid, &StatWithPlayer> {
    stats
        .iter()
        .filter(|s| s.stat == StatKind::Assist.as_str())
        .filter_map(|s| s.related_stat_id.map(|goal| (goal, s)))
        .collect()
}

pub fn build_stats_view(stats: &[StatWithPlayer]) -> GameStatsView {
    let assists = assists_by_goal(stats);
    let mut view = GameStatsView::default();

    for stat in stats {
        let Ok(kind) = stat.stat.parse::<StatKind>() else {
            continue;
        };
        match kind {
            StatKind::Played => view.players.push((
                stat.player_position.clone(),
                stat.player_shirt_number,
                display_name(stat),
            )),
            StatKind::Goal => view.goals_and_assists.push(GoalView {
                player_name: display_name(stat),
                assist_player_name: assists
                    .get(&stat.id)
                    .and_then(|assist| assist.player_name.clone()),
            }),
            StatKind::YellowCard => view.yellow_cards.push((display_name(stat), stat.quantity)),
            StatKind::RedCard => view.red_cards.push(display_name(stat)),
            StatKind::Mvp => view.mvps.push((display_name(stat), stat.quantity)),
            StatKind::Assist => {}
        }
    }

    // Players without a shirt go last.
    view.players
        .sort_by_key(|(_, shirt, _)| (shirt.is_none(), *shirt));
    view.mvps.sort_by(|a, b| b.1.cmp(&a.1));
    view
}

/// The stored stats as the payload that would recreate them.
pub fn build_stats_input(stats: &[StatWithPlayer]) -> GameStats {
    let assists = assists_by_goal(stats);
    let mut players = Vec::new();
    let mut goals_and_assists = Vec::new();
    let mut yellow_cards = Vec::new();
    let mut red_cards = Vec::new();
    let mut mvps = Vec::new();

    for stat in stats {
        let Ok(kind) = stat.stat.parse::<StatKind>() else {
            continue;
        };
        match (kind, stat.player_id) {
            (StatKind::Goal, goal_player_id) => goals_and_assists.push(GoalAndAssist {
                goal_player_id,
                assist_player_id: assists.get(&stat.id).and_then(|a| a.player_id),
            }),
            (StatKind::Played, Some(id)) => players.push(id),
            (StatKind::YellowCard, Some(player_id)) => yellow_cards.push(PlayerAndQuantity {
                player_id,
                quantity: stat.quantity,
            }),
            (StatKind::RedCard, Some(id)) => red_cards.push(id),
            (StatKind::Mvp, Some(player_id)) => mvps.push(PlayerAndQuantity {
                player_id,
                quantity: stat.quantity,
            }),
            _ => {}
        }
    }

    GameStats {
        players: Some(players),
        goals_and_assists: Some(goals_and_assists),
        yellow_cards: Some(yellow_cards),
        red_cards: Some(red_cards),
        mvps: Some(mvps),
    }
}

pub async fn game_stats(db: &PgPool, actor: &User, game_id: Uuid) -> AppResult<GameStatsView> {
    game_repo::get_by_id(db, actor.team_id, game_id, false)
        .await?
        .ok_or(AppError::GameNotFound)?;
    let stats = stat_repo::list_by_game(db, game_id).await?;
    Ok(build_stats_view(&stats))
}

/// Top scorer of the current Brasília month, if anyone scored.
pub async fn month_top_scorer(db: &PgPool, team_id: Uuid) -> AppResult<Option<TopScorer>> {
    let month = current_month_range(brasilia_today());
    let (Some(first), Some(last)) = (month.start(), month.end()) else {
        return Ok(None);
    };
    let (from, _) = local_day_bounds_utc(first);
    let (_, to) = local_day_bounds_utc(last);
    Ok(stat_repo::top_scorer_between(db, team_id, from, to).await?)
}

//////////////////////////////////////////////////
// Season summary
//////////////////////////////////////////////////

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeasonSummary {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub games: i64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub goals_scored: i64,
    pub goals_conceded: i64,
    pub clean_sheets: i64,
    pub season_mvp: Option<MvpPoints>,
}

/// Adds one scored game to the running totals.
pub fn tally(summary: &mut SeasonSummary, team_score: i32, adversary_score: i32, is_wo: bool) {
    summary.games += 1;
    match game_result(Some(team_score), Some(adversary_score), is_wo) {
        GameResult::Win => summary.wins += 1,
        GameResult::Loss => summary.losses += 1,
        GameResult::Draw => summary.draws += 1,
        GameResult::Pending => {}
    }
    summary.goals_scored += i64::from(team_score);
    summary.goals_conceded += i64::from(adversary_score);
    if adversary_score == 0 {
        summary.clean_sheets += 1;
    }
}

pub async fn season_summary(db: &PgPool, team_id: Uuid) -> AppResult<SeasonSummary> {
    let team = load_team(db, team_id).await?;
    let today = brasilia_today();
    let start = team
        .season_start_date
        .or_else(|| NaiveDate::from_ymd_opt(today.year(), 1, 1))
        .unwrap_or(today);
    let end = team.season_end_date;

    let (from, _) = local_day_bounds_utc(start);
    let to = end.map(|e| local_day_bounds_utc(e).1);
    let before_system =
        championship_repo::get_by_name(db, team_id, &settings().before_system_championship_name)
            .await?
            .map(|c| c.id);

    let games = game_repo::scored_between(db, team_id, from, to, before_system).await?;

    let mut summary = SeasonSummary {
        start_date: Some(start),
        end_date: end,
        ..SeasonSummary::default()
    };
    for game in &games {
        if let Some(team_score) = game.team_score {
            tally(&mut summary, team_score, game.adversary_score.unwrap_or(0), game.is_wo);
        }
    }

    if !games.is_empty() {
        let ids: Vec<Uuid> = games.iter().map(|g| g.id).collect();
        summary.season_mvp = stat_repo::top_mvp(db, &ids).await?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(
        id: u128,
        stat: StatKind,
        player: Option<(&str, Option<i32>)>,
        quantity: i32,
        related: Option<u128>,
    ) -> StatWithPlayer {
        StatWithPlayer {
            id: Uuid::from_u128(id),
            player_id: player.map(|_| Uuid::from_u128(id + 1000)),
            related_stat_id: related.map(Uuid::from_u128),
            stat: stat.as_str().into(),
            quantity,
            player_name: player.map(|(name, _)| name.to_string()),
            player_shirt_number: player.and_then(|(_, shirt)| shirt),
            player_position: player.map(|_| "Atacante".to_string()),
        }
    }

    #[test]
    fn view_pairs_goals_with_assists_and_marks_own_goals() {
        let stats = vec![
            stat(1, StatKind::Played, Some(("Danilo", Some(8))), 1, None),
            stat(2, StatKind::Played, Some(("Cláudio", Some(7))), 1, None),
            stat(3, StatKind::Played, Some(("Beto", None)), 1, None),
            stat(4, StatKind::Goal, Some(("Cláudio", Some(7))), 1, None),
            stat(5, StatKind::Assist, Some(("Danilo", Some(8))), 1, Some(4)),
            stat(6, StatKind::Goal, None, 1, None),
            stat(7, StatKind::Mvp, Some(("Danilo", Some(8))), 1, None),
            stat(8, StatKind::Mvp, Some(("Cláudio", Some(7))), 3, None),
            stat(9, StatKind::YellowCard, Some(("Danilo", Some(8))), 2, None),
        ];

        let view = build_stats_view(&stats);
        let shirts: Vec<Option<i32>> = view.players.iter().map(|p| p.1).collect();
        assert_eq!(shirts, vec![Some(7), Some(8), None]);
        assert_eq!(
            view.goals_and_assists,
            vec![
                GoalView {
                    player_name: "Cláudio".into(),
                    assist_player_name: Some("Danilo".into()),
                },
                GoalView {
                    player_name: OWN_GOAL_LABEL.into(),
                    assist_player_name: None,
                },
            ]
        );
        assert_eq!(view.mvps, vec![("Cláudio".into(), 3), ("Danilo".into(), 1)]);
        assert_eq!(view.yellow_cards, vec![("Danilo".into(), 2)]);
    }

    #[test]
    fn stats_input_round_trips_the_goal_links() {
        let stats = vec![
            stat(1, StatKind::Played, Some(("Danilo", Some(8))), 1, None),
            stat(4, StatKind::Goal, Some(("Danilo", Some(8))), 1, None),
            stat(5, StatKind::Assist, Some(("Cláudio", Some(7))), 1, Some(4)),
        ];
        let input = build_stats_input(&stats);
        let goals = input.goals_and_assists.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal_player_id, Some(Uuid::from_u128(1004)));
        assert_eq!(goals[0].assist_player_id, Some(Uuid::from_u128(1005)));
        assert_eq!(input.players, Some(vec![Uuid::from_u128(1001)]));
    }

    #[test]
    fn season_tally_counts_results_and_clean_sheets() {
        let mut summary = SeasonSummary::default();
        tally(&mut summary, 2, 1, false);
        tally(&mut summary, 0, 0, false);
        tally(&mut summary, 1, 3, false);
        tally(&mut summary, 3, 0, true);
        assert_eq!(
            (summary.games, summary.wins, summary.draws, summary.losses),
            (4, 2, 1, 1)
        );
        assert_eq!((summary.goals_scored, summary.goals_conceded), (6, 4));
        assert_eq!(summary.clean_sheets, 2);
    }

    #[test]
    fn before_system_totals_detect_any_stat() {
        assert!(!StatTotals::default().has_any());
        let totals = StatTotals {
            mvps: 1,
            ..StatTotals::default()
        };
        assert!(totals.has_any());
    }
}
