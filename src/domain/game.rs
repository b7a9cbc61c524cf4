//! Game payloads and the consistency rules applied before anything is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::deserialize_local_or_utc;
use crate::db::models::Game;
use crate::domain::types::{GameResult, StageOption};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalAndAssist {
    /// `None` for an own goal.
    pub goal_player_id: Option<Uuid>,
    #[serde(default)]
    pub assist_player_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAndQuantity {
    pub player_id: Uuid,
    pub quantity: i32,
}

/// Descriptive fields of a game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameInfo {
    pub championship_id: Uuid,
    pub adversary: String,
    #[serde(deserialize_with = "deserialize_local_or_utc")]
    pub date_hour: DateTime<Utc>,
    #[serde(default)]
    pub round: Option<i32>,
    #[serde(default)]
    pub stage: Option<StageOption>,
    #[serde(default = "default_true")]
    pub is_home: bool,
    #[serde(default)]
    pub is_wo: bool,
    #[serde(default)]
    pub team_score: Option<i32>,
    #[serde(default)]
    pub adversary_score: Option<i32>,
    #[serde(default)]
    pub team_penalty_score: Option<i32>,
    #[serde(default)]
    pub adversary_penalty_score: Option<i32>,
}

fn default_true() -> bool {
    true
}

impl GameInfo {
    /// True when any stored field differs from this input.
    pub fn differs_from(&self, game: &Game) -> bool {
        self.championship_id != game.championship_id
            || self.adversary != game.adversary
            || self.date_hour != game.date_hour
            || self.round != game.round
            || self.stage.map(|s| s.as_str()) != game.stage.as_deref()
            || self.is_home != game.is_home
            || self.is_wo != game.is_wo
            || self.team_score != game.team_score
            || self.adversary_score != game.adversary_score
            || self.team_penalty_score != game.team_penalty_score
            || self.adversary_penalty_score != game.adversary_penalty_score
    }
}

/// Per-player events of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    #[serde(default)]
    pub players: Option<Vec<Uuid>>,
    #[serde(default)]
    pub goals_and_assists: Option<Vec<GoalAndAssist>>,
    #[serde(default)]
    pub yellow_cards: Option<Vec<PlayerAndQuantity>>,
    #[serde(default)]
    pub red_cards: Option<Vec<Uuid>>,
    #[serde(default)]
    pub mvps: Option<Vec<PlayerAndQuantity>>,
}

fn non_empty<T>(items: &Option<Vec<T>>) -> bool {
    items.as_ref().is_some_and(|v| !v.is_empty())
}

fn dedup_keep_order(ids: &mut Vec<Uuid>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

impl GameStats {
    pub fn has_any_event(&self) -> bool {
        non_empty(&self.goals_and_assists)
            || non_empty(&self.yellow_cards)
            || non_empty(&self.red_cards)
            || non_empty(&self.mvps)
    }
}

/// Body of `POST /games`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameInput {
    #[serde(flatten)]
    pub info: GameInfo,
    #[serde(flatten)]
    pub stats: GameStats,
}

/// Body of `PATCH /games/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameUpdateInput {
    #[serde(flatten)]
    pub game: GameInput,
    pub has_stats_update: bool,
}

fn check_range(value: Option<i32>, range: std::ops::RangeInclusive<i32>, message: &str) -> Result<(), AppError> {
    match value {
        Some(v) if !range.contains(&v) => Err(AppError::Validation(message.into())),
        _ => Ok(()),
    }
}

impl GameInput {
    /// Validates the payload and normalizes it (W.O. scores, duplicate ids).
    pub fn sanitize(mut self) -> Result<Self, AppError> {
        let info = &mut self.info;
        let stats = &mut self.stats;

        let adversary_len = info.adversary.chars().count();
        if adversary_len < 1 || adversary_len > 255 {
            return Err(AppError::Validation(
                "Adversary must be between 1 and 255 characters long.".into(),
            ));
        }
        check_range(info.round, 1..=10_000, "Round must be between 1 and 10000 if provided.")?;
        if info.stage.is_some() && info.round.is_some() {
            return Err(AppError::Validation("Can't have both stage and round".into()));
        }

        if info.is_wo {
            info.team_score = Some(3);
            info.adversary_score = Some(0);
            info.team_penalty_score = None;
            info.adversary_penalty_score = None;
            *stats = GameStats::default();
            return Ok(self);
        }

        if info.team_score.is_some() != info.adversary_score.is_some() {
            return Err(AppError::Validation(
                "Must have both team_score and adversary_score or neither".into(),
            ));
        }
        if info.team_penalty_score.is_some() != info.adversary_penalty_score.is_some() {
            return Err(AppError::Validation(
                "Must have both team_penalty_score and adversary_penalty_score or neither".into(),
            ));
        }

        if let Some(players) = stats.players.as_mut() {
            dedup_keep_order(players);
        }
        if let Some(red_cards) = stats.red_cards.as_mut() {
            dedup_keep_order(red_cards);
        }

        check_range(info.team_score, 0..=100, "Team score must be between 0 and 100 if provided.")?;
        check_range(
            info.adversary_score,
            0..=100,
            "Adversary score must be between 0 and 100 if provided.",
        )?;
        check_range(
            info.team_penalty_score,
            0..=100,
            "team_penalty_score must be between 0 and 100 if provided.",
        )?;
        check_range(
            info.adversary_penalty_score,
            0..=100,
            "adversary_penalty_score must be between 0 and 100 if provided.",
        )?;

        if stats.has_any_event() && !non_empty(&stats.players) {
            return Err(AppError::Validation(
                "Players must be provided if any stats are included.".into(),
            ));
        }

        if let (Some(goals), Some(team_score)) = (stats.goals_and_assists.as_ref(), info.team_score) {
            if !goals.is_empty() && goals.len() as i32 != team_score {
                return Err(AppError::Validation(
                    "Can't have more goals and assists than team_score".into(),
                ));
            }
        }
        for pair in stats.goals_and_assists.iter().flatten() {
            match (pair.goal_player_id, pair.assist_player_id) {
                (None, Some(_)) => {
                    return Err(AppError::Validation("Can't assist an own goal".into()));
                }
                (Some(goal), Some(assist)) if goal == assist => {
                    return Err(AppError::Validation(
                        "Can't assist and score at the same time bro".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(self)
    }
}

pub fn game_result(team_score: Option<i32>, adversary_score: Option<i32>, is_wo: bool) -> GameResult {
    let Some(team) = team_score else {
        return GameResult::Pending;
    };
    let adversary = adversary_score.unwrap_or(0);
    // Penalty shootouts do not change the result.
    if is_wo || team > adversary {
        GameResult::Win
    } else if team < adversary {
        GameResult::Loss
    } else {
        GameResult::Draw
    }
}

/// Keeps the first `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
