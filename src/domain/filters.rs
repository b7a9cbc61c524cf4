//! Bodies of the `*/filter` endpoints and their sort orders.
//!
//! Every field is optional; an absent field does not restrict the result.
//! Sort orders are closed enums so only known columns ever reach the SQL.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::datetime::{deserialize_opt_local_or_utc, Interval};
use crate::domain::types::{
    ChampionshipFormat, ChampionshipStatus, PlayerPosition, StageOption, StatKind,
};
use crate::error::AppError;

//////////////////////////////////////////////////
// Ranges
//////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NumberRange {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

impl NumberRange {
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.min, self.max) {
            (None, None) => Err(AppError::Validation(
                "At least one of min or max must be provided.".into(),
            )),
            (Some(min), Some(max)) if min > max => {
                Err(AppError::Validation("Min cannot be bigger than max.".into()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn interval(&self) -> Result<Interval<NaiveDate>, AppError> {
        Ok(Interval::new(self.start, self.end)?)
    }
}

//////////////////////////////////////////////////
// Sort orders
//////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChampionshipOrder {
    NameAsc,
    NameDesc,
    StartDateAsc,
    StartDateDesc,
    EndDateAsc,
    EndDateDesc,
}

impl ChampionshipOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::NameAsc => "name ASC",
            Self::NameDesc => "name DESC",
            Self::StartDateAsc => "start_date ASC",
            Self::StartDateDesc => "start_date DESC",
            Self::EndDateAsc => "end_date ASC NULLS LAST",
            Self::EndDateDesc => "end_date DESC NULLS LAST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerOrder {
    NameAsc,
    NameDesc,
    ShirtNumberAsc,
    ShirtNumberDesc,
}

impl PlayerOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::NameAsc => "p.name ASC",
            Self::NameDesc => "p.name DESC",
            Self::ShirtNumberAsc => "p.shirt_number ASC NULLS LAST",
            Self::ShirtNumberDesc => "p.shirt_number DESC NULLS LAST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOrder {
    DateHourAsc,
    #[default]
    DateHourDesc,
    TeamScoreAsc,
    TeamScoreDesc,
    AdversaryScoreAsc,
    AdversaryScoreDesc,
}

impl GameOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::DateHourAsc => "g.date_hour ASC",
            Self::DateHourDesc => "g.date_hour DESC",
            Self::TeamScoreAsc => "g.team_score ASC",
            Self::TeamScoreDesc => "g.team_score DESC",
            Self::AdversaryScoreAsc => "g.adversary_score ASC",
            Self::AdversaryScoreDesc => "g.adversary_score DESC",
        }
    }

    /// Score orders leave unscored games out of the result.
    pub fn required_column(self) -> Option<&'static str> {
        match self {
            Self::TeamScoreAsc | Self::TeamScoreDesc => Some("g.team_score"),
            Self::AdversaryScoreAsc | Self::AdversaryScoreDesc => Some("g.adversary_score"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

//////////////////////////////////////////////////
// Filters
//////////////////////////////////////////////////

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChampionshipFilter {
    pub name: Option<String>,
    pub status: Option<Vec<ChampionshipStatus>>,
    pub format: Option<ChampionshipFormat>,
    pub final_stages: Option<Vec<StageOption>>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub end_date_from: Option<NaiveDate>,
    pub end_date_to: Option<NaiveDate>,
    pub order_by: Option<ChampionshipOrder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerFilter {
    pub name: Option<String>,
    pub shirt_number: Option<i32>,
    pub positions: Option<Vec<PlayerPosition>>,
    pub order_by: Option<PlayerOrder>,
}

fn default_true() -> bool {
    true
}

/// Body of `POST /players/stats-filter`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayersStatsFilter {
    #[serde(default)]
    pub stat_name: StatKind,
    #[serde(default)]
    pub quantity_range: Option<NumberRange>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub championships: Option<Vec<Uuid>>,
    #[serde(default = "default_true")]
    pub exclude_friendly: bool,
    #[serde(default)]
    pub stages: Option<Vec<StageOption>>,
    #[serde(default)]
    pub players: Option<Vec<Uuid>>,
    #[serde(default)]
    pub player_positions: Option<Vec<PlayerPosition>>,
    #[serde(default)]
    pub order_by: Option<SortDirection>,
}

impl Default for PlayersStatsFilter {
    fn default() -> Self {
        PlayersStatsFilter {
            stat_name: StatKind::Goal,
            quantity_range: None,
            date_range: None,
            championships: None,
            exclude_friendly: true,
            stages: None,
            players: None,
            player_positions: None,
            order_by: None,
        }
    }
}

impl PlayersStatsFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(range) = &self.quantity_range {
            range.validate()?;
        }
        if let Some(range) = &self.date_range {
            range.interval()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameFilter {
    pub championship_id: Option<Uuid>,
    pub adversary: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_local_or_utc")]
    pub date_hour_from: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_opt_local_or_utc")]
    pub date_hour_to: Option<DateTime<Utc>>,
    pub round: Option<i32>,
    pub stages: Option<Vec<StageOption>>,
    pub is_home: Option<bool>,
    pub is_wo: Option<bool>,
    pub team_score_from: Option<i32>,
    pub team_score_to: Option<i32>,
    pub adversary_score_from: Option<i32>,
    pub adversary_score_to: Option<i32>,
    pub has_penalty_score: Option<bool>,
    pub order_by: Option<GameOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_range_needs_a_bound() {
        let empty = NumberRange { min: None, max: None };
        assert!(empty.validate().is_err());
        let inverted = NumberRange { min: Some(5), max: Some(1) };
        assert!(inverted.validate().is_err());
        let open = NumberRange { min: Some(2), max: None };
        assert!(open.validate().is_ok());
    }

    #[test]
    fn stats_filter_defaults() {
        let filter: PlayersStatsFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.stat_name, StatKind::Goal);
        assert!(filter.exclude_friendly);
        assert!(filter.order_by.is_none());
    }

    #[test]
    fn unknown_order_is_rejected() {
        let parsed = serde_json::from_str::<GameFilter>(r#"{"order_by": "round_asc"}"#);
        assert!(parsed.is_err());
        let parsed: GameFilter =
            serde_json::from_str(r#"{"order_by": "team_score_desc"}"#).unwrap();
        assert_eq!(parsed.order_by.and_then(GameOrder::required_column), Some("g.team_score"));
    }

    #[test]
    fn naive_filter_dates_are_brasilia() {
        let parsed: GameFilter =
            serde_json::from_str(r#"{"date_hour_from": "2024-05-10T00:00:00"}"#).unwrap();
        assert_eq!(
            parsed.date_hour_from.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-05-10T03:00:00+00:00")
        );
    }
}
