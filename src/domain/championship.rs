//! Championship rules: status, input consistency and listing order.

use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Reverse;
use std::str::FromStr;

use crate::datetime::Interval;
use crate::db::models::Championship;
use crate::domain::types::{ChampionshipStatus, StageOption};
use crate::error::AppError;

pub fn status_on(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> ChampionshipStatus {
    if start > today {
        ChampionshipStatus::NaoIniciado
    } else if end.is_some_and(|end| end < today) {
        ChampionshipStatus::Finalizado
    } else {
        ChampionshipStatus::EmAndamento
    }
}

/// Whether `date` falls inside the championship (open end allowed).
pub fn date_is_within(championship: &Championship, date: NaiveDate) -> bool {
    Interval::new(Some(championship.start_date), championship.end_date)
        .map(|interval| interval.contains(date))
        .unwrap_or(false)
}

/// In progress first, then upcoming, then finished; latest start first inside each group.
pub fn order_by_status_and_start_date(championships: &mut [Championship], today: NaiveDate) {
    fn rank(status: ChampionshipStatus) -> u8 {
        match status {
            ChampionshipStatus::EmAndamento => 0,
            ChampionshipStatus::NaoIniciado => 1,
            ChampionshipStatus::Finalizado => 2,
        }
    }
    championships.sort_by_key(|c| {
        (
            rank(status_on(c.start_date, c.end_date, today)),
            Reverse(c.start_date),
        )
    });
}

/// Body of championship create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChampionshipInput {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_league_format: bool,
    #[serde(default)]
    pub final_stage: Option<StageOption>,
    #[serde(default)]
    pub final_position: Option<i32>,
}

impl ChampionshipInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > 255 {
            return Err(AppError::Validation(
                "Name must be between 1 and 255 characters long.".into(),
            ));
        }
        if self.final_position.is_some_and(|p| !(1..=200).contains(&p)) {
            return Err(AppError::Validation(
                "Final position must be between 1 and 200 if provided.".into(),
            ));
        }
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(AppError::StartDateBiggerThanEnd);
        }
        if (self.final_stage.is_some() || self.final_position.is_some()) && self.end_date.is_none() {
            return Err(AppError::FinalAttributeWithoutEndDate);
        }
        if self.is_league_format && self.final_stage.is_some() {
            return Err(AppError::LeagueFormatCantHaveFinalStage);
        }
        if !self.is_league_format && self.final_position.is_some() {
            return Err(AppError::KnockOutCantHaveFinalPosition);
        }
        Ok(())
    }

    /// The stored championship seen as an input, for change detection.
    pub fn from_stored(championship: &Championship) -> Self {
        ChampionshipInput {
            name: championship.name.clone(),
            start_date: championship.start_date,
            end_date: championship.end_date,
            is_league_format: championship.is_league_format,
            final_stage: championship
                .final_stage
                .as_deref()
                .and_then(|s| StageOption::from_str(s).ok()),
            final_position: championship.final_position,
        }
    }

    pub fn changed_any_field_but_end_date(&self, current: &ChampionshipInput) -> bool {
        self.name != current.name
            || self.start_date != current.start_date
            || self.is_league_format != current.is_league_format
            || self.final_stage != current.final_stage
            || self.final_position != current.final_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input() -> ChampionshipInput {
        ChampionshipInput {
            name: "Copa do Bairro".into(),
            start_date: d(2024, 3, 1),
            end_date: Some(d(2024, 6, 30)),
            is_league_format: false,
            final_stage: Some(StageOption::SemiFinal),
            final_position: None,
        }
    }

    #[test]
    fn status_follows_today() {
        let today = d(2024, 5, 1);
        assert_eq!(status_on(d(2024, 6, 1), None, today), ChampionshipStatus::NaoIniciado);
        assert_eq!(status_on(d(2024, 1, 1), Some(d(2024, 4, 30)), today), ChampionshipStatus::Finalizado);
        assert_eq!(status_on(d(2024, 1, 1), Some(d(2024, 5, 1)), today), ChampionshipStatus::EmAndamento);
        assert_eq!(status_on(d(2024, 5, 1), None, today), ChampionshipStatus::EmAndamento);
    }

    #[test]
    fn valid_knockout_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn end_before_start_fails() {
        let mut i = input();
        i.end_date = Some(d(2024, 2, 1));
        assert!(matches!(i.validate(), Err(AppError::StartDateBiggerThanEnd)));
    }

    #[test]
    fn final_stage_requires_end_date() {
        let mut i = input();
        i.end_date = None;
        assert!(matches!(i.validate(), Err(AppError::FinalAttributeWithoutEndDate)));
    }

    #[test]
    fn league_cannot_have_final_stage() {
        let mut i = input();
        i.is_league_format = true;
        assert!(matches!(i.validate(), Err(AppError::LeagueFormatCantHaveFinalStage)));
    }

    #[test]
    fn knockout_cannot_have_final_position() {
        let mut i = input();
        i.final_stage = None;
        i.final_position = Some(3);
        assert!(matches!(i.validate(), Err(AppError::KnockOutCantHaveFinalPosition)));
    }

    #[test]
    fn only_end_date_change_is_detected() {
        let current = input();
        let mut update = input();
        update.end_date = Some(d(2024, 7, 31));
        assert!(!update.changed_any_field_but_end_date(&current));
        update.name = "Copa da Cidade".into();
        assert!(update.changed_any_field_but_end_date(&current));
    }
}
