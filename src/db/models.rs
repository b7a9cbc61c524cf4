use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::permissions::Principal;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub emblem_url: Option<String>,
    pub foundation_date: Option<NaiveDate>,
    pub paid_until: NaiveDate,
    pub season_start_date: Option<NaiveDate>,
    pub season_end_date: Option<NaiveDate>,
    pub primary_color: Option<String>,
    pub code: Option<String>,
    pub max_players: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IntentionToSubscribe {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub phone_number: String,
    pub team_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub hashed_password: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_initial_user: bool,
    pub terms_accepted_version: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_admin_privileges(&self) -> bool {
        self.is_admin || self.is_super_admin
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            is_admin: self.is_admin,
            is_super_admin: self.is_super_admin,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LoggedUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TermsOfUse {
    pub id: Uuid,
    pub version: i32,
    pub content: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Championship {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_league_format: bool,
    pub final_stage: Option<String>,
    pub final_position: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Player {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub shirt_number: Option<i32>,
    pub position: String,
    pub has_before_system_stats: bool,
}

/// A player with its stat totals.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlayerWithStats {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub shirt_number: Option<i32>,
    pub position: String,
    pub played: i64,
    pub goals: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub mvps: i64,
    pub has_before_system_stats: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: Uuid,
    pub team_id: Uuid,
    pub championship_id: Uuid,
    pub adversary: String,
    pub date_hour: DateTime<Utc>,
    pub round: Option<i32>,
    pub stage: Option<String>,
    pub is_home: bool,
    pub is_wo: bool,
    pub team_score: Option<i32>,
    pub adversary_score: Option<i32>,
    pub team_penalty_score: Option<i32>,
    pub adversary_penalty_score: Option<i32>,
}

/// Game joined with the name of its championship.
#[derive(Debug, Clone, FromRow)]
pub struct GameWithChampionship {
    #[sqlx(flatten)]
    pub game: Game,
    pub championship_name: String,
}

/// Stat row joined with the player it belongs to (if any).
#[derive(Debug, Clone, FromRow)]
pub struct StatWithPlayer {
    pub id: Uuid,
    pub player_id: Option<Uuid>,
    pub related_stat_id: Option<Uuid>,
    pub stat: String,
    pub quantity: i32,
    pub player_name: Option<String>,
    pub player_shirt_number: Option<i32>,
    pub player_position: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Availability {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub status: String,
    pub player_name: String,
}
