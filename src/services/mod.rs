//! Business operations. Handlers stay thin and call into these.

pub mod admin;
pub mod availability;
pub mod championship;
pub mod cron;
pub mod game;
pub mod player;
pub mod stats;
pub mod team;
pub mod terms;
pub mod user;
