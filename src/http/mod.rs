pub mod admin;
pub mod auth;
pub mod availability;
pub mod championships;
pub mod cron;
pub mod games;
pub mod health;
pub mod players;
pub mod routes;
pub mod stats;
pub mod storage;
pub mod teams;
pub mod terms_of_use;
pub mod users;
