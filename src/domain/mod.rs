//! Business rules that need no database access.

pub mod championship;
pub mod filters;
pub mod game;
pub mod permissions;
pub mod registration;
pub mod types;
