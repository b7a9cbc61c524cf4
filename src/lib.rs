pub mod config;
pub mod datetime;
pub mod db;
pub mod domain;
pub mod error;
pub mod http;
pub mod metrics;
pub mod password;
pub mod services;
pub mod storage;
