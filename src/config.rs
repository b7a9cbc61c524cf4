//! Runtime configuration for the Team Manager server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Settings {
    pub database_url: String,
    pub server_addr: String,
    /// Postgres pool size.
    pub db_max_connections: u32,
    /// Connection attempts at startup before giving up.
    pub db_connect_retries: usize,

    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub password_pepper: String,

    /// Guards the `/admin/*/{password}` endpoints.
    pub migrations_pwd: String,
    pub super_user_pwd: String,

    pub friendly_championship_name: String,
    pub before_system_championship_name: String,
    pub demo_user_email: String,

    /// Root directory of the local object store.
    pub storage_dir: String,
    pub storage_public_url: String,
    pub teams_bucket: String,

    /// `local` keeps refresh cookies usable over plain http.
    pub env_config: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

impl Settings {
    fn from_env() -> Self {
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let db_connect_retries = env::var("DB_CONNECT_RETRIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let access_token_expire_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30);

        let refresh_token_expire_days = env::var("REFRESH_TOKEN_EXPIRE_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(7); // one week

        Settings {
            database_url: var_or("DATABASE_URL", ""),
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080"),
            db_max_connections,
            db_connect_retries,
            jwt_secret: var_or("JWT_SECRET", ""),
            access_token_expire_minutes,
            refresh_token_expire_days,
            password_pepper: var_or("PASSWORD_PEPPER", ""),
            migrations_pwd: var_or("MIGRATIONS_PWD", ""),
            super_user_pwd: var_or("SUPER_USER_PWD", ""),
            friendly_championship_name: var_or("FRIENDLY_CHAMPIONSHIP_NAME", "Amistosos"),
            before_system_championship_name: var_or(
                "BEFORE_SYSTEM_CHAMPIONSHIP_NAME",
                "Antes do Sistema",
            ),
            demo_user_email: var_or("DEMO_USER_EMAIL", "demo@teammanager.com.br"),
            storage_dir: var_or("STORAGE_DIR", "./storage"),
            storage_public_url: var_or("STORAGE_PUBLIC_URL", "http://127.0.0.1:8080/files/"),
            teams_bucket: var_or("TEAMS_BUCKET", "teams"),
            env_config: var_or("ENV_CONFIG", "local"),
        }
    }

    pub fn is_local(&self) -> bool {
        self.env_config == "local"
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}

/// Color given to teams that never picked one.
pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";
/// Adversary name used when a game is recorded without one.
pub const DEFAULT_ADVERSARY: &str = "Adversário";
/// Player cap for new teams.
pub const DEFAULT_MAX_PLAYERS: i32 = 30;
