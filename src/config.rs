use std::env;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Connection parameters shared by every pool the registry builds.
/// Each pool differs only in the database it targets.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Administrative database used only to issue `CREATE DATABASE`.
    pub system_database: String,
    /// Control-plane database holding `companies` and `users`.
    pub control_database: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseSettings {
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseSettings,
    pub encryption_key: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database: DatabaseSettings::from_env()?,
            encryption_key: required("ENCRYPTION_KEY")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".into())
                .parse()?,
        })
    }
}

impl DatabaseSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("PG_HOST").unwrap_or_else(|_| "localhost".into()),
            port: env::var("PG_PORT")
                .unwrap_or_else(|_| "5432".into())
                .parse()?,
            user: required("PG_USER")?,
            password: required("PG_PASSWORD")?,
            system_database: env::var("PG_DEFAULT_DB")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "postgres".into()),
            control_database: env::var("PG_CONTROL_DB")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "nexsys".into()),
            max_connections: env::var("PG_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            acquire_timeout: Duration::from_secs(
                env::var("PG_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".into())
                    .parse()?,
            ),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

#[cfg(test)]
impl DatabaseSettings {
    /// Settings pointing at a port nothing listens on, with a short acquire timeout.
    pub(crate) fn unreachable() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 1,
            user: "nexsys".into(),
            password: "nexsys".into(),
            system_database: "postgres".into(),
            control_database: "nexsys".into(),
            max_connections: 2,
            acquire_timeout: Duration::from_millis(300),
        }
    }
}
