use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use serde::Deserialize;

/// Backend holding foods, planning entries and the goals row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("unknown APP_STORE '{other}', expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub off_base_url: String,
    pub off_timeout_secs: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Postgres,
            database_url: None,
            db_max_connections: 10,
            db_acquire_timeout_secs: 5,
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: PathBuf::from("static"),
            off_base_url: "https://world.openfoodfacts.org".into(),
            off_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let store = match std::env::var("APP_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.store,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when APP_STORE=postgres");
        }

        Ok(Self {
            store,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            db_acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.db_acquire_timeout_secs),
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port: env_or("APP_PORT", defaults.port),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            off_base_url: std::env::var("OFF_BASE_URL").unwrap_or(defaults.off_base_url),
            off_timeout_secs: env_or("OFF_TIMEOUT_SECS", defaults.off_timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
