//! Configuration loading and management
//!
//! The storage backend is chosen by explicit configuration resolved once at
//! startup ([`AppConfig::from_env`] in `main`) and passed into the store
//! constructor — never by ambient globals inspected at import time.
//!
//! Environment variables (a `.env` file is honored):
//!
//! - `LISTEN_ADDR` — bind address, default `127.0.0.1:8000`
//! - `DB_ENGINE` — `SQLITE` (default), `POSTGRESQL`, or `MEMORY`
//! - `DB_PATH` — SQLite file path, default `./carte.db`
//! - `DB_USERNAME` / `DB_PASSWORD` / `DB_SERVICE` / `DB_DATABASE` —
//!   PostgreSQL connection settings

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Connection settings for the PostgreSQL backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DbSettings {
    pub username: String,
    pub password: String,
    /// Host (optionally `host:port`) of the database service.
    pub service: String,
    pub database: String,
}

impl DbSettings {
    /// Read the `DB_*` variables from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            username: require_env("DB_USERNAME")?,
            password: require_env("DB_PASSWORD")?,
            service: require_env("DB_SERVICE")?,
            database: require_env("DB_DATABASE")?,
        })
    }

    /// The sqlx connection URL for these settings.
    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}/{}",
            self.username, self.password, self.service, self.database
        )
    }
}

/// Which storage backend to run against.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Process-local store; state is lost on restart.
    Memory,
    /// Embedded single-file SQLite database.
    Sqlite { path: PathBuf },
    /// Networked PostgreSQL database.
    Postgres(DbSettings),
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub store: StoreBackend,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    ///
    /// `DB_ENGINE` unset defaults to the embedded SQLite store, matching
    /// the service's historical default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let store = match env::var("DB_ENGINE").ok().as_deref() {
            None | Some("SQLITE") => StoreBackend::Sqlite {
                path: env::var("DB_PATH")
                    .unwrap_or_else(|_| "./carte.db".to_string())
                    .into(),
            },
            Some("POSTGRESQL") => StoreBackend::Postgres(DbSettings::from_env()?),
            Some("MEMORY") => StoreBackend::Memory,
            Some(other) => bail!("unsupported DB_ENGINE value: {}", other),
        };

        Ok(Self { listen_addr, store })
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required environment variable {}", key))
}
