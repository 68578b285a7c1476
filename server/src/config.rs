// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Runtime configuration, read from the environment (and `.env` if present).
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `sqlite://tasks.db` |
//! | `APP_HOST` | `0.0.0.0` |
//! | `APP_PORT` | `3000` |
//! | `SESSION_BACKEND` | `sqlite` (or `memory`) |
//! | `BOOTSTRAP_ADMIN_USERNAME` / `BOOTSTRAP_ADMIN_PASSWORD` | unset |
use anyhow::{Context, Result, bail};
use std::fmt;

const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Sqlite,
    Memory,
}

/// Account guaranteed to exist with admin rights at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session_backend: SessionBackend,
    pub bootstrap_admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("APP_PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("APP_PORT must be a port number, got '{}'", port))?,
            None => 3000,
        };

        let session_backend = match lookup("SESSION_BACKEND").as_deref() {
            None | Some("sqlite") => SessionBackend::Sqlite,
            Some("memory") => SessionBackend::Memory,
            Some(other) => bail!("SESSION_BACKEND must be 'sqlite' or 'memory', got '{}'", other),
        };

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_USERNAME"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (None, None) => None,
            _ => bail!("BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database_url,
            host,
            port,
            session_backend,
            bootstrap_admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
