// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Login sessions.
//!
//! A session is an opaque bearer token mapped to a user id. Services never
//! see tokens; the HTTP layer resolves a token to a user before calling them.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rand::{Rng, distributions::Alphanumeric};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

const TOKEN_LENGTH: usize = 48;

/// Maps session tokens to user ids.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a session for `user_id` and returns its token.
    async fn create(&self, user_id: i64) -> Result<String>;

    /// The user a token belongs to, or `None` for unknown/revoked tokens.
    async fn resolve(&self, token: &str) -> Result<Option<i64>>;

    /// Ends a session. Revoking an unknown token is not an error.
    async fn revoke(&self, token: &str) -> Result<()>;
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Sessions persisted in the `sessions` table; they survive restarts and
/// disappear with their user.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, user_id: i64) -> Result<String> {
        let token = generate_token();

        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to store session")?;

        debug!("Opened session for user {}", user_id);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to resolve session")
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to revoke session")?;

        Ok(())
    }
}

/// Process-local sessions, lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, i64>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: i64) -> Result<String> {
        let token = generate_token();
        self.sessions.write().insert(token.clone(), user_id);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        Ok(self.sessions.read().get(token).copied())
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        self.sessions.write().remove(token);
        Ok(())
    }
}
