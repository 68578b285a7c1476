// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::database;
use crate::error::{ServiceError, ServiceResult};
use crate::password;
use common::User;
use sqlx::SqlitePool;
use tracing::{debug, info};

const MAX_USERNAME_LEN: usize = 80;

/// Registration, login and user lookup.
#[derive(Clone)]
pub struct AccountService {
    pool: SqlitePool,
}

impl AccountService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a regular (non-admin) user.
    pub async fn register(&self, username: &str, password: &str) -> ServiceResult<User> {
        let username = validate_username(username)?;
        if password.is_empty() {
            return Err(ServiceError::Validation("Password cannot be empty.".to_string()));
        }

        {
            let mut conn = self.pool.acquire().await?;
            if database::find_user_by_username_in_db(&mut conn, username)
                .await?
                .is_some()
            {
                return Err(ServiceError::UsernameTaken);
            }
        }

        let hash = password::hash_password(password)?;

        let mut tx = database::begin_write(&self.pool).await?;
        let user = match database::insert_user_in_db(&mut tx, username, &hash, false).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same name.
            Err(err) if database::is_unique_violation(&err) => {
                return Err(ServiceError::UsernameTaken);
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit().await?;

        info!("Registered user {} with ID {}.", user.username, user.id);
        Ok(user)
    }

    /// Unknown usernames and wrong passwords are reported identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let mut conn = self.pool.acquire().await?;
        let Some((user, hash)) = database::find_credentials_in_db(&mut conn, username).await? else {
            debug!("Login attempt for unknown user.");
            return Err(ServiceError::InvalidCredentials);
        };
        drop(conn);

        if !password::verify_password(password, &hash)? {
            debug!("Wrong password for user {}.", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find_user(&self, user_id: i64) -> ServiceResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        Ok(database::find_user_by_id_in_db(&mut conn, user_id).await?)
    }

    /// Makes sure `username` exists and is an admin. An existing account
    /// keeps its password; a missing one is created with `password`.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<User> {
        let username = validate_username(username)?;

        let mut tx = database::begin_write(&self.pool).await?;
        let user = match database::find_user_by_username_in_db(&mut tx, username).await? {
            Some(mut user) => {
                if !user.is_admin {
                    database::set_admin_in_db(&mut tx, user.id, true).await?;
                    user.is_admin = true;
                }
                user
            }
            None => {
                let hash = password::hash_password(password)?;
                database::insert_user_in_db(&mut tx, username, &hash, true).await?
            }
        };
        tx.commit().await?;

        info!("Admin account {} is ready.", user.username);
        Ok(user)
    }
}

/// Usernames are stored exactly as typed; only blank ones are refused.
fn validate_username(username: &str) -> ServiceResult<&str> {
    if username.trim().is_empty() {
        return Err(ServiceError::Validation("Username cannot be empty.".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ServiceError::Validation(format!(
            "Username cannot be longer than {} characters.",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username)
}
