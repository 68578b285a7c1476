// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Privileged operations across all users and tasks.
//!
//! Callers are responsible for making sure the actor is an admin; nothing
//! here re-checks it.
use super::validate_title;
use crate::access;
use crate::database;
use crate::error::{ServiceError, ServiceResult};
use common::{AdminTaskPayload, Task, TaskStatus, User};
use sqlx::SqlitePool;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AdminService {
    pool: SqlitePool,
}

impl AdminService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        Ok(database::list_users_in_db(&mut conn).await?)
    }

    pub async fn list_all_tasks(&self) -> ServiceResult<Vec<Task>> {
        let mut conn = self.pool.acquire().await?;
        Ok(database::list_all_tasks_in_db(&mut conn).await?)
    }

    /// Flips the target's admin flag and returns the updated user.
    ///
    /// The protected identity is checked before self-modification, so an
    /// admin named "sinan" toggling themselves gets the protection message.
    pub async fn toggle_admin(&self, actor: &User, target_id: i64) -> ServiceResult<User> {
        let mut tx = database::begin_write(&self.pool).await?;

        let mut target = database::find_user_by_id_in_db(&mut tx, target_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if access::is_protected_identity(&target) {
            warn!("User {} tried to toggle admin status of protected user.", actor.id);
            return Err(ServiceError::Protected(format!(
                "The admin status of \"{}\" cannot be changed.",
                target.username
            )));
        }
        if access::is_self(actor, &target) {
            return Err(ServiceError::SelfModification);
        }

        target.is_admin = !target.is_admin;
        database::set_admin_in_db(&mut tx, target.id, target.is_admin).await?;
        tx.commit().await?;

        info!(
            "Admin status for {} has been {}.",
            target.username,
            if target.is_admin { "granted" } else { "revoked" }
        );
        Ok(target)
    }

    /// Overwrites title and description of any task.
    ///
    /// The status is only taken from the payload when the actor is *not* an
    /// admin. Admins reaching this path therefore can never change status
    /// through it. This mirrors the deployed behaviour and is kept until the
    /// owners of the rule decide otherwise.
    pub async fn admin_edit_task(
        &self,
        actor: &User,
        task_id: i64,
        payload: AdminTaskPayload,
    ) -> ServiceResult<Task> {
        let mut tx = database::begin_write(&self.pool).await?;

        let mut task = database::find_task_in_db(&mut tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        let title = validate_title(&payload.title)?;

        let new_status = match payload.status.as_deref() {
            Some(status) if !actor.is_admin => Some(status.parse::<TaskStatus>()?),
            _ => None,
        };

        database::update_task_details_in_db(&mut tx, task_id, title, payload.description.as_deref())
            .await?;
        if let Some(status) = new_status {
            database::update_task_status_in_db(&mut tx, task_id, status).await?;
            task.status = status;
        }
        tx.commit().await?;

        task.title = title.to_string();
        task.description = payload.description;
        info!("Task {} updated by admin route (user {}).", task_id, actor.id);
        Ok(task)
    }

    /// Deletes any task, no ownership check.
    pub async fn admin_delete_task(&self, actor: &User, task_id: i64) -> ServiceResult<()> {
        let mut tx = database::begin_write(&self.pool).await?;

        if !database::delete_task_in_db(&mut tx, task_id).await? {
            return Err(ServiceError::NotFound);
        }
        tx.commit().await?;

        info!("Task {} deleted by admin {}.", task_id, actor.id);
        Ok(())
    }

    /// Deletes a user with their tasks, the permissions on those tasks, the
    /// permissions granted to them and their sessions. Returns the deleted
    /// user. Admins may delete themselves.
    pub async fn delete_user(&self, actor: &User, target_id: i64) -> ServiceResult<User> {
        let mut tx = database::begin_write(&self.pool).await?;

        let target = database::find_user_by_id_in_db(&mut tx, target_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if access::is_protected_identity(&target) {
            warn!("User {} tried to delete protected user.", actor.id);
            return Err(ServiceError::Protected(format!(
                "The user \"{}\" cannot be deleted.",
                target.username
            )));
        }

        database::delete_user_in_db(&mut tx, target.id).await?;
        tx.commit().await?;

        info!("User \"{}\" has been deleted by admin {}.", target.username, actor.id);
        Ok(target)
    }
}
