// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::access;
use crate::database;
use crate::error::{ServiceError, ServiceResult};
use common::{Permission, ShareOutcome, User};
use sqlx::SqlitePool;
use tracing::info;

#[derive(Clone)]
pub struct SharingService {
    pool: SqlitePool,
}

impl SharingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Gives `grantee_username` full view access to a task.
    ///
    /// Only the owner or an admin may share. Sharing twice with the same user
    /// upgrades the existing permission instead of adding a second one.
    pub async fn share_task(
        &self,
        actor: &User,
        task_id: i64,
        grantee_username: &str,
    ) -> ServiceResult<(ShareOutcome, Permission)> {
        let mut tx = database::begin_write(&self.pool).await?;

        let task = database::find_task_in_db(&mut tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !access::can_share_task(actor, &task) {
            return Err(ServiceError::Forbidden);
        }

        let grantee = database::find_user_by_username_in_db(&mut tx, grantee_username)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(grantee_username.to_string()))?;

        // Only decides what to report; the upsert below is what keeps a
        // single row per (task, grantee) under concurrent shares.
        let existed = database::find_permission_in_db(&mut tx, task.id, grantee.id)
            .await?
            .is_some();
        let permission = database::upsert_view_permission_in_db(&mut tx, task.id, grantee.id).await?;
        tx.commit().await?;

        let outcome = if existed {
            ShareOutcome::Upgraded
        } else {
            ShareOutcome::Shared
        };
        info!(
            "Task {} shared with {} ({:?}) by user {}.",
            task.id, grantee.username, outcome, actor.id
        );
        Ok((outcome, permission))
    }
}
