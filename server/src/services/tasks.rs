// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::validate_title;
use crate::access;
use crate::database;
use crate::error::{ServiceError, ServiceResult};
use common::{Task, TaskPayload, TaskStatus, User};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Task CRUD for regular users, gated by the access rules.
#[derive(Clone)]
pub struct TaskService {
    pool: SqlitePool,
}

impl TaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Admins see every task; everyone else sees the tasks they own plus
    /// the ones shared with them. No task is listed twice.
    pub async fn list_tasks(&self, actor: &User) -> ServiceResult<Vec<Task>> {
        let mut conn = self.pool.acquire().await?;

        let tasks = if actor.is_admin {
            database::list_all_tasks_in_db(&mut conn).await?
        } else {
            database::list_visible_tasks_in_db(&mut conn, actor.id).await?
        };

        debug!("User {} can see {} tasks.", actor.id, tasks.len());
        Ok(tasks)
    }

    /// Creates a task owned by `owner` in the `NOT_STARTED` state.
    pub async fn create_task(&self, owner: &User, payload: TaskPayload) -> ServiceResult<Task> {
        let title = validate_title(&payload.title)?;

        let mut tx = database::begin_write(&self.pool).await?;
        let task =
            database::create_task_in_db(&mut tx, owner.id, title, payload.description.as_deref())
                .await?;
        tx.commit().await?;

        info!("Task created successfully with ID: {}", task.id);
        Ok(task)
    }

    /// Overwrites title and description; the status is left alone.
    pub async fn edit_task(&self, actor: &User, task_id: i64, payload: TaskPayload) -> ServiceResult<Task> {
        let mut tx = database::begin_write(&self.pool).await?;

        let mut task = database::find_task_in_db(&mut tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !access::can_edit_task(actor, &task) {
            return Err(ServiceError::Forbidden);
        }
        let title = validate_title(&payload.title)?;

        database::update_task_details_in_db(&mut tx, task_id, title, payload.description.as_deref())
            .await?;
        tx.commit().await?;

        task.title = title.to_string();
        task.description = payload.description;
        info!("Task {} edited by user {}.", task_id, actor.id);
        Ok(task)
    }

    /// Creates a task when `task_id` is `None`, edits it otherwise.
    pub async fn create_or_edit(
        &self,
        actor: &User,
        task_id: Option<i64>,
        payload: TaskPayload,
    ) -> ServiceResult<Task> {
        match task_id {
            Some(task_id) => self.edit_task(actor, task_id, payload).await,
            None => self.create_task(actor, payload).await,
        }
    }

    /// Owner-only. `new_status` must be one of the enumerated names.
    pub async fn update_status(&self, actor: &User, task_id: i64, new_status: &str) -> ServiceResult<Task> {
        let mut tx = database::begin_write(&self.pool).await?;

        let mut task = database::find_task_in_db(&mut tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !access::can_change_status(actor, &task) {
            return Err(ServiceError::Forbidden);
        }
        let status: TaskStatus = new_status.parse()?;

        database::update_task_status_in_db(&mut tx, task_id, status).await?;
        tx.commit().await?;

        task.status = status;
        info!("Task {} status set to {}.", task_id, status);
        Ok(task)
    }

    /// Owner-only delete. Permissions on the task are removed with it.
    pub async fn delete_task(&self, actor: &User, task_id: i64) -> ServiceResult<()> {
        debug!("Attempting to delete task with ID: {}", task_id);
        let mut tx = database::begin_write(&self.pool).await?;

        let task = database::find_task_in_db(&mut tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !access::can_delete_task(actor, &task) {
            return Err(ServiceError::Forbidden);
        }

        database::delete_task_in_db(&mut tx, task_id).await?;
        tx.commit().await?;

        info!("Task with ID {} deleted successfully.", task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use crate::services::SharingService;

    fn payload(title: &str, description: Option<&str>) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_created_task_is_listed_for_owner() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;

        let task = service.create_task(&alice, payload("Buy milk", None)).await.unwrap();

        let tasks = service.list_tasks(&alice).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(tasks[0].status, TaskStatus::NotStarted);
        assert_eq!(tasks[0].owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;

        let result = service.create_task(&alice, payload("  ", Some("no title"))).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(service.list_tasks(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_hides_unshared_tasks() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let carol = testing::user(&pool, "carol", false).await;
        let admin = testing::user(&pool, "admin", true).await;
        testing::task(&pool, &alice, "Private").await;

        assert!(service.list_tasks(&carol).await.unwrap().is_empty());
        assert_eq!(service.list_tasks(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_ignores_permission_without_view() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let bob = testing::user(&pool, "bob", false).await;
        let task = testing::task(&pool, &alice, "Private").await;

        sqlx::query("INSERT INTO permissions (task_id, user_id, can_view) VALUES (?, ?, 0)")
            .bind(task.id)
            .bind(bob.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(service.list_tasks(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_does_not_repeat_self_shared_task() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let sharing = SharingService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let task = testing::task(&pool, &alice, "Mine").await;

        sharing.share_task(&alice, task.id, "alice").await.unwrap();

        assert_eq!(service.list_tasks(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_agrees_with_visibility_rule() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let sharing = SharingService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let bob = testing::user(&pool, "bob", false).await;
        let carol = testing::user(&pool, "carol", false).await;
        let admin = testing::user(&pool, "admin", true).await;
        let shared = testing::task(&pool, &alice, "Shared").await;
        testing::task(&pool, &alice, "Private").await;
        testing::task(&pool, &bob, "Bob's").await;
        sharing.share_task(&alice, shared.id, "bob").await.unwrap();

        let all = service.list_tasks(&admin).await.unwrap();
        assert_eq!(all.len(), 3);

        for actor in [&alice, &bob, &carol, &admin] {
            let visible: Vec<i64> = service
                .list_tasks(actor)
                .await
                .unwrap()
                .iter()
                .map(|t| t.id)
                .collect();

            let mut conn = pool.acquire().await.unwrap();
            for task in &all {
                let permission = database::find_permission_in_db(&mut conn, task.id, actor.id)
                    .await
                    .unwrap();
                assert_eq!(
                    visible.contains(&task.id),
                    access::can_view_task_list_entry(actor, task, permission.as_ref()),
                    "user {} / task {}",
                    actor.username,
                    task.title
                );
            }
        }
    }

    #[tokio::test]
    async fn test_edit_by_owner_and_admin() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let admin = testing::user(&pool, "admin", true).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;

        let edited = service
            .edit_task(&alice, task.id, payload("Buy oat milk", Some("Two cartons")))
            .await
            .unwrap();
        assert_eq!(edited.title, "Buy oat milk");

        service
            .edit_task(&admin, task.id, payload("Buy soy milk", None))
            .await
            .unwrap();

        let stored = testing::reload_task(&pool, task.id).await.unwrap();
        assert_eq!(stored.title, "Buy soy milk");
        assert_eq!(stored.description, None);
        assert_eq!(stored.status, TaskStatus::NotStarted);
        assert_eq!(stored.owner_id, alice.id);
        assert_eq!(stored.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_edit_errors() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let bob = testing::user(&pool, "bob", false).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;

        let result = service.edit_task(&bob, task.id, payload("Mine now", None)).await;
        assert!(matches!(result, Err(ServiceError::Forbidden)));

        let result = service.edit_task(&alice, 999, payload("Nothing", None)).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));

        assert_eq!(testing::reload_task(&pool, task.id).await.unwrap().title, "Buy milk");
    }

    #[tokio::test]
    async fn test_create_or_edit_dispatches_on_id() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;

        let created = service
            .create_or_edit(&alice, None, payload("Draft", None))
            .await
            .unwrap();
        let edited = service
            .create_or_edit(&alice, Some(created.id), payload("Final", None))
            .await
            .unwrap();

        assert_eq!(created.id, edited.id);
        assert_eq!(service.list_tasks(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_updates_status() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;

        service.update_status(&alice, task.id, "IN_PROGRESS").await.unwrap();

        let stored = testing::reload_task(&pool, task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_non_owner_status_update_is_forbidden_for_every_status() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let bob = testing::user(&pool, "bob", false).await;
        let admin = testing::user(&pool, "admin", true).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;

        for actor in [&bob, &admin] {
            for status in TaskStatus::ALL {
                let result = service.update_status(actor, task.id, status.as_str()).await;
                assert!(matches!(result, Err(ServiceError::Forbidden)));
            }
        }
        assert_eq!(
            testing::reload_task(&pool, task.id).await.unwrap().status,
            TaskStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;

        let result = service.update_status(&alice, task.id, "DONE").await;
        assert!(matches!(result, Err(ServiceError::InvalidStatus(s)) if s == "DONE"));

        let result = service.update_status(&alice, 999, "DONE").await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_is_owner_only_and_cascades() {
        let pool = testing::pool().await;
        let service = TaskService::new(pool.clone());
        let sharing = SharingService::new(pool.clone());
        let alice = testing::user(&pool, "alice", false).await;
        let admin = testing::user(&pool, "admin", true).await;
        testing::user(&pool, "bob", false).await;
        let task = testing::task(&pool, &alice, "Buy milk").await;
        sharing.share_task(&alice, task.id, "bob").await.unwrap();

        let result = service.delete_task(&admin, task.id).await;
        assert!(matches!(result, Err(ServiceError::Forbidden)));

        service.delete_task(&alice, task.id).await.unwrap();
        assert!(testing::reload_task(&pool, task.id).await.is_none());
        assert_eq!(testing::permission_count(&pool).await, 0);

        let result = service.delete_task(&alice, task.id).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
