// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ServiceError;
use crate::state::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    AdminTaskPayload, LoginPayload, LoginResponse, RegisterPayload, ShareOutcome, SharePayload,
    StatusPayload, Task, TaskPayload, User,
};
use tracing::{debug, info};

// --- Accounts ---

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    debug!("Received registration request for {}", payload.username);
    let user = state
        .accounts
        .register(&payload.username, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .accounts
        .authenticate(&payload.username, &payload.password)
        .await?;
    let token = state.sessions.create(user.id).await?;

    info!("User {} logged in.", user.id);
    Ok(Json(LoginResponse { token, user }))
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Result<StatusCode, AppError> {
    state.sessions.revoke(&current.token).await?;
    info!("User {} logged out.", current.user.id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Tasks ---

/// Handler for listing the tasks visible to the current user.
pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.list_tasks(&current.user).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<TaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.tasks.create_or_edit(&current.user, None, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn edit_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .tasks
        .create_or_edit(&current.user, Some(task_id), payload)
        .await?;
    Ok(Json(task))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .tasks
        .update_status(&current.user, task_id, &payload.status)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete_task(&current.user, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn share_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<SharePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let (outcome, permission) = state
        .sharing
        .share_task(&current.user, task_id, &payload.username)
        .await?;

    let (code, message) = match outcome {
        ShareOutcome::Shared => (
            StatusCode::CREATED,
            format!("Task shared successfully with {}", payload.username),
        ),
        ShareOutcome::Upgraded => (
            StatusCode::OK,
            format!(
                "Task has already been shared with {}. Permissions updated.",
                payload.username
            ),
        ),
    };

    Ok((
        code,
        Json(serde_json::json!({
            "message": message,
            "outcome": outcome,
            "permission": permission,
        })),
    ))
}

// --- Admin ---

pub async fn admin_list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.admin.list_users().await?))
}

pub async fn admin_list_tasks(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(state.admin.list_all_tasks().await?))
}

pub async fn admin_toggle_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state.admin.toggle_admin(&admin, user_id).await?;
    let verb = if user.is_admin { "granted" } else { "revoked" };

    Ok(Json(serde_json::json!({
        "message": format!("Admin status for {} has been {}.", user.username, verb),
        "user": user,
    })))
}

pub async fn admin_edit_task(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<AdminTaskPayload>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.admin.admin_edit_task(&admin, task_id, payload).await?))
}

pub async fn admin_delete_task(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.admin.admin_delete_task(&admin, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state.admin.delete_user(&admin, user_id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("User \"{}\" has been deleted successfully.", user.username),
    })))
}

// --- Custom Error Handling ---

/// Error returned by every handler and extractor.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    }
}

/// Failures from the session store.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal server error: {:?}", err);
        Self::internal()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let code = match &err {
            ServiceError::NotFound | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden | ServiceError::Protected(_) | ServiceError::SelfModification => {
                StatusCode::FORBIDDEN
            }
            ServiceError::UsernameTaken => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidStatus(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Credential(_) | ServiceError::Persistence(_) => {
                tracing::error!("Internal server error: {}", err);
                return Self::internal();
            }
        };

        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        debug!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PasswordError;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::UserNotFound("bob".into()), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::Protected("no".into()), StatusCode::FORBIDDEN),
            (ServiceError::SelfModification, StatusCode::FORBIDDEN),
            (ServiceError::UsernameTaken, StatusCode::CONFLICT),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidStatus("DONE".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, code) in cases {
            assert_eq!(AppError::from(err).code, code);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::from(ServiceError::Persistence(anyhow::anyhow!("disk I/O error")));
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred.");

        let err = AppError::from(ServiceError::Credential(PasswordError::HashError("rng".into())));
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("rng"));
    }
}
