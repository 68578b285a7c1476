// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/api/tasks/{id}",
            put(handlers::edit_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/status", patch(handlers::update_task_status))
        .route("/api/tasks/{id}/share", post(handlers::share_task))
        // Admin-only; the `AdminUser` extractor rejects everyone else with 403.
        .route("/api/admin/users", get(handlers::admin_list_users))
        .route("/api/admin/users/{id}", delete(handlers::admin_delete_user))
        .route(
            "/api/admin/users/{id}/toggle-admin",
            post(handlers::admin_toggle_admin),
        )
        .route("/api/admin/tasks", get(handlers::admin_list_tasks))
        .route(
            "/api/admin/tasks/{id}",
            put(handlers::admin_edit_task).delete(handlers::admin_delete_task),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
