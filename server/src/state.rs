// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::services::{AccountService, AdminService, SharingService, TaskService};
use crate::session::SessionStore;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything a request handler can reach. Built once by the entry point
/// (or a test) from an explicit store handle.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub accounts: AccountService,
    pub tasks: TaskService,
    pub sharing: SharingService,
    pub admin: AdminService,
}

impl AppState {
    pub fn new(pool: SqlitePool, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            accounts: AccountService::new(pool.clone()),
            tasks: TaskService::new(pool.clone()),
            sharing: SharingService::new(pool.clone()),
            admin: AdminService::new(pool),
        }
    }
}
