// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Operations on users, tasks and permissions.
//!
//! Each service owns a handle to the store and runs every public operation
//! in its own transaction: either all of its writes commit or none do.
pub mod accounts;
pub mod admin;
pub mod sharing;
pub mod tasks;

pub use accounts::AccountService;
pub use admin::AdminService;
pub use sharing::SharingService;
pub use tasks::TaskService;

use crate::error::{ServiceError, ServiceResult};

const MAX_TITLE_LEN: usize = 150;

/// Rejects blank or oversized titles and returns the trimmed title.
pub(crate) fn validate_title(title: &str) -> ServiceResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title cannot be empty.".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "Title cannot be longer than {} characters.",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}
