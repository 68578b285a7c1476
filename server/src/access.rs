// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Pure access-control decisions.
//!
//! Every function here looks only at the acting user and the target record.
//! They never touch the store; callers load what they need first.
use common::{Permission, Task, User};

/// Username that can never be deleted or have its admin flag toggled.
pub const PROTECTED_USERNAME: &str = "sinan";

/// Owners and admins may edit title and description.
pub fn can_edit_task(actor: &User, task: &Task) -> bool {
    actor.id == task.owner_id || actor.is_admin
}

/// Status changes are owner-only; being an admin is not enough.
pub fn can_change_status(actor: &User, task: &Task) -> bool {
    actor.id == task.owner_id
}

/// Deletion through the regular task routes is owner-only. The admin
/// routes skip this check entirely.
pub fn can_delete_task(actor: &User, task: &Task) -> bool {
    actor.id == task.owner_id
}

/// Sharing follows the same rule as editing.
pub fn can_share_task(actor: &User, task: &Task) -> bool {
    can_edit_task(actor, task)
}

/// Whether `task` belongs in `actor`'s task list. `permission` is the
/// actor's permission row on the task, if any.
pub fn can_view_task_list_entry(actor: &User, task: &Task, permission: Option<&Permission>) -> bool {
    actor.is_admin
        || actor.id == task.owner_id
        || permission.is_some_and(|p| p.grantee_id == actor.id && p.task_id == task.id && p.can_view)
}

pub fn is_protected_identity(user: &User) -> bool {
    user.username.eq_ignore_ascii_case(PROTECTED_USERNAME)
}

pub fn is_self(actor: &User, user: &User) -> bool {
    actor.id == user.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::TaskStatus;

    fn user(id: i64, username: &str, is_admin: bool) -> User {
        User {
            id,
            username: username.to_string(),
            is_admin,
        }
    }

    fn task_owned_by(owner_id: i64) -> Task {
        Task {
            id: 10,
            title: "Buy milk".to_string(),
            description: None,
            status: TaskStatus::NotStarted,
            owner_id,
            created_at: Utc::now(),
        }
    }

    fn permission(task_id: i64, grantee_id: i64, can_view: bool) -> Permission {
        Permission {
            id: 1,
            task_id,
            grantee_id,
            can_view,
            can_view_status: true,
        }
    }

    #[test]
    fn test_edit_allows_owner_and_admin() {
        let task = task_owned_by(1);
        assert!(can_edit_task(&user(1, "alice", false), &task));
        assert!(can_edit_task(&user(2, "admin", true), &task));
        assert!(!can_edit_task(&user(3, "bob", false), &task));
    }

    #[test]
    fn test_status_change_is_owner_only_even_for_admins() {
        let task = task_owned_by(1);
        assert!(can_change_status(&user(1, "alice", false), &task));
        assert!(!can_change_status(&user(2, "admin", true), &task));
        assert!(!can_change_status(&user(3, "bob", false), &task));
    }

    #[test]
    fn test_regular_delete_is_owner_only() {
        let task = task_owned_by(1);
        assert!(can_delete_task(&user(1, "alice", false), &task));
        assert!(!can_delete_task(&user(2, "admin", true), &task));
    }

    #[test]
    fn test_list_entry_visibility() {
        let task = task_owned_by(1);
        let bob = user(3, "bob", false);

        assert!(can_view_task_list_entry(&user(1, "alice", false), &task, None));
        assert!(can_view_task_list_entry(&user(2, "admin", true), &task, None));
        assert!(!can_view_task_list_entry(&bob, &task, None));
        assert!(can_view_task_list_entry(&bob, &task, Some(&permission(10, 3, true))));

        // A row with can_view unset grants nothing, nor does someone else's row.
        assert!(!can_view_task_list_entry(&bob, &task, Some(&permission(10, 3, false))));
        assert!(!can_view_task_list_entry(&bob, &task, Some(&permission(10, 4, true))));
    }

    #[test]
    fn test_protected_identity_ignores_case() {
        for name in ["sinan", "Sinan", "SiNaN", "SINAN"] {
            assert!(is_protected_identity(&user(5, name, false)));
        }
        assert!(!is_protected_identity(&user(5, "sinan2", false)));
        assert!(!is_protected_identity(&user(5, "alice", true)));
    }

    #[test]
    fn test_is_self_compares_ids() {
        let admin = user(2, "admin", true);
        assert!(is_self(&admin, &user(2, "renamed", true)));
        assert!(!is_self(&admin, &user(3, "admin", true)));
    }
}
