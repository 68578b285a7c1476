// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::password::PasswordError;

/// Outcome of a failed service operation.
///
/// Services never render messages for a particular surface; the HTTP layer
/// decides status codes and wording from the variant.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found.")]
    NotFound,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Username already exists. Please choose a different one.")]
    UsernameTaken,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Invalid status '{0}'.")]
    InvalidStatus(String),

    #[error("User '{0}' not found.")]
    UserNotFound(String),

    /// Carries the full refusal message, which depends on the attempted action.
    #[error("{0}")]
    Protected(String),

    #[error("You cannot change your own admin status.")]
    SelfModification,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Credential(#[from] PasswordError),

    #[error("Persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Persistence(err.into())
    }
}

impl From<common::UnknownStatus> for ServiceError {
    fn from(err: common::UnknownStatus) -> Self {
        ServiceError::InvalidStatus(err.0)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
