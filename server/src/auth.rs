// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Request extractors resolving `Authorization: Bearer <token>` to a user.
use crate::handlers::AppError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
};
use common::User;
use tracing::debug;

/// The logged-in user making the request, with the session token used.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// A logged-in user holding the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn unauthenticated() -> AppError {
    AppError::new(StatusCode::UNAUTHORIZED, "Please log in to access this page.")
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(unauthenticated)?;

        let Some(user_id) = state.sessions.resolve(&token).await? else {
            debug!("Rejected unknown session token.");
            return Err(unauthenticated());
        };

        // The session may outlive its user when the store does not cascade.
        let user = state
            .accounts
            .find_user(user_id)
            .await?
            .ok_or_else(unauthenticated)?;

        Ok(CurrentUser { user, token })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(AdminUser(user))
        } else {
            Err(AppError::new(StatusCode::FORBIDDEN, "Admin rights required."))
        }
    }
}
