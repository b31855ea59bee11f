//! Authentication extractors for Axum handlers.
//!
//! - [`MaybeUser`]: a token is optional, but an invalid one is rejected.
//! - [`Reader`]: a logged-in user, or any request from the trusted address.
//! - [`Editor`]: a logged-in user, or anyone when anonymous edits are allowed.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use folio_core::error::CoreError;
use folio_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user decoded from a JWT Bearer token in the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
}

/// The authenticated user, if the request carries a token.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<DbId> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(bearer_user(parts, state)?))
    }
}

/// Caller allowed to read pages.
#[derive(Debug, Clone)]
pub struct Reader(pub MaybeUser);

impl FromRequestParts<AppState> for Reader {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = MaybeUser::from_request_parts(parts, state).await?;
        if user.0.is_some() || from_trusted_ip(parts, state) {
            return Ok(Reader(user));
        }
        Err(AppError::Core(CoreError::Unauthorized(
            "Log in to read this wiki".into(),
        )))
    }
}

/// Caller allowed to edit pages and upload images.
#[derive(Debug, Clone)]
pub struct Editor(pub MaybeUser);

impl Editor {
    /// Author to record on revisions; `None` for anonymous edits.
    pub fn author_id(&self) -> Option<DbId> {
        self.0.user_id()
    }
}

impl FromRequestParts<AppState> for Editor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = MaybeUser::from_request_parts(parts, state).await?;
        if user.0.is_some() || state.config.wiki.allow_anonymous_edits {
            return Ok(Editor(user));
        }
        Err(AppError::Core(CoreError::Unauthorized(
            "Log in to edit this wiki".into(),
        )))
    }
}

/// Decode the Bearer token, if any. A present but invalid token is an error.
fn bearer_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(auth_header) = parts.headers.get("authorization") else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

    let claims = validate_token(token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(Some(AuthUser {
        user_id: claims.sub,
    }))
}

fn from_trusted_ip(parts: &Parts, state: &AppState) -> bool {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .is_some_and(|ConnectInfo(addr)| addr.ip() == state.config.wiki.trusted_ip)
}
