//! Request-scoped identity. Tokens come from the auth provider, this module resolves them
//! and hands the user to handlers through extractors. Nothing is cached across requests.
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use entity::{auth_token, user};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait};

use crate::{error::AppError, state::AppState};

pub const TOKEN_SCHEME: &str = "Token ";

/// Authenticated user, rejects anonymous requests with 401.
pub struct CurrentUser(pub user::Model);

/// Authenticated user if a token was sent.
pub struct MaybeUser(pub Option<user::Model>);

fn token_key(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(TOKEN_SCHEME))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AppError::InvalidToken)?;

    Ok(Some(key.to_string()))
}

pub async fn resolve_user<C: ConnectionTrait>(
    db: &C,
    key: &str,
) -> Result<Option<user::Model>, DbErr> {
    let found = auth_token::Entity::find_by_id(key.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, user)| user))
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = token_key(parts)? else {
            return Ok(Self(None));
        };

        match resolve_user(&state.db, &key).await? {
            Some(user) => Ok(Self(Some(user))),
            None => Err(AppError::InvalidToken),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;

        user.map(Self).ok_or(AppError::Unauthenticated)
    }
}

/// Argon2id PHC string, `$argon2id$v=19$...`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// False for anything that is not a valid PHC string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(hash) = PasswordHash::new(stored) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}
