use axum::{extract::FromRequestParts, http::request::Parts};

use crate::domain::Identity;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Caller identity from the `Authorization: Bearer <token>` header.
///
/// A missing header yields no identity; the service decides whether the
/// operation needs one. A header that is present but malformed, expired or
/// signed with another key is rejected with `TOKEN_INVALID`.
pub struct AuthUser(pub Option<Identity>);

impl AuthUser {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("Authorization") else {
            return Ok(AuthUser(None));
        };
        let auth_header = auth_header.to_str().map_err(|_| AppError::TokenInvalid)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(&state.config.auth.jwt_secret, token).map_err(|_| AppError::TokenInvalid)?;
        if claims.sub.is_empty() {
            return Err(AppError::TokenInvalid);
        }

        Ok(AuthUser(Some(Identity::new(claims.sub))))
    }
}
