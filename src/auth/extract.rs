use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use tracing::warn;

use crate::auth::{verify, Actor};
use crate::error::AppError;
use crate::state::AppState;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("expected 'Bearer <token>' authorization".to_string())
            })?;

        let claims = verify(&state.auth_secret, token, Utc::now()).map_err(|err| {
            warn!(error = %err, "rejected bearer token");
            AppError::Unauthorized(err.to_string())
        })?;

        Ok(Actor::from(claims))
    }
}
