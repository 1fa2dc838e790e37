use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body. Unreadable bodies answer with the usual error envelope.
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Invalid(rejection.body_text()))?;
        Ok(Payload(value))
    }
}

/// A body that may be left out entirely; an empty body reads as `T::default()`.
pub struct OptionalPayload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalPayload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Invalid(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalPayload(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(OptionalPayload)
            .map_err(|err| AppError::Invalid(format!("invalid request body: {err}")))
    }
}
