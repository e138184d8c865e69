//! JSON body extractor that runs `validator` rules.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use charisma_core::error::AppError;

use crate::error::ApiError;

/// A deserialized and validated JSON body. Malformed bodies and failed
/// validation both become `400 VALIDATION_ERROR`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
{
    /// Parse and validate an already buffered body. Handlers that must
    /// authorize before looking at the payload take `Bytes` and call this.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let Json(value) = Json::<T>::from_bytes(bytes)
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Body {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_from_bytes() {
        let ValidatedJson(body) = ValidatedJson::<Body>::from_bytes(br#"{"name":"x"}"#).unwrap();
        assert_eq!(body.name, "x");
        assert!(ValidatedJson::<Body>::from_bytes(br#"{"name":""}"#).is_err());
        assert!(ValidatedJson::<Body>::from_bytes(b"{").is_err());
    }
}
