//! `AuthUser` extractor: pulls the session JWT from the request, validates
//! it, and injects the caller's context.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use charisma_core::error::AppError;
use charisma_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `?token=` fallback for clients that cannot set headers, such as
/// browser `EventSource`.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Find the bearer token in the `Authorization` header or the `token`
/// query parameter.
pub(crate) fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| AppError::authentication("Invalid Authorization header"))?;
        return value
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"));
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Authentication required"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt_decoder.decode(&token)?;

        Ok(AuthUser(RequestContext::new(
            claims.user_id(),
            claims.role,
            claims.name,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_token() {
        let p = parts(Request::get("/api/health").header(AUTHORIZATION, "Bearer abc.def"));
        assert_eq!(bearer_token(&p).unwrap(), "abc.def");
    }

    #[test]
    fn test_query_token_fallback() {
        let p = parts(Request::get("/api/notifications/stream?token=xyz"));
        assert_eq!(bearer_token(&p).unwrap(), "xyz");
    }

    #[test]
    fn test_missing_or_malformed() {
        assert!(bearer_token(&parts(Request::get("/api/health"))).is_err());
        let p = parts(Request::get("/").header(AUTHORIZATION, "Basic Zm9vOmJhcg=="));
        assert!(bearer_token(&p).is_err());
    }
}
