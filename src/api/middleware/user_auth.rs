//! Customer authentication using bearer tokens

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::auth::TokenClaims;

/// Extractor that requires a valid bearer token.
///
/// The token alone is trusted; no directory lookup is made.
#[derive(Debug, Clone)]
pub struct RequireCustomer(pub TokenClaims);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = state.token_issuer.verify(&token)?;
        debug!(subject = %claims.subject(), "Bearer token accepted");

        Ok(RequireCustomer(claims))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide a token via 'Authorization: Bearer <token>' header",
    ))
}
