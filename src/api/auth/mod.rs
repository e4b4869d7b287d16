//! Authentication API endpoints
//!
//! Login with email and password, and introspection of the presented token.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireCustomer;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::customer::{CustomerProjection, DEFAULT_ROLE};
use crate::infrastructure::auth::token_expiry;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(get_current_customer))
}

/// Login request; the username is the customer's email
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[hidden]")
            .finish()
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub customer: CustomerProjection,
    pub expires_at: String,
}

/// Claims of the presented token
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentCustomerResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub expires_at: String,
}

/// Format a token value for the `Authorization` response header
pub(crate) fn bearer_header(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ApiError::internal("issued token is not a valid header value"))
}

/// Login with email and password
///
/// POST /auth/login
///
/// Returns the token both in the `Authorization` header and in the body.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let customer = state
        .customer_service
        .authenticate(&request.username, &request.password)
        .await?;

    let token = state.token_issuer.issue(&customer.username, DEFAULT_ROLE)?;
    let expires_at = token_expiry(Utc::now(), state.token_issuer.expiration_hours())?;

    debug!(username = %customer.username, "Issued login token");

    let authorization = bearer_header(&token)?;
    let body = LoginResponse {
        token,
        customer,
        expires_at: expires_at.to_rfc3339(),
    };

    Ok(([(header::AUTHORIZATION, authorization)], Json(body)).into_response())
}

/// Describe the authenticated caller
///
/// GET /auth/me
pub async fn get_current_customer(
    RequireCustomer(claims): RequireCustomer,
) -> Result<Json<CurrentCustomerResponse>, ApiError> {
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
        .ok_or_else(|| ApiError::unauthorized("Token expiry is out of range"))?;

    Ok(Json(CurrentCustomerResponse {
        username: claims.sub,
        roles: claims.scopes,
        expires_at: expires_at.to_rfc3339(),
    }))
}
