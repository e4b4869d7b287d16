//! Customer directory endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::auth::bearer_header;
use crate::api::middleware::RequireCustomer;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::customer::{
    CustomerId, CustomerProjection, RegistrationRequest, UpdateRequest, DEFAULT_ROLE,
};
use crate::domain::DomainError;

/// Create the customer router
pub fn create_customer_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(register_customer))
        .route(
            "/{customer_id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn parse_customer_id(raw: &str) -> Result<CustomerId, ApiError> {
    raw.parse::<CustomerId>()
        .map_err(|e| ApiError::from(DomainError::invalid_id(e.to_string())))
}

/// GET /api/v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
) -> Result<Json<Vec<CustomerProjection>>, ApiError> {
    debug!(caller = %caller.subject(), "Listing customers");

    let customers = state.customer_service.list_all().await?;

    Ok(Json(customers))
}

/// GET /api/v1/customers/{customer_id}
pub async fn get_customer(
    State(state): State<AppState>,
    RequireCustomer(_caller): RequireCustomer,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerProjection>, ApiError> {
    let id = parse_customer_id(&customer_id)?;
    debug!(customer_id = %id, "Getting customer");

    let customer = state.customer_service.get_by_id(id).await?;

    Ok(Json(customer))
}

/// POST /api/v1/customers
///
/// Open to anonymous callers. The token for the new customer is returned in
/// the `Authorization` header with an empty body.
pub async fn register_customer(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Response, ApiError> {
    debug!(email = %request.email, "Registering customer");

    let email = request.email.clone();
    state.customer_service.register(request).await?;

    let token = state.token_issuer.issue(&email, DEFAULT_ROLE)?;

    Ok((StatusCode::OK, [(header::AUTHORIZATION, bearer_header(&token)?)]).into_response())
}

/// DELETE /api/v1/customers/{customer_id}
pub async fn delete_customer(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    Path(customer_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_customer_id(&customer_id)?;
    debug!(customer_id = %id, caller = %caller.subject(), "Deleting customer");

    state.customer_service.delete(id).await?;

    Ok(StatusCode::OK)
}

/// PUT /api/v1/customers/{customer_id}
pub async fn update_customer(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    Path(customer_id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_customer_id(&customer_id)?;
    debug!(customer_id = %id, caller = %caller.subject(), "Updating customer");

    state.customer_service.update(id, request).await?;

    Ok(StatusCode::OK)
}
