use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{success_response, success_with_message},
    handlers::orders::OrderResponse,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/confirm", post(confirm_payment))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmPaymentRequest {
    pub session_id: String,
}

/// Open a payment-gateway checkout session for an order
#[utoipa::path(
    post,
    path = "/api/v1/checkout/session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Redirect target", body = crate::services::checkout::CheckoutRedirect),
        (status = 403, description = "Order belongs to another customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway failure", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Checkout"
)]
pub async fn create_session(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let redirect = state
        .services
        .checkout
        .initiate(payload.order_id, user.user_id)
        .await?;
    Ok(success_response(redirect))
}

/// Confirm payment for the order tied to a completed checkout session.
///
/// Idempotent; replaying the same session leaves the order unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/confirm",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Order approved and marked paid"),
        (status = 400, description = "Unknown session or incomplete payment", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already paid through another transaction", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Checkout"
)]
pub async fn confirm_payment(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.payments.confirm(&payload.session_id).await?;
    Ok(success_with_message(
        OrderResponse::from(order),
        "Payment confirmed",
    ))
}
