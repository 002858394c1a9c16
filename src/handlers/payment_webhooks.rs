use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, warn};

use crate::{errors::ApiError, AppState};

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(payment_webhook))
}

/// Gateway webhook endpoint. Accepts `checkout.session.completed` events and
/// drives payment confirmation for the referenced session; all other event
/// types are acknowledged and ignored.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    request_body = String,
    responses(
        (status = 200, description = "Webhook accepted"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse)
    ),
    tag = "Webhooks"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(secret) = state.config.payment_webhook_secret.as_deref() {
        let ok = verify_signature(
            &headers,
            &body,
            secret,
            state.config.payment_webhook_tolerance_secs,
        );
        if !ok {
            warn!("Payment webhook signature verification failed");
            return Err(ApiError::Unauthorized);
        }
    }

    let json: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid json: {e}")))?;

    let event_type = json.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match event_type {
        "checkout.session.completed" => {
            let session_id = json
                .pointer("/data/object/id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ApiError::BadRequest("webhook event carries no session id".to_string())
                })?;
            let order = state.services.payments.confirm(session_id).await?;
            info!(order_id = %order.id, %session_id, "Order confirmed via webhook");
        }
        _ => {
            info!(%event_type, "Unhandled payment webhook type");
        }
    }

    Ok((StatusCode::OK, "ok"))
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex hmac>`) against the
/// shared secret, rejecting timestamps outside the configured tolerance.
fn verify_signature(headers: &HeaderMap, payload: &Bytes, secret: &str, tolerance_secs: u64) -> bool {
    let Some(header) = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    let mut ts = "";
    let mut v1 = "";
    for part in header.split(',') {
        let mut it = part.trim().splitn(2, '=');
        match (it.next(), it.next()) {
            (Some("t"), Some(val)) => ts = val,
            (Some("v1"), Some(val)) => v1 = val,
            _ => {}
        }
    }
    if ts.is_empty() || v1.is_empty() {
        return false;
    }

    if let Ok(ts_i) = ts.parse::<i64>() {
        let now = chrono::Utc::now().timestamp();
        if (now - ts_i).unsigned_abs() > tolerance_secs {
            return false;
        }
    } else {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(ts.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, v1)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
