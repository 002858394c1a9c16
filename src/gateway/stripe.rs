//! Stripe REST client implementing the [`PaymentGateway`] trait.
//!
//! Uses the form-encoded `/v1` API surface directly: checkout session
//! creation, retrieval with an expanded payment intent, and recurring price
//! lookup by key.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{instrument, warn};

use super::{
    CheckoutLineItem, CheckoutSession, CreateSessionRequest, PaymentGateway, RecurringPrice,
};
use crate::errors::ServiceError;

pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base.trim_end_matches('/'), path)
    }
}

/// Wire shape of a Stripe checkout session. `payment_intent` and
/// `subscription` arrive as ids or expanded objects depending on the request.
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    payment_intent: Option<serde_json::Value>,
    subscription: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StripePriceList {
    data: Vec<RecurringPrice>,
}

fn reference_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Object(obj) => obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let transaction_id = session
            .payment_intent
            .as_ref()
            .and_then(reference_id)
            .or_else(|| session.subscription.as_ref().and_then(reference_id));
        CheckoutSession {
            id: session.id,
            url: session.url,
            metadata: session.metadata,
            transaction_id,
        }
    }
}

/// Flattens a session request into Stripe's bracketed form encoding.
fn session_form(request: &CreateSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = Vec::new();

    let mode = match request.mode {
        super::CheckoutMode::Payment => "payment",
        super::CheckoutMode::Subscription => "subscription",
    };
    form.push(("mode".into(), mode.into()));
    form.push(("success_url".into(), request.success_url.clone()));
    form.push(("cancel_url".into(), request.cancel_url.clone()));

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    for (index, item) in request.line_items.iter().enumerate() {
        match item {
            CheckoutLineItem::Priced {
                name,
                description,
                image_url,
                currency,
                unit_amount_minor,
                quantity,
            } => {
                let prefix = format!("line_items[{index}][price_data]");
                form.push((format!("{prefix}[currency]"), currency.to_lowercase()));
                form.push((
                    format!("{prefix}[unit_amount]"),
                    unit_amount_minor.to_string(),
                ));
                form.push((format!("{prefix}[product_data][name]"), name.clone()));
                form.push((
                    format!("{prefix}[product_data][description]"),
                    description.clone(),
                ));
                if let Some(url) = image_url {
                    form.push((format!("{prefix}[product_data][images][0]"), url.clone()));
                }
                form.push((format!("line_items[{index}][quantity]"), quantity.to_string()));
            }
            CheckoutLineItem::RecurringPrice { price_id, quantity } => {
                form.push((format!("line_items[{index}][price]"), price_id.clone()));
                form.push((format!("line_items[{index}][quantity]"), quantity.to_string()));
            }
        }
    }

    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let form = session_form(&request);
        let response = self
            .client
            .post(self.endpoint("checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("session create failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Gateway rejected checkout session creation");
            return Err(ServiceError::GatewayError(format!(
                "session create returned {status}: {body}"
            )));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("malformed session response: {e}")))?;
        Ok(session.into())
    }

    #[instrument(skip(self))]
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("checkout/sessions/{session_id}")))
            .bearer_auth(&self.secret_key)
            .query(&[("expand[]", "payment_intent")])
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("session retrieve failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(ServiceError::GatewayError(format!(
                "session retrieve returned {status}"
            )));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("malformed session response: {e}")))?;
        Ok(Some(session.into()))
    }

    #[instrument(skip(self))]
    async fn list_recurring_prices(
        &self,
        lookup_key: &str,
    ) -> Result<Vec<RecurringPrice>, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("prices"))
            .bearer_auth(&self.secret_key)
            .query(&[
                ("lookup_keys[]", lookup_key),
                ("type", "recurring"),
                ("active", "true"),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("price lookup failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ServiceError::GatewayError(format!(
                "price lookup returned {status}"
            )));
        }

        let prices: StripePriceList = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("malformed price response: {e}")))?;
        Ok(prices.data)
    }
}
